//! `SeaORM` Entity for groups table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tmi_core::organization::Group;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    #[sea_orm(unique)]
    pub meta_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::meta_groups::Entity",
        from = "Column::MetaId",
        to = "super::meta_groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    MetaGroups,
    #[sea_orm(has_many = "super::lines::Entity")]
    Lines,
}

impl Related<super::meta_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MetaGroups.def()
    }
}

impl Related<super::lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Group {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            meta_id: model.meta_id.into(),
        }
    }
}
