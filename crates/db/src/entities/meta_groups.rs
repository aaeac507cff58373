//! `SeaORM` Entity for meta_groups table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tmi_core::organization::MetaGroup;

use super::sea_orm_active_enums::GroupType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "meta_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub active: bool,
    pub group_type: GroupType,
    pub parent_id: Option<Uuid>,
    pub sequence: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Companies,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    SelfRef,
    #[sea_orm(has_one = "super::groups::Entity")]
    Groups,
    #[sea_orm(has_many = "super::moves::Entity")]
    Moves,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::moves::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Moves.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MetaGroup {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            company_id: model.company_id.into(),
            name: model.name,
            code: model.code,
            active: model.active,
            group_type: model.group_type.into(),
            parent_id: model.parent_id.map(Into::into),
            sequence: model.sequence,
        }
    }
}
