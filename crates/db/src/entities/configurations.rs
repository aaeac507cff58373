//! `SeaORM` Entity for configurations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "configurations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub company_id: Uuid,
    pub move_sequence_id: Option<Uuid>,
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
        belongs_to = "super::sequences::Entity",
        from = "Column::MoveSequenceId",
        to = "super::sequences::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Sequences,
    #[sea_orm(has_many = "super::configuration_targets::Entity")]
    ConfigurationTargets,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::sequences::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sequences.def()
    }
}

impl Related<super::configuration_targets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConfigurationTargets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
