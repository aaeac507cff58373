//! `SeaORM` Entity for periods table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tmi_core::fiscal::Period;

use super::sea_orm_active_enums::{PeriodState, PeriodType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "periods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub year_id: Uuid,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub state: PeriodState,
    pub period_type: PeriodType,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::years::Entity",
        from = "Column::YearId",
        to = "super::years::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Years,
    #[sea_orm(has_many = "super::moves::Entity")]
    Moves,
}

impl Related<super::years::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Years.def()
    }
}

impl Related<super::moves::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Moves.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Period {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            year_id: model.year_id.into(),
            name: model.name,
            start_date: model.start_date,
            end_date: model.end_date,
            state: model.state.into(),
            period_type: model.period_type.into(),
        }
    }
}
