//! `SeaORM` Entity for years table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tmi_core::fiscal::Year;

use super::sea_orm_active_enums::YearState;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "years")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub state: YearState,
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
    #[sea_orm(has_many = "super::periods::Entity")]
    Periods,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Periods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Year {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            company_id: model.company_id.into(),
            name: model.name,
            start_date: model.start_date,
            end_date: model.end_date,
            state: model.state.into(),
        }
    }
}
