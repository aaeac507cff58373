//! `SeaORM` Entity for moves table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tmi_core::ledger::{ControlTotal, Move};

use super::sea_orm_active_enums::{Metric, MoveState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "moves")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub number: Option<String>,
    pub post_number: Option<String>,
    pub date: Date,
    pub post_date: Option<Date>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub state: MoveState,
    pub group_id: Uuid,
    pub period_id: Uuid,
    pub control_metric: Option<Metric>,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub control_amount: Option<Decimal>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::meta_groups::Entity",
        from = "Column::GroupId",
        to = "super::meta_groups::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    MetaGroups,
    #[sea_orm(
        belongs_to = "super::periods::Entity",
        from = "Column::PeriodId",
        to = "super::periods::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Periods,
    #[sea_orm(has_many = "super::lines::Entity")]
    Lines,
}

impl Related<super::meta_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MetaGroups.def()
    }
}

impl Related<super::periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Periods.def()
    }
}

impl Related<super::lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Move {
    fn from(model: Model) -> Self {
        let control = match (model.control_metric, model.control_amount) {
            (Some(metric), Some(amount)) => Some(ControlTotal {
                metric: metric.into(),
                amount,
            }),
            _ => None,
        };
        Self {
            id: model.id.into(),
            company_id: model.company_id.into(),
            number: model.number,
            post_number: model.post_number,
            date: model.date,
            post_date: model.post_date,
            description: model.description,
            state: model.state.into(),
            group_id: model.group_id.into(),
            period_id: model.period_id.into(),
            control,
        }
    }
}
