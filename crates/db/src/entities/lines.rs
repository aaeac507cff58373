//! `SeaORM` Entity for lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tmi_core::ledger::{Line, MetricValues};

use super::sea_orm_active_enums::LineState;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub move_id: Uuid,
    pub group_id: Uuid,
    pub state: LineState,
    #[sea_orm(column_type = "Decimal(Some((16, 0)))")]
    pub baptism: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub tithe: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub offering: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 0)))")]
    pub small_group: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 0)))")]
    pub gathering: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 0)))")]
    pub church_planting: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 0)))")]
    pub organizing_church: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub praise_thanksgiving: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::moves::Entity",
        from = "Column::MoveId",
        to = "super::moves::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Moves,
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Groups,
}

impl Related<super::moves::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Moves.def()
    }
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The eight metric columns as one value set.
    pub fn values(&self) -> MetricValues {
        MetricValues {
            baptism: self.baptism,
            tithe: self.tithe,
            offering: self.offering,
            small_group: self.small_group,
            gathering: self.gathering,
            church_planting: self.church_planting,
            organizing_church: self.organizing_church,
            praise_thanksgiving: self.praise_thanksgiving,
        }
    }
}

impl From<Model> for Line {
    fn from(model: Model) -> Self {
        Self {
            values: model.values(),
            id: model.id.into(),
            move_id: model.move_id.into(),
            group_id: model.group_id.into(),
            state: model.state.into(),
        }
    }
}
