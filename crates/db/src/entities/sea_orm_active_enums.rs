//! `SeaORM` active enums mirroring the Postgres enum types.
//!
//! Each enum converts to and from its `tmi-core` counterpart, so the
//! repositories never match on database strings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tmi_core::fiscal;
use tmi_core::ledger;
use tmi_core::organization;

/// Maps a database enum onto a core enum, variant for variant.
macro_rules! mirror {
    ($db:ident <=> $module:ident :: $core:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$db> for $module::$core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$module::$core> for $db {
            fn from(value: $module::$core) -> Self {
                match value {
                    $($module::$core::$variant => Self::$variant,)+
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "year_state")]
pub enum YearState {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "close")]
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "period_state")]
pub enum PeriodState {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "close")]
    Close,
    #[sea_orm(string_value = "locked")]
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "period_type")]
pub enum PeriodType {
    #[sea_orm(string_value = "standard")]
    Standard,
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "group_type")]
pub enum GroupType {
    #[sea_orm(string_value = "conference")]
    Conference,
    #[sea_orm(string_value = "division")]
    Division,
    #[sea_orm(string_value = "union")]
    Union,
    #[sea_orm(string_value = "field")]
    Field,
    #[sea_orm(string_value = "zone")]
    Zone,
    #[sea_orm(string_value = "district")]
    District,
    #[sea_orm(string_value = "church")]
    Church,
    #[sea_orm(string_value = "small_group")]
    SmallGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "move_state")]
pub enum MoveState {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "quotation")]
    Quotation,
    #[sea_orm(string_value = "posted")]
    Posted,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "line_state")]
pub enum LineState {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "valid")]
    Valid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "metric")]
pub enum Metric {
    #[sea_orm(string_value = "baptism")]
    Baptism,
    #[sea_orm(string_value = "tithe")]
    Tithe,
    #[sea_orm(string_value = "offering")]
    Offering,
    #[sea_orm(string_value = "small_group")]
    SmallGroup,
    #[sea_orm(string_value = "gathering")]
    Gathering,
    #[sea_orm(string_value = "church_planting")]
    ChurchPlanting,
    #[sea_orm(string_value = "organizing_church")]
    OrganizingChurch,
    #[sea_orm(string_value = "praise_thanksgiving")]
    PraiseThanksgiving,
}

mirror!(YearState <=> fiscal::YearState { Open, Close });
mirror!(PeriodState <=> fiscal::PeriodState { Open, Close, Locked });
mirror!(PeriodType <=> fiscal::PeriodType { Standard, Adjustment });
mirror!(GroupType <=> organization::GroupType {
    Conference,
    Division,
    Union,
    Field,
    Zone,
    District,
    Church,
    SmallGroup,
});
mirror!(MoveState <=> ledger::MoveState { Draft, Quotation, Posted, Canceled });
mirror!(LineState <=> ledger::LineState { Draft, Valid });
mirror!(Metric <=> ledger::Metric {
    Baptism,
    Tithe,
    Offering,
    SmallGroup,
    Gathering,
    ChurchPlanting,
    OrganizingChurch,
    PraiseThanksgiving,
});
