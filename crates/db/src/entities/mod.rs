//! `SeaORM` entities, one module per table.

#![allow(missing_docs)]

pub mod prelude;

pub mod companies;
pub mod configuration_targets;
pub mod configurations;
pub mod groups;
pub mod lines;
pub mod meta_groups;
pub mod moves;
pub mod periods;
pub mod sea_orm_active_enums;
pub mod sequences;
pub mod years;
