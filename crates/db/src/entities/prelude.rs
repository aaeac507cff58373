//! Entity re-exports.

pub use super::companies::Entity as Companies;
pub use super::configuration_targets::Entity as ConfigurationTargets;
pub use super::configurations::Entity as Configurations;
pub use super::groups::Entity as Groups;
pub use super::lines::Entity as Lines;
pub use super::meta_groups::Entity as MetaGroups;
pub use super::moves::Entity as Moves;
pub use super::periods::Entity as Periods;
pub use super::sequences::Entity as Sequences;
pub use super::years::Entity as Years;
