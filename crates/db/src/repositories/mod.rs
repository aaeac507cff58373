//! Repository abstractions for data access.
//!
//! Each repository owns a connection handle, runs one transaction per
//! operation and delegates every rule to `tmi-core`.

pub mod aggregation;
pub mod company;
pub mod configuration;
pub mod fiscal;
pub mod moves;
pub mod organization;
pub mod sequence;

pub use aggregation::{AggregationRepoError, AggregationRepository};
pub use company::{CompanyError, CompanyRepository, CreateCompanyInput};
pub use configuration::{ConfigurationError, ConfigurationRepository};
pub use fiscal::{CreatePeriodInput, CreateYearInput, FiscalRepoError, FiscalRepository};
pub use moves::{CreateMoveInput, LineTarget, MoveRepoError, MoveRepository, MoveWithLines, UpdateMoveInput};
pub use organization::{
    CreateMetaGroupInput, OrganizationRepoError, OrganizationRepository, UpdateMetaGroupInput,
};
pub use sequence::{CreateSequenceInput, SequenceError, SequenceRepository};
