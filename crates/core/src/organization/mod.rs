//! Organization hierarchy: conference → … → church → small group.
//!
//! # Modules
//!
//! - `types` - Node types, nodes and operational groups
//! - `tree` - Arena tree with closures, leaf counts and ordering
//! - `cache` - Per-company tree cache
//! - `error` - Organization error types

pub mod cache;
pub mod error;
pub mod tree;
pub mod types;

#[cfg(test)]
mod tree_props;

pub use cache::TreeCache;
pub use error::OrganizationError;
pub use tree::OrganizationTree;
pub use types::{Group, GroupType, MetaGroup, get_parent_type};
