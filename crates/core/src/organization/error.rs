//! Organization tree error types.

use thiserror::Error;
use tmi_shared::types::{GroupId, MetaGroupId};

use super::types::GroupType;

/// Errors raised by the hierarchy rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrganizationError {
    // ========== Validation Errors ==========
    /// The parent's type is not the one required by the child's type.
    #[error("\"{name}\" is a {child_type} and needs a {expected} parent, got {actual}")]
    InvalidParentType {
        /// Node being validated.
        name: String,
        /// Its type.
        child_type: GroupType,
        /// Type the parent must have (`none` for conferences).
        expected: String,
        /// Type the parent has (`none` for a missing parent).
        actual: String,
    },

    /// The parent belongs to a company the node cannot see.
    #[error("Parent of \"{0}\" belongs to an unrelated company")]
    ParentCompanyMismatch(String),

    /// A second operational group for the same node.
    #[error("Node \"{0}\" already has an operational group")]
    DuplicateGroup(String),

    /// Operational groups exist only for churches and small groups.
    #[error("Node \"{name}\" is a {group_type} and cannot carry an operational group")]
    GroupNotAllowed {
        /// Node name.
        name: String,
        /// Its type.
        group_type: GroupType,
    },

    /// A node with children, a bound group or history cannot be removed.
    #[error("Node \"{0}\" is still referenced and cannot be deleted")]
    NodeInUse(String),

    // ========== Not Found ==========
    /// Node id unknown to the loaded tree.
    #[error("Node {0} not found")]
    NodeNotFound(MetaGroupId),

    /// Operational group id unknown.
    #[error("Group {0} not found")]
    GroupNotFound(GroupId),
}

impl OrganizationError {
    /// Returns a stable machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidParentType { .. } => "INVALID_PARENT_TYPE",
            Self::ParentCompanyMismatch(_) => "PARENT_COMPANY_MISMATCH",
            Self::DuplicateGroup(_) => "DUPLICATE_GROUP",
            Self::GroupNotAllowed { .. } => "GROUP_NOT_ALLOWED",
            Self::NodeInUse(_) => "NODE_IN_USE",
            Self::NodeNotFound(_) => "NODE_NOT_FOUND",
            Self::GroupNotFound(_) => "GROUP_NOT_FOUND",
        }
    }
}
