//! Organizational node types.

use serde::{Deserialize, Serialize};
use std::fmt;
use tmi_shared::types::{CompanyId, GroupId, MetaGroupId};

/// Kind of organizational node, from the root of the chain to its leaves.
///
/// The order of the variants is the order of the chain: every type's parent
/// is the variant just before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    /// Root of a hierarchy.
    Conference,
    /// Below a conference.
    Division,
    /// Below a division.
    Union,
    /// Below a union.
    Field,
    /// Below a field.
    Zone,
    /// Below a zone.
    District,
    /// Below a district; moves are recorded per church.
    Church,
    /// Leaf; lines are recorded per small group.
    SmallGroup,
}

impl GroupType {
    /// Every type in chain order.
    pub const ALL: [Self; 8] = [
        Self::Conference,
        Self::Division,
        Self::Union,
        Self::Field,
        Self::Zone,
        Self::District,
        Self::Church,
        Self::SmallGroup,
    ];

    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conference => "conference",
            Self::Division => "division",
            Self::Union => "union",
            Self::Field => "field",
            Self::Zone => "zone",
            Self::District => "district",
            Self::Church => "church",
            Self::SmallGroup => "small_group",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Human label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Conference => "Conference",
            Self::Division => "Division",
            Self::Union => "Union",
            Self::Field => "Field",
            Self::Zone => "Zone",
            Self::District => "District",
            Self::Church => "Church",
            Self::SmallGroup => "Small Group",
        }
    }

    /// Position in the chain, 0 for conference.
    #[must_use]
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Type one level up the chain; `None` for conference.
    #[must_use]
    pub fn parent_type(self) -> Option<Self> {
        self.rank().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Type one level down the chain; `None` for small group.
    #[must_use]
    pub fn child_type(self) -> Option<Self> {
        Self::ALL.get(self.rank() + 1).copied()
    }

    /// Only churches and small groups carry an operational [`Group`].
    #[must_use]
    pub fn has_operational_group(self) -> bool {
        matches!(self, Self::Church | Self::SmallGroup)
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a type to the type its parent must have.
#[must_use]
pub fn get_parent_type(group_type: GroupType) -> Option<GroupType> {
    group_type.parent_type()
}

/// A node of the organization hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaGroup {
    /// Unique identifier.
    pub id: MetaGroupId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// Optional short code.
    pub code: Option<String>,
    /// Inactive nodes keep their history but accept no new lines.
    pub active: bool,
    /// Position in the chain.
    pub group_type: GroupType,
    /// Parent node; `None` for roots.
    pub parent_id: Option<MetaGroupId>,
    /// Manual ordering among siblings.
    pub sequence: i32,
}

/// Operational record bound one-to-one to a church or small group node.
///
/// Everything else (name, type, company, parent) is read through `meta_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier.
    pub id: GroupId,
    /// The node this record stands for.
    pub meta_id: MetaGroupId,
}
