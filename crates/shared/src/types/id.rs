//! Typed IDs for type-safe entity references.
//!
//! A `PeriodId` can never be passed where a `YearId` is expected, even though
//! both are UUIDs in the database.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh time-ordered (v7) identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::now_v7())
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn uuid(self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

typed_id!(CompanyId, "Identifier of a company (the scope owning a hierarchy).");
typed_id!(UserId, "Identifier of the acting user.");
typed_id!(YearId, "Identifier of a fiscal year.");
typed_id!(PeriodId, "Identifier of a period inside a fiscal year.");
typed_id!(MetaGroupId, "Identifier of an organizational node.");
typed_id!(GroupId, "Identifier of the operational record bound to a node.");
typed_id!(MoveId, "Identifier of a move (one church, one period).");
typed_id!(LineId, "Identifier of a single small group entry inside a move.");
typed_id!(SequenceId, "Identifier of a numbering sequence.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(MoveId::generate(), MoveId::generate());
    }

    #[test]
    fn uuid_conversions_round_trip() {
        let uuid = Uuid::new_v4();
        let id = PeriodId::from(uuid);
        assert_eq!(id.uuid(), uuid);
        assert_eq!(Uuid::from(id), uuid);
    }

    #[test]
    fn display_matches_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(YearId::from(uuid).to_string(), uuid.to_string());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(MetaGroupId::from_str("not-a-uuid").is_err());
        let uuid = Uuid::new_v4();
        assert_eq!(MetaGroupId::from_str(&uuid.to_string()).unwrap().uuid(), uuid);
    }
}
