//! Newtype identifiers for domain entities.
//!
//! Each entity gets its own id type so a `TagId` can never be passed where
//! a `LeadId` is expected. Ids are random v4 UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Identifier of a lead.
    LeadId
);
id_type!(
    /// Identifier of a tag.
    TagId
);
id_type!(
    /// Identifier of a contact person attached to a lead.
    ContactId
);
id_type!(
    /// Identifier of a stage history entry.
    HistoryEntryId
);
id_type!(
    /// Identifier of the sponsor account a won lead converts into.
    SponsorId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(LeadId::new(), LeadId::new());
    }

    #[test]
    fn id_serializes_as_plain_uuid() {
        let id = LeadId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: LeadId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
        assert_eq!(json, format!("\"{}\"", id));
    }
}
