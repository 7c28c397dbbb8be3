//! Identifier newtypes for documents, layers and components
//!
//! Ids are opaque strings handed to us by the document source. The wrappers
//! exist so a layer id can never be passed where a component id is expected.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from anything string-like
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the raw id string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identity of an open document
    DocumentId
);

string_id!(
    /// Identity of a layer within a document
    LayerId
);

string_id!(
    /// Identity of an exportable component; the job registry key
    ComponentId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_display_and_as_str() {
        let id = ComponentId::new("hero@2x.png");
        assert_eq!(id.as_str(), "hero@2x.png");
        assert_eq!(id.to_string(), "hero@2x.png");
    }

    #[test]
    fn test_id_equality_and_hash() {
        let mut seen = HashSet::new();
        assert!(seen.insert(LayerId::from("7")));
        assert!(!seen.insert(LayerId::from("7".to_string())));
        assert!(seen.insert(LayerId::from("8")));
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = DocumentId::new("doc-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"doc-1\"");

        let back: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
