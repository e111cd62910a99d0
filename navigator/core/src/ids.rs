//! View Identifiers
//!
//! String-keyed identifiers for screens and popups. Identifiers are plain
//! values: they are created at call sites, compared by key only, and carry no
//! reference to the view they name. The empty key is the distinguished
//! "none" value.

use serde::{Deserialize, Serialize};

macro_rules! view_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from a key
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// The "none" identifier (empty key)
            #[must_use]
            pub fn none() -> Self {
                Self(String::new())
            }

            /// Whether this is the "none" identifier
            #[must_use]
            pub fn is_none(&self) -> bool {
                self.0.is_empty()
            }

            /// Get the key
            #[must_use]
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
            fn from(key: &str) -> Self {
                Self::new(key)
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

view_id! {
    /// Identifier of a full-page screen (including the HUD)
    ScreenId
}

view_id! {
    /// Identifier of a modal popup
    PopupId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_empty_key() {
        assert!(ScreenId::none().is_none());
        assert!(ScreenId::default().is_none());
        assert!(!ScreenId::new("Main").is_none());
        assert_eq!(PopupId::none().as_str(), "");
    }

    #[test]
    fn test_equality_is_case_sensitive() {
        assert_eq!(ScreenId::from("Settings"), ScreenId::new("Settings".to_string()));
        assert_ne!(ScreenId::from("Settings"), ScreenId::from("settings"));
    }

    #[test]
    fn test_display_prints_key() {
        assert_eq!(PopupId::from("Confirm").to_string(), "Confirm");
        assert_eq!(ScreenId::none().to_string(), "");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&ScreenId::from("Inventory")).unwrap();
        assert_eq!(json, "\"Inventory\"");
    }
}
