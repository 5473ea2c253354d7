use std::fmt;

use serde::{Deserialize, Serialize};

/// Record ids are assigned by the persistence backend as integers; the
/// newtypes only exist so a companion id can never be passed where a
/// character id is expected.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_id!(CharacterId);
define_id!(CompanionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_roundtrip() {
        let id = CharacterId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i64::from(id), 42);
        assert_eq!(CharacterId::from(42), id);
    }

    #[test]
    fn test_serde_transparent() {
        let id = CompanionId::new(7);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "7");
        let back: CompanionId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}
