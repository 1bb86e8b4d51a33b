//! Identifier newtypes for jobs, tasks, records and claims
//!
//! All ids are UUIDv7-based:
//! - Chronological sortability for temporal queries
//! - 128-bit uniqueness
//! - No coordination required for concurrent generation

use std::fmt;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new UUIDv7-based id
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create an id from a raw u128 value
            ///
            /// This is primarily for storage layer deserialization.
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Parse an id from a UUID string
            pub fn from_string(s: &str) -> Result<Self, String> {
                uuid::Uuid::parse_str(s)
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| format!("Invalid UUID string: {}", e))
            }

            /// Get the raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }

            /// Get the timestamp component (milliseconds since Unix epoch)
            pub fn timestamp(&self) -> u64 {
                // UUIDv7: top 48 bits are Unix millisecond timestamp
                (self.0 >> 80) as u64
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }

        // Ids cross the progress and query interfaces as UUID strings
        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_string(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for an import job
    JobId
}

uuid_id! {
    /// Unique identifier for a single file task within a job
    TaskId
}

uuid_id! {
    /// Unique identifier for an extracted record in the document store
    RecordId
}

uuid_id! {
    /// Unique identifier for a claim derived from a query answer
    ClaimId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_ordering() {
        let id1 = RecordId::from_value(1000);
        let id2 = RecordId::from_value(2000);

        assert!(id1 < id2);
        assert!(id2 > id1);
    }

    #[test]
    fn test_id_chronological() {
        // UUIDv7s generated in sequence should be chronologically ordered
        let id1 = JobId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = JobId::new();

        assert!(id1 < id2, "Earlier UUIDv7 should be less than later UUIDv7");
        assert!(id1.timestamp() <= id2.timestamp(), "Timestamps should be ordered");
    }

    #[test]
    fn test_id_display_and_parse() {
        let id = TaskId::new();
        let id_str = id.to_string();

        // UUIDv7 strings are 36 characters (8-4-4-4-12 with hyphens)
        assert_eq!(id_str.len(), 36);

        let parsed = TaskId::from_string(&id_str).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_invalid_string() {
        assert!(ClaimId::from_string("not-a-valid-uuid").is_err());
        assert!(ClaimId::from_string("").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: id ordering matches u128 ordering
        #[test]
        fn test_id_ordering_property(a: u128, b: u128) {
            let id_a = RecordId::from_value(a);
            let id_b = RecordId::from_value(b);

            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
            prop_assert_eq!(id_a > id_b, a > b);
        }

        /// Property: round-trip through string representation preserves the id
        #[test]
        fn test_id_string_roundtrip(value: u128) {
            let id = RecordId::from_value(value);
            let id_str = id.to_string();

            match RecordId::from_string(&id_str) {
                Ok(parsed) => prop_assert_eq!(id, parsed),
                Err(e) => return Err(TestCaseError::fail(e)),
            }
        }
    }
}
