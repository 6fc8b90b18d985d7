// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vLLM Launcher Authors

//! Instance identifier and generation.

use rand::RngCore;

/// Define a newtype ID wrapper around `String`, with the Display/From/Borrow
/// impls the rest of the crate relies on.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Opaque identifier for a running instance. Either client-supplied or
    /// auto-generated; unique within one registry.
    pub struct InstanceId;
}

/// Generates instance ids when the caller doesn't supply one.
pub trait IdGen: Send + Sync {
    fn next(&self) -> InstanceId;
}

/// Generates a random 64-bit token rendered as lowercase hex, matching the
/// `[0-9a-f]+` ids the launcher's REST callers expect.
#[derive(Clone, Default)]
pub struct RandomHexIdGen;

impl IdGen for RandomHexIdGen {
    fn next(&self) -> InstanceId {
        let token = rand::thread_rng().next_u64();
        InstanceId::new(format!("{token:016x}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_inner_string() {
        let id = InstanceId::new("abc123");
        assert_eq!(id.to_string(), "abc123");
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn random_hex_ids_are_lowercase_hex() {
        let gen = RandomHexIdGen;
        let id = gen.next();
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn random_hex_ids_are_distinct() {
        let gen = RandomHexIdGen;
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
    }
}
