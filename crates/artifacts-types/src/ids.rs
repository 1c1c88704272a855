//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Identifiers tag log lines so interleaved character loops can be told
//! apart. All IDs use UUID v7 (time-ordered) so they sort by creation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// One execution of a state-machine task.
    RunId
}

define_id! {
    /// One HTTP action request.
    RequestId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_time_ordered() {
        let first = RunId::new();
        let second = RunId::new();
        assert_ne!(first.into_inner(), Uuid::nil());
        assert!(first <= second);
    }

    #[test]
    fn display_matches_uuid() {
        let id = RequestId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
