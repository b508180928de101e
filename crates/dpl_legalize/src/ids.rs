//! Opaque ID newtypes for legalizer entities.
//!
//! [`CellId`], [`GroupId`], and [`NetId`] are thin `u32` wrappers used as
//! arena indices into a [`Design`](crate::data::Design). They are `Copy`,
//! `Hash`, ordered, and `Serialize`/`Deserialize`.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the arena slot this ID refers to.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a cell instance in the design.
    CellId
);

define_id!(
    /// Opaque, copyable ID for a placement group (fence region).
    GroupId
);

define_id!(
    /// Opaque, copyable ID for a net.
    NetId
);
