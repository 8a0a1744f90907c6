//! Strong, zero-cost handles for mesh entities.
//!
//! Nodes and elements are addressed by opaque identifiers wrapping a
//! nonzero `u64`; 0 is reserved as an invalid or sentinel value. Global ids
//! are allocated densely starting at 1, so `max + 1` is always the next
//! free id.
//!
//! Grains are numbered by the meshing tool and carried as a plain `u32`.

use crate::mesh_error::GrainMeshError;
use serde::{Deserialize, Serialize};
use std::{fmt, num::NonZeroU64};

macro_rules! nonzero_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Creates an identifier from a raw `u64`, rejecting zero.
            #[inline]
            pub fn new(raw: u64) -> Result<Self, GrainMeshError> {
                NonZeroU64::new(raw)
                    .map($name)
                    .ok_or(GrainMeshError::InvalidId)
            }

            /// Returns the inner `u64` value.
            #[inline]
            pub const fn get(self) -> u64 {
                self.0.get()
            }

            /// The identifier immediately following this one.
            #[inline]
            pub fn next(self) -> Self {
                $name(self.0.saturating_add(1))
            }

            /// First identifier allocated after `floor`, where `floor` is the
            /// current maximum (0 for an empty table).
            #[inline]
            pub(crate) fn after(floor: u64) -> Self {
                $name(NonZeroU64::MIN.saturating_add(floor))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.get()).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.get())
            }
        }

        impl TryFrom<u64> for $name {
            type Error = GrainMeshError;

            fn try_from(raw: u64) -> Result<Self, Self::Error> {
                $name::new(raw)
            }
        }
    };
}

nonzero_id!(
    /// Identifier of a mesh node, local to the fragment or mesh that owns it.
    NodeId
);

nonzero_id!(
    /// Identifier of a mesh element, local to the fragment or mesh that owns it.
    ElementId
);

/// Grain number as assigned by the meshing tool.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GrainId(pub u32);

impl GrainId {
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for GrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GrainId {
    fn from(raw: u32) -> Self {
        GrainId(raw)
    }
}
