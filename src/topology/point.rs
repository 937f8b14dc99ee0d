//! `PointId`: a strong, zero-cost handle for mesh entities
//!
//! Every element of a mesh topology (cell, face, edge, vertex) is a point
//! drawn from a contiguous chart `[0, N)`. A point carries no intrinsic
//! dimension tag; its role comes from the depth/height stratification of the
//! graph it lives in.
//!
//! This module provides:
//! - A transparent `PointId` newtype around `u64` with the same memory layout.
//! - Chart helpers (`index`, `from_index`, `shifted`) used by renumbering passes.
//! - Implementations of common traits (`Debug`, `Display`, ordering,
//!   hashing, serde) so `PointId` can be used in maps, sets, and printed easily.

use std::fmt;

/// Identifier of a point inside a chart.
///
/// # Memory layout
/// This type is `repr(transparent)`, meaning it has the same ABI and
/// alignment as `u64` and can be exchanged between partitions as a `u64`.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct PointId(u64);

impl PointId {
    /// Creates a new `PointId` from a raw chart index.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mesh_sieve_faults::topology::point::PointId;
    /// let p = PointId::new(0);
    /// assert_eq!(p.get(), 0);
    /// ```
    #[inline]
    pub const fn new(raw: u64) -> Self {
        PointId(raw)
    }

    /// Returns the inner `u64` value of this `PointId`.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Position of the point inside its chart, for indexing dense tables.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Inverse of [`PointId::index`].
    #[inline]
    pub const fn from_index(i: usize) -> Self {
        PointId(i as u64)
    }

    /// The point `by` slots further along the chart.
    #[inline]
    pub const fn shifted(self, by: u64) -> Self {
        PointId(self.0 + by)
    }
}

impl From<u64> for PointId {
    #[inline]
    fn from(raw: u64) -> Self {
        PointId(raw)
    }
}

/// Custom `Debug` implementation to display as `PointId(raw_value)`.
impl fmt::Debug for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PointId").field(&self.get()).finish()
    }
}

/// Prints the numeric ID without any wrapper text.
impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// `PointId` can be sent over MPI as a `u64`.
#[cfg(feature = "mpi-support")]
unsafe impl mpi::datatype::Equivalence for PointId {
    type Out = <u64 as mpi::datatype::Equivalence>::Out;

    fn equivalent_datatype() -> Self::Out {
        u64::equivalent_datatype()
    }
}
