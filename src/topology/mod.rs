//! Top-level module for mesh topology abstractions.
//!
//! This module provides:
//! - Point ids and cone orientations
//! - The chart-indexed sieve with its strata
//! - Cell shapes, labels and the `Mesh` container

pub mod cell_type;
pub mod labels;
pub mod mesh;
pub mod orientation;
pub mod point;
pub mod sieve;

pub use orientation::ConeOrientation;
pub use sieve::ChartSieve;
