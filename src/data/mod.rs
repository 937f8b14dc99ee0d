//! Data attached to mesh points.

pub mod coordinates;
