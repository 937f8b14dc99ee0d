//! Re-export public algorithms.

pub mod communicator;
pub mod interpolate;
pub mod submesh;

pub use interpolate::{cell_vertices, interpolate};
pub use submesh::create_fault;
