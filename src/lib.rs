#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-sieve-faults
//!
//! Cohesive fault insertion for sieve-style unstructured meshes. A fault is
//! a surface of faces marked by a label; inserting it duplicates the fault
//! vertices, moves the cells on one side onto the duplicates and stitches
//! the two sides together with zero-thickness cohesive cells.
//!
//! ## Features
//! - Chart-indexed sieve topology with cones, supports and depth/height strata
//! - Interpolation (faces and edges) and uninterpolation with DMPlex-style
//!   cone orientations
//! - Fault submesh and buried-boundary extraction
//! - Cohesive cell construction with optional Lagrange-multiplier vertices
//! - Pluggable communication backends (serial, in-process, MPI) for the one
//!   collective decision the construction makes
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mesh-sieve-faults = "0.3"
//! # features = ["mpi-support"]
//! ```
//!
//! ```rust
//! use mesh_sieve_faults::prelude::*;
//!
//! // two quads sharing the edge x = 1
//! let coords = [0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0];
//! let mut mesh = Mesh::from_cells(2, 2, &[vec![0, 1, 4, 3], vec![1, 2, 5, 4]], &coords)?;
//! mesh.labels_mut().set_label(PointId::new(3), "fault", 1);
//! mesh.labels_mut().set_label(PointId::new(6), "fault", 1);
//!
//! let out = insert_fault(&mut mesh, "fault", 100, true, BuilderContext::default())?;
//! assert_eq!(out.context.cohesive_cells, 1);
//! assert_eq!(mesh.topology().cone_size(PointId::new(2)), 6);
//! # Ok::<(), MeshSieveError>(())
//! ```
//!
//! ## Determinism
//!
//! All storage is ordered; the same input always yields the same chart,
//! cones, labels and coordinates.

pub mod algs;
pub mod data;
pub mod faults;
pub mod mesh_error;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{Communicator, LocalComm, NoComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::submesh::{FaultBoundary, FaultPath, FaultSubmesh, create_fault};
    pub use crate::data::coordinates::Coordinates;
    pub use crate::faults::{
        BuilderContext, CohesiveInsertion, create, create_fault_parallel, create_interpolated,
        insert_fault,
    };
    pub use crate::mesh_error::MeshSieveError;
    pub use crate::topology::cell_type::CellType;
    pub use crate::topology::labels::LabelSet;
    pub use crate::topology::mesh::{Mesh, PointTypeSizes};
    pub use crate::topology::point::PointId;
    pub use crate::topology::sieve::ChartSieve;
}
