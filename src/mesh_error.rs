//! MeshSieveError: Unified error type for the public APIs of this crate
//!
//! Every fallible operation (graph stratification, fault extraction,
//! cohesive cell insertion, communication) reports through this type.
//! Errors in the invalid-topology category are fatal for a fault build: the
//! caller has to fix the mesh or the marker and start over.

use crate::topology::point::PointId;
use thiserror::Error;

/// Unified error type for mesh and fault operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshSieveError {
    /// A point referenced by a cone, label or map lies outside the chart.
    #[error("point {point} lies outside the chart [0, {chart_size})")]
    PointOutOfChart { point: PointId, chart_size: usize },
    /// A point appeared in a cone but wasn’t in the chart.
    #[error("Topology error: point `{0}` found in cone but not in point set")]
    MissingPointInCone(String),
    /// The mesh topology contains a cycle; expected a DAG.
    #[error("Topology error: cycle detected in mesh (expected DAG)")]
    CycleDetected,
    /// Strata were queried before `stratify` ran on the current cones.
    #[error("graph is not stratified; call symmetrize() and stratify() after editing cones")]
    NotStratified,

    /// The fault marker selects nothing.
    #[error("invalid topology: label `{label}` selects no fault faces")]
    EmptyFault { label: String },
    /// A selected face is not shared by exactly two cells.
    #[error("invalid topology: fault face {face} is adjacent to {cells} cells (expected 2)")]
    NonManifoldFace { face: PointId, cells: usize },
    /// More than two fault faces meet at one ridge of the fault surface.
    #[error("invalid topology: {faces} fault faces meet at ridge {ridge:?}")]
    NonManifoldFault { ridge: Vec<PointId>, faces: usize },
    /// Fault faces cannot be given a consistent orientation.
    #[error("invalid topology: fault surface is not orientable near face {face}")]
    NonOrientableFault { face: PointId },
    /// A fault face matches its cell neither forward nor reversed.
    #[error("invalid topology: fault face {face:?} does not match any face of cell {cell}")]
    OrientationMismatch { face: Vec<PointId>, cell: PointId },
    /// A cell touching the fault could not be given a side.
    #[error("invalid topology: cell {cell} around fault vertex {vertex} cannot be classified")]
    UnclassifiedCell { cell: PointId, vertex: PointId },
    /// A cell was reached from both sides of the fault.
    #[error("invalid topology: cell {cell} lies on both sides of the fault")]
    ConflictingSides { cell: PointId },

    /// Cell shape not covered by the reference tables.
    #[error("unsupported cell {point}: {cone_size} cone points in dimension {dimension}")]
    UnsupportedCell {
        point: PointId,
        cone_size: usize,
        dimension: usize,
    },
    /// Chart does not follow the `[cells][vertices][...]` layout.
    #[error("unsupported chart layout: {0}")]
    UnsupportedLayout(String),

    /// A vertex has no coordinates attached.
    #[error("no coordinates stored for point {0}")]
    MissingCoordinates(PointId),
    /// A coordinate slice has the wrong length.
    #[error("slice length mismatch at {point}: expected {expected}, found {found}")]
    SliceLengthMismatch {
        point: PointId,
        expected: usize,
        found: usize,
    },
    /// Coordinate storage with zero components per point.
    #[error("coordinate dimension must be non-zero")]
    ZeroLengthSlice,
    /// The same point was inserted twice.
    #[error("point {0} is already present")]
    DuplicatePoint(PointId),

    /// Message passing failed or delivered a malformed payload.
    #[error("communication error: {0}")]
    Communication(String),
}

impl MeshSieveError {
    /// True for the fatal invalid-topology category: the marker or the mesh
    /// has to be corrected before the build can be retried from scratch.
    pub fn is_invalid_topology(&self) -> bool {
        matches!(
            self,
            MeshSieveError::EmptyFault { .. }
                | MeshSieveError::NonManifoldFace { .. }
                | MeshSieveError::NonManifoldFault { .. }
                | MeshSieveError::NonOrientableFault { .. }
                | MeshSieveError::OrientationMismatch { .. }
                | MeshSieveError::UnclassifiedCell { .. }
                | MeshSieveError::ConflictingSides { .. }
        )
    }
}
