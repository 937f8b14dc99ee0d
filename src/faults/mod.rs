//! Fault insertion: side resolution, cell classification, renumbering and
//! cohesive cell construction.

pub mod classify;
pub mod cohesive;
pub mod orient;
pub mod renumber;

pub use crate::algs::submesh::{FaultBoundary, FaultPath, FaultSubmesh, create_fault};
pub use cohesive::{
    BuilderContext, CohesiveInsertion, create, create_fault_parallel, create_interpolated,
    insert_fault,
};
