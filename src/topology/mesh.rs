//! `Mesh`: topology, labels, coordinates and point-type bookkeeping of one
//! partition.
//!
//! The chart of a mesh always starts with its cells, followed directly by
//! its vertices. Interpolated meshes append faces and edges after the
//! vertices, so cell and vertex ids are the same in both forms.

use std::ops::Range;

use crate::algs::communicator::{Communicator, NoComm};
use crate::algs::interpolate::interpolate;
use crate::data::coordinates::Coordinates;
use crate::mesh_error::MeshSieveError;
use crate::topology::labels::{DEPTH_LABEL, LabelSet};
use crate::topology::point::PointId;
use crate::topology::sieve::ChartSieve;

/// Counts partitioning the chart of a split mesh into
/// `[cells][cohesive cells][vertices][shadow][Lagrange]`.
///
/// Exact block boundaries hold after the first fault. Later faults append
/// their blocks at the end of the chart and only accumulate the counts.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct PointTypeSizes {
    pub cells: usize,
    pub cohesive_cells: usize,
    pub vertices: usize,
    pub shadow_vertices: usize,
    pub lagrange_vertices: usize,
}

impl PointTypeSizes {
    /// Ids of the cohesive cells, which follow the normal cells.
    pub fn cohesive_range(&self) -> Range<usize> {
        self.cells..self.cells + self.cohesive_cells
    }

    pub fn total(&self) -> usize {
        self.cells
            + self.cohesive_cells
            + self.vertices
            + self.shadow_vertices
            + self.lagrange_vertices
    }
}

/// Cell and vertex blocks of a chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartLayout {
    /// All height-0 points, cohesive cells included: `[0, c_end)`.
    pub cells: Range<usize>,
    /// All depth-0 points: `[c_end, v_end)`.
    pub vertices: Range<usize>,
}

impl ChartLayout {
    #[inline]
    pub fn is_cell(&self, p: PointId) -> bool {
        self.cells.contains(&p.index())
    }

    #[inline]
    pub fn is_vertex(&self, p: PointId) -> bool {
        self.vertices.contains(&p.index())
    }
}

/// One partition of an unstructured mesh.
#[derive(Clone, Debug)]
pub struct Mesh<C: Communicator = NoComm> {
    dimension: usize,
    topology: ChartSieve,
    labels: LabelSet,
    coordinates: Coordinates<f64>,
    point_type_sizes: Option<PointTypeSizes>,
    comm: C,
}

impl Mesh<NoComm> {
    /// Build a cell→vertex mesh.
    ///
    /// `cells[i]` lists local vertex indices into the coordinate array;
    /// `coords` holds `coord_dim` components per vertex. Cells take chart
    /// ids `[0, cells.len())` and vertex `k` becomes `cells.len() + k`.
    pub fn from_cells(
        dimension: usize,
        coord_dim: usize,
        cells: &[Vec<usize>],
        coords: &[f64],
    ) -> Result<Self, MeshSieveError> {
        if coord_dim == 0 {
            return Err(MeshSieveError::ZeroLengthSlice);
        }
        if coords.len() % coord_dim != 0 {
            return Err(MeshSieveError::UnsupportedLayout(format!(
                "{} coordinate values do not split into {coord_dim}-component vertices",
                coords.len()
            )));
        }
        let nc = cells.len();
        let nv = coords.len() / coord_dim;
        let mut topology = ChartSieve::with_chart(nc + nv);
        for (c, cone) in cells.iter().enumerate() {
            topology.set_cone(
                PointId::from_index(c),
                cone.iter().map(|&v| PointId::from_index(nc + v)),
            )?;
        }
        let mut coordinates = Coordinates::try_new(coord_dim)?;
        for (k, xyz) in coords.chunks_exact(coord_dim).enumerate() {
            coordinates.try_add_point(PointId::from_index(nc + k), xyz)?;
        }
        Mesh::from_parts(dimension, topology, LabelSet::new(), coordinates)
    }

    /// Assemble a serial mesh from its parts, stratifying the topology.
    pub fn from_parts(
        dimension: usize,
        mut topology: ChartSieve,
        labels: LabelSet,
        coordinates: Coordinates<f64>,
    ) -> Result<Self, MeshSieveError> {
        if coordinates.dimension() < dimension {
            return Err(MeshSieveError::SliceLengthMismatch {
                point: PointId::new(0),
                expected: dimension,
                found: coordinates.dimension(),
            });
        }
        topology.symmetrize_and_stratify()?;
        let mut mesh = Mesh {
            dimension,
            topology,
            labels,
            coordinates,
            point_type_sizes: None,
            comm: NoComm,
        };
        mesh.refresh_depth_label()?;
        Ok(mesh)
    }
}

impl<C: Communicator> Mesh<C> {
    /// The same mesh attached to another communicator.
    pub fn with_comm<D: Communicator>(self, comm: D) -> Mesh<D> {
        Mesh {
            dimension: self.dimension,
            topology: self.topology,
            labels: self.labels,
            coordinates: self.coordinates,
            point_type_sizes: self.point_type_sizes,
            comm,
        }
    }

    /// Topological dimension of the cells.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn topology(&self) -> &ChartSieve {
        &self.topology
    }

    #[inline]
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    #[inline]
    pub fn labels_mut(&mut self) -> &mut LabelSet {
        &mut self.labels
    }

    #[inline]
    pub fn coordinates(&self) -> &Coordinates<f64> {
        &self.coordinates
    }

    #[inline]
    pub fn point_type_sizes(&self) -> Option<PointTypeSizes> {
        self.point_type_sizes
    }

    pub fn set_point_type_sizes(&mut self, sizes: Option<PointTypeSizes>) {
        self.point_type_sizes = sizes;
    }

    #[inline]
    pub fn comm(&self) -> &C {
        &self.comm
    }

    /// Local depth of the topology (0 for an empty chart).
    pub fn depth(&self) -> Result<u32, MeshSieveError> {
        self.topology.max_depth()
    }

    /// Cohesive cells left by earlier fault insertions.
    pub fn is_cohesive(&self, p: PointId) -> bool {
        self.point_type_sizes
            .is_some_and(|s| s.cohesive_range().contains(&p.index()))
    }

    /// Locate the `[cells][vertices]` blocks at the start of the chart.
    pub fn layout(&self) -> Result<ChartLayout, MeshSieveError> {
        let cells = self.topology.height_stratum(0)?;
        let c_end = cells.len();
        if cells.last().is_some_and(|c| c.index() + 1 != c_end) {
            return Err(MeshSieveError::UnsupportedLayout(
                "cells do not form the first block of the chart".into(),
            ));
        }
        let vertices: Vec<PointId> = self
            .topology
            .depth_stratum(0)?
            .iter()
            .copied()
            .filter(|v| v.index() >= c_end)
            .collect();
        let v_end = c_end + vertices.len();
        if vertices.last().is_some_and(|v| v.index() + 1 != v_end) {
            return Err(MeshSieveError::UnsupportedLayout(
                "vertices do not directly follow the cells".into(),
            ));
        }
        Ok(ChartLayout {
            cells: 0..c_end,
            vertices: c_end..v_end,
        })
    }

    /// A copy with faces (3-D) and edges appended after the existing chart.
    /// Cohesive cells keep their vertex cones.
    pub fn interpolated(&self) -> Result<Self, MeshSieveError>
    where
        C: Clone,
    {
        let topology = interpolate(&self.topology, self.dimension, |p| self.is_cohesive(p))?;
        let mut out = Mesh {
            dimension: self.dimension,
            topology,
            labels: self.labels.clone(),
            coordinates: self.coordinates.clone(),
            point_type_sizes: self.point_type_sizes,
            comm: self.comm.clone(),
        };
        out.refresh_depth_label()?;
        Ok(out)
    }

    /// Replace topology, labels, coordinates and point-type sizes at once.
    ///
    /// The topology is symmetrized and stratified first; on error the mesh
    /// is left untouched.
    pub fn install(
        &mut self,
        mut topology: ChartSieve,
        labels: LabelSet,
        coordinates: Coordinates<f64>,
        sizes: Option<PointTypeSizes>,
    ) -> Result<(), MeshSieveError> {
        if !topology.is_symmetrized() || topology.strata().is_err() {
            topology.symmetrize_and_stratify()?;
        }
        topology.debug_assert_consistent();
        self.topology = topology;
        self.labels = labels;
        self.coordinates = coordinates;
        self.point_type_sizes = sizes;
        self.refresh_depth_label()
    }

    /// Rewrite the `"depth"` label from the current strata.
    pub fn refresh_depth_label(&mut self) -> Result<(), MeshSieveError> {
        let strata = self.topology.strata()?;
        self.labels.remove_label(DEPTH_LABEL);
        self.labels.create_label(DEPTH_LABEL);
        for (i, &d) in strata.depth.iter().enumerate() {
            self.labels
                .set_label(PointId::from_index(i), DEPTH_LABEL, d as i32);
        }
        Ok(())
    }
}
