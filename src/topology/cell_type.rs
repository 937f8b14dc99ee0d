//! Cell type metadata and reference face tables.
//!
//! Cells reference their vertices in a standard ordering:
//!
//! - [`CellType::Segment`]: `(0,1)`
//! - [`CellType::Triangle`]: `(0,1,2)` counter-clockwise
//! - [`CellType::Quadrilateral`]: `(0,1,2,3)` counter-clockwise
//! - [`CellType::Tetrahedron`]: `(0,1,2)` counter-clockwise seen from `3`
//! - [`CellType::Hexahedron`]: `(0,1,2,3)` bottom face counter-clockwise
//!   seen from the top, `(4,5,6,7)` the top face above it
//!
//! Every face in [`CellType::faces`] lists local vertex indices in outward
//! order, so two consistently ordered cells see a shared face in opposite
//! directions.

use crate::topology::point::PointId;

/// Cell shapes understood by interpolation and fault insertion.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CellType {
    /// 0D vertex.
    Vertex,
    /// 1D segment/edge.
    Segment,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
}

const SEGMENT_FACES: &[&[usize]] = &[&[0], &[1]];
const TRIANGLE_FACES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 0]];
const QUAD_FACES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const TET_FACES: &[&[usize]] = &[&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[2, 0, 3]];
const HEX_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];

impl CellType {
    /// Topological dimension of the cell.
    pub fn dimension(self) -> usize {
        match self {
            CellType::Vertex => 0,
            CellType::Segment => 1,
            CellType::Triangle | CellType::Quadrilateral => 2,
            CellType::Tetrahedron | CellType::Hexahedron => 3,
        }
    }

    /// Number of vertices of the cell.
    pub fn num_corners(self) -> usize {
        match self {
            CellType::Vertex => 1,
            CellType::Segment => 2,
            CellType::Triangle => 3,
            CellType::Quadrilateral | CellType::Tetrahedron => 4,
            CellType::Hexahedron => 8,
        }
    }

    /// Outward faces as local vertex indices.
    pub fn faces(self) -> &'static [&'static [usize]] {
        match self {
            CellType::Vertex => &[],
            CellType::Segment => SEGMENT_FACES,
            CellType::Triangle => TRIANGLE_FACES,
            CellType::Quadrilateral => QUAD_FACES,
            CellType::Tetrahedron => TET_FACES,
            CellType::Hexahedron => HEX_FACES,
        }
    }

    /// Vertices per face (all supported shapes have uniform faces).
    pub fn num_face_vertices(self) -> usize {
        self.faces().first().map_or(0, |f| f.len())
    }

    /// Shape of a cell of dimension `dim` with `n` vertices.
    pub fn from_vertex_count(dim: usize, n: usize) -> Option<CellType> {
        match (dim, n) {
            (0, 1) => Some(CellType::Vertex),
            (1, 2) => Some(CellType::Segment),
            (2, 3) => Some(CellType::Triangle),
            (2, 4) => Some(CellType::Quadrilateral),
            (3, 4) => Some(CellType::Tetrahedron),
            (3, 8) => Some(CellType::Hexahedron),
            _ => None,
        }
    }

    /// Shape of an interpolated cell of dimension `dim` with `n` faces.
    pub fn from_face_count(dim: usize, n: usize) -> Option<CellType> {
        match (dim, n) {
            (1, 2) => Some(CellType::Segment),
            (2, 3) => Some(CellType::Triangle),
            (2, 4) => Some(CellType::Quadrilateral),
            (3, 4) => Some(CellType::Tetrahedron),
            (3, 6) => Some(CellType::Hexahedron),
            _ => None,
        }
    }

    /// The cell's own ordering of one of its faces.
    ///
    /// `face` is the unordered vertex set of the face. The result follows
    /// the outward order of the matching reference face, rotated so that it
    /// starts at `anchor`. Faces with two vertices are returned unrotated.
    /// Returns `None` when `face` is not a face of the cell or `anchor` is
    /// not on it.
    pub fn oriented_face(
        self,
        cell_vertices: &[PointId],
        face: &[PointId],
        anchor: PointId,
    ) -> Option<Vec<PointId>> {
        if cell_vertices.len() != self.num_corners() {
            return None;
        }
        let mut wanted = face.to_vec();
        wanted.sort_unstable();
        for local in self.faces() {
            let ordered: Vec<PointId> = local.iter().map(|&i| cell_vertices[i]).collect();
            let mut key = ordered.clone();
            key.sort_unstable();
            if key != wanted {
                continue;
            }
            if ordered.len() <= 2 {
                return Some(ordered);
            }
            let start = ordered.iter().position(|&v| v == anchor)?;
            let n = ordered.len();
            return Some((0..n).map(|i| ordered[(start + i) % n]).collect());
        }
        None
    }
}

impl Default for CellType {
    fn default() -> Self {
        CellType::Vertex
    }
}
