//! Which side of a fault face a cell lies on.
//!
//! A fault face is an ordered vertex cycle. A cell that sees the face in
//! the same order (its outward order, up to rotation) lies on the negative
//! side; a cell that sees it reversed lies on the positive side.

use crate::algs::interpolate::cell_vertices;
use crate::mesh_error::MeshSieveError;
use crate::topology::cell_type::CellType;
use crate::topology::point::PointId;
use crate::topology::sieve::ChartSieve;

/// Relation between a fault face and the outward ordering a cell gives it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceOrientation {
    /// The cell orders the face like the fault does.
    Forward,
    /// The cell orders the face backwards.
    Reverse,
    /// The face is not a face of the cell.
    Mismatch,
}

impl FaceOrientation {
    /// `(negative, positive)` given the tested `cell` and the `other` cell
    /// across the face; `None` on a mismatch.
    pub fn sides(self, cell: PointId, other: PointId) -> Option<(PointId, PointId)> {
        match self {
            FaceOrientation::Forward => Some((cell, other)),
            FaceOrientation::Reverse => Some((other, cell)),
            FaceOrientation::Mismatch => None,
        }
    }
}

/// Compare `face` with the ordering `cell_vertices` (of shape `ct`) gives it.
///
/// Forward is tried first, anchored at the first fault vertex; reverse is
/// anchored at the last fault vertex and compared backwards. Two-vertex
/// faces compare positionally.
pub fn resolve_vertices(ct: CellType, cell_vertices: &[PointId], face: &[PointId]) -> FaceOrientation {
    let (Some(&first), Some(&last)) = (face.first(), face.last()) else {
        return FaceOrientation::Mismatch;
    };
    if let Some(local) = ct.oriented_face(cell_vertices, face, first) {
        if local == face {
            return FaceOrientation::Forward;
        }
    }
    if let Some(local) = ct.oriented_face(cell_vertices, face, last) {
        if local.iter().eq(face.iter().rev()) {
            return FaceOrientation::Reverse;
        }
    }
    FaceOrientation::Mismatch
}

/// Orientation of `face` (parent vertex ids, fault order) relative to
/// `cell` of the `dim`-dimensional topology `sieve`.
pub fn resolve(
    sieve: &ChartSieve,
    dim: usize,
    cell: PointId,
    face: &[PointId],
) -> Result<FaceOrientation, MeshSieveError> {
    let verts = cell_vertices(sieve, cell)?;
    let ct = CellType::from_vertex_count(dim, verts.len()).ok_or(MeshSieveError::UnsupportedCell {
        point: cell,
        cone_size: verts.len(),
        dimension: dim,
    })?;
    let o = resolve_vertices(ct, &verts, face);
    log::trace!("face {face:?} vs cell {cell}: {o:?}");
    Ok(o)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[u64]) -> Vec<PointId> {
        raw.iter().copied().map(PointId::new).collect()
    }

    #[test]
    fn hex_shared_face_forward_and_reverse() {
        let lower = pts(&[2, 3, 4, 5, 6, 7, 8, 9]);
        let upper = pts(&[6, 7, 8, 9, 10, 11, 12, 13]);
        // outward order of the top face of the lower hex
        let face = pts(&[6, 7, 8, 9]);
        assert_eq!(
            resolve_vertices(CellType::Hexahedron, &lower, &face),
            FaceOrientation::Forward
        );
        assert_eq!(
            resolve_vertices(CellType::Hexahedron, &upper, &face),
            FaceOrientation::Reverse
        );
        // any rotation of the cycle resolves the same way
        assert_eq!(
            resolve_vertices(CellType::Hexahedron, &lower, &pts(&[8, 9, 6, 7])),
            FaceOrientation::Forward
        );
    }

    #[test]
    fn segments_compare_positionally() {
        let tri = pts(&[0, 1, 2]);
        assert_eq!(
            resolve_vertices(CellType::Triangle, &tri, &pts(&[1, 2])),
            FaceOrientation::Forward
        );
        assert_eq!(
            resolve_vertices(CellType::Triangle, &tri, &pts(&[2, 1])),
            FaceOrientation::Reverse
        );
    }

    #[test]
    fn foreign_face_mismatches() {
        let tet = pts(&[0, 1, 2, 3]);
        assert_eq!(
            resolve_vertices(CellType::Tetrahedron, &tet, &pts(&[0, 1, 7])),
            FaceOrientation::Mismatch
        );
        assert_eq!(FaceOrientation::Mismatch.sides(PointId::new(0), PointId::new(1)), None);
        assert_eq!(
            FaceOrientation::Reverse.sides(PointId::new(0), PointId::new(1)),
            Some((PointId::new(1), PointId::new(0)))
        );
    }

    #[test]
    fn resolve_on_interpolated_topology() {
        let mut s = ChartSieve::with_chart(5);
        let v = PointId::from_index;
        s.set_cone(v(0), [v(1), v(2), v(3), v(4)]).unwrap();
        s.symmetrize_and_stratify().unwrap();
        let interp = crate::algs::interpolate::interpolate(&s, 2, |_| false).unwrap();
        assert_eq!(
            resolve(&interp, 2, v(0), &[v(2), v(3)]).unwrap(),
            FaceOrientation::Forward
        );
    }
}
