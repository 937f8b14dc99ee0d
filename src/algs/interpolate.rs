//! Construct intermediate entities (edges/faces) from cell→vertex meshes,
//! and recover cell vertex lists from interpolated ones.
//!
//! # Expected cell types
//! Cells reference their vertices in the orderings documented in
//! [`crate::topology::cell_type`]. Interpolation turns them into
//! `cell → face → edge → vertex` (3-D) or `cell → edge → vertex` (2-D)
//! connectivity:
//!
//! - New points are appended after the existing chart, faces before edges,
//!   each block in order of first appearance (ascending cell, then local
//!   face/edge index). Cell and vertex ids are left untouched.
//! - The first cell to produce a face fixes the face's stored vertex cycle.
//!   Every arrow carries the [`ConeOrientation`] mapping the stored cycle to
//!   the order the parent sees.
//!
//! [`cell_vertices`] inverts the process for a single point.
//!
//! # Example
//! ```rust
//! # fn try_main() -> Result<(), mesh_sieve_faults::mesh_error::MeshSieveError> {
//! use mesh_sieve_faults::algs::interpolate::{cell_vertices, interpolate};
//! use mesh_sieve_faults::topology::point::PointId;
//! use mesh_sieve_faults::topology::sieve::ChartSieve;
//!
//! let v = PointId::from_index;
//! let mut sieve = ChartSieve::with_chart(5);
//! sieve.set_cone(v(0), [v(1), v(2), v(3), v(4)])?;
//! sieve.symmetrize_and_stratify()?;
//!
//! let interp = interpolate(&sieve, 2, |_| false)?;
//! assert_eq!(interp.chart_size(), 9);
//! assert_eq!(cell_vertices(&interp, v(0))?, vec![v(1), v(2), v(3), v(4)]);
//! # Ok(())
//! # }
//! # try_main().unwrap();
//! ```

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::mesh_error::MeshSieveError;
use crate::topology::cell_type::CellType;
use crate::topology::orientation::ConeOrientation;
use crate::topology::point::PointId;
use crate::topology::sieve::ChartSieve;

/// Deduplicates entities by vertex set, remembering the first-seen cycle.
#[derive(Debug, Default)]
struct EntityTable {
    index: BTreeMap<Vec<PointId>, usize>,
    stored: Vec<Vec<PointId>>,
}

impl EntityTable {
    /// Index of the entity with the vertex set of `seen`, creating it with
    /// `seen` as its stored cycle if needed.
    fn intern(&mut self, seen: &[PointId]) -> usize {
        let mut key = seen.to_vec();
        key.sort_unstable();
        *self.index.entry(key).or_insert_with(|| {
            self.stored.push(seen.to_vec());
            self.stored.len() - 1
        })
    }

    fn len(&self) -> usize {
        self.stored.len()
    }
}

fn orientation(
    parent: PointId,
    stored: &[PointId],
    seen: &[PointId],
    dimension: usize,
) -> Result<ConeOrientation, MeshSieveError> {
    ConeOrientation::between(stored, seen).ok_or(MeshSieveError::UnsupportedCell {
        point: parent,
        cone_size: seen.len(),
        dimension,
    })
}

/// Interpolate every cell→vertex cell of `sieve` for which `skip` is false.
///
/// `sieve` must be stratified. A sieve that is already interpolated (depth
/// equal to `dim`), or whose cells are segments, is returned unchanged.
/// Skipped cells keep their vertex cones.
pub fn interpolate<F>(sieve: &ChartSieve, dim: usize, skip: F) -> Result<ChartSieve, MeshSieveError>
where
    F: Fn(PointId) -> bool,
{
    let strata = sieve.strata()?;
    if dim <= 1 || strata.diameter as usize >= dim || strata.diameter == 0 {
        return Ok(sieve.clone());
    }

    let n = sieve.chart_size();
    let mut faces = EntityTable::default();
    let mut cell_faces: Vec<(PointId, Vec<(usize, Vec<PointId>)>)> = Vec::new();
    for &cell in sieve.height_stratum(0)? {
        if skip(cell) || strata.depth[cell.index()] != 1 {
            continue;
        }
        let verts = sieve.cone_points(cell);
        let ct = CellType::from_vertex_count(dim, verts.len()).ok_or(
            MeshSieveError::UnsupportedCell {
                point: cell,
                cone_size: verts.len(),
                dimension: dim,
            },
        )?;
        let seen_faces = ct
            .faces()
            .iter()
            .map(|local| {
                let seen: Vec<PointId> = local.iter().map(|&i| verts[i]).collect();
                (faces.intern(&seen), seen)
            })
            .collect();
        cell_faces.push((cell, seen_faces));
    }

    // faces of 3-D cells are polygons that need their own edges
    let mut edges = EntityTable::default();
    let mut face_edges: Vec<Vec<(usize, Vec<PointId>)>> = Vec::new();
    if dim == 3 {
        for stored in &faces.stored {
            let seen_edges = stored
                .iter()
                .copied()
                .circular_tuple_windows::<(_, _)>()
                .map(|(a, b)| {
                    let seen = vec![a, b];
                    (edges.intern(&seen), seen)
                })
                .collect();
            face_edges.push(seen_edges);
        }
    }

    let face_id = |i: usize| PointId::from_index(n + i);
    let edge_id = |j: usize| PointId::from_index(n + faces.len() + j);

    let mut out = ChartSieve::with_chart(n + faces.len() + edges.len());
    for p in sieve.points() {
        if sieve.cone_size(p) > 0 {
            out.set_cone_oriented(p, sieve.cone_oriented(p).to_vec())?;
        }
    }
    for (cell, seen_faces) in &cell_faces {
        let cone = seen_faces
            .iter()
            .map(|(i, seen)| Ok((face_id(*i), orientation(*cell, &faces.stored[*i], seen, dim)?)))
            .collect::<Result<Vec<_>, MeshSieveError>>()?;
        out.set_cone_oriented(*cell, cone)?;
    }
    for (i, stored) in faces.stored.iter().enumerate() {
        let f = face_id(i);
        if dim == 2 {
            out.set_cone(f, stored.iter().copied())?;
        } else {
            let cone = face_edges[i]
                .iter()
                .map(|(j, seen)| Ok((edge_id(*j), orientation(f, &edges.stored[*j], seen, dim - 1)?)))
                .collect::<Result<Vec<_>, MeshSieveError>>()?;
            out.set_cone_oriented(f, cone)?;
        }
    }
    for (j, stored) in edges.stored.iter().enumerate() {
        out.set_cone(edge_id(j), stored.iter().copied())?;
    }
    out.symmetrize_and_stratify()?;
    log::debug!(
        "interpolated {} cells: {} faces, {} edges appended after {n} points",
        cell_faces.len(),
        faces.len(),
        edges.len()
    );
    Ok(out)
}

/// Vertex cycle of a depth-2 point, from the first vertex of each
/// oriented edge.
fn polygon_cycle(sieve: &ChartSieve, p: PointId) -> Result<Vec<PointId>, MeshSieveError> {
    sieve
        .cone_oriented(p)
        .iter()
        .map(|&(e, o)| {
            o.apply(&sieve.cone_points(e))
                .first()
                .copied()
                .ok_or_else(|| MeshSieveError::MissingPointInCone(format!("edge {e} of {p}")))
        })
        .collect()
}

/// Vertices of a depth-3 point in reference order, reassembled from its
/// oriented faces.
fn polyhedron_vertices(sieve: &ChartSieve, p: PointId) -> Result<Vec<PointId>, MeshSieveError> {
    let cone = sieve.cone_oriented(p);
    let unsupported = MeshSieveError::UnsupportedCell {
        point: p,
        cone_size: cone.len(),
        dimension: 3,
    };
    let ct = CellType::from_face_count(3, cone.len()).ok_or_else(|| unsupported.clone())?;
    let mut local: Vec<Option<PointId>> = vec![None; ct.num_corners()];
    for (&(f, o), table) in cone.iter().zip(ct.faces()) {
        let seen = o.apply(&polygon_cycle(sieve, f)?);
        if seen.len() != table.len() {
            return Err(unsupported);
        }
        for (&slot, v) in table.iter().zip(seen) {
            match local[slot] {
                Some(prev) if prev != v => {
                    return Err(MeshSieveError::UnsupportedLayout(format!(
                        "faces of cell {p} disagree on its vertex {slot}"
                    )));
                }
                _ => local[slot] = Some(v),
            }
        }
    }
    local.into_iter().collect::<Option<Vec<_>>>().ok_or(unsupported)
}

/// Vertices of `p` in reference order, whatever the interpolation state.
///
/// Vertex cones are returned as stored; interpolated polygons and polyhedra
/// are walked through their oriented faces and edges.
pub fn cell_vertices(sieve: &ChartSieve, p: PointId) -> Result<Vec<PointId>, MeshSieveError> {
    let strata = sieve.strata()?;
    let depth = *strata
        .depth
        .get(p.index())
        .ok_or(MeshSieveError::PointOutOfChart {
            point: p,
            chart_size: sieve.chart_size(),
        })?;
    match depth {
        0 => Ok(vec![p]),
        1 => Ok(sieve.cone_points(p)),
        2 => polygon_cycle(sieve, p),
        3 => polyhedron_vertices(sieve, p),
        _ => Err(MeshSieveError::UnsupportedCell {
            point: p,
            cone_size: sieve.cone_size(p),
            dimension: depth as usize,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(i: usize) -> PointId {
        PointId::from_index(i)
    }

    fn cell_vertex(cells: &[&[usize]], nv: usize) -> ChartSieve {
        let nc = cells.len();
        let mut s = ChartSieve::with_chart(nc + nv);
        for (c, cone) in cells.iter().enumerate() {
            s.set_cone(pid(c), cone.iter().map(|&v| pid(nc + v))).unwrap();
        }
        s.symmetrize_and_stratify().unwrap();
        s
    }

    fn assert_roundtrip(s: &ChartSieve, interp: &ChartSieve, ncells: usize) {
        for c in 0..ncells {
            assert_eq!(
                cell_vertices(interp, pid(c)).unwrap(),
                s.cone_points(pid(c)),
                "cell {c}"
            );
        }
    }

    #[test]
    fn two_hexes_share_one_face() {
        let s = cell_vertex(
            &[&[0, 1, 2, 3, 4, 5, 6, 7], &[4, 5, 6, 7, 8, 9, 10, 11]],
            12,
        );
        let interp = interpolate(&s, 3, |_| false).unwrap();
        // 11 faces, 20 edges
        assert_eq!(interp.chart_size(), 14 + 11 + 20);
        assert_eq!(interp.max_depth().unwrap(), 3);
        assert_eq!(interp.height_stratum(1).unwrap().len(), 11);
        assert_roundtrip(&s, &interp, 2);
    }

    #[test]
    fn shared_face_is_seen_reflected() {
        let s = cell_vertex(
            &[&[0, 1, 2, 3, 4, 5, 6, 7], &[4, 5, 6, 7, 8, 9, 10, 11]],
            12,
        );
        let interp = interpolate(&s, 3, |_| false).unwrap();
        let shared: Vec<_> = interp
            .cone(pid(0))
            .filter(|f| interp.cone(pid(1)).any(|g| g == *f))
            .collect();
        assert_eq!(shared.len(), 1);
        let o0 = interp.cone_oriented(pid(0))[1].1;
        let o1 = interp.cone_oriented(pid(1))[0].1;
        assert_eq!(o0, ConeOrientation::IDENTITY);
        assert!(o1.is_reflection());
    }

    #[test]
    fn tets_roundtrip() {
        let s = cell_vertex(&[&[0, 1, 2, 3], &[1, 2, 3, 4]], 5);
        let interp = interpolate(&s, 3, |_| false).unwrap();
        // 7 faces, 9 edges
        assert_eq!(interp.chart_size(), 7 + 7 + 9);
        assert_roundtrip(&s, &interp, 2);
    }

    #[test]
    fn triangles_and_quads_roundtrip() {
        let tris = cell_vertex(&[&[0, 1, 2], &[2, 1, 3]], 4);
        let interp = interpolate(&tris, 2, |_| false).unwrap();
        assert_eq!(interp.chart_size(), 6 + 5);
        assert_roundtrip(&tris, &interp, 2);

        let quads = cell_vertex(&[&[0, 1, 4, 3], &[1, 2, 5, 4]], 6);
        let interp = interpolate(&quads, 2, |_| false).unwrap();
        assert_eq!(interp.chart_size(), 8 + 7);
        assert_roundtrip(&quads, &interp, 2);
    }

    #[test]
    fn skipped_cells_keep_vertex_cones() {
        let s = cell_vertex(&[&[0, 1, 4, 3], &[1, 2, 5, 4]], 6);
        let interp = interpolate(&s, 2, |p| p == pid(1)).unwrap();
        assert_eq!(interp.cone_points(pid(1)), s.cone_points(pid(1)));
        assert_eq!(interp.chart_size(), 8 + 4);
    }

    #[test]
    fn already_interpolated_is_unchanged() {
        let s = cell_vertex(&[&[0, 1, 2]], 3);
        let once = interpolate(&s, 2, |_| false).unwrap();
        let twice = interpolate(&once, 2, |_| false).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_shape_is_rejected() {
        let s = cell_vertex(&[&[0, 1, 2, 3, 4]], 5);
        assert!(matches!(
            interpolate(&s, 2, |_| false),
            Err(MeshSieveError::UnsupportedCell { cone_size: 5, .. })
        ));
    }
}
