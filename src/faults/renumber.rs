//! Point renumbering for a split: vertex shift, duplicate-vertex maps, and
//! the labels and coordinates carried over to the new chart.
//!
//! Labels on faces and edges cannot follow the shift directly, since the
//! split chart is rebuilt from cells and vertices. [`carry_entity_labels`]
//! finds them again by vertex set once the split mesh is re-interpolated.

use std::collections::BTreeMap;

use crate::data::coordinates::Coordinates;
use crate::mesh_error::MeshSieveError;
use crate::topology::labels::{DEPTH_LABEL, LabelSet, MATERIAL_LABEL};
use crate::topology::mesh::ChartLayout;
use crate::topology::point::PointId;
use crate::topology::sieve::ChartSieve;

/// Renumbering produced by one fault insertion.
///
/// `shadow` and `lagrange` are keyed by the original (unshifted) vertex id;
/// `cohesive` is keyed by the fault face id in the fault submesh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenumberMap {
    pub shadow: BTreeMap<PointId, PointId>,
    pub lagrange: BTreeMap<PointId, PointId>,
    pub cohesive: BTreeMap<PointId, PointId>,
}

/// Old chart → new chart: cells stay, vertices move up by the number of
/// inserted cohesive cells, everything after the vertices is dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexShift {
    layout: ChartLayout,
    by: u64,
}

impl VertexShift {
    pub fn new(layout: ChartLayout, by: u64) -> Self {
        Self { layout, by }
    }

    pub fn apply(&self, p: PointId) -> Option<PointId> {
        if self.layout.is_cell(p) {
            Some(p)
        } else if self.layout.is_vertex(p) {
            Some(p.shifted(self.by))
        } else {
            None
        }
    }

    /// New id of vertex `v`.
    #[inline]
    pub fn vertex(&self, v: PointId) -> PointId {
        debug_assert!(self.layout.is_vertex(v), "{v} is not a vertex");
        v.shifted(self.by)
    }
}

/// Every label except `"depth"`, moved to the new chart. Face and edge
/// points have no image under `shift` and are left out.
pub fn renumber_labels(labels: &LabelSet, shift: &VertexShift) -> LabelSet {
    let mut out = labels.map_points(|p| shift.apply(p));
    out.remove_label(DEPTH_LABEL);
    out
}

/// Labels of the faces and edges of the interpolated mesh `old`, moved onto
/// the re-interpolated split topology `new`.
///
/// An old entity is looked up once per cell in its star (`is_cell` filters
/// out cohesive cells): its vertices are mapped as that cell's cone was
/// mapped by `cell_vertex(cell, vertex)`, and the new entity spanning the
/// mapped vertices receives every label of the old one except `"depth"`.
/// A face on the fault thus labels both of its copies.
pub fn carry_entity_labels<F, G>(
    old: &ChartSieve,
    old_labels: &LabelSet,
    shift: &VertexShift,
    is_cell: F,
    cell_vertex: G,
    new: &ChartSieve,
    out: &mut LabelSet,
) -> Result<(), MeshSieveError>
where
    F: Fn(PointId) -> bool,
    G: Fn(PointId, PointId) -> PointId,
{
    let strata = new.strata()?;
    let mut by_vertices: BTreeMap<(u32, Vec<PointId>), PointId> = BTreeMap::new();
    for p in new.points() {
        let depth = strata.depth[p.index()];
        if depth > 0 && strata.height[p.index()] > 0 {
            by_vertices.insert((depth, new.closure_vertices(p)?), p);
        }
    }

    let mut copies: BTreeMap<PointId, Vec<PointId>> = BTreeMap::new();
    for (name, p, value) in old_labels.iter() {
        if name == DEPTH_LABEL || shift.apply(p).is_some() {
            continue;
        }
        if !copies.contains_key(&p) {
            let depth = old.depth(p)?;
            let vertices = old.closure_vertices(p)?;
            let mut found = Vec::new();
            for cell in old.star_cells(p)?.into_iter().filter(|&c| is_cell(c)) {
                let mut key: Vec<PointId> =
                    vertices.iter().map(|&v| cell_vertex(cell, v)).collect();
                key.sort_unstable();
                if let Some(&q) = by_vertices.get(&(depth, key)) {
                    found.push(q);
                }
            }
            found.sort_unstable();
            found.dedup();
            if found.is_empty() {
                log::debug!("entity {p} has no counterpart after the split");
            }
            copies.insert(p, found);
        }
        for &q in copies.get(&p).into_iter().flatten() {
            out.set_label(q, name, value);
        }
    }
    Ok(())
}

/// Tag the duplicates of `original`.
///
/// The shadow vertex receives every label of the original except `"depth"`
/// and `"material-id"`; shadow and Lagrange vertex both join stratum 1 of
/// `group`. No value already present in `out` is removed.
pub fn label_duplicates(
    source: &LabelSet,
    out: &mut LabelSet,
    group: &str,
    original: PointId,
    shadow: PointId,
    lagrange: Option<PointId>,
) {
    for (name, value) in source.labels_of(original) {
        if name == DEPTH_LABEL || name == MATERIAL_LABEL {
            continue;
        }
        out.set_label(shadow, name, value);
    }
    out.set_label(shadow, group, 1);
    if let Some(l) = lagrange {
        out.set_label(l, group, 1);
    }
}

/// Coordinates on the new chart: shifted vertices keep theirs, shadow and
/// Lagrange vertices get exact copies of their original's.
pub fn remap_coordinates(
    coords: &Coordinates<f64>,
    shift: &VertexShift,
    renumbering: &RenumberMap,
) -> Result<Coordinates<f64>, MeshSieveError> {
    let mut out = coords.try_map_points(|p| shift.apply(p))?;
    for (&v, &s) in renumbering.shadow.iter().chain(&renumbering.lagrange) {
        out.try_add_point(s, coords.try_restrict(v)?)?;
    }
    Ok(out)
}
