//! Assigning the cells around a fault to its negative or positive side.
//!
//! Cells adjacent to a fault face get their side from the face resolver.
//! Every other cell touching a fault vertex inherits the side of a
//! classified neighbour it shares a non-fault face with, by breadth-first
//! propagation through the star of that vertex.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::mesh_error::MeshSieveError;
use crate::topology::point::PointId;

/// Side of the fault a cell lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Keeps the original fault vertices.
    Negative,
    /// Switches to the shadow vertices.
    Positive,
}

impl Side {
    #[inline]
    pub fn replaces(self) -> bool {
        self == Side::Positive
    }

    /// Label value marking a cell of dimension `dim` on this side.
    pub fn label_value(self, dim: usize) -> i32 {
        match self {
            Side::Negative => -(dim as i32),
            Side::Positive => dim as i32,
        }
    }

    /// Inverse of [`Side::label_value`].
    pub fn from_label_value(value: i32, dim: usize) -> Option<Side> {
        match value {
            v if v == dim as i32 => Some(Side::Positive),
            v if v == -(dim as i32) => Some(Side::Negative),
            _ => None,
        }
    }
}

/// Which vertices a [`classify`] run is seeded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    /// Fault-interior vertices: every cell of their star must end up
    /// classified, and never on both sides.
    Interior,
    /// Fault-boundary vertices: first classified neighbour wins, conflicts
    /// are tolerated and leftovers stay unassigned.
    Tip,
}

/// Side assignment for cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellSides {
    sides: BTreeMap<PointId, Side>,
}

impl CellSides {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, cell: PointId) -> Option<Side> {
        self.sides.get(&cell).copied()
    }

    /// Record `side` for `cell`; assigning the opposite side to an already
    /// classified cell is an error.
    pub fn assign(&mut self, cell: PointId, side: Side) -> Result<(), MeshSieveError> {
        match self.sides.insert(cell, side) {
            Some(prev) if prev != side => Err(MeshSieveError::ConflictingSides { cell }),
            _ => Ok(()),
        }
    }

    /// Cells on the positive side, ascending.
    pub fn replace_cells(&self) -> BTreeSet<PointId> {
        self.sides
            .iter()
            .filter_map(|(&c, s)| s.replaces().then_some(c))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PointId, Side)> + '_ {
        self.sides.iter().map(|(&c, &s)| (c, s))
    }

    pub fn len(&self) -> usize {
        self.sides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }
}

/// Cell/vertex incidence in cell→vertex form, with the fault faces that
/// must not be crossed.
#[derive(Clone, Debug)]
pub struct CellAdjacency {
    /// Sorted vertex set of every cell, indexed by cell id.
    cells: Vec<Vec<PointId>>,
    star: BTreeMap<PointId, Vec<PointId>>,
    fault_faces: BTreeSet<Vec<PointId>>,
    face_size: usize,
}

impl CellAdjacency {
    /// `cell_vertices[c]` lists the vertices of cell `c`; cells for which
    /// `skip` is true (cohesive cells) never take part in propagation.
    pub fn new<F>(
        cell_vertices: &[Vec<PointId>],
        skip: F,
        fault_faces: impl IntoIterator<Item = Vec<PointId>>,
        face_size: usize,
    ) -> Self
    where
        F: Fn(PointId) -> bool,
    {
        let mut star: BTreeMap<PointId, Vec<PointId>> = BTreeMap::new();
        let cells = cell_vertices
            .iter()
            .enumerate()
            .map(|(i, verts)| {
                let c = PointId::from_index(i);
                let mut sorted = verts.clone();
                sorted.sort_unstable();
                sorted.dedup();
                if !skip(c) {
                    for &v in &sorted {
                        star.entry(v).or_default().push(c);
                    }
                }
                sorted
            })
            .collect();
        let fault_faces = fault_faces
            .into_iter()
            .map(|mut f| {
                f.sort_unstable();
                f
            })
            .collect();
        Self {
            cells,
            star,
            fault_faces,
            face_size,
        }
    }

    /// Non-cohesive cells containing `v`, ascending.
    pub fn star(&self, v: PointId) -> &[PointId] {
        self.star.get(&v).map_or(&[], Vec::as_slice)
    }

    /// True when `a` and `b` share a face that is not a fault face.
    pub fn shares_open_face(&self, a: PointId, b: PointId) -> bool {
        if a == b {
            return false;
        }
        let (Some(va), Some(vb)) = (self.cells.get(a.index()), self.cells.get(b.index())) else {
            return false;
        };
        let shared: Vec<PointId> = va.iter().copied().filter(|v| vb.binary_search(v).is_ok()).collect();
        shared.len() == self.face_size && !self.fault_faces.contains(&shared)
    }
}

/// Propagate sides from already classified cells through the stars of
/// `seeds`.
pub fn classify(
    adjacency: &CellAdjacency,
    seeds: &[PointId],
    pass: Pass,
    sides: &mut CellSides,
) -> Result<(), MeshSieveError> {
    for &vertex in seeds {
        let star = adjacency.star(vertex);
        match pass {
            Pass::Interior => classify_interior(adjacency, vertex, star, sides)?,
            Pass::Tip => classify_tip(adjacency, vertex, star, sides),
        }
    }
    Ok(())
}

fn classify_interior(
    adjacency: &CellAdjacency,
    vertex: PointId,
    star: &[PointId],
    sides: &mut CellSides,
) -> Result<(), MeshSieveError> {
    let mut queue: VecDeque<PointId> = star
        .iter()
        .copied()
        .filter(|&c| sides.get(c).is_some())
        .collect();
    while let Some(a) = queue.pop_front() {
        let Some(side) = sides.get(a) else { continue };
        for &b in star {
            if !adjacency.shares_open_face(a, b) {
                continue;
            }
            match sides.get(b) {
                None => {
                    log::debug!("vertex {vertex}: cell {b} joins {side:?} side via cell {a}");
                    sides.assign(b, side)?;
                    queue.push_back(b);
                }
                Some(other) if other != side => {
                    return Err(MeshSieveError::ConflictingSides { cell: b });
                }
                Some(_) => {}
            }
        }
    }
    if let Some(&cell) = star.iter().find(|&&c| sides.get(c).is_none()) {
        return Err(MeshSieveError::UnclassifiedCell { cell, vertex });
    }
    Ok(())
}

fn classify_tip(adjacency: &CellAdjacency, vertex: PointId, star: &[PointId], sides: &mut CellSides) {
    loop {
        let mut changed = false;
        for &b in star {
            if sides.get(b).is_some() {
                continue;
            }
            let mut neighbour_sides = star
                .iter()
                .filter(|&&a| adjacency.shares_open_face(a, b))
                .filter_map(|&a| sides.get(a));
            let Some(first) = neighbour_sides.next() else {
                continue;
            };
            if neighbour_sides.any(|s| s != first) {
                log::warn!("tip vertex {vertex}: cell {b} borders both sides, keeping {first:?}");
            }
            log::debug!("tip vertex {vertex}: cell {b} joins {first:?} side");
            // an unassigned cell cannot conflict
            let _ = sides.assign(b, first);
            changed = true;
        }
        if !changed {
            break;
        }
    }
}
