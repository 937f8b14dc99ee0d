//! Fault submesh extraction.
//!
//! [`create_fault`] turns the points marked by a label into a fault
//! surface: a mesh one dimension lower than its parent, with chart
//! `[faces][vertices][edges]` and a subpoint map back into the parent. The
//! buried part of the surface's own boundary (its tips) is extracted as a
//! second submesh whose subpoint map points into the fault submesh.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::algs::communicator::{Communicator, all_reduce_max};
use crate::algs::interpolate::{cell_vertices, interpolate};
use crate::data::coordinates::Coordinates;
use crate::mesh_error::MeshSieveError;
use crate::topology::cell_type::CellType;
use crate::topology::labels::LabelSet;
use crate::topology::mesh::Mesh;
use crate::topology::point::PointId;
use crate::topology::sieve::ChartSieve;

/// Bidirectional mapping between parent and submesh point IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmeshMaps {
    pub parent_to_sub: BTreeMap<PointId, PointId>,
    /// Indexed by submesh point. `None` only for edges of a fault rebuilt
    /// from the cohesive cells of a cell→vertex mesh, which has no edges.
    pub sub_to_parent: Vec<Option<PointId>>,
}

impl SubmeshMaps {
    fn push(&mut self, parent: Option<PointId>) -> PointId {
        let sub = PointId::from_index(self.sub_to_parent.len());
        if let Some(p) = parent {
            self.parent_to_sub.insert(p, sub);
        }
        self.sub_to_parent.push(parent);
        sub
    }

    #[inline]
    pub fn parent(&self, sub: PointId) -> Option<PointId> {
        self.sub_to_parent.get(sub.index()).copied().flatten()
    }

    #[inline]
    pub fn sub(&self, parent: PointId) -> Option<PointId> {
        self.parent_to_sub.get(&parent).copied()
    }
}

/// How fault extraction reaches an interpolated topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultPath {
    /// The mesh already stores faces and edges.
    Interpolated,
    /// The mesh is cell→vertex; a scratch copy is interpolated first.
    NeedsInterpolation,
}

impl FaultPath {
    /// Collective probe: every rank must call it.
    ///
    /// The maximum local depth over all ranks decides; partitions without
    /// cells therefore follow the others.
    pub fn probe<C: Communicator>(mesh: &Mesh<C>) -> Result<Self, MeshSieveError> {
        let local = u64::from(mesh.depth()?);
        let depth = all_reduce_max(mesh.comm(), local)?;
        let path = if depth == mesh.dimension() as u64 {
            FaultPath::Interpolated
        } else {
            FaultPath::NeedsInterpolation
        };
        log::debug!("rank {}: depth {local} (global {depth}) -> {path:?}", mesh.comm().rank());
        Ok(path)
    }
}

/// A fault surface extracted from a volumetric mesh.
#[derive(Clone, Debug)]
pub struct FaultSubmesh {
    /// Name of the label the fault was selected with.
    pub group: String,
    /// Topology `[faces][vertices][edges]`, coordinates and the
    /// `fault_<group>` label. Dimension is one less than the parent's.
    pub mesh: Mesh,
    /// Faces and edges map to the (possibly scratch-interpolated) parent
    /// topology, vertices to parent vertices.
    pub maps: SubmeshMaps,
    pub num_faces: usize,
    pub num_vertices: usize,
    /// The two parent cells adjacent to each face, ascending.
    pub face_cells: Vec<[PointId; 2]>,
}

impl FaultSubmesh {
    /// Name of the label tagging every fault point.
    pub fn label_name(&self) -> String {
        fault_label(&self.group)
    }

    pub fn faces(&self) -> impl Iterator<Item = PointId> + use<> {
        (0..self.num_faces).map(PointId::from_index)
    }

    pub fn vertices(&self) -> impl Iterator<Item = PointId> + use<> {
        (self.num_faces..self.num_faces + self.num_vertices).map(PointId::from_index)
    }

    #[inline]
    pub fn is_vertex(&self, p: PointId) -> bool {
        (self.num_faces..self.num_faces + self.num_vertices).contains(&p.index())
    }

    #[inline]
    pub fn parent(&self, p: PointId) -> Option<PointId> {
        self.maps.parent(p)
    }

    /// Vertices of fault face `f` in its oriented order, as fault ids.
    pub fn face_vertices(&self, f: PointId) -> Result<Vec<PointId>, MeshSieveError> {
        cell_vertices(self.mesh.topology(), f)
    }

    /// Vertices of fault face `f` in its oriented order, as parent ids.
    pub fn parent_face_vertices(&self, f: PointId) -> Result<Vec<PointId>, MeshSieveError> {
        self.face_vertices(f)?
            .into_iter()
            .map(|v| {
                self.parent(v)
                    .ok_or_else(|| MeshSieveError::MissingPointInCone(format!("fault vertex {v}")))
            })
            .collect()
    }
}

/// The buried boundary (tips) of a fault surface.
#[derive(Clone, Debug)]
pub struct FaultBoundary {
    /// Ridges and their vertices, dimension two less than the parent's.
    pub mesh: Mesh,
    /// Subpoint map into the fault submesh.
    pub maps: SubmeshMaps,
}

impl FaultBoundary {
    /// A boundary holding only the given fault vertices.
    pub fn from_fault_vertices(
        fault: &FaultSubmesh,
        vertices: &[PointId],
    ) -> Result<Self, MeshSieveError> {
        let set: BTreeSet<PointId> = vertices.iter().copied().collect();
        build_boundary(fault, &[], &set)
    }

    /// Fault vertices on the boundary, as fault submesh ids, ascending.
    pub fn fault_vertices(&self) -> Result<Vec<PointId>, MeshSieveError> {
        let mut out: Vec<PointId> = self
            .mesh
            .topology()
            .depth_stratum(0)?
            .iter()
            .filter_map(|&p| self.maps.parent(p))
            .collect();
        out.sort_unstable();
        Ok(out)
    }

    pub fn is_empty(&self) -> bool {
        self.mesh.topology().chart_size() == 0
    }
}

pub(crate) fn fault_label(group: &str) -> String {
    format!("fault_{group}")
}

/// One face of a fault under construction, in parent terms.
pub(crate) struct FaceSeed {
    pub parent: PointId,
    pub cycle: Vec<PointId>,
    pub cells: [PointId; 2],
}

/// Lay out `[faces][vertices]`, interpolate edges and attach coordinates.
pub(crate) fn assemble_fault<F>(
    group: &str,
    dim: usize,
    parent_coords: &Coordinates<f64>,
    seeds: &[FaceSeed],
    edge_parent: F,
) -> Result<FaultSubmesh, MeshSieveError>
where
    F: Fn(PointId, PointId) -> Option<PointId>,
{
    let verts: BTreeSet<PointId> = seeds.iter().flat_map(|s| s.cycle.iter().copied()).collect();
    let (nf, nv) = (seeds.len(), verts.len());

    let mut maps = SubmeshMaps::default();
    for s in seeds {
        maps.push(Some(s.parent));
    }
    let mut vertex_sub = BTreeMap::new();
    for &v in &verts {
        vertex_sub.insert(v, maps.push(Some(v)));
    }

    let mut sieve = ChartSieve::with_chart(nf + nv);
    for (i, s) in seeds.iter().enumerate() {
        sieve.set_cone(PointId::from_index(i), s.cycle.iter().map(|v| vertex_sub[v]))?;
    }
    sieve.symmetrize_and_stratify()?;
    let topology = interpolate(&sieve, dim - 1, |_| false)?;
    for e in nf + nv..topology.chart_size() {
        let cone = topology.cone_points(PointId::from_index(e));
        let ends = match cone[..] {
            [a, b] => maps.parent(a).zip(maps.parent(b)),
            _ => None,
        };
        maps.push(ends.and_then(|(a, b)| edge_parent(a, b)));
    }

    let mut coords = Coordinates::try_new(parent_coords.dimension())?;
    for (&v, &sub) in &vertex_sub {
        coords.try_add_point(sub, parent_coords.try_restrict(v)?)?;
    }

    let name = fault_label(group);
    let mut labels = LabelSet::new();
    for p in topology.points() {
        labels.set_label(p, &name, 1);
    }
    let mesh = Mesh::from_parts(dim - 1, topology, labels, coords)?;

    Ok(FaultSubmesh {
        group: group.to_string(),
        mesh,
        maps,
        num_faces: nf,
        num_vertices: nv,
        face_cells: seeds.iter().map(|s| s.cells).collect(),
    })
}

/// Boundary submesh from fault ridges (edges, 3-D only) and extra vertices.
fn build_boundary(
    fault: &FaultSubmesh,
    ridges: &[PointId],
    extra_vertices: &BTreeSet<PointId>,
) -> Result<FaultBoundary, MeshSieveError> {
    let topo = fault.mesh.topology();
    let mut verts = extra_vertices.clone();
    for &r in ridges {
        verts.extend(topo.cone(r));
    }
    let mut maps = SubmeshMaps::default();
    for &r in ridges {
        maps.push(Some(r));
    }
    for &v in &verts {
        maps.push(Some(v));
    }
    let mut sieve = ChartSieve::with_chart(ridges.len() + verts.len());
    for (i, &r) in ridges.iter().enumerate() {
        let cone = topo
            .cone(r)
            .map(|v| maps.sub(v).ok_or(MeshSieveError::MissingPointInCone(format!("{v}"))))
            .collect::<Result<Vec<_>, _>>()?;
        sieve.set_cone(PointId::from_index(i), cone)?;
    }
    let fcoords = fault.mesh.coordinates();
    let mut coords = Coordinates::try_new(fcoords.dimension())?;
    for &v in &verts {
        if let Some(sub) = maps.sub(v) {
            coords.try_add_point(sub, fcoords.try_restrict(v)?)?;
        }
    }
    let dim = fault.mesh.dimension().saturating_sub(1);
    let mesh = Mesh::from_parts(dim, sieve, LabelSet::new(), coords)?;
    Ok(FaultBoundary { mesh, maps })
}

fn ridges_of(cycle: &[PointId], face_dim: usize) -> Vec<Vec<PointId>> {
    if face_dim == 1 {
        cycle.iter().map(|&v| vec![v]).collect()
    } else {
        (0..cycle.len())
            .map(|i| {
                let (a, b) = (cycle[i], cycle[(i + 1) % cycle.len()]);
                vec![a.min(b), a.max(b)]
            })
            .collect()
    }
}

/// +1 when `cycle` runs along `ridge` (or starts at a ridge vertex), -1
/// otherwise. Faces agreeing in orientation give opposite signs.
fn ridge_sign(cycle: &[PointId], ridge: &[PointId]) -> i8 {
    match ridge {
        [v] => {
            if cycle.first() == Some(v) {
                1
            } else {
                -1
            }
        }
        [a, b] => {
            let n = cycle.len();
            let forward = (0..n).any(|i| cycle[i] == *a && cycle[(i + 1) % n] == *b);
            if forward { 1 } else { -1 }
        }
        _ => 0,
    }
}

/// Flip fault face cycles until every pair of faces sharing a ridge runs
/// through it in opposite directions.
fn orient_faces(
    faces: &[PointId],
    cycles: &mut [Vec<PointId>],
    face_dim: usize,
) -> Result<(), MeshSieveError> {
    let mut by_ridge: BTreeMap<Vec<PointId>, Vec<usize>> = BTreeMap::new();
    for (i, c) in cycles.iter().enumerate() {
        for r in ridges_of(c, face_dim) {
            by_ridge.entry(r).or_default().push(i);
        }
    }
    let mut neighbours: Vec<Vec<(usize, Vec<PointId>)>> = vec![Vec::new(); cycles.len()];
    for (ridge, fs) in &by_ridge {
        match fs[..] {
            [_] => {}
            [a, b] => {
                neighbours[a].push((b, ridge.clone()));
                neighbours[b].push((a, ridge.clone()));
            }
            _ => {
                return Err(MeshSieveError::NonManifoldFault {
                    ridge: ridge.clone(),
                    faces: fs.len(),
                });
            }
        }
    }

    let mut done = vec![false; cycles.len()];
    for start in 0..cycles.len() {
        if done[start] {
            continue;
        }
        done[start] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(a) = queue.pop_front() {
            for (b, ridge) in &neighbours[a] {
                let sa = ridge_sign(&cycles[a], ridge);
                let agree = ridge_sign(&cycles[*b], ridge) != sa;
                if done[*b] {
                    if !agree {
                        return Err(MeshSieveError::NonOrientableFault { face: faces[*b] });
                    }
                    continue;
                }
                if !agree {
                    cycles[*b].reverse();
                    log::debug!("flipped fault face {}", faces[*b]);
                }
                done[*b] = true;
                queue.push_back(*b);
            }
        }
    }
    Ok(())
}

/// Extract the fault marked by stratum 1 of label `group`.
///
/// Collective: probes the construction path across ranks first.
pub fn create_fault<C: Communicator>(
    mesh: &Mesh<C>,
    group: &str,
) -> Result<(FaultSubmesh, FaultBoundary), MeshSieveError> {
    let path = FaultPath::probe(mesh)?;
    create_fault_on_path(mesh, group, path)
}

/// [`create_fault`] with an already probed path.
pub fn create_fault_on_path<C: Communicator>(
    mesh: &Mesh<C>,
    group: &str,
    path: FaultPath,
) -> Result<(FaultSubmesh, FaultBoundary), MeshSieveError> {
    let dim = mesh.dimension();
    if dim < 2 {
        return Err(MeshSieveError::UnsupportedCell {
            point: PointId::new(0),
            cone_size: mesh.topology().cone_size(PointId::new(0)),
            dimension: dim,
        });
    }
    let work: Cow<'_, ChartSieve> = match path {
        FaultPath::Interpolated => Cow::Borrowed(mesh.topology()),
        FaultPath::NeedsInterpolation => Cow::Owned(interpolate(mesh.topology(), dim, |p| {
            mesh.is_cohesive(p)
        })?),
    };
    let strata = work.strata()?;

    let marked: Vec<PointId> = mesh
        .labels()
        .stratum_points(group, 1)
        .into_iter()
        .filter(|p| work.contains(*p))
        .collect();
    let mut faces: Vec<PointId> = marked
        .iter()
        .copied()
        .filter(|p| strata.height[p.index()] == 1 && strata.depth[p.index()] > 0)
        .collect();
    if faces.is_empty() {
        let marked_vertices: BTreeSet<PointId> = marked
            .iter()
            .copied()
            .filter(|p| strata.depth[p.index()] == 0)
            .collect();
        faces = work
            .height_stratum(1)?
            .iter()
            .copied()
            .filter(|&f| strata.depth[f.index()] > 0)
            .filter(|&f| {
                work.closure_vertices(f)
                    .is_ok_and(|vs| vs.iter().all(|v| marked_vertices.contains(v)))
            })
            .collect();
    }
    if faces.is_empty() {
        return Err(MeshSieveError::EmptyFault {
            label: group.to_string(),
        });
    }

    let mut seeds = Vec::with_capacity(faces.len());
    for &f in &faces {
        let cells: Vec<PointId> = work
            .support(f)
            .iter()
            .copied()
            .filter(|c| !mesh.is_cohesive(*c))
            .collect();
        let [c0, c1] = cells[..] else {
            return Err(MeshSieveError::NonManifoldFace {
                face: f,
                cells: cells.len(),
            });
        };
        let verts = work.closure_vertices(f)?;
        let cv = cell_vertices(&work, c0)?;
        let ct = CellType::from_vertex_count(dim, cv.len()).ok_or(MeshSieveError::UnsupportedCell {
            point: c0,
            cone_size: cv.len(),
            dimension: dim,
        })?;
        let cycle = ct
            .oriented_face(&cv, &verts, verts[0])
            .ok_or_else(|| MeshSieveError::OrientationMismatch {
                face: verts.clone(),
                cell: c0,
            })?;
        log::debug!("fault face {f}: cells ({c0}, {c1}), vertices {cycle:?}");
        seeds.push(FaceSeed {
            parent: f,
            cycle,
            cells: [c0, c1],
        });
    }

    let mut cycles: Vec<Vec<PointId>> = seeds.iter().map(|s| s.cycle.clone()).collect();
    orient_faces(&faces, &mut cycles, dim - 1)?;
    for (s, c) in seeds.iter_mut().zip(cycles) {
        s.cycle = c;
    }

    let fault = assemble_fault(group, dim, mesh.coordinates(), &seeds, |a, b| {
        work.support(a)
            .iter()
            .copied()
            .find(|e| strata.depth[e.index()] == 1 && work.support(b).contains(e))
    })?;

    // ridges on the closure of an external face are not tips
    let mut exterior = BTreeSet::new();
    for &f in work.height_stratum(1)? {
        if strata.depth[f.index()] > 0
            && work.support(f).iter().filter(|c| !mesh.is_cohesive(**c)).count() == 1
        {
            exterior.extend(work.closure([f]));
        }
    }
    let ftopo = fault.mesh.topology();
    let ridge_depth = if dim == 3 { 1 } else { 0 };
    let tips: Vec<PointId> = ftopo
        .depth_stratum(ridge_depth)?
        .iter()
        .copied()
        .filter(|&r| ftopo.support(r).len() == 1)
        .filter(|&r| fault.parent(r).is_some_and(|p| !exterior.contains(&p)))
        .collect();
    let boundary = if dim == 3 {
        build_boundary(&fault, &tips, &BTreeSet::new())?
    } else {
        build_boundary(&fault, &[], &tips.iter().copied().collect())?
    };

    log::info!(
        "extracted fault `{group}`: {} faces, {} vertices, {} buried boundary ridges ({path:?})",
        fault.num_faces,
        fault.num_vertices,
        tips.len()
    );
    Ok((fault, boundary))
}
