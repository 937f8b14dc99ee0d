//! Cohesive cell construction.
//!
//! A split turns every fault-interior vertex `v` into a pair (`v`, shadow)
//! plus, with constraints, a Lagrange vertex, and every fault face into a
//! zero-thickness cohesive cell with cone
//! `[negative face][shadow face][Lagrange face]`. Cells on the positive
//! side of the fault switch to the shadow vertices. The new chart is
//!
//! ```text
//! [cells][cohesive cells][vertices][shadow][Lagrange]
//! ```
//!
//! [`create`] works from any mesh form, [`create_interpolated`] drives the
//! split through a `"cohesive"` label on an interpolated mesh. Both end in
//! the same construction pass. It builds the cell→vertex split and
//! interpolates it again when the input was interpolated, so faces and edges
//! (with their labels) follow the vertex blocks.

use std::collections::BTreeSet;
use std::ops::Range;

use crate::algs::communicator::Communicator;
use crate::algs::interpolate::{cell_vertices, interpolate};
use crate::algs::submesh::{
    FaceSeed, FaultBoundary, FaultPath, FaultSubmesh, assemble_fault, create_fault_on_path,
};
use crate::faults::classify::{CellAdjacency, CellSides, Pass, Side, classify};
use crate::faults::orient::resolve;
use crate::faults::renumber::{
    RenumberMap, VertexShift, carry_entity_labels, label_duplicates, remap_coordinates,
    renumber_labels,
};
use crate::mesh_error::MeshSieveError;
use crate::topology::cell_type::CellType;
use crate::topology::labels::{COHESIVE_LABEL, LabelSet, MATERIAL_LABEL, complete_label_value};
use crate::topology::mesh::{ChartLayout, Mesh, PointTypeSizes};
use crate::topology::point::PointId;
use crate::topology::sieve::ChartSieve;

/// Scratch label holding the closure of the buried fault boundary.
const TIP_LABEL: &str = "fault-tips";

/// Running totals over the faults inserted into one mesh.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct BuilderContext {
    pub faults_inserted: u32,
    pub cohesive_cells: u64,
    pub shadow_vertices: u64,
    pub lagrange_vertices: u64,
}

/// Outcome of one fault insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CohesiveInsertion {
    /// Counters including this fault.
    pub context: BuilderContext,
    pub renumbering: RenumberMap,
    /// Ids of the new cohesive cells.
    pub cohesive_cells: Range<PointId>,
}

/// One cohesive cell to build.
#[derive(Clone, Debug)]
struct CohesiveFace {
    fault_face: PointId,
    /// Parent vertex ids in fault order, which is the negative cell's order.
    vertices: Vec<PointId>,
    negative: PointId,
    positive: PointId,
}

/// Everything the construction pass needs, in parent ids.
#[derive(Clone, Debug)]
struct SplitPlan {
    /// Vertices to duplicate, ascending.
    interior: Vec<PointId>,
    /// Fault vertices that are never duplicated.
    tips: BTreeSet<PointId>,
    faces: Vec<CohesiveFace>,
    /// Cells switching to shadow vertices.
    replace: BTreeSet<PointId>,
}

/// Cell→vertex view of a mesh of either form.
struct CellVertexView {
    layout: ChartLayout,
    cells: Vec<Vec<PointId>>,
}

impl CellVertexView {
    fn new<C: Communicator>(mesh: &Mesh<C>) -> Result<Self, MeshSieveError> {
        let layout = mesh.layout()?;
        let cells = layout
            .cells
            .clone()
            .map(PointId::from_index)
            .map(|c| {
                if mesh.is_cohesive(c) {
                    Ok(mesh.topology().cone_points(c))
                } else {
                    cell_vertices(mesh.topology(), c)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { layout, cells })
    }
}

fn check_fault_belongs<C: Communicator>(
    mesh: &Mesh<C>,
    view: &CellVertexView,
    fault: &FaultSubmesh,
    boundary: &FaultBoundary,
) {
    assert_eq!(
        fault.mesh.dimension() + 1,
        mesh.dimension(),
        "fault `{}` does not match the mesh dimension",
        fault.group
    );
    for cells in &fault.face_cells {
        for &c in cells {
            assert!(
                view.layout.is_cell(c) && !mesh.is_cohesive(c),
                "fault `{}` references cell {c} outside this mesh",
                fault.group
            );
        }
    }
    for v in fault.vertices() {
        assert!(
            fault.parent(v).is_some_and(|p| view.layout.is_vertex(p)),
            "fault `{}` vertex {v} is not a vertex of this mesh",
            fault.group
        );
    }
    let fault_chart = fault.mesh.topology().chart_size();
    assert!(
        boundary
            .maps
            .sub_to_parent
            .iter()
            .all(|p| p.is_some_and(|p| p.index() < fault_chart)),
        "fault boundary was not extracted from fault `{}`",
        fault.group
    );
}

/// Parent ids of the fault-boundary vertices.
fn tip_vertices(
    fault: &FaultSubmesh,
    boundary: &FaultBoundary,
) -> Result<BTreeSet<PointId>, MeshSieveError> {
    Ok(boundary
        .fault_vertices()?
        .into_iter()
        .filter_map(|v| fault.parent(v))
        .collect())
}

fn interior_vertices(fault: &FaultSubmesh, tips: &BTreeSet<PointId>) -> Vec<PointId> {
    let mut interior: Vec<PointId> = fault
        .vertices()
        .filter_map(|v| fault.parent(v))
        .filter(|v| !tips.contains(v))
        .collect();
    interior.sort_unstable();
    interior
}

/// Resolve which adjacent cell of every fault face is negative.
fn resolve_faces(
    topology: &ChartSieve,
    dim: usize,
    fault: &FaultSubmesh,
) -> Result<Vec<CohesiveFace>, MeshSieveError> {
    fault
        .faces()
        .map(|f| {
            let vertices = fault.parent_face_vertices(f)?;
            let [c0, c1] = fault.face_cells[f.index()];
            let o = resolve(topology, dim, c0, &vertices)?;
            let (negative, positive) =
                o.sides(c0, c1).ok_or_else(|| MeshSieveError::OrientationMismatch {
                    face: vertices.clone(),
                    cell: c0,
                })?;
            log::debug!(
                "fault face {f}: {o:?} on cell {c0}, negative {negative}, positive {positive}"
            );
            Ok(CohesiveFace {
                fault_face: f,
                vertices,
                negative,
                positive,
            })
        })
        .collect()
}

/// Resolver plus both classifier passes.
fn classify_cells<C: Communicator>(
    mesh: &Mesh<C>,
    view: &CellVertexView,
    faces: &[CohesiveFace],
    interior: &[PointId],
    tips: &BTreeSet<PointId>,
) -> Result<CellSides, MeshSieveError> {
    let mut sides = CellSides::new();
    for f in faces {
        sides.assign(f.negative, Side::Negative)?;
        sides.assign(f.positive, Side::Positive)?;
    }
    let face_size = faces.first().map_or(0, |f| f.vertices.len());
    let adjacency = CellAdjacency::new(
        &view.cells,
        |c| mesh.is_cohesive(c),
        faces.iter().map(|f| f.vertices.clone()),
        face_size,
    );
    classify(&adjacency, interior, Pass::Interior, &mut sides)?;
    let tips: Vec<PointId> = tips.iter().copied().collect();
    classify(&adjacency, &tips, Pass::Tip, &mut sides)?;
    Ok(sides)
}

/// Split `mesh` along `fault`, classifying cells directly.
///
/// The mesh may be cell→vertex or interpolated and keeps its form; on an
/// interpolated input every face and edge label lands on the matching new
/// entities. On error the mesh is left untouched.
pub fn create<C: Communicator>(
    mesh: &mut Mesh<C>,
    fault: &FaultSubmesh,
    boundary: &FaultBoundary,
    material: i32,
    constraints: bool,
    context: BuilderContext,
) -> Result<CohesiveInsertion, MeshSieveError> {
    let dim = mesh.dimension();
    let view = CellVertexView::new(mesh)?;
    check_fault_belongs(mesh, &view, fault, boundary);

    let tips = tip_vertices(fault, boundary)?;
    let interior = interior_vertices(fault, &tips);
    let faces = resolve_faces(mesh.topology(), dim, fault)?;
    let sides = classify_cells(mesh, &view, &faces, &interior, &tips)?;

    let plan = SplitPlan {
        interior,
        tips,
        faces,
        replace: sides.replace_cells(),
    };
    construct(mesh, view, plan, &fault.group, material, constraints, context)
}

/// Split an interpolated `mesh` along `fault` through a `"cohesive"` label.
///
/// The fault closure is labelled with the depth of each point (tips left
/// out), cells are labelled `+dim` (positive, switching to shadow vertices)
/// or `-dim` (negative), and the split is read back from that label.
pub fn create_interpolated<C: Communicator>(
    mesh: &mut Mesh<C>,
    fault: &FaultSubmesh,
    boundary: &FaultBoundary,
    material: i32,
    constraints: bool,
    context: BuilderContext,
) -> Result<CohesiveInsertion, MeshSieveError> {
    let dim = mesh.dimension();
    let depth = mesh.depth()? as usize;
    if depth != dim {
        return Err(MeshSieveError::UnsupportedLayout(format!(
            "interpolated split needs depth {dim}, mesh has depth {depth}"
        )));
    }
    let view = CellVertexView::new(mesh)?;
    check_fault_belongs(mesh, &view, fault, boundary);
    let topo = mesh.topology();

    let mut split = LabelSet::new();
    for p in boundary
        .maps
        .sub_to_parent
        .iter()
        .flatten()
        .filter_map(|&p| fault.parent(p))
    {
        split.set_label(p, TIP_LABEL, 1);
    }
    complete_label_value(topo, &mut split, TIP_LABEL, 1);
    split.create_label(COHESIVE_LABEL);
    for p in fault.mesh.topology().points() {
        let parent = fault
            .parent(p)
            .ok_or_else(|| MeshSieveError::MissingPointInCone(format!("fault point {p}")))?;
        if split.get_label(parent, TIP_LABEL).is_none() {
            split.set_label(parent, COHESIVE_LABEL, topo.depth(parent)? as i32);
        }
    }

    let tips: BTreeSet<PointId> = fault
        .vertices()
        .filter_map(|v| fault.parent(v))
        .filter(|v| split.get_label(*v, COHESIVE_LABEL).is_none())
        .collect();
    let interior = split.stratum_points(COHESIVE_LABEL, 0);
    let faces = resolve_faces(mesh.topology(), dim, fault)?;
    let sides = classify_cells(mesh, &view, &faces, &interior, &tips)?;
    for (cell, side) in sides.iter() {
        split.set_label(cell, COHESIVE_LABEL, side.label_value(dim));
    }
    log::debug!(
        "cohesive label: {} positive cells, {} negative cells, {} interior vertices",
        split.stratum_size(COHESIVE_LABEL, dim as i32),
        split.stratum_size(COHESIVE_LABEL, -(dim as i32)),
        interior.len()
    );

    let faces = faces
        .into_iter()
        .map(|f| {
            let side_of = |c: PointId| {
                split
                    .get_label(c, COHESIVE_LABEL)
                    .and_then(|v| Side::from_label_value(v, dim))
            };
            let [a, b] = fault.face_cells[f.fault_face.index()];
            let (negative, positive) = match (side_of(a), side_of(b)) {
                (Some(Side::Negative), Some(Side::Positive)) => (a, b),
                (Some(Side::Positive), Some(Side::Negative)) => (b, a),
                _ => return Err(MeshSieveError::ConflictingSides { cell: a }),
            };
            Ok(CohesiveFace {
                negative,
                positive,
                ..f
            })
        })
        .collect::<Result<Vec<_>, MeshSieveError>>()?;
    let plan = SplitPlan {
        interior,
        tips,
        faces,
        replace: split
            .stratum_points(COHESIVE_LABEL, dim as i32)
            .into_iter()
            .collect(),
    };
    construct(mesh, view, plan, &fault.group, material, constraints, context)
}

/// Shared construction pass: new chart, cones, labels, coordinates, install.
///
/// An interpolated input is interpolated again after the split (cohesive
/// cells keep their vertex cones) and its face and edge labels are carried
/// over by vertex set.
fn construct<C: Communicator>(
    mesh: &mut Mesh<C>,
    view: CellVertexView,
    plan: SplitPlan,
    group: &str,
    material: i32,
    constraints: bool,
    context: BuilderContext,
) -> Result<CohesiveInsertion, MeshSieveError> {
    let layout = view.layout;
    let (c_end, v_end) = (layout.cells.end, layout.vertices.end);
    let extra_cells = plan.faces.len();
    let fault_vertices = plan.interior.len();
    let lagrange_count = if constraints { fault_vertices } else { 0 };
    let first_shadow = v_end + extra_cells;
    let first_lagrange = first_shadow + fault_vertices;
    let chart = first_lagrange + lagrange_count;
    let shift = VertexShift::new(layout.clone(), extra_cells as u64);

    let mut renumbering = RenumberMap::default();
    for (k, &v) in plan.interior.iter().enumerate() {
        renumbering
            .shadow
            .insert(v, PointId::from_index(first_shadow + k));
        if constraints {
            renumbering
                .lagrange
                .insert(v, PointId::from_index(first_lagrange + k));
        }
    }
    let shadow_of = |v: PointId| {
        renumbering
            .shadow
            .get(&v)
            .copied()
            .unwrap_or_else(|| shift.vertex(v))
    };
    let lagrange_of = |v: PointId| {
        renumbering
            .lagrange
            .get(&v)
            .copied()
            .unwrap_or_else(|| shift.vertex(v))
    };

    let mut topology = ChartSieve::with_chart(chart);
    for (i, verts) in view.cells.iter().enumerate() {
        let cell = PointId::from_index(i);
        if plan.replace.contains(&cell) {
            topology.set_cone(cell, verts.iter().map(|&v| shadow_of(v)))?;
        } else {
            topology.set_cone(cell, verts.iter().map(|&v| shift.vertex(v)))?;
        }
    }

    let mut labels = renumber_labels(mesh.labels(), &shift);
    for &v in &plan.interior {
        label_duplicates(
            mesh.labels(),
            &mut labels,
            group,
            v,
            shadow_of(v),
            renumbering.lagrange.get(&v).copied(),
        );
    }

    let mut cohesive = Vec::with_capacity(extra_cells);
    for (i, face) in plan.faces.iter().enumerate() {
        let id = PointId::from_index(c_end + i);
        let mut cone: Vec<PointId> = face.vertices.iter().map(|&v| shift.vertex(v)).collect();
        cone.extend(face.vertices.iter().map(|&v| shadow_of(v)));
        if constraints {
            cone.extend(face.vertices.iter().map(|&v| lagrange_of(v)));
        }
        log::debug!(
            "cohesive cell {id} for fault face {} between {} and {}: {cone:?}",
            face.fault_face,
            face.negative,
            face.positive
        );
        topology.set_cone(id, cone)?;
        labels.set_label(id, MATERIAL_LABEL, material);
        cohesive.push((face.fault_face, id));
    }
    renumbering.cohesive.extend(cohesive);

    let coordinates = remap_coordinates(mesh.coordinates(), &shift, &renumbering)?;
    topology.symmetrize_and_stratify()?;

    let sizes = match mesh.point_type_sizes() {
        None => PointTypeSizes {
            cells: c_end,
            cohesive_cells: extra_cells,
            vertices: layout.vertices.len(),
            shadow_vertices: fault_vertices,
            lagrange_vertices: lagrange_count,
        },
        Some(prev) => PointTypeSizes {
            cohesive_cells: prev.cohesive_cells + extra_cells,
            shadow_vertices: prev.shadow_vertices + fault_vertices,
            lagrange_vertices: prev.lagrange_vertices + lagrange_count,
            ..prev
        },
    };
    let dim = mesh.dimension();
    if mesh.depth()? as usize == dim {
        let cohesive_ids = sizes.cohesive_range();
        topology = interpolate(&topology, dim, |p| cohesive_ids.contains(&p.index()))?;
        let cell_vertex = |cell: PointId, v: PointId| match renumbering.shadow.get(&v) {
            Some(&s) if plan.replace.contains(&cell) => s,
            _ => shift.vertex(v),
        };
        carry_entity_labels(
            mesh.topology(),
            mesh.labels(),
            &shift,
            |c| layout.is_cell(c) && !mesh.is_cohesive(c),
            cell_vertex,
            &topology,
            &mut labels,
        )?;
        log::debug!(
            "re-interpolated the split mesh: chart {} with faces and edges",
            topology.chart_size()
        );
    }
    mesh.install(topology, labels, coordinates, Some(sizes))?;

    let context = BuilderContext {
        faults_inserted: context.faults_inserted + 1,
        cohesive_cells: context.cohesive_cells + extra_cells as u64,
        shadow_vertices: context.shadow_vertices + fault_vertices as u64,
        lagrange_vertices: context.lagrange_vertices + lagrange_count as u64,
    };
    log::info!(
        "inserted fault `{group}` (material {material}): {extra_cells} cohesive cells, \
         {fault_vertices} shadow and {lagrange_count} Lagrange vertices, {} tip vertices kept",
        plan.tips.len()
    );
    Ok(CohesiveInsertion {
        context,
        renumbering,
        cohesive_cells: PointId::from_index(c_end)..PointId::from_index(c_end + extra_cells),
    })
}

/// Rebuild the fault submesh of an already split mesh from its cohesive
/// cells tagged `material`.
///
/// Fault vertices are the Lagrange slot of each cohesive cone when
/// `constraints` is set, the negative slot otherwise.
pub fn create_fault_parallel<C: Communicator>(
    mesh: &Mesh<C>,
    material: i32,
    group: &str,
    constraints: bool,
) -> Result<FaultSubmesh, MeshSieveError> {
    let dim = mesh.dimension();
    let view = CellVertexView::new(mesh)?;
    let slots = if constraints { 3 } else { 2 };

    let cohesive: Vec<PointId> = view
        .layout
        .cells
        .clone()
        .map(PointId::from_index)
        .filter(|&c| {
            mesh.is_cohesive(c) && mesh.labels().get_label(c, MATERIAL_LABEL) == Some(material)
        })
        .collect();
    if cohesive.is_empty() {
        return Err(MeshSieveError::EmptyFault {
            label: MATERIAL_LABEL.to_string(),
        });
    }
    let adjacency = CellAdjacency::new(&view.cells, |c| mesh.is_cohesive(c), [], 0);
    // cells whose faces have the slot's size and which hold every slot vertex
    let containing = |slot: &[PointId]| -> Vec<PointId> {
        slot.first().map_or_else(Vec::new, |&v0| {
            adjacency
                .star(v0)
                .iter()
                .copied()
                .filter(|c| {
                    let verts = &view.cells[c.index()];
                    CellType::from_vertex_count(dim, verts.len())
                        .is_some_and(|ct| ct.num_face_vertices() == slot.len())
                        && slot.iter().all(|v| verts.contains(v))
                })
                .collect()
        })
    };

    let mut seeds = Vec::with_capacity(cohesive.len());
    for &k in &cohesive {
        let cone = &view.cells[k.index()];
        if cone.len() % slots != 0 || cone.len() / slots < dim {
            return Err(MeshSieveError::UnsupportedCell {
                point: k,
                cone_size: cone.len(),
                dimension: dim,
            });
        }
        let fs = cone.len() / slots;
        let negative = &cone[..fs];
        let shadow = &cone[fs..2 * fs];
        let mut cells = containing(negative);
        cells.extend(containing(shadow));
        cells.sort_unstable();
        cells.dedup();
        let [a, b] = cells[..] else {
            return Err(MeshSieveError::NonManifoldFace {
                face: k,
                cells: cells.len(),
            });
        };
        let cycle = if constraints { &cone[2 * fs..] } else { negative };
        seeds.push(FaceSeed {
            parent: k,
            cycle: cycle.to_vec(),
            cells: [a, b],
        });
    }
    let fault = assemble_fault(group, dim, mesh.coordinates(), &seeds, |_, _| None)?;
    log::info!(
        "rebuilt fault `{group}` from {} cohesive cells of material {material}",
        fault.num_faces
    );
    Ok(fault)
}

/// Extract the fault marked by `group` and split the mesh along it, on the
/// construction path chosen by the collective probe.
pub fn insert_fault<C: Communicator>(
    mesh: &mut Mesh<C>,
    group: &str,
    material: i32,
    constraints: bool,
    context: BuilderContext,
) -> Result<CohesiveInsertion, MeshSieveError> {
    let path = FaultPath::probe(mesh)?;
    let (fault, boundary) = create_fault_on_path(mesh, group, path)?;
    match path {
        FaultPath::Interpolated => {
            create_interpolated(mesh, &fault, &boundary, material, constraints, context)
        }
        FaultPath::NeedsInterpolation => {
            create(mesh, &fault, &boundary, material, constraints, context)
        }
    }
}
