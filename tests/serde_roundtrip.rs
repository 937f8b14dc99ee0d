mod util;

use mesh_sieve_faults::faults::{BuilderContext, insert_fault};
use mesh_sieve_faults::topology::cell_type::CellType;
use mesh_sieve_faults::topology::mesh::PointTypeSizes;
use mesh_sieve_faults::topology::orientation::ConeOrientation;
use mesh_sieve_faults::topology::point::PointId;
use util::*;

#[test]
fn builder_context_carries_across_a_json_boundary() {
    let mut mesh = two_hexes();
    let out = insert_fault(&mut mesh, "fault", 1, true, BuilderContext::default()).unwrap();
    let json = serde_json::to_string(&out.context).unwrap();
    assert_eq!(
        json,
        r#"{"faults_inserted":1,"cohesive_cells":1,"shadow_vertices":4,"lagrange_vertices":4}"#
    );
    let back: BuilderContext = serde_json::from_str(&json).unwrap();
    assert_eq!(back, out.context);
}

#[test]
fn point_type_sizes_through_bincode() {
    let mut mesh = quad_grid_with_tip();
    insert_fault(&mut mesh, "fault", 1, false, BuilderContext::default()).unwrap();
    let sizes = mesh.point_type_sizes().unwrap();
    let bytes = bincode::serialize(&sizes).unwrap();
    let back: PointTypeSizes = bincode::deserialize(&bytes).unwrap();
    assert_eq!(back, sizes);
    assert_eq!(back.cohesive_range(), 4..5);
}

#[test]
fn topology_vocabulary_serializes() {
    let pid_json = serde_json::to_string(&PointId::new(42)).unwrap();
    assert_eq!(pid_json, "42");
    let ct: CellType = serde_json::from_str(r#""Hexahedron""#).unwrap();
    assert_eq!(ct, CellType::Hexahedron);
    let o = ConeOrientation::reflection(1);
    let bytes = bincode::serialize(&o).unwrap();
    assert_eq!(bincode::deserialize::<ConeOrientation>(&bytes).unwrap(), o);
}
