mod util;

use mesh_sieve_faults::faults::{BuilderContext, insert_fault};
use mesh_sieve_faults::topology::labels::MATERIAL_LABEL;
use mesh_sieve_faults::topology::point::PointId;
use proptest::prelude::*;
use util::*;

proptest! {
    #[test]
    fn strip_split_counts(
        n in 2usize..8,
        column_seed in 0usize..64,
        constraints in any::<bool>(),
    ) {
        let column = 1 + column_seed % (n - 1);
        let mut mesh = quad_strip(n, column);
        let chart = mesh.topology().chart_size();
        let out = insert_fault(&mut mesh, "fault", 5, constraints, BuilderContext::default())
            .unwrap();
        let extra = if constraints { 4 } else { 2 };
        let topo = mesh.topology();
        prop_assert_eq!(topo.chart_size(), chart + 1 + extra);
        let cohesive = out.cohesive_cells.start;
        prop_assert_eq!(cohesive.index(), n);
        prop_assert_eq!(topo.cone_size(cohesive), if constraints { 6 } else { 4 });
        prop_assert_eq!(mesh.labels().get_label(cohesive, MATERIAL_LABEL), Some(5));
        prop_assert_eq!(mesh.labels().stratum_size("fault", 1), 2 + extra);
        // negative cell is the one left of the fault
        let left = topo.cone_points(PointId::from_index(column - 1));
        let cone = topo.cone_points(cohesive);
        prop_assert!(cone[..2].iter().all(|v| left.contains(v)));
    }

    #[test]
    fn cones_and_supports_agree(
        n in 2usize..8,
        column_seed in 0usize..64,
        constraints in any::<bool>(),
    ) {
        let column = 1 + column_seed % (n - 1);
        let mut mesh = quad_strip(n, column);
        insert_fault(&mut mesh, "fault", 1, constraints, BuilderContext::default()).unwrap();
        let topo = mesh.topology();
        for p in topo.points() {
            for q in topo.cone(p) {
                prop_assert!(topo.support(q).contains(&p));
            }
            for &s in topo.support(p) {
                prop_assert!(topo.cone(s).any(|q| q == p));
            }
        }
    }

    #[test]
    fn paths_and_reruns_agree(
        n in 2usize..6,
        column_seed in 0usize..64,
        constraints in any::<bool>(),
    ) {
        let column = 1 + column_seed % (n - 1);
        let run = |interpolate: bool| {
            let base = quad_strip(n, column);
            let mut mesh = if interpolate { base.interpolated().unwrap() } else { base };
            let out = insert_fault(&mut mesh, "fault", 1, constraints, BuilderContext::default())
                .unwrap();
            // compare both in interpolated form
            let mesh = if interpolate { mesh } else { mesh.interpolated().unwrap() };
            (cones(&mesh), mesh.labels().clone(), mesh.coordinates().clone(), out)
        };
        let plain = run(false);
        prop_assert_eq!(&plain, &run(false));
        prop_assert_eq!(&plain, &run(true));
    }
}
