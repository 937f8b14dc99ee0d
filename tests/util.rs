#![allow(dead_code)]
use mesh_sieve_faults::{
    topology::mesh::Mesh,
    topology::point::PointId,
};

pub fn pid(u: u64) -> PointId {
    PointId::new(u)
}

pub fn pids(raw: &[u64]) -> Vec<PointId> {
    raw.iter().copied().map(pid).collect()
}

/// Two unit hexes stacked along z.
///
/// Chart: cells 0 (lower) and 1 (upper), vertices 2..=13 layer by layer.
/// The shared face z = 1 has vertices 6..=9 and is marked in label
/// `"fault"`.
pub fn two_hexes() -> Mesh {
    let mut coords = Vec::new();
    for z in 0..3 {
        for (x, y) in [(0, 0), (1, 0), (1, 1), (0, 1)] {
            coords.extend([x as f64, y as f64, z as f64]);
        }
    }
    let cells = [
        vec![0, 1, 2, 3, 4, 5, 6, 7],
        vec![4, 5, 6, 7, 8, 9, 10, 11],
    ];
    let mut mesh = Mesh::from_cells(3, 3, &cells, &coords).unwrap();
    for v in 6..=9 {
        mesh.labels_mut().set_label(pid(v), "fault", 1);
    }
    mesh
}

/// 2×2 quads on the unit grid `[0,2]²`.
///
/// ```text
/// 10 11 12
///  7  8  9
///  4  5  6
/// ```
/// Cells 0..=3 (lower-left, lower-right, upper-left, upper-right). The
/// fault `"fault"` runs from (1,0) (vertex 5) to the centre (vertex 8),
/// which makes the centre a buried tip.
pub fn quad_grid_with_tip() -> Mesh {
    let mut coords = Vec::new();
    for y in 0..3 {
        for x in 0..3 {
            coords.extend([x as f64, y as f64]);
        }
    }
    let cells = [
        vec![0, 1, 4, 3],
        vec![1, 2, 5, 4],
        vec![3, 4, 7, 6],
        vec![4, 5, 8, 7],
    ];
    let mut mesh = Mesh::from_cells(2, 2, &cells, &coords).unwrap();
    mesh.labels_mut().set_label(pid(5), "fault", 1);
    mesh.labels_mut().set_label(pid(8), "fault", 1);
    mesh
}

/// A strip of `n` unit quads along x.
///
/// Chart: cells `0..n`, bottom vertices `n..=2n`, top vertices
/// `2n+1..=3n+1`. Label `"fault"` marks the vertical line `x = column`,
/// which must be interior (`0 < column < n`).
pub fn quad_strip(n: usize, column: usize) -> Mesh {
    let mut coords = Vec::new();
    for y in 0..2 {
        for x in 0..=n {
            coords.extend([x as f64, y as f64]);
        }
    }
    let cells: Vec<Vec<usize>> = (0..n)
        .map(|i| vec![i, i + 1, n + 2 + i, n + 1 + i])
        .collect();
    let mut mesh = Mesh::from_cells(2, 2, &cells, &coords).unwrap();
    mark_column(&mut mesh, n, column, "fault");
    mesh
}

/// Mark the vertical line `x = column` of a fresh [`quad_strip`] in `label`.
pub fn mark_column(mesh: &mut Mesh, n: usize, column: usize, label: &str) {
    let bottom = (n + column) as u64;
    let top = (2 * n + 1 + column) as u64;
    mesh.labels_mut().set_label(pid(bottom), label, 1);
    mesh.labels_mut().set_label(pid(top), label, 1);
}

/// Two triangles sharing the diagonal (0,0)-(1,1) of the unit square.
pub fn triangle_pair() -> Mesh {
    let coords = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
    let mut mesh = Mesh::from_cells(2, 2, &[vec![0, 1, 2], vec![0, 2, 3]], &coords).unwrap();
    mesh.labels_mut().set_label(pid(2), "fault", 1);
    mesh.labels_mut().set_label(pid(4), "fault", 1);
    mesh
}

/// 2×2×2 unit hexes on `[0,2]³`.
///
/// Cell `i + 2j + 4k` spans `[i,i+1]×[j,j+1]×[k,k+1]` and vertex `(x,y,z)`
/// is `8 + x + 3y + 9z`. Label `"fault"` marks the plane z = 1 for x ≤ 1
/// only, so the fault ends inside the mesh along the line x = 1, z = 1.
pub fn half_faulted_hex_grid() -> Mesh {
    let vid = |x: usize, y: usize, z: usize| x + 3 * y + 9 * z;
    let mut coords = Vec::new();
    for z in 0..3 {
        for y in 0..3 {
            for x in 0..3 {
                coords.extend([x as f64, y as f64, z as f64]);
            }
        }
    }
    let mut cells = Vec::new();
    for k in 0..2 {
        for j in 0..2 {
            for i in 0..2 {
                cells.push(vec![
                    vid(i, j, k),
                    vid(i + 1, j, k),
                    vid(i + 1, j + 1, k),
                    vid(i, j + 1, k),
                    vid(i, j, k + 1),
                    vid(i + 1, j, k + 1),
                    vid(i + 1, j + 1, k + 1),
                    vid(i, j + 1, k + 1),
                ]);
            }
        }
    }
    let mut mesh = Mesh::from_cells(3, 3, &cells, &coords).unwrap();
    for y in 0..3 {
        for x in 0..2 {
            mesh.labels_mut()
                .set_label(pid((8 + vid(x, y, 1)) as u64), "fault", 1);
        }
    }
    mesh
}

/// Two unit cubes along x, each cut into the six Kuhn tetrahedra around
/// its main diagonal.
///
/// Cells 0..=5 fill the left cube and 6..=11 the right one, every tet
/// positively oriented; vertex `(x,y,z)` is `12 + x + 3y + 6z`. Label
/// `"fault"` marks the shared square x = 1 (vertices 13, 16, 19, 22).
pub fn kuhn_tet_strip() -> Mesh {
    let vid = |[x, y, z]: [usize; 3]| x + 3 * y + 6 * z;
    let mut coords = Vec::new();
    for z in 0..2 {
        for y in 0..2 {
            for x in 0..3 {
                coords.extend([x as f64, y as f64, z as f64]);
            }
        }
    }
    let axes = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    let mut cells = Vec::new();
    for cube in 0..2 {
        for order in axes {
            let mut corner = [cube, 0, 0];
            let mut tet = vec![corner];
            for axis in order {
                corner[axis] += 1;
                tet.push(corner);
            }
            if signed_volume(&tet) < 0 {
                tet.swap(1, 2);
            }
            cells.push(tet.into_iter().map(vid).collect::<Vec<_>>());
        }
    }
    let mut mesh = Mesh::from_cells(3, 3, &cells, &coords).unwrap();
    for corner in [[1, 0, 0], [1, 1, 0], [1, 0, 1], [1, 1, 1]] {
        mesh.labels_mut()
            .set_label(pid((12 + vid(corner)) as u64), "fault", 1);
    }
    mesh
}

/// Six times the signed volume of a tet given by integer corners.
fn signed_volume(tet: &[[usize; 3]]) -> i64 {
    let d = |k: usize| -> [i64; 3] {
        let [a, b] = [tet[k], tet[0]];
        [0, 1, 2].map(|i| a[i] as i64 - b[i] as i64)
    };
    let (u, v, w) = (d(1), d(2), d(3));
    u[0] * (v[1] * w[2] - v[2] * w[1]) - u[1] * (v[0] * w[2] - v[2] * w[0])
        + u[2] * (v[0] * w[1] - v[1] * w[0])
}

/// The face or edge whose closure holds exactly `vertices`.
pub fn entity_with_vertices(mesh: &Mesh, vertices: &[u64]) -> Option<PointId> {
    let mut want = pids(vertices);
    want.sort_unstable();
    let topo = mesh.topology();
    topo.points().find(|&p| {
        topo.depth(p).unwrap() > 0
            && topo.height(p).unwrap() > 0
            && topo.closure_vertices(p).unwrap() == want
    })
}

/// Cells of `mesh` with at least one vertex id `>= first`.
pub fn cells_touching(mesh: &Mesh, cells: std::ops::Range<u64>, first: u64) -> Vec<PointId> {
    cells
        .map(pid)
        .filter(|&c| mesh.topology().cone(c).any(|v| v.get() >= first))
        .collect()
}

/// Cones of every point, in chart order.
pub fn cones(mesh: &Mesh) -> Vec<Vec<PointId>> {
    mesh.topology()
        .points()
        .map(|p| mesh.topology().cone_points(p))
        .collect()
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}
