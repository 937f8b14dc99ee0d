//! Strata computation for chart-indexed sieves.
//!
//! This module provides [`StrataCache`], the depth/height classification of
//! every point of a [`ChartSieve`], and [`compute_strata`], which derives it
//! from the cones alone.
//!
//! # Errors
//! * [`MeshSieveError::CycleDetected`]: the topology contains a cycle.

use crate::mesh_error::MeshSieveError;
use crate::topology::point::PointId;
use crate::topology::sieve::ChartSieve;

/// Precomputed stratum information for a sieve.
///
/// Depth counts arrows down to a point with an empty cone (vertices have
/// depth 0); height counts arrows up to a point with an empty support
/// (cells have height 0).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StrataCache {
    /// Depth of every chart point, indexed by `PointId::index`.
    pub depth: Vec<u32>,
    /// Height of every chart point, indexed by `PointId::index`.
    pub height: Vec<u32>,
    /// `depth_strata[d]` = points at depth `d`, ascending.
    pub depth_strata: Vec<Vec<PointId>>,
    /// `height_strata[h]` = points at height `h`, ascending.
    pub height_strata: Vec<Vec<PointId>>,
    /// Maximum depth over the chart.
    pub diameter: u32,
}

impl StrataCache {
    /// Total number of points in the chart.
    #[inline]
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }
}

/// Compute strata information on-the-fly.
///
/// ## Complexity
/// - Time: **O(|V| + |E|)** (Kahn topological sort + forward/backward passes)
/// - Space: **O(|V| + |E|)**
pub fn compute_strata(s: &ChartSieve) -> Result<StrataCache, MeshSieveError> {
    let n = s.chart_size();

    let mut in_deg = vec![0u32; n];
    for p in s.points() {
        for q in s.cone(p) {
            in_deg[q.index()] += 1;
        }
    }

    // Kahn’s topological sort, sources pushed in descending order so the
    // stack pops them ascending
    let mut stack: Vec<PointId> = (0..n)
        .rev()
        .filter(|&i| in_deg[i] == 0)
        .map(PointId::from_index)
        .collect();
    let mut topo = Vec::with_capacity(n);
    while let Some(p) = stack.pop() {
        topo.push(p);
        for q in s.cone(p) {
            let d = &mut in_deg[q.index()];
            *d -= 1;
            if *d == 0 {
                stack.push(q);
            }
        }
    }
    if topo.len() != n {
        return Err(MeshSieveError::CycleDetected);
    }

    let mut height = vec![0u32; n];
    for &p in &topo {
        let h = height[p.index()] + 1;
        for q in s.cone(p) {
            let hq = &mut height[q.index()];
            *hq = (*hq).max(h);
        }
    }

    let mut depth = vec![0u32; n];
    for &p in topo.iter().rev() {
        depth[p.index()] = s
            .cone(p)
            .map(|q| depth[q.index()] + 1)
            .max()
            .unwrap_or(0);
    }

    let diameter = depth.iter().copied().max().unwrap_or(0);
    let max_height = height.iter().copied().max().unwrap_or(0);
    let mut depth_strata = vec![Vec::new(); (diameter + 1) as usize];
    let mut height_strata = vec![Vec::new(); (max_height + 1) as usize];
    for p in s.points() {
        depth_strata[depth[p.index()] as usize].push(p);
        height_strata[height[p.index()] as usize].push(p);
    }

    Ok(StrataCache {
        depth,
        height,
        depth_strata,
        height_strata,
        diameter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(i: u64) -> PointId {
        PointId::new(i)
    }

    #[test]
    fn triangle_strata() {
        // cell 0 -> vertices 1,2,3
        let mut s = ChartSieve::with_chart(4);
        s.set_cone(pid(0), [pid(1), pid(2), pid(3)]).unwrap();
        let strata = compute_strata(&s).unwrap();
        assert_eq!(strata.diameter, 1);
        assert_eq!(strata.depth_strata[0], vec![pid(1), pid(2), pid(3)]);
        assert_eq!(strata.height_strata[0], vec![pid(0)]);
        assert_eq!(strata.height[3], 1);
    }

    #[test]
    fn depth_and_height_differ_for_mixed_chains() {
        // 0 -> 1 -> 2 and 0 -> 2
        let mut s = ChartSieve::with_chart(3);
        s.set_cone(pid(0), [pid(1), pid(2)]).unwrap();
        s.set_cone(pid(1), [pid(2)]).unwrap();
        let strata = compute_strata(&s).unwrap();
        assert_eq!(strata.depth, vec![2, 1, 0]);
        assert_eq!(strata.height, vec![0, 1, 2]);
    }

    #[test]
    fn cycle_is_reported() {
        let mut s = ChartSieve::with_chart(2);
        s.set_cone(pid(0), [pid(1)]).unwrap();
        s.set_cone(pid(1), [pid(0)]).unwrap();
        assert_eq!(compute_strata(&s), Err(MeshSieveError::CycleDetected));
    }
}
