//! `ChartSieve`: an index-arena topology over a contiguous chart `[0, N)`.
//!
//! Cones are authored; supports and strata are derived. Any cone edit
//! invalidates both, and they come back only through
//! [`ChartSieve::symmetrize`] followed by [`ChartSieve::stratify`].

use std::collections::BTreeSet;
use std::ops::Range;

use crate::mesh_error::MeshSieveError;
use crate::topology::orientation::ConeOrientation;
use crate::topology::point::PointId;
use crate::topology::sieve::strata::{StrataCache, compute_strata};

/// Chart-indexed sieve with one orientation per cone arrow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChartSieve {
    cones: Vec<Vec<(PointId, ConeOrientation)>>,
    supports: Vec<Vec<PointId>>,
    symmetric: bool,
    strata: Option<StrataCache>,
}

impl ChartSieve {
    /// An empty sieve over the chart `[0, n)`.
    pub fn with_chart(n: usize) -> Self {
        Self {
            cones: vec![Vec::new(); n],
            supports: vec![Vec::new(); n],
            symmetric: true,
            strata: None,
        }
    }

    #[inline]
    pub fn chart_size(&self) -> usize {
        self.cones.len()
    }

    #[inline]
    pub fn chart(&self) -> Range<PointId> {
        PointId::new(0)..PointId::from_index(self.chart_size())
    }

    /// All chart points in ascending order.
    pub fn points(&self) -> impl Iterator<Item = PointId> + '_ {
        (0..self.chart_size()).map(PointId::from_index)
    }

    #[inline]
    pub fn contains(&self, p: PointId) -> bool {
        p.index() < self.chart_size()
    }

    fn check(&self, p: PointId) -> Result<(), MeshSieveError> {
        if self.contains(p) {
            Ok(())
        } else {
            Err(MeshSieveError::PointOutOfChart {
                point: p,
                chart_size: self.chart_size(),
            })
        }
    }

    fn invalidate(&mut self) {
        self.symmetric = false;
        self.strata = None;
    }

    /// Replace the cone of `p`, every arrow with the identity orientation.
    pub fn set_cone<I>(&mut self, p: PointId, cone: I) -> Result<(), MeshSieveError>
    where
        I: IntoIterator<Item = PointId>,
    {
        let cone = cone
            .into_iter()
            .map(|q| (q, ConeOrientation::IDENTITY))
            .collect();
        self.set_cone_oriented(p, cone)
    }

    /// Replace the cone of `p` together with its arrow orientations.
    pub fn set_cone_oriented(
        &mut self,
        p: PointId,
        cone: Vec<(PointId, ConeOrientation)>,
    ) -> Result<(), MeshSieveError> {
        self.check(p)?;
        for &(q, _) in &cone {
            self.check(q)?;
        }
        self.cones[p.index()] = cone;
        self.invalidate();
        Ok(())
    }

    /// Cone points of `p` in stored order (empty outside the chart).
    pub fn cone(&self, p: PointId) -> impl ExactSizeIterator<Item = PointId> + '_ {
        self.cone_oriented(p).iter().map(|&(q, _)| q)
    }

    pub fn cone_oriented(&self, p: PointId) -> &[(PointId, ConeOrientation)] {
        self.cones.get(p.index()).map_or(&[], Vec::as_slice)
    }

    #[inline]
    pub fn cone_size(&self, p: PointId) -> usize {
        self.cone_oriented(p).len()
    }

    pub fn cone_points(&self, p: PointId) -> Vec<PointId> {
        self.cone(p).collect()
    }

    /// Support of `p`, ascending. Only meaningful after [`Self::symmetrize`].
    pub fn support(&self, p: PointId) -> &[PointId] {
        debug_assert!(self.symmetric, "support queried on a non-symmetrized sieve");
        self.supports.get(p.index()).map_or(&[], Vec::as_slice)
    }

    /// Rebuild every support from the cones.
    pub fn symmetrize(&mut self) {
        for s in &mut self.supports {
            s.clear();
        }
        for (i, cone) in self.cones.iter().enumerate() {
            for &(q, _) in cone {
                self.supports[q.index()].push(PointId::from_index(i));
            }
        }
        self.symmetric = true;
    }

    /// Recompute depth/height strata from the cones.
    pub fn stratify(&mut self) -> Result<(), MeshSieveError> {
        self.strata = Some(compute_strata(self)?);
        Ok(())
    }

    /// `symmetrize` then `stratify`.
    pub fn symmetrize_and_stratify(&mut self) -> Result<(), MeshSieveError> {
        self.symmetrize();
        self.stratify()
    }

    #[inline]
    pub fn is_symmetrized(&self) -> bool {
        self.symmetric
    }

    pub fn strata(&self) -> Result<&StrataCache, MeshSieveError> {
        self.strata.as_ref().ok_or(MeshSieveError::NotStratified)
    }

    pub fn depth(&self, p: PointId) -> Result<u32, MeshSieveError> {
        self.check(p)?;
        Ok(self.strata()?.depth[p.index()])
    }

    pub fn height(&self, p: PointId) -> Result<u32, MeshSieveError> {
        self.check(p)?;
        Ok(self.strata()?.height[p.index()])
    }

    /// Maximum depth over the chart (0 for an empty chart).
    pub fn max_depth(&self) -> Result<u32, MeshSieveError> {
        Ok(self.strata()?.diameter)
    }

    /// Points at depth `d`, ascending (empty past the diameter).
    pub fn depth_stratum(&self, d: u32) -> Result<&[PointId], MeshSieveError> {
        Ok(self
            .strata()?
            .depth_strata
            .get(d as usize)
            .map_or(&[], Vec::as_slice))
    }

    /// Points at height `h`, ascending.
    pub fn height_stratum(&self, h: u32) -> Result<&[PointId], MeshSieveError> {
        Ok(self
            .strata()?
            .height_strata
            .get(h as usize)
            .map_or(&[], Vec::as_slice))
    }

    /// Transitive closure of `seeds` (seeds included), ascending.
    pub fn closure<I>(&self, seeds: I) -> Vec<PointId>
    where
        I: IntoIterator<Item = PointId>,
    {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<PointId> = seeds.into_iter().collect();
        while let Some(p) = stack.pop() {
            if seen.insert(p) {
                stack.extend(self.cone(p));
            }
        }
        seen.into_iter().collect()
    }

    /// Transitive star of `seeds` (seeds included), ascending.
    pub fn star<I>(&self, seeds: I) -> Vec<PointId>
    where
        I: IntoIterator<Item = PointId>,
    {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<PointId> = seeds.into_iter().collect();
        while let Some(p) = stack.pop() {
            if seen.insert(p) {
                stack.extend_from_slice(self.support(p));
            }
        }
        seen.into_iter().collect()
    }

    /// Depth-0 points in the closure of `p`, ascending.
    pub fn closure_vertices(&self, p: PointId) -> Result<Vec<PointId>, MeshSieveError> {
        let strata = self.strata()?;
        Ok(self
            .closure([p])
            .into_iter()
            .filter(|q| strata.depth[q.index()] == 0)
            .collect())
    }

    /// Height-0 points in the star of `p`, ascending.
    pub fn star_cells(&self, p: PointId) -> Result<Vec<PointId>, MeshSieveError> {
        let strata = self.strata()?;
        Ok(self
            .star([p])
            .into_iter()
            .filter(|q| strata.height[q.index()] == 0)
            .collect())
    }

    /// True when every cone arrow `p -> q` is matched by `p` in the
    /// support of `q`, with equal multiplicity, and nothing else.
    pub fn is_consistent(&self) -> bool {
        let mut expected = vec![Vec::new(); self.chart_size()];
        for (i, cone) in self.cones.iter().enumerate() {
            for &(q, _) in cone {
                expected[q.index()].push(PointId::from_index(i));
            }
        }
        expected.iter().zip(&self.supports).all(|(e, s)| {
            let mut s = s.clone();
            s.sort_unstable();
            *e == s
        })
    }

    /// Check consistency in debug builds; no-op in release.
    #[inline]
    pub fn debug_assert_consistent(&self) {
        debug_assert!(self.is_consistent(), "cone/support tables out of sync");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(i: u64) -> PointId {
        PointId::new(i)
    }

    /// Two triangles 0,1 sharing the edge (3,4); vertices 2..=5.
    fn two_triangles() -> ChartSieve {
        let mut s = ChartSieve::with_chart(6);
        s.set_cone(pid(0), [pid(2), pid(3), pid(4)]).unwrap();
        s.set_cone(pid(1), [pid(4), pid(3), pid(5)]).unwrap();
        s.symmetrize_and_stratify().unwrap();
        s
    }

    #[test]
    fn supports_follow_cones() {
        let s = two_triangles();
        assert_eq!(s.support(pid(3)), &[pid(0), pid(1)]);
        assert_eq!(s.support(pid(5)), &[pid(1)]);
        assert!(s.is_consistent());
    }

    #[test]
    fn strata_queries() {
        let s = two_triangles();
        assert_eq!(s.max_depth().unwrap(), 1);
        assert_eq!(s.height_stratum(0).unwrap(), &[pid(0), pid(1)]);
        assert_eq!(s.depth_stratum(0).unwrap().len(), 4);
        assert!(s.depth_stratum(7).unwrap().is_empty());
        assert_eq!(s.star_cells(pid(4)).unwrap(), vec![pid(0), pid(1)]);
        assert_eq!(s.closure_vertices(pid(1)).unwrap(), vec![pid(3), pid(4), pid(5)]);
    }

    #[test]
    fn editing_a_cone_drops_strata() {
        let mut s = two_triangles();
        s.set_cone(pid(1), [pid(3), pid(4), pid(5)]).unwrap();
        assert_eq!(s.depth(pid(1)), Err(MeshSieveError::NotStratified));
        assert!(!s.is_symmetrized());
        s.symmetrize_and_stratify().unwrap();
        assert_eq!(s.depth(pid(1)), Ok(1));
    }

    #[test]
    fn cone_outside_chart_is_rejected() {
        let mut s = ChartSieve::with_chart(2);
        let err = s.set_cone(pid(0), [pid(5)]).unwrap_err();
        assert_eq!(
            err,
            MeshSieveError::PointOutOfChart {
                point: pid(5),
                chart_size: 2
            }
        );
    }
}
