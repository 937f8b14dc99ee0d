//! Point label storage for topology metadata.
//!
//! Labels map `PointId` → integer tags, grouped by label name.
//! Fault insertion reads its marker from a label, tags cohesive cells in
//! the material label and carries every other label through renumbering.
//! Storage is ordered so that iteration, and everything built from it, is
//! deterministic.

use std::collections::BTreeMap;

use crate::topology::point::PointId;
use crate::topology::sieve::ChartSieve;

/// Depth bookkeeping; rewritten whenever a mesh is stratified.
pub const DEPTH_LABEL: &str = "depth";
/// Material tags. Cohesive cells receive the fault's material here.
pub const MATERIAL_LABEL: &str = "material-id";
/// Scratch label driving the interpolated construction path.
pub const COHESIVE_LABEL: &str = "cohesive";

/// Named integer labels for mesh points.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSet {
    labels: BTreeMap<String, BTreeMap<PointId, i32>>,
}

impl LabelSet {
    /// Creates an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `value` for `point` under label `name`.
    ///
    /// Returns the previous value, if any.
    pub fn set_label(&mut self, point: PointId, name: &str, value: i32) -> Option<i32> {
        self.labels
            .entry(name.to_string())
            .or_default()
            .insert(point, value)
    }

    /// Returns the label value for `point` under `name`.
    pub fn get_label(&self, point: PointId, name: &str) -> Option<i32> {
        self.labels
            .get(name)
            .and_then(|map| map.get(&point).copied())
    }

    /// Creates label `name` without any points if it does not exist yet.
    pub fn create_label(&mut self, name: &str) {
        self.labels.entry(name.to_string()).or_default();
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    /// Label names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.keys().map(String::as_str)
    }

    /// The whole `point → value` map of label `name`.
    pub fn label(&self, name: &str) -> Option<&BTreeMap<PointId, i32>> {
        self.labels.get(name)
    }

    /// Removes label `name` entirely, returning its contents.
    pub fn remove_label(&mut self, name: &str) -> Option<BTreeMap<PointId, i32>> {
        self.labels.remove(name)
    }

    /// Returns all points with label `name == value`, ascending.
    pub fn stratum_points(&self, name: &str, value: i32) -> Vec<PointId> {
        self.labels.get(name).map_or_else(Vec::new, |map| {
            map.iter()
                .filter_map(|(&point, &v)| (v == value).then_some(point))
                .collect()
        })
    }

    /// Returns the number of points with label `name == value`.
    pub fn stratum_size(&self, name: &str, value: i32) -> usize {
        self.labels
            .get(name)
            .map_or(0, |map| map.values().filter(|&&v| v == value).count())
    }

    /// Returns all distinct values stored for label `name`, sorted ascending.
    pub fn stratum_values(&self, name: &str) -> Vec<i32> {
        let mut values: Vec<i32> = self
            .labels
            .get(name)
            .map_or_else(Vec::new, |map| map.values().copied().collect());
        values.sort_unstable();
        values.dedup();
        values
    }

    /// Every `(name, value)` attached to `point`, by label name.
    pub fn labels_of(&self, point: PointId) -> Vec<(&str, i32)> {
        self.labels
            .iter()
            .filter_map(|(name, map)| map.get(&point).map(|&v| (name.as_str(), v)))
            .collect()
    }

    /// Returns true when the label set has no entries.
    pub fn is_empty(&self) -> bool {
        self.labels.values().all(BTreeMap::is_empty)
    }

    /// Iterate over all labels as `(name, point, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, PointId, i32)> + '_ {
        self.labels.iter().flat_map(|(name, map)| {
            map.iter()
                .map(move |(&point, &value)| (name.as_str(), point, value))
        })
    }

    /// A copy with every point sent through `f`; points mapped to `None`
    /// are dropped. Empty labels are kept so label names survive.
    pub fn map_points<F>(&self, mut f: F) -> LabelSet
    where
        F: FnMut(PointId) -> Option<PointId>,
    {
        let labels = self
            .labels
            .iter()
            .map(|(name, map)| {
                let remapped = map
                    .iter()
                    .filter_map(|(&p, &v)| f(p).map(|q| (q, v)))
                    .collect();
                (name.clone(), remapped)
            })
            .collect();
        LabelSet { labels }
    }
}

/// Expand a label stratum to include the closure of its points.
///
/// This mirrors DMPlexLabelComplete for a single label value: every point
/// in the closure of a labeled point receives the value, unless it already
/// carries one.
pub fn complete_label_value(sieve: &ChartSieve, labels: &mut LabelSet, name: &str, value: i32) {
    let seeds = labels.stratum_points(name, value);
    if seeds.is_empty() {
        return;
    }
    for point in sieve.closure(seeds) {
        if labels.get_label(point, name).is_none() {
            labels.set_label(point, name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(i: u64) -> PointId {
        PointId::new(i)
    }

    #[test]
    fn set_get_and_strata() {
        let mut labels = LabelSet::new();
        assert_eq!(labels.set_label(pid(3), "fault", 1), None);
        assert_eq!(labels.set_label(pid(3), "fault", 2), Some(1));
        labels.set_label(pid(1), "fault", 2);
        labels.set_label(pid(2), MATERIAL_LABEL, 7);
        assert_eq!(labels.get_label(pid(3), "fault"), Some(2));
        assert_eq!(labels.stratum_points("fault", 2), vec![pid(1), pid(3)]);
        assert_eq!(labels.stratum_size("fault", 2), 2);
        assert_eq!(labels.stratum_values("fault"), vec![2]);
        assert_eq!(labels.names().collect::<Vec<_>>(), vec!["fault", "material-id"]);
    }

    #[test]
    fn labels_of_point() {
        let mut labels = LabelSet::new();
        labels.set_label(pid(5), "b", 2);
        labels.set_label(pid(5), "a", 1);
        assert_eq!(labels.labels_of(pid(5)), vec![("a", 1), ("b", 2)]);
        assert!(labels.labels_of(pid(6)).is_empty());
    }

    #[test]
    fn map_points_shifts_and_drops() {
        let mut labels = LabelSet::new();
        labels.set_label(pid(0), "cells", 1);
        labels.set_label(pid(4), "verts", 9);
        let shifted = labels.map_points(|p| (p.get() >= 2).then(|| p.shifted(10)));
        assert_eq!(shifted.get_label(pid(14), "verts"), Some(9));
        assert!(shifted.has_label("cells"));
        assert_eq!(shifted.stratum_size("cells", 1), 0);
    }

    #[test]
    fn completion_over_closure_keeps_existing_values() {
        let mut s = ChartSieve::with_chart(4);
        s.set_cone(pid(0), [pid(1), pid(2), pid(3)]).unwrap();
        let mut labels = LabelSet::new();
        labels.set_label(pid(0), "bc", 1);
        labels.set_label(pid(2), "bc", 5);
        complete_label_value(&s, &mut labels, "bc", 1);
        assert_eq!(labels.stratum_points("bc", 1), vec![pid(0), pid(1), pid(3)]);
        assert_eq!(labels.get_label(pid(2), "bc"), Some(5));
    }
}
