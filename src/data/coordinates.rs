//! Geometry/coordinates storage for mesh points.
//!
//! Coordinates are stored as one contiguous buffer with a fixed number of
//! components per point, addressed through an ordered `point → offset` atlas.

use std::collections::BTreeMap;

use crate::mesh_error::MeshSieveError;
use crate::topology::point::PointId;

/// Coordinate storage with an attached dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct Coordinates<V = f64> {
    dimension: usize,
    atlas: BTreeMap<PointId, usize>,
    data: Vec<V>,
}

impl<V> Coordinates<V> {
    /// Empty storage with `dimension` components per point.
    pub fn try_new(dimension: usize) -> Result<Self, MeshSieveError> {
        if dimension == 0 {
            return Err(MeshSieveError::ZeroLengthSlice);
        }
        Ok(Self {
            dimension,
            atlas: BTreeMap::new(),
            data: Vec::new(),
        })
    }

    /// Returns the spatial dimension per point.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of points with coordinates.
    #[inline]
    pub fn len(&self) -> usize {
        self.atlas.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.atlas.is_empty()
    }

    #[inline]
    pub fn contains(&self, p: PointId) -> bool {
        self.atlas.contains_key(&p)
    }

    /// Points with coordinates, ascending.
    pub fn points(&self) -> impl Iterator<Item = PointId> + '_ {
        self.atlas.keys().copied()
    }

    /// Read-only view of the coordinate slice for a point `p`.
    pub fn try_restrict(&self, p: PointId) -> Result<&[V], MeshSieveError> {
        let &off = self
            .atlas
            .get(&p)
            .ok_or(MeshSieveError::MissingCoordinates(p))?;
        Ok(&self.data[off..off + self.dimension])
    }

    /// Mutable view of the coordinate slice for a point `p`.
    pub fn try_restrict_mut(&mut self, p: PointId) -> Result<&mut [V], MeshSieveError> {
        let &off = self
            .atlas
            .get(&p)
            .ok_or(MeshSieveError::MissingCoordinates(p))?;
        Ok(&mut self.data[off..off + self.dimension])
    }
}

impl<V: Clone> Coordinates<V> {
    /// Adds a new point with the given components.
    pub fn try_add_point(&mut self, p: PointId, values: &[V]) -> Result<(), MeshSieveError> {
        if values.len() != self.dimension {
            return Err(MeshSieveError::SliceLengthMismatch {
                point: p,
                expected: self.dimension,
                found: values.len(),
            });
        }
        if self.atlas.contains_key(&p) {
            return Err(MeshSieveError::DuplicatePoint(p));
        }
        self.atlas.insert(p, self.data.len());
        self.data.extend_from_slice(values);
        Ok(())
    }

    /// A copy with every point sent through `f`, in ascending source order.
    /// Points mapped to `None` are dropped.
    pub fn try_map_points<F>(&self, mut f: F) -> Result<Self, MeshSieveError>
    where
        F: FnMut(PointId) -> Option<PointId>,
    {
        let mut out = Self {
            dimension: self.dimension,
            atlas: BTreeMap::new(),
            data: Vec::with_capacity(self.data.len()),
        };
        for (&p, &off) in &self.atlas {
            if let Some(q) = f(p) {
                out.try_add_point(q, &self.data[off..off + self.dimension])?;
            }
        }
        Ok(out)
    }
}
