//! Arrow orientations for cones, in the DMPlex convention.
//!
//! A cone arrow `parent -> child` carries a [`ConeOrientation`] telling how
//! the parent sees the child's own vertex cycle:
//!
//! | value      | meaning                                   |
//! |------------|-------------------------------------------|
//! | `o >= 0`   | rotation: start `o` places further along  |
//! | `o < 0`    | reflection: walk backwards from `-(o+1)`   |
//!
//! For an edge (a 2-cycle) the only non-identity orientation found by
//! [`ConeOrientation::between`] is rotation `1`, i.e. the single "flip" bit.
//! Vertex cones of uninterpolated cells always use the identity.

use core::fmt::{Debug, Formatter};

/// Orientation of one cone arrow.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[repr(transparent)]
pub struct ConeOrientation(pub i32);

impl Debug for ConeOrientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ConeOrientation").field(&self.0).finish()
    }
}

impl ConeOrientation {
    pub const IDENTITY: Self = ConeOrientation(0);

    /// Rotation by `k` places.
    #[inline]
    pub const fn rotation(k: usize) -> Self {
        ConeOrientation(k as i32)
    }

    /// Reflection anchored at position `r`.
    #[inline]
    pub const fn reflection(r: usize) -> Self {
        ConeOrientation(-(r as i32) - 1)
    }

    #[inline]
    pub const fn is_reflection(self) -> bool {
        self.0 < 0
    }

    /// Reorder a stored cycle the way the parent of this arrow sees it.
    pub fn apply<T: Copy>(self, stored: &[T]) -> Vec<T> {
        let n = stored.len();
        if n == 0 {
            return Vec::new();
        }
        if self.0 >= 0 {
            let o = self.0 as usize % n;
            (0..n).map(|i| stored[(i + o) % n]).collect()
        } else {
            let r = (-(self.0 + 1)) as usize % n;
            (0..n).map(|i| stored[(r + n - i) % n]).collect()
        }
    }

    /// Orientation turning `stored` into `seen`, if `seen` is a rotation or
    /// reflection of `stored`. Rotations are tried before reflections.
    pub fn between<T: Copy + Eq>(stored: &[T], seen: &[T]) -> Option<Self> {
        let n = stored.len();
        if n != seen.len() {
            return None;
        }
        if n == 0 {
            return Some(Self::IDENTITY);
        }
        (0..n)
            .map(Self::rotation)
            .chain((0..n).map(Self::reflection))
            .find(|o| o.apply(stored) == seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_keeps_order() {
        assert_eq!(ConeOrientation::IDENTITY.apply(&[4, 5, 6, 7]), vec![4, 5, 6, 7]);
    }

    #[test]
    fn rotation_and_reflection() {
        let quad = [10, 11, 12, 13];
        assert_eq!(ConeOrientation::rotation(1).apply(&quad), vec![11, 12, 13, 10]);
        assert_eq!(ConeOrientation::reflection(0).apply(&quad), vec![10, 13, 12, 11]);
        assert_eq!(ConeOrientation::reflection(2).apply(&quad), vec![12, 11, 10, 13]);
        assert!(ConeOrientation::reflection(2).is_reflection());
    }

    #[test]
    fn edge_flip_is_rotation_one() {
        let o = ConeOrientation::between(&[3, 8], &[8, 3]).unwrap();
        assert_eq!(o, ConeOrientation::rotation(1));
        assert_eq!(o.apply(&[3, 8]), vec![8, 3]);
    }

    #[test]
    fn between_recovers_every_dihedral_element() {
        let tri = [1, 2, 3];
        for o in (0..3)
            .map(ConeOrientation::rotation)
            .chain((0..3).map(ConeOrientation::reflection))
        {
            let seen = o.apply(&tri);
            let found = ConeOrientation::between(&tri, &seen).unwrap();
            assert_eq!(found.apply(&tri), seen);
        }
        assert_eq!(ConeOrientation::between(&tri, &[1, 2, 4]), None);
    }
}
