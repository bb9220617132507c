//! Axis-aligned bounding boxes and octant classification.

use crate::error::GravityError;
use crate::particle::Vec3;

/// An axis-aligned box in 3D space, half-open on the upper bound per axis
/// (`x ∈ [min.x, max.x)` and likewise for y and z).
///
/// Always constructed from the componentwise extremes of two corner vectors,
/// so `min <= max` holds on every axis regardless of argument order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    min: Vec3,
    max: Vec3,
}

impl Domain {
    /// Builds the domain spanned by two corner vectors, in either order.
    pub fn new(v1: Vec3, v2: Vec3) -> Self {
        Self {
            min: v1.inf(&v2),
            max: v1.sup(&v2),
        }
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Tests whether a position lies within `[min, max)` on all three axes.
    pub fn contains(&self, pos: Vec3) -> bool {
        let in_x = pos.x >= self.min.x && pos.x < self.max.x;
        let in_y = pos.y >= self.min.y && pos.y < self.max.y;
        let in_z = pos.z >= self.min.z && pos.z < self.max.z;
        in_x && in_y && in_z
    }

    fn midpoint(&self) -> Vec3 {
        self.min + (self.max - self.min) * 0.5
    }

    /// Classifies a position into one of the 8 octants around the domain
    /// midpoint, with `>= mid` counting as the upper half on each axis.
    ///
    /// The index encodes (z, y, x) most-to-least significant with the upper
    /// half as 0: octant 0 is (z≥, y≥, x≥), 1 is (z≥, y≥, x<), 2 is
    /// (z≥, y<, x≥), continuing through 7 = (z<, y<, x<). This ordering is
    /// the inverse of [`Domain::octant_domain`].
    pub fn octant_index(&self, pos: Vec3) -> usize {
        let mid = self.midpoint();
        let mut index = 0;
        if pos.x < mid.x {
            index |= 1;
        }
        if pos.y < mid.y {
            index |= 2;
        }
        if pos.z < mid.z {
            index |= 4;
        }
        index
    }

    /// Returns the sub-box for an octant index, spanning the midpoint and the
    /// outer corner that [`Domain::octant_index`] maps to that index.
    pub fn octant_domain(&self, index: usize) -> Result<Domain, GravityError> {
        if index >= 8 {
            return Err(GravityError::InvalidOctant(index));
        }
        let mid = self.midpoint();
        let outer = Vec3::new(
            if index & 1 != 0 { self.min.x } else { self.max.x },
            if index & 2 != 0 { self.min.y } else { self.max.y },
            if index & 4 != 0 { self.min.z } else { self.max.z },
        );
        Ok(Domain::new(mid, outer))
    }
}
