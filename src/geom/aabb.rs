use crate::float_types::Real;
use nalgebra::Point3;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
    pub mins: Point3<Real>,
    pub maxs: Point3<Real>,
}

impl Aabb3 {
    #[inline]
    pub const fn new(mins: Point3<Real>, maxs: Point3<Real>) -> Self {
        Self { mins, maxs }
    }

    /// Inverted box ready to accumulate points.
    #[inline]
    pub fn empty() -> Self {
        Self {
            mins: Point3::new(Real::INFINITY, Real::INFINITY, Real::INFINITY),
            maxs: Point3::new(Real::NEG_INFINITY, Real::NEG_INFINITY, Real::NEG_INFINITY),
        }
    }

    /// True once at least one point has been accumulated.
    #[inline]
    pub fn is_valid(&self) -> bool {
        (0..3).all(|i| self.mins[i] <= self.maxs[i])
    }

    #[inline]
    pub fn add_point(&mut self, p: &Point3<Real>) {
        for i in 0..3 {
            if p[i] < self.mins[i] {
                self.mins[i] = p[i];
            }
            if p[i] > self.maxs[i] {
                self.maxs[i] = p[i];
            }
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        out.add_point(&other.mins);
        out.add_point(&other.maxs);
        out
    }

    pub fn grow(&self, amount: Real) -> Self {
        Self {
            mins: Point3::new(
                self.mins.x - amount,
                self.mins.y - amount,
                self.mins.z - amount,
            ),
            maxs: Point3::new(
                self.maxs.x + amount,
                self.maxs.y + amount,
                self.maxs.z + amount,
            ),
        }
    }

    #[inline]
    pub fn extent(&self, axis: usize) -> Real {
        self.maxs[axis] - self.mins[axis]
    }

    pub fn volume(&self) -> Real {
        if !self.is_valid() {
            return 0.0;
        }
        self.extent(0) * self.extent(1) * self.extent(2)
    }

    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.maxs.x >= other.mins.x
            && self.mins.x <= other.maxs.x
            && self.maxs.y >= other.mins.y
            && self.mins.y <= other.maxs.y
            && self.maxs.z >= other.mins.z
            && self.mins.z <= other.maxs.z
    }

    /// True when the boxes are separated or share only a face, edge or
    /// corner.
    #[inline]
    pub fn disjoint_or_touching(&self, other: &Self) -> bool {
        (0..3).any(|i| self.maxs[i] <= other.mins[i] || self.mins[i] >= other.maxs[i])
    }
}
