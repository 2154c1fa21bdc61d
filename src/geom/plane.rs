//! Plane representation and the interning store shared across a build.

use crate::float_types::{Real, DIST_EPSILON, NORMAL_EPSILON};
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use parking_lot::RwLock;

/// Dominant-axis classification of a plane normal. Axial types order before
/// the any-* types; callers rely on that to prefer axis-aligned splitters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlaneType {
    X,
    Y,
    Z,
    AnyX,
    AnyY,
    AnyZ,
}

impl PlaneType {
    #[inline]
    pub fn is_axial(&self) -> bool {
        *self <= PlaneType::Z
    }

    /// Dominant axis index.
    #[inline]
    pub fn axis(&self) -> usize {
        match self {
            PlaneType::X | PlaneType::AnyX => 0,
            PlaneType::Y | PlaneType::AnyY => 1,
            PlaneType::Z | PlaneType::AnyZ => 2,
        }
    }

    fn for_normal(normal: &Vector3<Real>) -> Self {
        if normal.x == 1.0 || normal.x == -1.0 {
            PlaneType::X
        } else if normal.y == 1.0 || normal.y == -1.0 {
            PlaneType::Y
        } else if normal.z == 1.0 || normal.z == -1.0 {
            PlaneType::Z
        } else {
            let ax = normal.x.abs();
            let ay = normal.y.abs();
            let az = normal.z.abs();
            if ax >= ay && ax >= az {
                PlaneType::AnyX
            } else if ay >= az {
                PlaneType::AnyY
            } else {
                PlaneType::AnyZ
            }
        }
    }
}

/// Plane in point-normal form: `normal · p == dist`.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    normal: Vector3<Real>,
    dist: Real,
    ptype: PlaneType,
}

impl Plane {
    /// Builds a plane from a (not necessarily unit) normal and distance.
    pub fn new(normal: Vector3<Real>, dist: Real) -> Self {
        let len = normal.norm();
        debug_assert!(len > 0.0, "degenerate plane normal");
        let inv = 1.0 / len;
        let normal = normal * inv;
        Self {
            normal,
            dist: dist * inv,
            ptype: PlaneType::for_normal(&normal),
        }
    }

    #[inline]
    pub fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    #[inline]
    pub fn dist(&self) -> Real {
        self.dist
    }

    #[inline]
    pub fn plane_type(&self) -> PlaneType {
        self.ptype
    }

    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            dist: -self.dist,
            ptype: PlaneType::for_normal(&(-self.normal)),
        }
    }

    /// Signed distance of `point` above the plane.
    #[inline]
    pub fn distance_to(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.dist
    }

    /// A plane pair's canonical orientation: the dominant normal component
    /// points in the positive direction of its axis.
    pub fn is_positive_facing(&self) -> bool {
        self.normal[self.ptype.axis()] > 0.0
    }

    fn epsilon_eq(&self, other: &Plane) -> bool {
        (self.dist - other.dist).abs() <= DIST_EPSILON
            && (self.normal.x - other.normal.x).abs() <= NORMAL_EPSILON
            && (self.normal.y - other.normal.y).abs() <= NORMAL_EPSILON
            && (self.normal.z - other.normal.z).abs() <= NORMAL_EPSILON
    }
}

// Bucket width for the interner's distance hash. Coarse enough that an
// epsilon-equal plane can only land in the same or an adjacent bucket.
const BUCKET_WIDTH: Real = 8.0;

#[inline]
fn bucket_key(dist: Real) -> i64 {
    (dist.abs() / BUCKET_WIDTH).floor() as i64
}

#[derive(Default)]
struct StoreInner {
    planes: Vec<Plane>,
    buckets: HashMap<i64, Vec<usize>>,
}

impl StoreInner {
    fn find(&self, plane: &Plane) -> Option<usize> {
        let key = bucket_key(plane.dist());
        for k in (key - 1)..=(key + 1) {
            if let Some(ids) = self.buckets.get(&k) {
                for &id in ids {
                    if self.planes[id].epsilon_eq(plane) {
                        return Some(id);
                    }
                }
            }
        }
        None
    }

    fn insert_pair(&mut self, plane: &Plane) -> usize {
        let (positive, input_was_flipped) = if plane.is_positive_facing() {
            (*plane, false)
        } else {
            (plane.flipped(), true)
        };

        let base = self.planes.len();
        self.planes.push(positive);
        self.planes.push(positive.flipped());
        for id in base..base + 2 {
            let key = bucket_key(self.planes[id].dist());
            self.buckets.entry(key).or_default().push(id);
        }

        if input_was_flipped {
            base + 1
        } else {
            base
        }
    }
}

/// Interner mapping plane equations to stable ids.
///
/// A plane and its reverse occupy consecutive ids differing only in the low
/// bit, and the even id always faces the positive direction of its dominant
/// axis. Ids never move for the lifetime of the store, so they can be held
/// across the whole build; lookups that race an insertion from a sibling
/// task observe the entry once `add_or_find` has returned.
#[derive(Default)]
pub struct PlaneStore {
    inner: RwLock<StoreInner>,
}

impl PlaneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the id of an existing plane matching `plane`, or interns a
    /// new pair and returns the id whose orientation matches.
    pub fn add_or_find(&self, plane: &Plane) -> usize {
        let mut inner = self.inner.write();
        if let Some(id) = inner.find(plane) {
            return id;
        }
        inner.insert_pair(plane)
    }

    pub fn get(&self, id: usize) -> Plane {
        self.inner.read().planes[id]
    }

    /// The positive-facing plane of `id`'s pair.
    pub fn get_positive(&self, id: usize) -> Plane {
        self.get(id & !1)
    }
}
