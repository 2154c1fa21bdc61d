//! Ordered convex polygons lying in a plane.

use crate::float_types::{Real, TINY_EDGE_LENGTH};
use crate::geom::aabb::Aabb3;
use crate::geom::plane::Plane;
use nalgebra::{Point3, Vector3};

const SIDE_FRONT: u8 = 0;
const SIDE_BACK: u8 = 1;
const SIDE_ON: u8 = 2;

/// Ordered convex polygon in 3D.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Winding {
    pub points: Vec<Point3<Real>>,
}

impl Winding {
    pub fn new(points: Vec<Point3<Real>>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point3<Real>> {
        self.points.iter()
    }

    /// A quad lying in `plane`, reaching `extent` units out in both tangent
    /// directions. Every face winding starts from one of these and gets
    /// clipped down.
    pub fn base_for_plane(plane: &Plane, extent: Real) -> Self {
        let normal = plane.normal();

        // pick an up vector not parallel to the normal
        let mut up = if plane.plane_type().axis() == 2 {
            Vector3::x()
        } else {
            Vector3::z()
        };
        up -= normal * up.dot(&normal);
        up.normalize_mut();

        let org = Point3::from(normal * plane.dist());
        let right = up.cross(&normal) * extent;
        let up = up * extent;

        Self {
            points: vec![
                org - right + up,
                org + right + up,
                org + right - up,
                org - right - up,
            ],
        }
    }

    /// Same polygon with reversed vertex order (facing the other way).
    pub fn flipped(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    pub fn area(&self) -> Real {
        let mut total = 0.0;
        for i in 2..self.points.len() {
            let d1 = self.points[i - 1] - self.points[0];
            let d2 = self.points[i] - self.points[0];
            total += d1.cross(&d2).norm() * 0.5;
        }
        total
    }

    pub fn center(&self) -> Point3<Real> {
        let mut sum = Vector3::zeros();
        for p in &self.points {
            sum += p.coords;
        }
        Point3::from(sum / self.points.len() as Real)
    }

    pub fn bounds(&self) -> Aabb3 {
        let mut out = Aabb3::empty();
        self.extend_bounds(&mut out);
        out
    }

    pub fn extend_bounds(&self, bounds: &mut Aabb3) {
        for p in &self.points {
            bounds.add_point(p);
        }
    }

    fn classify(&self, plane: &Plane, eps: Real) -> (Vec<Real>, Vec<u8>, [usize; 3]) {
        let mut dists = Vec::with_capacity(self.points.len());
        let mut sides = Vec::with_capacity(self.points.len());
        let mut counts = [0usize; 3];
        for p in &self.points {
            let d = plane.distance_to(p);
            let side = if d > eps {
                SIDE_FRONT
            } else if d < -eps {
                SIDE_BACK
            } else {
                SIDE_ON
            };
            counts[side as usize] += 1;
            dists.push(d);
            sides.push(side);
        }
        (dists, sides, counts)
    }

    /// The point where the edge from `p1` to `p2` crosses `plane`. Axial
    /// components are snapped to the plane distance to dodge round-off.
    fn edge_crossing(
        plane: &Plane,
        p1: &Point3<Real>,
        p2: &Point3<Real>,
        d1: Real,
        d2: Real,
    ) -> Point3<Real> {
        let dot = d1 / (d1 - d2);
        let normal = plane.normal();
        let mut mid = Point3::origin();
        for j in 0..3 {
            if normal[j] == 1.0 {
                mid[j] = plane.dist();
            } else if normal[j] == -1.0 {
                mid[j] = -plane.dist();
            } else {
                mid[j] = p1[j] + dot * (p2[j] - p1[j]);
            }
        }
        mid
    }

    /// Splits into the pieces in front of and behind `plane`. Points within
    /// `eps` of the plane belong to both pieces.
    pub fn clip(&self, plane: &Plane, eps: Real) -> (Option<Winding>, Option<Winding>) {
        let (dists, sides, counts) = self.classify(plane, eps);

        if counts[SIDE_FRONT as usize] == 0 {
            return (None, Some(self.clone()));
        }
        if counts[SIDE_BACK as usize] == 0 {
            return (Some(self.clone()), None);
        }

        let len = self.points.len();
        let mut front = Vec::with_capacity(len + 4);
        let mut back = Vec::with_capacity(len + 4);

        for i in 0..len {
            let p1 = self.points[i];
            match sides[i] {
                SIDE_ON => {
                    front.push(p1);
                    back.push(p1);
                    continue;
                }
                SIDE_FRONT => front.push(p1),
                _ => back.push(p1),
            }

            let j = (i + 1) % len;
            if sides[j] == SIDE_ON || sides[j] == sides[i] {
                continue;
            }
            let mid = Self::edge_crossing(plane, &p1, &self.points[j], dists[i], dists[j]);
            front.push(mid);
            back.push(mid);
        }

        (Some(Winding::new(front)), Some(Winding::new(back)))
    }

    /// Keeps only the piece behind `plane`; `None` when nothing remains.
    pub fn clip_back(&self, plane: &Plane, eps: Real) -> Option<Winding> {
        let (dists, sides, counts) = self.classify(plane, eps);

        if counts[SIDE_FRONT as usize] == 0 {
            return Some(self.clone());
        }
        if counts[SIDE_BACK as usize] == 0 {
            return None;
        }

        let len = self.points.len();
        let mut back = Vec::with_capacity(len + 4);
        for i in 0..len {
            let p1 = self.points[i];
            match sides[i] {
                SIDE_ON => {
                    back.push(p1);
                    continue;
                }
                SIDE_BACK => back.push(p1),
                _ => {}
            }

            let j = (i + 1) % len;
            if sides[j] == SIDE_ON || sides[j] == sides[i] {
                continue;
            }
            back.push(Self::edge_crossing(
                plane,
                &p1,
                &self.points[j],
                dists[i],
                dists[j],
            ));
        }

        Some(Winding::new(back))
    }

    /// True when vertex snapping would crunch the winding out of existence:
    /// fewer than three edges longer than `min_edge`.
    pub fn is_tiny(&self, min_edge: Real) -> bool {
        let mut edges = 0;
        for i in 0..self.points.len() {
            let j = (i + 1) % self.points.len();
            let len = (self.points[j] - self.points[i]).norm();
            if len > min_edge {
                edges += 1;
                if edges == 3 {
                    return false;
                }
            }
        }
        true
    }

    /// `is_tiny` with the default edge threshold.
    pub fn is_tiny_default(&self) -> bool {
        self.is_tiny(TINY_EDGE_LENGTH)
    }

    /// True when the winding still carries a point from its base quad.
    pub fn is_huge(&self, extent: Real) -> bool {
        self.points
            .iter()
            .any(|p| (0..3).any(|j| p[j].abs() > extent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_z0() -> Winding {
        Winding::new(vec![
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn clip_spanning_square() {
        let w = unit_square_z0();
        let plane = Plane::new(Vector3::x(), 0.0);
        let (front, back) = w.clip(&plane, 0.0);
        let front = front.unwrap();
        let back = back.unwrap();
        assert!(front.iter().all(|p| p.x >= -1e-9));
        assert!(back.iter().all(|p| p.x <= 1e-9));
        assert!((front.area() + back.area() - w.area()).abs() < 1e-9);
    }

    #[test]
    fn clip_one_sided() {
        let w = unit_square_z0();
        let plane = Plane::new(Vector3::x(), 5.0);
        let (front, back) = w.clip(&plane, 0.0);
        assert!(front.is_none());
        assert_eq!(back.unwrap(), w);
    }

    #[test]
    fn clip_back_keeps_coplanar() {
        let w = unit_square_z0();
        let plane = Plane::new(Vector3::z(), 0.0);
        // whole winding lies on the plane; nothing is in front
        assert_eq!(w.clip_back(&plane, 0.1).unwrap(), w);
    }

    #[test]
    fn base_winding_lies_in_plane() {
        let plane = Plane::new(Vector3::new(1.0, 2.0, 3.0).normalize(), 10.0);
        let w = Winding::base_for_plane(&plane, 1024.0);
        assert_eq!(w.len(), 4);
        for p in w.iter() {
            assert!(plane.distance_to(p).abs() < 1e-6);
        }
    }

    #[test]
    fn tiny_and_huge() {
        let w = unit_square_z0();
        assert!(!w.is_tiny_default());
        assert!(w.is_tiny(3.0));
        assert!(!w.is_huge(2.0));
        assert!(w.is_huge(0.5));
    }

    #[test]
    fn area_of_square() {
        assert!((unit_square_z0().area() - 4.0).abs() < 1e-12);
    }
}
