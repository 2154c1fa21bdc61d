//! Convex brushes and their planar sides.

use crate::contents::ContentFlags;
use crate::float_types::Real;
use crate::geom::{Aabb3, Plane, PlaneStore, Winding};
use nalgebra::Vector3;

/// Which half-space holds the bulk of a brush.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MajoritySide {
    Front,
    Back,
}

/// One planar face of a brush.
#[derive(Clone, Debug)]
pub struct Side {
    /// Interned plane id; the normal points out of the brush.
    pub planenum: usize,
    pub winding: Option<Winding>,
    /// Index into the caller's texinfo table. `None` is the compiler's own
    /// "skip" tag, used for faces introduced by splits.
    pub texinfo: Option<usize>,
    /// Bevel sides exist only for collision expansion and never split.
    pub bevel: bool,
    pub visible: bool,
    pub hint: bool,
    pub hintskip: bool,
    /// Consumed as a splitter by an ancestor node.
    pub onnode: bool,
    /// Scratch, meaningful only within a single plane-selection pass.
    pub tested: bool,
}

impl Side {
    pub fn new(planenum: usize) -> Self {
        Self {
            planenum,
            winding: None,
            texinfo: None,
            bevel: false,
            visible: true,
            hint: false,
            hintskip: false,
            onnode: false,
            tested: false,
        }
    }
}

/// Convex volume bounded by its sides' planes. Each side's winding is the
/// face of the polytope lying on that side's plane, and `bounds` is the
/// envelope of all winding vertices.
#[derive(Clone, Debug)]
pub struct Brush {
    pub sides: Vec<Side>,
    pub bounds: Aabb3,
    pub contents: ContentFlags,
    /// Which source map brush this came from.
    pub mapbrush: usize,
    /// Index of the pre-split ancestor in the build's input list.
    pub original: Option<usize>,
    /// Scratch classification used while separating a node's brush list.
    pub side: u8,
    pub testside: u8,
}

impl Brush {
    pub fn new(contents: ContentFlags) -> Self {
        Self {
            sides: Vec::new(),
            bounds: Aabb3::empty(),
            contents,
            mapbrush: 0,
            original: None,
            side: 0,
            testside: 0,
        }
    }

    /// Six-sided axial brush covering `bounds`. The six axis planes are
    /// interned through `planes`; `extent` sizes the base windings.
    pub fn from_bounds(
        bounds: &Aabb3,
        planes: &PlaneStore,
        extent: Real,
        contents: ContentFlags,
    ) -> Self {
        let mut brush = Brush::new(contents);
        brush.sides.reserve(6);
        for i in 0..3 {
            let mut normal = Vector3::zeros();
            normal[i] = 1.0;
            brush
                .sides
                .push(Side::new(planes.add_or_find(&Plane::new(normal, bounds.maxs[i]))));

            let mut normal = Vector3::zeros();
            normal[i] = -1.0;
            brush
                .sides
                .push(Side::new(planes.add_or_find(&Plane::new(normal, -bounds.mins[i]))));
        }
        brush.create_windings(planes, extent);
        brush
    }

    /// Regenerates every side's winding: the side plane's base quad clipped
    /// behind all the other side planes. Sides whose winding vanishes keep
    /// `None`.
    pub fn create_windings(&mut self, planes: &PlaneStore, extent: Real) {
        for i in 0..self.sides.len() {
            let plane = planes.get(self.sides[i].planenum);
            let mut w = Some(Winding::base_for_plane(&plane, extent));
            for j in 0..self.sides.len() {
                if i == j {
                    continue;
                }
                let Some(cur) = w.take() else { break };
                w = cur.clip_back(&planes.get(self.sides[j].planenum), 0.0);
            }
            self.sides[i].winding = w;
        }
        self.update_bounds(false);
    }

    /// Recomputes `bounds` from winding vertices. Returns false when fewer
    /// than three sides carry windings; with `validate`, also when any
    /// non-bevel side lost its winding.
    pub fn update_bounds(&mut self, validate: bool) -> bool {
        self.bounds = Aabb3::empty();
        let mut live = 0;
        for side in &self.sides {
            match &side.winding {
                Some(w) if !w.is_empty() => {
                    w.extend_bounds(&mut self.bounds);
                    live += 1;
                }
                _ => {
                    if validate && !side.bevel {
                        return false;
                    }
                }
            }
        }
        live >= 3
    }

    /// Volume in world units cubed: tetrahedra from an arbitrary corner to
    /// every face.
    pub fn volume(&self, planes: &PlaneStore) -> Real {
        // grab the first valid point as the corner
        let Some(corner) = self
            .sides
            .iter()
            .find_map(|s| s.winding.as_ref().and_then(|w| w.points.first()))
            .copied()
        else {
            return 0.0;
        };

        let mut volume = 0.0;
        for side in &self.sides {
            let Some(w) = &side.winding else { continue };
            if w.is_empty() {
                continue;
            }
            let plane = planes.get(side.planenum);
            let d = -plane.distance_to(&corner);
            volume += d * w.area();
        }
        volume / 3.0
    }

    /// Which side of `plane` carries the brush's farthest vertex.
    pub fn mostly_on_side(&self, plane: &Plane) -> MajoritySide {
        let mut max = 0.0;
        let mut side = MajoritySide::Front;
        for face in &self.sides {
            let Some(w) = &face.winding else { continue };
            for point in w.iter() {
                let d = plane.distance_to(point);
                if d > max {
                    max = d;
                    side = MajoritySide::Front;
                }
                if -d > max {
                    max = -d;
                    side = MajoritySide::Back;
                }
            }
        }
        side
    }

    /// True if the two brushes definitely do not intersect. There are
    /// false negatives for some non-axial combinations.
    pub fn disjoint(&self, other: &Brush) -> bool {
        if self.bounds.disjoint_or_touching(&other.bounds) {
            // bounding boxes don't overlap
            return true;
        }

        // opposing planes prove the brushes can only touch
        for a in &self.sides {
            for b in &other.sides {
                if a.planenum == (b.planenum ^ 1) {
                    return true;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contents::{ContentFlags, ContentKind};
    use nalgebra::Point3;

    const EXTENT: Real = 65536.0 * 4.0;

    fn cube(planes: &PlaneStore, min: Real, max: Real) -> Brush {
        let bounds = Aabb3::new(Point3::new(min, min, min), Point3::new(max, max, max));
        Brush::from_bounds(&bounds, planes, EXTENT, ContentFlags::new(ContentKind::Solid))
    }

    #[test]
    fn from_bounds_builds_closed_box() {
        let planes = PlaneStore::new();
        let brush = cube(&planes, 0.0, 64.0);
        assert_eq!(brush.sides.len(), 6);
        assert!(brush.sides.iter().all(|s| s.winding.is_some()));
        assert_eq!(brush.bounds.mins, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(brush.bounds.maxs, Point3::new(64.0, 64.0, 64.0));
    }

    #[test]
    fn volume_of_cube() {
        let planes = PlaneStore::new();
        let brush = cube(&planes, 0.0, 64.0);
        assert!((brush.volume(&planes) - 64.0 * 64.0 * 64.0).abs() < 1e-6);
    }

    #[test]
    fn separated_cubes_are_disjoint_by_bounds() {
        let planes = PlaneStore::new();
        let a = cube(&planes, 0.0, 64.0);
        let b = Brush::from_bounds(
            &Aabb3::new(Point3::new(65.0, 0.0, 0.0), Point3::new(129.0, 64.0, 64.0)),
            &planes,
            EXTENT,
            ContentFlags::new(ContentKind::Solid),
        );
        assert!(a.disjoint(&b));
    }

    #[test]
    fn opposing_plane_pair_proves_disjointness() {
        let planes = PlaneStore::new();
        let a = cube(&planes, 0.0, 64.0);
        // shares the x = 64 plane with `a`, seen from the other side
        let mut b = Brush::from_bounds(
            &Aabb3::new(Point3::new(64.0, 0.0, 0.0), Point3::new(128.0, 64.0, 64.0)),
            &planes,
            EXTENT,
            ContentFlags::new(ContentKind::Solid),
        );
        assert!(a
            .sides
            .iter()
            .any(|sa| b.sides.iter().any(|sb| sa.planenum == (sb.planenum ^ 1))));
        // force the bounds to overlap so only the plane test can decide
        b.bounds = Aabb3::new(Point3::new(32.0, 0.0, 0.0), b.bounds.maxs);
        assert!(a.disjoint(&b));
    }

    #[test]
    fn overlapping_cubes_are_not_disjoint() {
        let planes = PlaneStore::new();
        let a = cube(&planes, 0.0, 64.0);
        let b = cube(&planes, 32.0, 96.0);
        assert!(!a.disjoint(&b));
    }

    #[test]
    fn mostly_on_side_picks_heavier_half() {
        let planes = PlaneStore::new();
        let brush = cube(&planes, 0.0, 64.0);
        let plane = Plane::new(Vector3::x(), 8.0);
        assert_eq!(brush.mostly_on_side(&plane), MajoritySide::Front);
        let plane = Plane::new(Vector3::x(), 56.0);
        assert_eq!(brush.mostly_on_side(&plane), MajoritySide::Back);
    }
}
