//! Splitting brushes against interned planes.

use crate::brush::{Brush, MajoritySide, Side};
use crate::bsp::{BspContext, BspStats};
use crate::float_types::{Real, PLANESIDE_EPSILON, SPLIT_SLOP};
use crate::geom::{Aabb3, Plane, Winding};
use nalgebra::Point3;

pub const PSIDE_FRONT: u8 = 1;
pub const PSIDE_BACK: u8 = 2;
pub const PSIDE_BOTH: u8 = PSIDE_FRONT | PSIDE_BACK;
/// OR'ed into the classification when one of the brush's own sides lies on
/// the tested plane.
pub const PSIDE_FACING: u8 = 4;

/// Returns `PSIDE_FRONT`, `PSIDE_BACK`, or `PSIDE_BOTH`.
pub fn box_on_plane_side(bounds: &Aabb3, plane: &Plane) -> u8 {
    // axial planes are easy
    if plane.plane_type().is_axial() {
        let axis = plane.plane_type().axis();
        let mut side = 0;
        if bounds.maxs[axis] > plane.dist() + PLANESIDE_EPSILON {
            side |= PSIDE_FRONT;
        }
        if bounds.mins[axis] < plane.dist() - PLANESIDE_EPSILON {
            side |= PSIDE_BACK;
        }
        return side;
    }

    // create the proper leading and trailing verts for the box
    let normal = plane.normal();
    let mut corners = [Point3::origin(); 2];
    for i in 0..3 {
        if normal[i] < 0.0 {
            corners[0][i] = bounds.mins[i];
            corners[1][i] = bounds.maxs[i];
        } else {
            corners[1][i] = bounds.mins[i];
            corners[0][i] = bounds.maxs[i];
        }
    }

    let dist1 = plane.distance_to(&corners[0]);
    let dist2 = plane.distance_to(&corners[1]);
    let mut side = 0;
    if dist1 >= PLANESIDE_EPSILON {
        side = PSIDE_FRONT;
    }
    if dist2 < PLANESIDE_EPSILON {
        side |= PSIDE_BACK;
    }
    side
}

/// Split statistics gathered while evaluating a candidate plane against one
/// brush.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaneTestMetrics {
    /// Visible, not-on-node windings the plane would cut.
    pub splits: usize,
    /// A hint surface would be cut.
    pub hintsplit: bool,
    /// Brushes that just barely poke through the plane.
    pub epsilonbrush: usize,
}

impl BspContext<'_> {
    /// Classifies `brush` against plane `planenum` (`PSIDE_*` bits). When
    /// `metrics` is given and the brush straddles the plane, split costs
    /// are accumulated into it.
    pub fn test_brush_to_planenum(
        &self,
        brush: &Brush,
        planenum: usize,
        metrics: Option<&mut PlaneTestMetrics>,
    ) -> u8 {
        // if the brush actually uses the planenum,
        // we can tell the side for sure
        for side in &brush.sides {
            if side.planenum == planenum {
                return PSIDE_BACK | PSIDE_FACING;
            }
            if side.planenum == (planenum ^ 1) {
                return PSIDE_FRONT | PSIDE_FACING;
            }
        }

        let plane = self.planes.get(planenum);
        let s = box_on_plane_side(&brush.bounds, &plane);
        if s != PSIDE_BOTH {
            return s;
        }

        if let Some(metrics) = metrics {
            // count the visible faces the plane would cut
            let mut d_front: Real = 0.0;
            let mut d_back: Real = 0.0;

            for side in &brush.sides {
                if side.onnode {
                    continue; // on node, don't worry about splits
                }
                if !side.visible {
                    continue; // we don't care about non-visible
                }
                let Some(w) = &side.winding else { continue };
                let mut front = false;
                let mut back = false;
                for point in w.iter() {
                    let d = plane.distance_to(point);
                    if d > d_front {
                        d_front = d;
                    }
                    if d < d_back {
                        d_back = d;
                    }
                    if d > SPLIT_SLOP {
                        front = true;
                    }
                    if d < -SPLIT_SLOP {
                        back = true;
                    }
                }
                if front && back && !side.hintskip {
                    metrics.splits += 1;
                    if side.hint {
                        metrics.hintsplit = true;
                    }
                }
            }

            if (d_front > 0.0 && d_front < 1.0) || (d_back < 0.0 && d_back > -1.0) {
                metrics.epsilonbrush += 1;
            }
        }

        s
    }

    /// Splits `brush` by plane `planenum`, consuming it. Either returned
    /// piece may be absent; a brush that does not truly cross the plane is
    /// routed whole to one side.
    pub fn split_brush(
        &self,
        brush: Brush,
        planenum: usize,
        stats: &BspStats,
    ) -> (Option<Brush>, Option<Brush>) {
        let split = self.planes.get(planenum);

        // check all points
        let mut d_front: Real = 0.0;
        let mut d_back: Real = 0.0;
        for side in &brush.sides {
            let Some(w) = &side.winding else { continue };
            for point in w.iter() {
                let d = split.distance_to(point);
                if d > 0.0 && d > d_front {
                    d_front = d;
                }
                if d < 0.0 && d < d_back {
                    d_back = d;
                }
            }
        }
        if d_front < SPLIT_SLOP {
            // only on back
            return (None, Some(brush));
        }
        if d_back > -SPLIT_SLOP {
            // only on front
            return (Some(brush), None);
        }

        // create a new winding from the split plane
        let mut w = Some(Winding::base_for_plane(&split, self.base_extent()));
        for side in &brush.sides {
            let Some(cur) = w.take() else { break };
            w = cur.clip_back(&self.planes.get(side.planenum), 0.0);
        }

        let midwinding = match w {
            Some(w) if !w.is_tiny_default() => w,
            _ => {
                // the brush isn't really split
                return match brush.mostly_on_side(&split) {
                    MajoritySide::Front => (Some(brush), None),
                    MajoritySide::Back => (None, Some(brush)),
                };
            }
        };

        if midwinding.is_huge(self.options.worldextent) {
            log::warn!("huge winding near {:?}", midwinding.center());
        }

        // start with 2 empty brushes and distribute the clipped windings
        let mut pieces = [Self::split_shell(&brush), Self::split_shell(&brush)];

        for side in &brush.sides {
            let Some(win) = &side.winding else { continue };
            let clipped = win.clip(&split, 0.0);
            for (piece, part) in pieces.iter_mut().zip([clipped.0, clipped.1]) {
                if let Some(part) = part {
                    let mut copy = side.clone();
                    copy.winding = Some(part);
                    piece.sides.push(copy);
                }
            }
        }

        // see if we have valid polygons on both sides
        let mut result: [Option<Brush>; 2] = pieces.map(Some);
        for slot in result.iter_mut() {
            let keep = match slot.as_mut() {
                Some(piece) => {
                    let mut bogus = false;
                    if !piece.update_bounds(false) {
                        BspStats::bump(&stats.bogus_brushes);
                        bogus = true;
                    } else {
                        for axis in 0..3 {
                            if piece.bounds.mins[axis] < -self.options.worldextent
                                || piece.bounds.maxs[axis] > self.options.worldextent
                            {
                                BspStats::bump(&stats.bogus_brushes);
                                bogus = true;
                                break;
                            }
                        }
                    }
                    piece.sides.len() >= 3 && !bogus
                }
                None => true,
            };
            if !keep {
                *slot = None;
            }
        }

        match (&result[0], &result[1]) {
            (None, None) => {
                BspStats::bump(&stats.brushes_removed);
                return (None, None);
            }
            (Some(_), None) => {
                BspStats::bump(&stats.brushes_onesided);
                return (Some(brush), None);
            }
            (None, Some(_)) => {
                BspStats::bump(&stats.brushes_onesided);
                return (None, Some(brush));
            }
            _ => {}
        }

        // add the midwinding to both sides
        for (i, slot) in result.iter_mut().enumerate() {
            let Some(piece) = slot else { continue };
            let on_front = i == 0;

            let mut mid = Side::new(planenum ^ i ^ 1);
            // the face touching the plane carries the normal opposite the
            // side it caps; texinfo None marks it as skip
            mid.winding = Some(if on_front {
                midwinding.flipped()
            } else {
                midwinding.clone()
            });
            mid.visible = false;
            mid.onnode = true;
            piece.sides.push(mid);
        }

        for slot in result.iter_mut() {
            let too_small = slot
                .as_ref()
                .is_some_and(|piece| piece.volume(self.planes) < self.options.microvolume);
            if too_small {
                *slot = None;
                BspStats::bump(&stats.tiny_volumes);
            }
        }

        let [front, back] = result;
        (front, back)
    }

    /// Verifies that splitting `volume` on `planenum` leaves a real volume
    /// on both sides.
    pub(crate) fn check_plane_against_volume(
        &self,
        planenum: usize,
        volume: &Brush,
        stats: &BspStats,
    ) -> bool {
        let (front, back) = self.split_brush(volume.clone(), planenum, stats);
        front.is_some() && back.is_some()
    }

    /// Fresh fragment carrying everything of `brush` except its geometry.
    fn split_shell(brush: &Brush) -> Brush {
        Brush {
            sides: Vec::with_capacity(brush.sides.len() + 1),
            bounds: Aabb3::empty(),
            contents: brush.contents,
            mapbrush: brush.mapbrush,
            original: brush.original,
            side: 0,
            testside: 0,
        }
    }
}
