//! Split-plane selection and the recursive tree build.

use crate::brush::Brush;
use crate::bsp::split::{
    PlaneTestMetrics, PSIDE_BACK, PSIDE_BOTH, PSIDE_FACING, PSIDE_FRONT,
};
use crate::bsp::{BspContext, BspStats, Entity, Node, Tree};
use crate::errors::BspError;
use crate::float_types::{Real, NORMAL_EPSILON, SIDESPACE};
use crate::geom::{Aabb3, Plane};
use nalgebra::{Point3, Vector3};

/// Winning candidate of one selection round.
pub(crate) struct SelectedPlane {
    pub planenum: usize,
    /// The plane came from a detail pass, so the node is not needed for
    /// visibility.
    pub detail_separator: bool,
}

/// Split a bounding box by a plane. Each returned box fully contains the
/// part of the input on its side of the plane, so for a non-axial plane the
/// two boxes overlap.
fn divide_bounds(in_bounds: &Aabb3, split: &Plane) -> (Aabb3, Aabb3) {
    let mut front = *in_bounds;
    let mut back = *in_bounds;

    if split.plane_type().is_axial() {
        let axis = split.plane_type().axis();
        front.mins[axis] = split.dist();
        back.maxs[axis] = split.dist();
        return (front, back);
    }

    // make proper sloping cuts
    let normal = split.normal();
    for a in 0..3 {
        // parallel to this axis, no intersection to track
        if normal[a].abs() < NORMAL_EPSILON {
            continue;
        }
        let b = (a + 1) % 3;
        let c = (a + 2) % 3;

        let mut split_mins = in_bounds.maxs[a];
        let mut split_maxs = in_bounds.mins[a];
        let mut corner = Point3::origin();
        for i in 0..2 {
            corner[b] = if i == 0 {
                in_bounds.mins[b]
            } else {
                in_bounds.maxs[b]
            };
            for j in 0..2 {
                corner[c] = if j == 0 {
                    in_bounds.mins[c]
                } else {
                    in_bounds.maxs[c]
                };

                corner[a] = in_bounds.mins[a];
                let dist1 = split.distance_to(&corner);
                corner[a] = in_bounds.maxs[a];
                let dist2 = split.distance_to(&corner);

                let mut mid = in_bounds.maxs[a] - in_bounds.mins[a];
                mid *= dist1 / (dist1 - dist2);
                mid += in_bounds.mins[a];

                split_mins = mid.min(split_mins).max(in_bounds.mins[a]);
                split_maxs = mid.max(split_maxs).min(in_bounds.maxs[a]);
            }
        }
        if normal[a] > 0.0 {
            front.mins[a] = split_mins;
            back.maxs[a] = split_maxs;
        } else {
            back.mins[a] = split_mins;
            front.maxs[a] = split_maxs;
        }
    }

    (front, back)
}

/// A good split leaves equal volumes on front and back; a bad one puts all
/// of the volume on one side.
fn split_plane_metric(plane: &Plane, bounds: &Aabb3) -> Real {
    let (front, back) = divide_bounds(bounds, plane);
    (front.volume() - back.volume()).abs()
}

fn check_plane_against_parents(planenum: usize, parents: &[usize]) -> Result<(), BspError> {
    if parents.contains(&planenum) {
        return Err(BspError::TriedParentPlane(planenum));
    }
    Ok(())
}

impl BspContext<'_> {
    /// The coarse strategy: pick the plane that divides the node's bounds
    /// most evenly, without caring about brush statistics. Prefers axial
    /// candidates.
    fn choose_mid_plane_from_list(
        &self,
        brushes: &[Brush],
        volume: &Brush,
        bounds: &Aabb3,
        stats: &BspStats,
    ) -> Option<usize> {
        let mut best_axial_metric = Real::MAX;
        let mut best_axial_plane = None;
        let mut best_any_metric = Real::MAX;
        let mut best_any_plane = None;

        for brush in brushes {
            for side in &brush.sides {
                if side.bevel {
                    continue; // never use a bevel as a splitter
                }
                if side.onnode {
                    continue; // already a node splitter
                }

                let positive = side.planenum & !1;
                let plane = self.planes.get(positive);

                if !self.check_plane_against_volume(positive, volume, stats) {
                    continue; // would produce a tiny volume
                }

                let metric = split_plane_metric(&plane, bounds);

                if metric < best_any_metric {
                    best_any_metric = metric;
                    best_any_plane = Some(positive);
                }

                if plane.plane_type().is_axial() && metric < best_axial_metric {
                    best_axial_metric = metric;
                    best_axial_plane = Some(positive);
                }
            }
        }

        best_axial_plane.or(best_any_plane)
    }

    /// Chooses a plane to partition `brushes` with, writing each brush's
    /// classification against the winner into its scratch `side` field.
    /// `None` means no valid splitter remains and the node is a leaf.
    pub(crate) fn select_split_plane(
        &self,
        brushes: &mut [Brush],
        bounds: &Aabb3,
        volume: &Brush,
        parents: &[usize],
        forced_midsplit: Option<bool>,
        total_brushes: usize,
        stats: &BspStats,
    ) -> Result<Option<SelectedPlane>, BspError> {
        // no brushes left to split, so we can't use any plane
        if brushes.is_empty() {
            return Ok(None);
        }

        let mut midsplit = forced_midsplit;
        if midsplit.is_none() || midsplit == Some(true) {
            if midsplit.is_none() {
                if self.options.midsplitbrushfraction != 0.0 {
                    // how much of the map are we partitioning?
                    let fraction = brushes.len() as Real / total_brushes as Real;
                    midsplit = Some(fraction > self.options.midsplitbrushfraction);
                } else if self.options.maxnodesize >= 64.0 {
                    let maxnodesize = self.options.maxnodesize - self.options.epsilon;
                    midsplit = Some((0..3).any(|i| bounds.extent(i) > maxnodesize));
                } else {
                    midsplit = Some(false);
                }
            }

            if midsplit == Some(true) {
                if let Some(planenum) =
                    self.choose_mid_plane_from_list(brushes, volume, bounds, stats)
                {
                    BspStats::bump(&stats.midsplits);
                    for brush in brushes.iter_mut() {
                        brush.side = self.test_brush_to_planenum(brush, planenum, None);
                    }
                    return Ok(Some(SelectedPlane {
                        planenum,
                        detail_separator: false,
                    }));
                }
            }
        }

        let mut best: Option<(usize, usize)> = None;
        let mut best_value: i64 = -99999;
        let mut winning_pass = 0;

        // the search order goes: visible-structural, visible-detail,
        // nonvisible-structural, nonvisible-detail. If any valid plane is
        // available in a pass, no further passes will be tried.
        for pass in 0..4 {
            for bi in 0..brushes.len() {
                let is_detail = self.game.is_any_detail(&brushes[bi].contents);
                let detail_pass = (pass & 1) == 1;
                if detail_pass != is_detail {
                    continue;
                }

                for si in 0..brushes[bi].sides.len() {
                    let side = &brushes[bi].sides[si];
                    if side.bevel {
                        continue; // never use a bevel as a splitter
                    }
                    if side.winding.is_none() {
                        continue; // nothing visible, so it can't split
                    }
                    if side.onnode {
                        continue; // already a node splitter
                    }
                    if side.tested {
                        continue; // we already have metrics for this plane
                    }
                    if side.hintskip {
                        continue; // skip surfaces are never chosen
                    }
                    if side.visible != (pass < 2) {
                        continue; // only check visible faces on first pass
                    }
                    let side_hint = side.hint;

                    // always score the positive-facing plane
                    let positive = side.planenum & !1;
                    let plane = self.planes.get(positive);

                    check_plane_against_parents(positive, parents)?;

                    if !self.check_plane_against_volume(positive, volume, stats) {
                        continue; // would produce a tiny volume
                    }

                    let mut front: i64 = 0;
                    let mut back: i64 = 0;
                    let mut facing: i64 = 0;
                    let mut splits: usize = 0;
                    let mut epsilonbrush: usize = 0;
                    let mut hintsplit = false;

                    for ti in 0..brushes.len() {
                        let mut metrics = PlaneTestMetrics::default();
                        let s =
                            self.test_brush_to_planenum(&brushes[ti], positive, Some(&mut metrics));

                        if metrics.splits > 0 && (s & PSIDE_FACING) != 0 {
                            return Err(BspError::FacingWithSplits {
                                planenum: positive,
                                splits: metrics.splits,
                            });
                        }
                        splits += metrics.splits;
                        hintsplit |= metrics.hintsplit;
                        epsilonbrush += metrics.epsilonbrush;

                        brushes[ti].testside = s;
                        // a brush sharing this face means the plane never
                        // needs to be scored again within this pass
                        if (s & PSIDE_FACING) != 0 {
                            facing += 1;
                            for test_side in brushes[ti].sides.iter_mut() {
                                if (test_side.planenum & !1) == positive {
                                    test_side.tested = true;
                                }
                            }
                        }
                        if (s & PSIDE_FRONT) != 0 {
                            front += 1;
                        }
                        if (s & PSIDE_BACK) != 0 {
                            back += 1;
                        }
                    }

                    // give a value estimate for using this plane
                    let mut value = 5 * facing - 5 * splits as i64 - (front - back).abs();
                    if plane.plane_type().is_axial() {
                        value += 5; // axial is better
                    }
                    value -= epsilonbrush as i64 * 1000; // avoid!

                    // never split a hint side except with another hint
                    if hintsplit && !side_hint {
                        value = -9999999;
                    }

                    // save off the classifications so we don't recalculate
                    // them when we actually separate the brushes
                    if value > best_value {
                        best_value = value;
                        best = Some((bi, si));
                        winning_pass = pass;
                        for brush in brushes.iter_mut() {
                            brush.side = brush.testside;
                        }
                    }
                }
            }

            // if we found a good plane, don't bother trying other passes
            if best.is_some() {
                break;
            }
        }

        // clear all the tested flags we set
        for brush in brushes.iter_mut() {
            for side in brush.sides.iter_mut() {
                side.tested = false;
            }
        }

        let Some((bi, si)) = best else {
            return Ok(None);
        };

        if !brushes[bi].sides[si].visible {
            BspStats::bump(&stats.nonvis_nodes);
        }
        BspStats::bump(&stats.expensive_splits);

        Ok(Some(SelectedPlane {
            planenum: brushes[bi].sides[si].planenum & !1,
            detail_separator: winning_pass > 0,
        }))
    }

    /// Routes each pre-classified brush to the front or back list, splitting
    /// the ones that straddle the plane. Sides lying on the plane are marked
    /// `onnode` so they cannot be selected again deeper in the tree.
    pub(crate) fn split_brush_list(
        &self,
        brushes: Vec<Brush>,
        planenum: usize,
        stats: &BspStats,
    ) -> (Vec<Brush>, Vec<Brush>) {
        let mut front_list = Vec::new();
        let mut back_list = Vec::new();

        for mut brush in brushes {
            let sides = brush.side;

            if sides == PSIDE_BOTH {
                let (front, back) = self.split_brush(brush, planenum, stats);
                if let Some(front) = front {
                    front_list.push(front);
                }
                if let Some(back) = back {
                    back_list.push(back);
                }
                continue;
            }

            if (sides & PSIDE_FACING) != 0 {
                for side in brush.sides.iter_mut() {
                    if (side.planenum & !1) == planenum {
                        side.onnode = true;
                    }
                }
            }

            if (sides & PSIDE_FRONT) != 0 {
                front_list.push(brush);
                continue;
            }
            if (sides & PSIDE_BACK) != 0 {
                back_list.push(brush);
            }
        }

        (front_list, back_list)
    }

    pub(crate) fn leaf_node(&self, node: &mut Node, brushes: Vec<Brush>, stats: &BspStats) {
        node.contents = self.game.create_empty_contents();
        for brush in &brushes {
            node.contents = self.game.combine_contents(node.contents, brush.contents);
        }
        node.original_brushes = brushes.iter().filter_map(|b| b.original).collect();

        self.game.count_contents_in_stats(node.contents, &stats.leafstats);
    }

    /// Bounds of the two children: the node's bounds, tightened along the
    /// axis of an axial split plane.
    pub(crate) fn child_bounds(bounds: &Aabb3, plane: &Plane) -> (Aabb3, Aabb3) {
        let mut front = *bounds;
        let mut back = *bounds;
        for i in 0..3 {
            if plane.normal()[i] == 1.0 {
                front.mins[i] = plane.dist();
                back.maxs[i] = plane.dist();
                break;
            }
        }
        (front, back)
    }

    #[cfg(not(feature = "parallel"))]
    pub(crate) fn build_tree_r(
        &self,
        bounds: Aabb3,
        volume: Brush,
        mut brushes: Vec<Brush>,
        parents: &[usize],
        forced_midsplit: Option<bool>,
        total_brushes: usize,
        stats: &BspStats,
    ) -> Result<Node, BspError> {
        // find the best plane to use as a splitter
        let selected = self.select_split_plane(
            &mut brushes,
            &bounds,
            &volume,
            parents,
            forced_midsplit,
            total_brushes,
            stats,
        )?;

        let mut node = Node::new(bounds, self.game.create_empty_contents());
        let Some(selected) = selected else {
            BspStats::bump(&stats.leafs);
            self.leaf_node(&mut node, brushes, stats);
            return Ok(node);
        };

        BspStats::bump(&stats.nodes);
        debug_assert_eq!(selected.planenum & 1, 0);
        node.planenum = Some(selected.planenum);
        node.detail_separator = selected.detail_separator;

        let plane = self.planes.get(selected.planenum);
        let (front_brushes, back_brushes) =
            self.split_brush_list(brushes, selected.planenum, stats);
        let (front_bounds, back_bounds) = Self::child_bounds(&node.bounds, &plane);

        // the node's own volume is consumed to form the child volumes
        let (Some(front_volume), Some(back_volume)) =
            self.split_brush(volume, selected.planenum, stats)
        else {
            // the selected plane was verified against this volume
            unreachable!("split plane produced an empty child volume");
        };

        let mut child_parents = parents.to_vec();
        child_parents.push(selected.planenum);

        let front = self.build_tree_r(
            front_bounds,
            front_volume,
            front_brushes,
            &child_parents,
            forced_midsplit,
            total_brushes,
            stats,
        )?;
        let back = self.build_tree_r(
            back_bounds,
            back_volume,
            back_brushes,
            &child_parents,
            forced_midsplit,
            total_brushes,
            stats,
        )?;

        node.front = Some(Box::new(front));
        node.back = Some(Box::new(back));
        Ok(node)
    }

    fn degenerate_tree(&self, entity: &Entity) -> Tree {
        // an entity may carry no visible brushes (all clip, say) but still
        // needs a simple empty hull for the engine; the choice of plane is
        // mostly unimportant, but it must resolve in the store
        if self.planes.is_empty() {
            self.planes.add_or_find(&Plane::new(Vector3::x(), 0.0));
        }

        let empty = self.game.create_empty_contents();
        let mut head = Node::new(entity.bounds, empty);
        head.planenum = Some(0);
        head.front = Some(Box::new(Node::new(entity.bounds, empty)));
        head.back = Some(Box::new(Node::new(entity.bounds, empty)));

        Tree {
            head,
            bounds: entity.bounds,
        }
    }

    /// Partitions an entity's brush list into a BSP tree.
    ///
    /// The input slice is never mutated; working copies are stamped with
    /// their input index so leaves can report which brushes reached them.
    /// `forced_midsplit` pins the plane-selection strategy; `None` lets the
    /// node size and brush fraction decide per node.
    pub fn build(
        &self,
        entity: &Entity,
        brushlist: &[Brush],
        forced_midsplit: Option<bool>,
    ) -> Result<Tree, BspError> {
        if brushlist.is_empty() {
            return Ok(self.degenerate_tree(entity));
        }

        let stats = BspStats::new(self.game);

        let mut bounds = Aabb3::empty();
        let mut visible_faces = 0usize;
        let mut nonvisible_faces = 0usize;
        for brush in brushlist {
            for side in &brush.sides {
                if side.bevel || side.onnode || side.winding.is_none() {
                    continue;
                }
                if side.visible {
                    visible_faces += 1;
                } else {
                    nonvisible_faces += 1;
                }
            }
            bounds = bounds.union(&brush.bounds);
        }
        log::debug!("{:8} brushes", brushlist.len());
        log::debug!("{:8} visible faces", visible_faces);
        log::debug!("{:8} nonvisible faces", nonvisible_faces);

        let mut brushes = brushlist.to_vec();
        for (i, brush) in brushes.iter_mut().enumerate() {
            if brush.original.is_none() {
                brush.original = Some(i);
            }
        }

        let head_bounds = bounds.grow(SIDESPACE);
        let volume = Brush::from_bounds(
            &head_bounds,
            self.planes,
            self.base_extent(),
            self.game.create_empty_contents(),
        );

        let head = self.build_tree_r(
            head_bounds,
            volume,
            brushes,
            &[],
            forced_midsplit,
            brushlist.len(),
            &stats,
        )?;

        stats.log_summary();

        Ok(Tree { head, bounds })
    }
}
