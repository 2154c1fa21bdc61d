//! Carving overlapping brushes into pairwise disjoint pieces.

use crate::brush::Brush;
use crate::bsp::{BspContext, BspStats};

impl BspContext<'_> {
    /// True if `b1` is allowed to bite `b2`.
    fn brush_ge(&self, b1: &Brush, b2: &Brush) -> bool {
        // detail brushes never bite structural brushes
        if self.game.is_any_detail(&b1.contents) && !self.game.is_any_detail(&b2.contents) {
            return false;
        }
        self.game.is_solid(&b1.contents)
    }

    /// The brushes that remain after `b` is subtracted from `a`. `None`
    /// means the two did not actually intersect; an empty list means `a`
    /// was swallowed whole. The originals are undisturbed.
    pub fn subtract_brush(&self, a: &Brush, b: &Brush, stats: &BspStats) -> Option<Vec<Brush>> {
        let mut out = Vec::new();
        let mut inside = a.clone();

        for side in &b.sides {
            let (front, back) = self.split_brush(inside, side.planenum, stats);
            if let Some(front) = front {
                out.push(front);
            }
            match back {
                Some(back) => inside = back,
                // nothing of `a` is behind this face of `b`
                None => return None,
            }
        }

        // what is left of `inside` lies within `b` and is discarded
        Some(out)
    }

    /// Carves any intersecting solid brushes into non-intersecting pieces,
    /// honoring the bite priority. The container is replaced with the
    /// carved set.
    pub fn chop_brushes(&self, brushes: &mut Vec<Brush>) {
        let original_count = brushes.len();
        // split bookkeeping only; chopping reports its own counters
        let stats = BspStats::new(self.game);
        let mut swallowed = 0usize;
        let mut from_split = 0usize;

        let mut list = std::mem::take(brushes);

        let mut i = 0;
        while i < list.len() {
            let mut advance = true;
            let mut j = i + 1;
            while j < list.len() {
                if list[i].disjoint(&list[j]) {
                    j += 1;
                    continue;
                }

                let mut sub1: Option<Vec<Brush>> = None;
                let mut sub2: Option<Vec<Brush>> = None;
                let mut c1 = usize::MAX;
                let mut c2 = usize::MAX;

                if self.brush_ge(&list[j], &list[i]) {
                    match self.subtract_brush(&list[i], &list[j], &stats) {
                        None => {
                            // didn't really intersect
                            j += 1;
                            continue;
                        }
                        Some(pieces) if pieces.is_empty() => {
                            // b1 is swallowed by b2; rescan from here
                            list.remove(i);
                            swallowed += 1;
                            advance = false;
                            break;
                        }
                        Some(pieces) => {
                            c1 = pieces.len();
                            sub1 = Some(pieces);
                        }
                    }
                }

                if self.brush_ge(&list[i], &list[j]) {
                    match self.subtract_brush(&list[j], &list[i], &stats) {
                        None => {
                            j += 1;
                            continue;
                        }
                        Some(pieces) if pieces.is_empty() => {
                            // b2 is swallowed by b1
                            list.remove(j);
                            swallowed += 1;
                            continue;
                        }
                        Some(pieces) => {
                            c2 = pieces.len();
                            sub2 = Some(pieces);
                        }
                    }
                }

                if sub1.is_none() && sub2.is_none() {
                    // neither one can bite
                    j += 1;
                    continue;
                }

                // only accept a cut that doesn't fragment both brushes
                if c1 > 1 && c2 > 1 {
                    j += 1;
                    continue;
                }

                if c1 < c2 {
                    from_split += c1;
                    list.extend(sub1.into_iter().flatten());
                    list.remove(i);
                    advance = false;
                } else {
                    from_split += c2;
                    list.extend(sub2.into_iter().flatten());
                    list.remove(j);
                    // keep b1, rescan its remaining partners
                    advance = false;
                }
                break;
            }
            if advance {
                i += 1;
            }
        }

        *brushes = list;

        log::debug!("chopped {} brushes into {}", original_count, brushes.len());
        if swallowed > 0 {
            log::debug!("{:8} brushes swallowed", swallowed);
        }
        if from_split > 0 {
            log::debug!("{:8} brushes created from the carve", from_split);
        }
    }
}
