//! Parallel variant of the recursive tree build. Sibling subtrees are
//! independent, so each node forks one rayon task per child and joins
//! before returning.

use crate::brush::Brush;
use crate::bsp::{BspContext, BspStats, Node};
use crate::errors::BspError;
use crate::geom::Aabb3;

impl BspContext<'_> {
    #[cfg(feature = "parallel")]
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

        let (front, back) = rayon::join(
            || {
                self.build_tree_r(
                    front_bounds,
                    front_volume,
                    front_brushes,
                    &child_parents,
                    forced_midsplit,
                    total_brushes,
                    stats,
                )
            },
            || {
                self.build_tree_r(
                    back_bounds,
                    back_volume,
                    back_brushes,
                    &child_parents,
                    forced_midsplit,
                    total_brushes,
                    stats,
                )
            },
        );

        node.front = Some(Box::new(front?));
        node.back = Some(Box::new(back?));
        Ok(node)
    }
}
