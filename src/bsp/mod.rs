//! BSP tree construction over chopped brush lists.

pub mod build;
#[cfg(feature = "parallel")]
pub mod build_parallel;
pub mod chop;
pub mod split;

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::contents::{ContentFlags, ContentStats, TargetGame};
use crate::geom::{Aabb3, PlaneStore};
use crate::options::Options;

/// Source entity handed to the builder. The core only consumes its bounds;
/// key-value handling lives with the caller.
#[derive(Clone, Copy, Debug)]
pub struct Entity {
    pub bounds: Aabb3,
}

/// One node or leaf of the partition tree.
#[derive(Clone, Debug)]
pub struct Node {
    /// Bounding volume, not just the points inside.
    pub bounds: Aabb3,
    /// Positive-facing split plane id; `None` marks a leaf.
    pub planenum: Option<usize>,
    pub front: Option<Box<Node>>,
    pub back: Option<Box<Node>>,
    /// Combined contents of the brushes that reached this leaf.
    pub contents: ContentFlags,
    /// Input-list indices of the brushes that reached this leaf.
    pub original_brushes: Vec<usize>,
    /// The split was chosen from a detail pass, so it is not needed for
    /// visibility.
    pub detail_separator: bool,
}

impl Node {
    fn new(bounds: Aabb3, empty_contents: ContentFlags) -> Self {
        Self {
            bounds,
            planenum: None,
            front: None,
            back: None,
            contents: empty_contents,
            original_brushes: Vec::new(),
            detail_separator: false,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.planenum.is_none()
    }

    /// All leaves of the subtree, iteratively to keep deep trees off the
    /// call stack.
    pub fn leaves(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                out.push(node);
                continue;
            }
            stack.extend(
                [&node.front, &node.back]
                    .iter()
                    .filter_map(|child| child.as_deref()),
            );
        }
        out
    }
}

/// Completed partition of one entity.
#[derive(Clone, Debug)]
pub struct Tree {
    pub head: Node,
    /// Exact envelope of the input brushes (the head node's bounds are
    /// this grown by the side space).
    pub bounds: Aabb3,
}

/// Counters accumulated across one build, bumped concurrently from the
/// recursion tasks.
#[derive(Debug)]
pub struct BspStats {
    /// Total number of internal nodes, including `nonvis_nodes`.
    pub nodes: AtomicUsize,
    /// Nodes created by splitting on a side that was not visible.
    pub nonvis_nodes: AtomicUsize,
    /// Nodes whose plane came from the full quality search.
    pub expensive_splits: AtomicUsize,
    /// Nodes whose plane came from the midsplit shortcut.
    pub midsplits: AtomicUsize,
    pub leafs: AtomicUsize,
    /// Brush fragments beyond the world extent.
    pub bogus_brushes: AtomicUsize,
    /// Brushes entirely removed by a split.
    pub brushes_removed: AtomicUsize,
    /// Brushes that survived a split on one side only.
    pub brushes_onesided: AtomicUsize,
    /// Fragments dropped for falling below the micro volume.
    pub tiny_volumes: AtomicUsize,
    pub leafstats: ContentStats,
}

impl BspStats {
    pub fn new(game: &dyn TargetGame) -> Self {
        Self {
            nodes: AtomicUsize::new(0),
            nonvis_nodes: AtomicUsize::new(0),
            expensive_splits: AtomicUsize::new(0),
            midsplits: AtomicUsize::new(0),
            leafs: AtomicUsize::new(0),
            bogus_brushes: AtomicUsize::new(0),
            brushes_removed: AtomicUsize::new(0),
            brushes_onesided: AtomicUsize::new(0),
            tiny_volumes: AtomicUsize::new(0),
            leafstats: game.create_content_stats(),
        }
    }

    pub(crate) fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }

    pub(crate) fn log_summary(&self) {
        let nodes = Self::get(&self.nodes);
        let nonvis = Self::get(&self.nonvis_nodes);
        log::debug!("{:8} visible nodes", nodes - nonvis);
        if nonvis > 0 {
            log::debug!("{:8} nonvis nodes", nonvis);
        }
        if Self::get(&self.expensive_splits) > 0 {
            log::debug!("{:8} expensive split nodes", Self::get(&self.expensive_splits));
        }
        if Self::get(&self.midsplits) > 0 {
            log::debug!("{:8} midsplit nodes", Self::get(&self.midsplits));
        }
        log::debug!("{:8} leafs", Self::get(&self.leafs));
        if Self::get(&self.bogus_brushes) > 0 {
            log::debug!("{:8} bogus brushes", Self::get(&self.bogus_brushes));
        }
        if Self::get(&self.brushes_removed) > 0 {
            log::debug!(
                "{:8} brushes removed from a split",
                Self::get(&self.brushes_removed)
            );
        }
        if Self::get(&self.brushes_onesided) > 0 {
            log::debug!(
                "{:8} brushes split only on one side",
                Self::get(&self.brushes_onesided)
            );
        }
        if Self::get(&self.tiny_volumes) > 0 {
            log::debug!(
                "{:8} tiny volumes removed after splits",
                Self::get(&self.tiny_volumes)
            );
        }

        log::debug!(
            "leafs: {} empty, {} solid, {} liquid, {} sky, {} detail",
            Self::get(&self.leafstats.empty_leafs),
            Self::get(&self.leafstats.solid_leafs),
            Self::get(&self.leafstats.liquid_leafs),
            Self::get(&self.leafstats.sky_leafs),
            Self::get(&self.leafstats.detail_leafs),
        );
    }
}

/// Shared, immutable state for one compile: the plane interner, the
/// target-game policy and the numeric options. Cheap to hand to every
/// worker task by reference.
#[derive(Clone, Copy)]
pub struct BspContext<'a> {
    pub planes: &'a PlaneStore,
    pub game: &'a dyn TargetGame,
    pub options: &'a Options,
}

impl<'a> BspContext<'a> {
    pub fn new(planes: &'a PlaneStore, game: &'a dyn TargetGame, options: &'a Options) -> Self {
        Self {
            planes,
            game,
            options,
        }
    }

    /// Base winding scale: far enough out that any winding still carrying
    /// a base point trips the huge check.
    pub(crate) fn base_extent(&self) -> crate::float_types::Real {
        self.options.worldextent * 4.0
    }
}
