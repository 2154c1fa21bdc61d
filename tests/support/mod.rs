//! Test support library
//! Provides shared fixtures & helpers for the integration tests.

#![allow(dead_code)]

use brushbsp::brush::Brush;
use brushbsp::bsp::{BspContext, Node};
use brushbsp::contents::{ContentFlags, ContentKind, DefaultGame};
use brushbsp::float_types::Real;
use brushbsp::geom::{Aabb3, PlaneStore};
use brushbsp::options::Options;
use nalgebra::Point3;

pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Run tests with `RUST_LOG=debug` to see the build statistics.
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Owns the shared state one compile needs, so tests can borrow a context
/// from it.
pub struct Compile {
    pub planes: PlaneStore,
    pub game: DefaultGame,
    pub options: Options,
}

impl Compile {
    pub fn new() -> Self {
        Self {
            planes: PlaneStore::new(),
            game: DefaultGame,
            options: Options::default(),
        }
    }

    pub fn ctx(&self) -> BspContext<'_> {
        BspContext::new(&self.planes, &self.game, &self.options)
    }

    fn base_extent(&self) -> Real {
        self.options.worldextent * 4.0
    }

    pub fn brush(&self, mins: [Real; 3], maxs: [Real; 3], contents: ContentFlags) -> Brush {
        let bounds = Aabb3::new(
            Point3::new(mins[0], mins[1], mins[2]),
            Point3::new(maxs[0], maxs[1], maxs[2]),
        );
        Brush::from_bounds(&bounds, &self.planes, self.base_extent(), contents)
    }

    pub fn solid(&self, mins: [Real; 3], maxs: [Real; 3]) -> Brush {
        self.brush(mins, maxs, ContentFlags::new(ContentKind::Solid))
    }

    pub fn detail_solid(&self, mins: [Real; 3], maxs: [Real; 3]) -> Brush {
        self.brush(mins, maxs, ContentFlags::detail(ContentKind::Solid))
    }

    pub fn total_volume(&self, brushes: &[Brush]) -> Real {
        brushes.iter().map(|b| b.volume(&self.planes)).sum()
    }
}

/// All leaves of `tree_head` whose contents are not empty.
pub fn solid_leaves(head: &Node) -> Vec<&Node> {
    head.leaves()
        .into_iter()
        .filter(|leaf| !leaf.contents.is_empty())
        .collect()
}

/// All internal (splitting) nodes of the subtree.
pub fn internal_nodes(head: &Node) -> Vec<&Node> {
    let mut out = Vec::new();
    let mut stack = vec![head];
    while let Some(node) = stack.pop() {
        if node.is_leaf() {
            continue;
        }
        out.push(node);
        if let Some(front) = &node.front {
            stack.push(front);
        }
        if let Some(back) = &node.back {
            stack.push(back);
        }
    }
    out
}
