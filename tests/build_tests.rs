mod support;

use brushbsp::bsp::Entity;
use brushbsp::contents::ContentKind;
use brushbsp::float_types::{Real, SIDESPACE};
use brushbsp::geom::Aabb3;
use nalgebra::Point3;

use crate::support::{approx_eq, init_logs, internal_nodes, solid_leaves, Compile};

fn entity(mins: [Real; 3], maxs: [Real; 3]) -> Entity {
    Entity {
        bounds: Aabb3::new(
            Point3::new(mins[0], mins[1], mins[2]),
            Point3::new(maxs[0], maxs[1], maxs[2]),
        ),
    }
}

#[test]
fn empty_brushlist_builds_degenerate_tree() {
    let compile = Compile::new();
    let ent = entity([-16.0, -16.0, -16.0], [16.0, 16.0, 16.0]);

    let tree = compile.ctx().build(&ent, &[], None).unwrap();

    assert_eq!(tree.head.planenum, Some(0));
    assert_eq!(tree.bounds, ent.bounds);
    assert_eq!(tree.head.bounds, ent.bounds);

    let front = tree.head.front.as_ref().unwrap();
    let back = tree.head.back.as_ref().unwrap();
    assert!(front.is_leaf() && back.is_leaf());
    assert!(front.contents.is_empty());
    assert!(back.contents.is_empty());

    // the degenerate head plane must resolve in the store
    assert!(compile.planes.len() >= 2);
}

#[test]
fn single_cube_survives_into_one_solid_leaf() {
    init_logs();
    let compile = Compile::new();
    let brushes = vec![compile.solid([0.0, 0.0, 0.0], [64.0, 64.0, 64.0])];
    let ent = entity([0.0, 0.0, 0.0], [64.0, 64.0, 64.0]);

    let tree = compile.ctx().build(&ent, &brushes, None).unwrap();

    // tree bounds hug the brush; the head node grows by the side space
    assert_eq!(tree.bounds, brushes[0].bounds);
    for i in 0..3 {
        assert!(approx_eq(tree.head.bounds.mins[i], -SIDESPACE, 1e-9));
        assert!(approx_eq(tree.head.bounds.maxs[i], 64.0 + SIDESPACE, 1e-9));
    }

    let solid = solid_leaves(&tree.head);
    assert_eq!(solid.len(), 1);
    assert_eq!(solid[0].contents.kind, ContentKind::Solid);
    assert_eq!(solid[0].original_brushes, vec![0]);

    // six axial splits box the brush in exactly
    let leaf = solid[0];
    for i in 0..3 {
        assert!(approx_eq(leaf.bounds.mins[i], 0.0, 1e-6));
        assert!(approx_eq(leaf.bounds.maxs[i], 64.0, 1e-6));
    }

    // every other leaf is empty and owes nothing to the input
    for leaf in tree.head.leaves() {
        if leaf.contents.is_empty() {
            assert!(leaf.original_brushes.is_empty());
        }
    }
}

#[test]
fn internal_nodes_use_positive_planes_and_tighten_axial_bounds() {
    let compile = Compile::new();
    let brushes = vec![
        compile.solid([0.0, 0.0, 0.0], [64.0, 64.0, 64.0]),
        compile.solid([128.0, 0.0, 0.0], [192.0, 64.0, 64.0]),
    ];
    let ent = entity([0.0, 0.0, 0.0], [192.0, 64.0, 64.0]);

    let tree = compile.ctx().build(&ent, &brushes, None).unwrap();

    for node in internal_nodes(&tree.head) {
        let planenum = node.planenum.unwrap();
        assert_eq!(planenum & 1, 0, "split planes are positive-facing");

        let plane = compile.planes.get(planenum);
        assert!(plane.is_positive_facing());

        let front = node.front.as_ref().unwrap();
        let back = node.back.as_ref().unwrap();
        if plane.plane_type().is_axial() {
            let axis = plane.plane_type().axis();
            assert!(approx_eq(front.bounds.mins[axis], plane.dist(), 1e-9));
            assert!(approx_eq(back.bounds.maxs[axis], plane.dist(), 1e-9));
        }
    }
}

#[test]
fn disjoint_cubes_reach_distinct_leaves() {
    let compile = Compile::new();
    let brushes = vec![
        compile.solid([0.0, 0.0, 0.0], [64.0, 64.0, 64.0]),
        compile.solid([128.0, 0.0, 0.0], [192.0, 64.0, 64.0]),
    ];
    let ent = entity([0.0, 0.0, 0.0], [192.0, 64.0, 64.0]);

    let tree = compile.ctx().build(&ent, &brushes, None).unwrap();

    let solid = solid_leaves(&tree.head);
    assert_eq!(solid.len(), 2);
    let mut seen: Vec<usize> = solid
        .iter()
        .flat_map(|leaf| leaf.original_brushes.iter().copied())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1]);
    for leaf in &solid {
        assert_eq!(leaf.original_brushes.len(), 1);
    }
}

#[test]
fn coincident_brushes_combine_contents() {
    let compile = Compile::new();
    let brushes = vec![
        compile.brush(
            [0.0, 0.0, 0.0],
            [64.0, 64.0, 64.0],
            brushbsp::contents::ContentFlags::new(ContentKind::Water),
        ),
        compile.solid([0.0, 0.0, 0.0], [64.0, 64.0, 64.0]),
    ];
    let ent = entity([0.0, 0.0, 0.0], [64.0, 64.0, 64.0]);

    let tree = compile.ctx().build(&ent, &brushes, None).unwrap();

    let solid = solid_leaves(&tree.head);
    assert_eq!(solid.len(), 1);
    // solid outranks water when both reach the leaf
    assert_eq!(solid[0].contents.kind, ContentKind::Solid);
    let mut originals = solid[0].original_brushes.clone();
    originals.sort_unstable();
    assert_eq!(originals, vec![0, 1]);
}

#[test]
fn input_brushes_are_not_mutated() {
    let compile = Compile::new();
    let brushes = vec![
        compile.solid([0.0, 0.0, 0.0], [64.0, 64.0, 64.0]),
        compile.solid([128.0, 0.0, 0.0], [192.0, 64.0, 64.0]),
    ];
    let ent = entity([0.0, 0.0, 0.0], [192.0, 64.0, 64.0]);

    compile.ctx().build(&ent, &brushes, None).unwrap();

    for brush in &brushes {
        assert!(brush.original.is_none());
        for side in &brush.sides {
            assert!(!side.onnode);
            assert!(!side.tested);
        }
    }
}

#[test]
fn detail_split_marks_separator_nodes() {
    let compile = Compile::new();
    let brushes = vec![
        compile.solid([0.0, 0.0, 0.0], [64.0, 64.0, 64.0]),
        compile.detail_solid([128.0, 0.0, 0.0], [192.0, 64.0, 64.0]),
    ];
    let ent = entity([0.0, 0.0, 0.0], [192.0, 64.0, 64.0]);

    let tree = compile.ctx().build(&ent, &brushes, None).unwrap();

    let nodes = internal_nodes(&tree.head);
    assert!(nodes.iter().any(|n| n.detail_separator));
    assert!(nodes.iter().any(|n| !n.detail_separator));

    let solid = solid_leaves(&tree.head);
    assert!(solid.iter().any(|leaf| leaf.contents.detail));
}

#[test]
fn forced_midsplit_still_finds_every_brush() {
    let compile = Compile::new();
    let brushes = vec![
        compile.solid([0.0, 0.0, 0.0], [64.0, 64.0, 64.0]),
        compile.solid([128.0, 0.0, 0.0], [192.0, 64.0, 64.0]),
    ];
    let ent = entity([0.0, 0.0, 0.0], [192.0, 64.0, 64.0]);

    for forced in [Some(true), Some(false)] {
        let tree = compile.ctx().build(&ent, &brushes, forced).unwrap();
        let solid = solid_leaves(&tree.head);
        let mut seen: Vec<usize> = solid
            .iter()
            .flat_map(|leaf| leaf.original_brushes.iter().copied())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, vec![0, 1]);
    }
}

#[test]
fn interned_planes_round_trip() {
    let compile = Compile::new();
    let brushes = vec![compile.solid([0.0, 0.0, 0.0], [64.0, 64.0, 64.0])];
    let ent = entity([0.0, 0.0, 0.0], [64.0, 64.0, 64.0]);

    compile.ctx().build(&ent, &brushes, None).unwrap();

    for id in 0..compile.planes.len() {
        assert_eq!(compile.planes.add_or_find(&compile.planes.get(id)), id);
    }
}
