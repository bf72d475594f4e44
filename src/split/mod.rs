// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Node-splitting heuristics.
//!
//! A single dispatcher (`split_node`) picks the configured algorithm; each
//! algorithm lives in its own module since they share almost no code apart
//! from the greedy `distribute` step used by quadratic and linear.

mod brute_force;
mod linear;
mod quadratic;

use crate::node::{Node, SplitType};

/// Splits an overflowing node into two, using the algorithm named by
/// `split_type`.
///
/// `root_bbox` is the current root node's bounding box, needed only by the
/// linear algorithm as its per-axis normalizer: it normalizes against the
/// tree's current extent, not the extent of the node being split.
///
/// ## Panics
/// Panics if `node` has fewer than 2 entries — callers only split nodes
/// that already overflow `max_entries`, which is always `>= 2`.
pub fn split_node(
    split_type: SplitType,
    node: Node,
    dim: usize,
    root_bbox: (&[i64], &[i64]),
) -> (Node, Node) {
    assert!(node.len() >= 2, "cannot split a node with fewer than 2 entries");
    match split_type {
        SplitType::BruteForce => brute_force::split(node, dim),
        SplitType::Quadratic => quadratic::split(node, dim),
        SplitType::Linear => linear::split(node, dim, root_bbox),
    }
}

/// Rebuilds a `Node` of the same kind (leaf/non-leaf) as `template` from the
/// entries selected by `indices`.
fn rebuild(template: &Node, indices: &[usize]) -> Node {
    match template {
        Node::Leaf(entries) => {
            Node::Leaf(indices.iter().map(|&i| entries[i].clone()).collect())
        }
        Node::NonLeaf(entries) => {
            Node::NonLeaf(indices.iter().map(|&i| entries[i].clone()).collect())
        }
    }
}

fn entry_bbox(node: &Node, i: usize) -> (Vec<i64>, Vec<i64>) {
    match node {
        Node::Leaf(entries) => {
            let (lo, hi) = entries[i].bounding_box();
            (lo.to_vec(), hi.to_vec())
        }
        Node::NonLeaf(entries) => {
            let (lo, hi) = entries[i].bounding_box();
            (lo.to_vec(), hi.to_vec())
        }
    }
}

/// Greedily distributes the entries at `remaining` between groups seeded by
/// `seed_a`/`seed_b`, one entry at a time.
///
/// At each step, for every still-unassigned entry `e`, computes `d1`/`d2` —
/// the area growth from adding `e`'s box to group A's / group B's current
/// bounding box — and picks the entry maximizing `|d1 - d2|` (the one with
/// the strongest preference for one side). Ties break: smaller `d` wins;
/// else smaller current group area wins; else the group with fewer entries
/// so far wins; else group B. Shared by quadratic and linear split, which
/// differ only in how they pick the two seeds.
fn distribute(node: &Node, seed_a: usize, seed_b: usize, mut remaining: Vec<usize>) -> (Vec<usize>, Vec<usize>) {
    let mut group_a = vec![seed_a];
    let mut group_b = vec![seed_b];
    let (mut lo_a, mut hi_a) = entry_bbox(node, seed_a);
    let (mut lo_b, mut hi_b) = entry_bbox(node, seed_b);

    while !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_pos = 0;
        let mut best_gap = -1i128;
        let mut best_d1 = 0i128;
        let mut best_d2 = 0i128;

        for (pos, &entry) in remaining.iter().enumerate() {
            let (lo_e, hi_e) = entry_bbox(node, entry);
            let d1 = crate::geometry::combined_area(&lo_a, &hi_a, &lo_e, &hi_e)
                - crate::geometry::area(&lo_a, &hi_a);
            let d2 = crate::geometry::combined_area(&lo_b, &hi_b, &lo_e, &hi_e)
                - crate::geometry::area(&lo_b, &hi_b);
            let gap = (d1 - d2).abs();
            if gap > best_gap {
                best_gap = gap;
                best_idx = entry;
                best_pos = pos;
                best_d1 = d1;
                best_d2 = d2;
            }
        }

        remaining.remove(best_pos);
        let area_a = crate::geometry::area(&lo_a, &hi_a);
        let area_b = crate::geometry::area(&lo_b, &hi_b);
        let goes_to_a = if best_d1 != best_d2 {
            best_d1 < best_d2
        } else if area_a != area_b {
            area_a < area_b
        } else if group_a.len() != group_b.len() {
            group_a.len() < group_b.len()
        } else {
            false
        };

        if goes_to_a {
            let (lo_e, hi_e) = entry_bbox(node, best_idx);
            let (nl, nh) = crate::geometry::union(&lo_a, &hi_a, &lo_e, &hi_e);
            lo_a = nl;
            hi_a = nh;
            group_a.push(best_idx);
        } else {
            let (lo_e, hi_e) = entry_bbox(node, best_idx);
            let (nl, nh) = crate::geometry::union(&lo_b, &hi_b, &lo_e, &hi_e);
            lo_b = nl;
            hi_b = nh;
            group_b.push(best_idx);
        }
    }

    (group_a, group_b)
}
