// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Quadratic-cost split (seed pick is the quadratic-cost step; distribution
//! is linear cost): seeds are the pair of entries whose union box has the
//! largest area, then every remaining entry is assigned one at a time to
//! whichever group it prefers most.

use super::{distribute, entry_bbox, rebuild};
use crate::geometry;
use crate::node::Node;

pub fn split(node: Node, _dim: usize) -> (Node, Node) {
    let k = node.len();
    debug_assert!(k >= 2);

    let mut seed_a = 0;
    let mut seed_b = 1;
    let mut best_area = i128::MIN;

    for i in 0..k {
        for j in (i + 1)..k {
            let (lo_i, hi_i) = entry_bbox(&node, i);
            let (lo_j, hi_j) = entry_bbox(&node, j);
            let combined = geometry::combined_area(&lo_i, &hi_i, &lo_j, &hi_j);
            if combined > best_area {
                best_area = combined;
                seed_a = i;
                seed_b = j;
            }
        }
    }

    let remaining: Vec<usize> = (0..k).filter(|&i| i != seed_a && i != seed_b).collect();
    let (a_idx, b_idx) = distribute(&node, seed_a, seed_b, remaining);
    (rebuild(&node, &a_idx), rebuild(&node, &b_idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::LeafEntry;

    #[test]
    fn seeds_are_the_farthest_pair() {
        let node = Node::Leaf(vec![
            LeafEntry { coord: vec![0, 0], data: 1 },
            LeafEntry { coord: vec![1, 0], data: 2 },
            LeafEntry { coord: vec![1000, 0], data: 3 },
        ]);
        let (a, b) = split(node, 2);
        assert_eq!(a.len() + b.len(), 3);
        // The outlier at x=1000 must not share a group with both neighbors.
        let sizes = (a.len(), b.len());
        assert!(sizes == (1, 2) || sizes == (2, 1));
    }
}
