// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Linear-cost split: picks the single dimension with the largest
//! normalized separation between entries, seeds from its extremes, then
//! distributes the rest with the same greedy preference rule as quadratic.

use super::{distribute, entry_bbox, rebuild};
use crate::node::Node;

pub fn split(node: Node, dim: usize, root_bbox: (&[i64], &[i64])) -> (Node, Node) {
    let k = node.len();
    debug_assert!(k >= 2);
    let (root_lo, root_hi) = root_bbox;

    let mut best_dim = 0;
    let mut best_n = f64::NEG_INFINITY;
    let mut best_high_idx = 0;
    let mut best_low_idx = 1;

    for i in 0..dim {
        let mut high_idx = 0;
        let mut high_val = i64::MIN;
        let mut low_idx = 0;
        let mut low_val = i64::MAX;
        for e in 0..k {
            let (lo_e, hi_e) = entry_bbox(&node, e);
            if lo_e[i] > high_val {
                high_val = lo_e[i];
                high_idx = e;
            }
            if hi_e[i] < low_val {
                low_val = hi_e[i];
                low_idx = e;
            }
        }

        let s_i = (high_val - low_val).unsigned_abs() as f64;
        let width_i = (root_hi[i] - root_lo[i]).unsigned_abs() as f64;
        let n_i = if width_i > 0.0 {
            s_i / width_i
        } else if s_i > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        if n_i > best_n {
            best_n = n_i;
            best_dim = i;
            best_high_idx = high_idx;
            best_low_idx = low_idx;
        }
    }
    let _ = best_dim;

    // Seeds must be distinct entries; if the extremes coincide (degenerate
    // node), fall back to the next distinct index so both groups start
    // non-empty.
    if best_high_idx == best_low_idx {
        best_low_idx = (best_high_idx + 1) % k;
    }

    let remaining: Vec<usize> = (0..k)
        .filter(|&i| i != best_high_idx && i != best_low_idx)
        .collect();
    let (a_idx, b_idx) = distribute(&node, best_high_idx, best_low_idx, remaining);
    (rebuild(&node, &a_idx), rebuild(&node, &b_idx))
}
