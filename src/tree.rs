// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The `Rtree` handle: ties storage, split algorithm, and search together
//! into the public API surface.

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use crate::error::{RtreeError, RtreeResult};
use crate::geometry;
use crate::metrics;
use crate::node::{LeafEntry, Node, NonLeafEntry, SplitType};
use crate::split;
use crate::storage::{DiskStorage, MemoryStorage, Storage};

/// A point and its associated payload, as returned by `search_range` and
/// `search_knn`.
pub type Hit = (Vec<i64>, i64);

/// An R-tree index over fixed-dimension integer coordinates.
///
/// Polymorphic over its backing storage (`MemoryStorage` or `DiskStorage`)
/// through `Box<dyn Storage>` — query logic here never distinguishes the
/// two.
pub struct Rtree {
    storage: Box<dyn Storage>,
}

enum InsertOutcome {
    Done,
    Split { left: Node, right: Node },
}

impl Rtree {
    /// Creates an in-memory tree.
    pub fn create_in_memory(dim: usize, node_size: u64, split_type: SplitType) -> RtreeResult<Self> {
        crate::config::validate_config(dim, node_size, split_type)?;
        Ok(Self {
            storage: Box::new(MemoryStorage::new(dim, node_size, split_type)),
        })
    }

    /// Creates a disk-backed tree at `path`. Writes the header and an empty
    /// root node 0 immediately.
    pub fn create_in_file<P: AsRef<Path>>(
        path: P,
        dim: usize,
        node_size: u64,
        split_type: SplitType,
    ) -> RtreeResult<Self> {
        Ok(Self {
            storage: Box::new(DiskStorage::create_in_file(path, dim, node_size, split_type)?),
        })
    }

    /// Opens an existing disk-backed tree.
    pub fn open_from_file<P: AsRef<Path>>(path: P) -> RtreeResult<Self> {
        Ok(Self {
            storage: Box::new(DiskStorage::open_from_file(path)?),
        })
    }

    /// Number of dimensions every coordinate in this tree has.
    pub fn dimensions(&self) -> usize {
        self.storage.dim()
    }

    /// Number of nodes currently allocated (exposed for tests and
    /// reachability checks; node 0 is always the root).
    pub fn node_count(&self) -> u64 {
        self.storage.count()
    }

    /// Inserts `(coord, data)`.
    ///
    /// ## Errors
    /// `ConfigError` if `coord.len() != dimensions()`. Propagates any
    /// storage error encountered along the way.
    pub fn insert(&mut self, coord: Vec<i64>, data: i64) -> RtreeResult<()> {
        if coord.len() != self.dimensions() {
            return Err(RtreeError::ConfigError {
                reason: format!(
                    "coordinate has {} dimensions, tree has {}",
                    coord.len(),
                    self.dimensions()
                ),
            });
        }
        metrics::timed("insert", || self.insert_inner(LeafEntry { coord, data }))
    }

    fn insert_inner(&mut self, leaf: LeafEntry) -> RtreeResult<()> {
        match self.choose_and_insert(0, leaf)? {
            InsertOutcome::Done => Ok(()),
            InsertOutcome::Split { left, right } => {
                // Node 0 must stay the root: move the left half to a fresh
                // slot, then overwrite node 0 with a new non-leaf pointing
                // at both halves.
                let left_idx = self.storage.add_node(&left)?;
                let right_idx = self.storage.add_node(&right)?;
                let dim = self.dimensions();
                let (lo_l, hi_l) = left.bounding_box(dim);
                let (lo_r, hi_r) = right.bounding_box(dim);
                let new_root = Node::NonLeaf(vec![
                    NonLeafEntry { lo: lo_l, hi: hi_l, child: left_idx },
                    NonLeafEntry { lo: lo_r, hi: hi_r, child: right_idx },
                ]);
                self.storage.set_node(0, &new_root)?;
                Ok(())
            }
        }
    }

    /// Descends from `node_idx` looking for a leaf to hold `leaf`, splitting
    /// and propagating bottom-up on overflow.
    fn choose_and_insert(&mut self, node_idx: u64, leaf: LeafEntry) -> RtreeResult<InsertOutcome> {
        let node = self.storage.get_node(node_idx)?;
        let dim = self.dimensions();

        if node.is_leaf() {
            let mut entries = node.as_leaf().unwrap().to_vec();
            entries.push(leaf);
            let max = self.storage.max_entries(true);
            if entries.len() <= max {
                self.storage.set_node(node_idx, &Node::Leaf(entries))?;
                return Ok(InsertOutcome::Done);
            }
            let (left, right) = self.split_overflowed(Node::Leaf(entries), dim)?;
            self.storage.set_node(node_idx, &left)?;
            return Ok(InsertOutcome::Split { left, right });
        }

        let mut entries = node.as_non_leaf().unwrap().to_vec();
        let chosen = choose_child(&entries, &leaf.coord);
        let child_idx = entries[chosen].child;

        match self.choose_and_insert(child_idx, leaf)? {
            InsertOutcome::Done => {
                let child_node = self.storage.get_node(child_idx)?;
                let (lo, hi) = child_node.bounding_box(dim);
                entries[chosen] = NonLeafEntry { lo, hi, child: child_idx };
                self.storage.set_node(node_idx, &Node::NonLeaf(entries))?;
                Ok(InsertOutcome::Done)
            }
            InsertOutcome::Split { left, right } => {
                self.storage.set_node(child_idx, &left)?;
                let right_idx = self.storage.add_node(&right)?;

                let (lo_l, hi_l) = left.bounding_box(dim);
                let (lo_r, hi_r) = right.bounding_box(dim);
                entries[chosen] = NonLeafEntry { lo: lo_l, hi: hi_l, child: child_idx };
                entries.push(NonLeafEntry { lo: lo_r, hi: hi_r, child: right_idx });

                let max = self.storage.max_entries(false);
                if entries.len() <= max {
                    self.storage.set_node(node_idx, &Node::NonLeaf(entries))?;
                    Ok(InsertOutcome::Done)
                } else {
                    let (left, right) = self.split_overflowed(Node::NonLeaf(entries), dim)?;
                    self.storage.set_node(node_idx, &left)?;
                    Ok(InsertOutcome::Split { left, right })
                }
            }
        }
    }

    fn split_overflowed(&mut self, node: Node, dim: usize) -> RtreeResult<(Node, Node)> {
        let root = self.storage.get_node(0)?;
        let (root_lo, root_hi) = root.bounding_box(dim);
        Ok(split::split_node(
            self.storage.split_type(),
            node,
            dim,
            (&root_lo, &root_hi),
        ))
    }

    /// Returns every `(coord, data)` pair whose coordinate lies inside
    /// `(lo, hi)`, inclusive, deduplicated.
    pub fn search_range(&mut self, lo: &[i64], hi: &[i64]) -> RtreeResult<Vec<Hit>> {
        metrics::timed("search_range", || {
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            let mut queue = VecDeque::new();
            queue.push_back(0u64);

            while let Some(idx) = queue.pop_front() {
                let node = self.storage.get_node(idx)?;
                match node {
                    Node::Leaf(entries) => {
                        for entry in entries {
                            if geometry::point_in_box(&entry.coord, lo, hi) {
                                let key = (entry.coord.clone(), entry.data);
                                if seen.insert(key.clone()) {
                                    out.push(key);
                                }
                            }
                        }
                    }
                    Node::NonLeaf(entries) => {
                        for entry in entries {
                            if geometry::overlaps(&entry.lo, &entry.hi, lo, hi) {
                                queue.push_back(entry.child);
                            }
                        }
                    }
                }
            }
            Ok(out)
        })
    }

    /// BFS from node 0, collecting leaf entries within Manhattan distance
    /// `d` of `point`, pruning non-leaf children whose box cannot be
    /// within `d`.
    fn search_within(&mut self, point: &[i64], d: i64) -> RtreeResult<Vec<Hit>> {
        let mut out = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(0u64);

        while let Some(idx) = queue.pop_front() {
            let node = self.storage.get_node(idx)?;
            match node {
                Node::Leaf(entries) => {
                    for entry in entries {
                        if geometry::manhattan_distance(&entry.coord, point) <= d {
                            out.push((entry.coord, entry.data));
                        }
                    }
                }
                Node::NonLeaf(entries) => {
                    for entry in entries {
                        if geometry::box_within_distance(&entry.lo, &entry.hi, point, d) {
                            queue.push_back(entry.child);
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Counts nodes reachable from node 0 by following every non-leaf
    /// child pointer. No node should ever be orphaned. Exposed for tests
    /// and integrity checks, not part of the core query surface.
    pub fn reachable_node_count(&mut self) -> RtreeResult<u64> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(0u64);
        seen.insert(0u64);

        while let Some(idx) = queue.pop_front() {
            if let Node::NonLeaf(entries) = self.storage.get_node(idx)? {
                for entry in entries {
                    if seen.insert(entry.child) {
                        queue.push_back(entry.child);
                    }
                }
            }
        }
        Ok(seen.len() as u64)
    }

    /// Returns at most `k` leaf entries near `point`, via binary search on
    /// search radius. Approximate: does not guarantee exact distance
    /// ordering.
    pub fn search_knn(&mut self, point: &[i64], k: usize) -> RtreeResult<Vec<Hit>> {
        metrics::timed("search_knn", || {
            let root = self.storage.get_node(0)?;
            let dim = self.dimensions();
            let (root_lo, root_hi) = root.bounding_box(dim);
            let d_max_lo = geometry::manhattan_distance(point, &root_lo);
            let d_max_hi = geometry::manhattan_distance(point, &root_hi);
            let mut d_max = d_max_lo.max(d_max_hi);
            let mut d_min = 0i64;

            let out = self.search_within(point, d_max)?;
            if out.len() <= k {
                return Ok(out);
            }

            let mut best: Option<Vec<Hit>> = None;
            loop {
                if (d_max - d_min).abs() <= 1 {
                    return Ok(best.unwrap_or(out));
                }
                let d = d_min + (d_max - d_min) / 2;
                let out = self.search_within(point, d)?;
                if out.len() == k {
                    return Ok(out);
                }
                if out.len() > k {
                    if best.as_ref().map_or(true, |b| out.len() < b.len()) {
                        best = Some(out);
                    }
                    d_max = d;
                } else {
                    d_min = d;
                }
            }
        })
    }
}

/// Picks the child entry with the minimum area enlargement needed to cover
/// `coord`; ties break by the child's smaller current area.
fn choose_child(entries: &[NonLeafEntry], coord: &[i64]) -> usize {
    let mut best = 0;
    let mut best_growth = i128::MAX;
    let mut best_area = i128::MAX;

    for (i, entry) in entries.iter().enumerate() {
        let area = geometry::area(&entry.lo, &entry.hi);
        let combined = geometry::combined_area(&entry.lo, &entry.hi, coord, coord);
        let growth = combined - area;
        if growth < best_growth || (growth == best_growth && area < best_area) {
            best_growth = growth;
            best_area = area;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_single_insert_round_trips() {
        let mut tree = Rtree::create_in_memory(2, 128, SplitType::Quadratic).unwrap();
        tree.insert(vec![0, 0], 7).unwrap();
        let hits = tree.search_range(&[-1, -1], &[1, 1]).unwrap();
        assert_eq!(hits, vec![(vec![0, 0], 7)]);
        let nn = tree.search_knn(&[0, 0], 1).unwrap();
        assert_eq!(nn, vec![(vec![0, 0], 7)]);
    }

    #[test]
    fn s2_forced_split_allocates_two_new_nodes() {
        let mut tree = Rtree::create_in_memory(2, 128, SplitType::Linear).unwrap();
        let max = crate::node::max_entries(2, 128, true);
        for i in 0..=(max as i64) {
            tree.insert(vec![i, i * 2], i).unwrap();
        }
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn empty_root_descent_accepts_first_insert() {
        let mut tree = Rtree::create_in_memory(1, 64, SplitType::BruteForce).unwrap();
        tree.insert(vec![5], 1).unwrap();
        assert_eq!(tree.search_range(&[0], &[10]).unwrap(), vec![(vec![5], 1)]);
    }

    #[test]
    fn rejects_mismatched_dimension() {
        let mut tree = Rtree::create_in_memory(2, 128, SplitType::Quadratic).unwrap();
        assert!(tree.insert(vec![1, 2, 3], 0).is_err());
    }

    #[test]
    fn knn_returns_min_k_and_n() {
        let mut tree = Rtree::create_in_memory(2, 128, SplitType::BruteForce).unwrap();
        for i in 0..5i64 {
            tree.insert(vec![i, 0], i).unwrap();
        }
        let hits = tree.search_knn(&[0, 0], 3).unwrap();
        assert_eq!(hits.len(), 3);
        let hits = tree.search_knn(&[0, 0], 100).unwrap();
        assert_eq!(hits.len(), 5);
    }
}
