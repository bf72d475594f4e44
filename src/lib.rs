// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! A disk-backed R-tree spatial index over fixed-dimension integer
//! coordinates.
//!
//! ## Quick start
//!
//! ```rust
//! use rtree_index::{Rtree, SplitType};
//!
//! let mut tree = Rtree::create_in_memory(2, 128, SplitType::Quadratic).unwrap();
//! tree.insert(vec![0, 0], 7).unwrap();
//! let hits = tree.search_range(&[-1, -1], &[1, 1]).unwrap();
//! assert_eq!(hits, vec![(vec![0, 0], 7)]);
//! ```
//!
//! ## Architecture
//!
//! - **geometry**: pure box/point primitives (area, union, overlap, distance)
//! - **node**: leaf/non-leaf entry and node types, fan-out arithmetic
//! - **storage**: the `Storage` trait and its `MemoryStorage`/`DiskStorage`
//!   backends, including the on-disk codec and write-back page cache
//! - **split**: brute-force/quadratic/linear node-splitting heuristics
//! - **tree**: the `Rtree` handle — insertion, range search, kNN
//! - **config**: construction-time validation
//! - **metrics**: lightweight operation instrumentation
//! - **error**: the crate's error taxonomy

pub mod config;
pub mod error;
pub mod geometry;
pub mod metrics;
pub mod node;
pub mod split;
pub mod storage;
pub mod tree;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{RtreeError, RtreeResult};
pub use node::{LeafEntry, Node, NonLeafEntry, SplitType};
pub use storage::{DiskStorage, MemoryStorage, Storage};
pub use tree::{Hit, Rtree};
