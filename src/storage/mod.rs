// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Storage abstraction for R-tree nodes.
//!
//! The tree is polymorphic over a single capability set — `dim`,
//! `node_size`, `split_type`, `count`, `get_node`, `set_node`, `add_node` —
//! exposed here as one trait with two concrete backends (`MemoryStorage`,
//! `DiskStorage`). This mirrors the `Index<K, V>` trait this codebase uses
//! elsewhere to make query logic independent of its backing index.

pub mod codec;
pub mod disk;
pub mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use crate::error::RtreeResult;
use crate::node::{max_entries, Node, SplitType};

/// Uniform interface over node storage.
///
/// ## Copy semantics
/// `get_node`/`set_node`/`add_node` all operate on owned copies. Modifying
/// the `Node` returned by `get_node` must never affect stored state, and
/// `set_node`/`add_node` must never be affected by later mutation of the
/// caller's `Node`. Splits and ancestor rewrites depend on this: they read
/// a node, mutate a local copy, and commit the result back explicitly.
pub trait Storage {
    /// Number of dimensions every coordinate in this tree has.
    fn dim(&self) -> usize;

    /// Configured node size in bytes.
    fn node_size(&self) -> u64;

    /// Configured split algorithm.
    fn split_type(&self) -> SplitType;

    /// Number of nodes ever appended (including node 0).
    fn count(&self) -> u64;

    /// Reads node `index`, returning a deep copy.
    ///
    /// ## Errors
    /// `IndexError` if `index >= count()`.
    fn get_node(&mut self, index: u64) -> RtreeResult<Node>;

    /// Replaces node `index` with a copy of `node`.
    ///
    /// ## Errors
    /// `IndexError` if `index >= count()`.
    /// `InvariantViolation`/`ConfigError` if `node` doesn't fit `node_size`.
    fn set_node(&mut self, index: u64, node: &Node) -> RtreeResult<()>;

    /// Appends a copy of `node`, returning its new index.
    fn add_node(&mut self, node: &Node) -> RtreeResult<u64>;

    /// Maximum entries for a node of the given kind, derived from
    /// `node_size`/`dim`: `M(is_leaf) = floor(node_size / entry_size(is_leaf))`.
    fn max_entries(&self, is_leaf: bool) -> usize {
        max_entries(self.dim(), self.node_size(), is_leaf)
    }
}
