// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! In-memory node storage: a growable `Vec<Node>`.
//!
//! No on-disk format, no cache — `get_node` simply clones the stored
//! `Node`, matching the deep-copy-on-every-access contract the `Storage`
//! trait requires.

use super::Storage;
use crate::error::{RtreeError, RtreeResult};
use crate::node::{Node, SplitType};

/// A tree backed entirely by an in-process `Vec<Node>`.
pub struct MemoryStorage {
    dim: usize,
    node_size: u64,
    split_type: SplitType,
    nodes: Vec<Node>,
}

impl MemoryStorage {
    /// Creates storage with a single empty leaf node at index 0.
    pub fn new(dim: usize, node_size: u64, split_type: SplitType) -> Self {
        Self {
            dim,
            node_size,
            split_type,
            nodes: vec![Node::empty_leaf()],
        }
    }
}

impl Storage for MemoryStorage {
    fn dim(&self) -> usize {
        self.dim
    }

    fn node_size(&self) -> u64 {
        self.node_size
    }

    fn split_type(&self) -> SplitType {
        self.split_type
    }

    fn count(&self) -> u64 {
        self.nodes.len() as u64
    }

    fn get_node(&mut self, index: u64) -> RtreeResult<Node> {
        self.nodes
            .get(index as usize)
            .cloned()
            .ok_or(RtreeError::IndexError {
                index,
                count: self.count(),
            })
    }

    fn set_node(&mut self, index: u64, node: &Node) -> RtreeResult<()> {
        let count = self.count();
        let slot = self
            .nodes
            .get_mut(index as usize)
            .ok_or(RtreeError::IndexError { index, count })?;
        *slot = node.clone();
        Ok(())
    }

    fn add_node(&mut self, node: &Node) -> RtreeResult<u64> {
        self.nodes.push(node.clone());
        Ok(self.nodes.len() as u64 - 1)
    }
}
