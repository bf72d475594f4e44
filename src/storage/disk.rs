// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! File-backed node storage with a direct-mapped write-back cache.
//!
//! Deliberately uses `std::fs::File` with explicit seeks rather than
//! `memmap2` (used elsewhere in this codebase for read-mostly pages):
//! the cache here needs to control exactly when a dirty page reaches
//! disk, which an OS-managed mapping doesn't give us.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::codec::{decode_file_header, decode_node, encode_file_header, encode_node, FILE_HEADER_SIZE};
use super::Storage;
use crate::error::{RtreeError, RtreeResult};
use crate::node::{Node, SplitType};

/// Number of direct-mapped cache slots.
const SLOTS: usize = 1024;

struct CacheSlot {
    index: u64,
    dirty: bool,
    node: Node,
}

/// Node storage backed by a single file, fronted by a bounded write-back
/// cache.
///
/// Cache slots are direct-mapped (`slot = index % SLOTS`): a slot holds at
/// most one live node at a time, and fetching a different node for an
/// occupied slot evicts whatever is there, flushing it first if dirty.
pub struct DiskStorage {
    file: File,
    dim: usize,
    node_size: u64,
    split_type: SplitType,
    count: u64,
    cache: Vec<Option<CacheSlot>>,
}

impl DiskStorage {
    /// Creates a new index file at `path`, writing the header and an empty
    /// root leaf at node 0.
    ///
    /// ## Errors
    /// `ConfigError` if `dim`/`node_size`/`split_type` are invalid, or the
    /// file already exists / can't be created. `IoError` on write failure.
    pub fn create_in_file<P: AsRef<Path>>(
        path: P,
        dim: usize,
        node_size: u64,
        split_type: SplitType,
    ) -> RtreeResult<Self> {
        crate::config::validate_config(dim, node_size, split_type)?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| RtreeError::IoError {
                operation: "create_in_file".to_string(),
                reason: e.to_string(),
            })?;

        let header = encode_file_header(dim, node_size, split_type);
        file.write_all(&header).map_err(|e| RtreeError::IoError {
            operation: "write_header".to_string(),
            reason: e.to_string(),
        })?;
        let root_bytes = encode_node(&Node::empty_leaf(), dim, node_size)?;
        file.write_all(&root_bytes).map_err(|e| RtreeError::IoError {
            operation: "write_root".to_string(),
            reason: e.to_string(),
        })?;
        file.flush().map_err(|e| RtreeError::IoError {
            operation: "flush_create".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            file,
            dim,
            node_size,
            split_type,
            count: 1,
            cache: (0..SLOTS).map(|_| None).collect(),
        })
    }

    /// Opens an existing index file, deriving `count` from its length.
    ///
    /// ## Errors
    /// `ConfigError` if the header is malformed or the file length isn't a
    /// whole number of pages. `IoError` on read failure.
    pub fn open_from_file<P: AsRef<Path>>(path: P) -> RtreeResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| RtreeError::IoError {
                operation: "open_from_file".to_string(),
                reason: e.to_string(),
            })?;

        let mut header = [0u8; FILE_HEADER_SIZE as usize];
        file.read_exact(&mut header).map_err(|e| RtreeError::IoError {
            operation: "read_header".to_string(),
            reason: e.to_string(),
        })?;
        let (dim, node_size, split_type) = decode_file_header(&header)?;

        let body_len = file.metadata()?.len().saturating_sub(FILE_HEADER_SIZE);
        if node_size == 0 || body_len % node_size != 0 {
            return Err(RtreeError::ConfigError {
                reason: format!(
                    "file body length {} is not a multiple of node_size {}",
                    body_len, node_size
                ),
            });
        }
        let count = body_len / node_size;

        Ok(Self {
            file,
            dim,
            node_size,
            split_type,
            count,
            cache: (0..SLOTS).map(|_| None).collect(),
        })
    }

    fn page_offset(&self, index: u64) -> u64 {
        FILE_HEADER_SIZE + index * self.node_size
    }

    fn read_page(&mut self, index: u64) -> RtreeResult<Node> {
        self.file
            .seek(SeekFrom::Start(self.page_offset(index)))
            .map_err(|e| RtreeError::IoError {
                operation: "seek_page".to_string(),
                reason: e.to_string(),
            })?;
        let mut buf = vec![0u8; self.node_size as usize];
        self.file.read_exact(&mut buf).map_err(|e| RtreeError::IoError {
            operation: "read_page".to_string(),
            reason: e.to_string(),
        })?;
        decode_node(&buf, self.dim)
    }

    fn write_page(&mut self, index: u64, node: &Node) -> RtreeResult<()> {
        let bytes = encode_node(node, self.dim, self.node_size)?;
        self.file
            .seek(SeekFrom::Start(self.page_offset(index)))
            .map_err(|e| RtreeError::IoError {
                operation: "seek_page".to_string(),
                reason: e.to_string(),
            })?;
        self.file.write_all(&bytes).map_err(|e| RtreeError::IoError {
            operation: "write_page".to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Ensures slot `slot` is free, flushing and evicting its current
    /// occupant (if any and dirty).
    fn evict(&mut self, slot: usize) -> RtreeResult<()> {
        if let Some(occupant) = self.cache[slot].take() {
            if occupant.dirty {
                self.write_page(occupant.index, &occupant.node)?;
            }
        }
        Ok(())
    }

    fn flush_all(&mut self) -> RtreeResult<()> {
        for slot in 0..SLOTS {
            self.evict(slot)?;
        }
        Ok(())
    }
}

impl Storage for DiskStorage {
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
        self.count
    }

    fn get_node(&mut self, index: u64) -> RtreeResult<Node> {
        if index >= self.count {
            return Err(RtreeError::IndexError {
                index,
                count: self.count,
            });
        }
        let slot = (index as usize) % SLOTS;
        if let Some(occupant) = &self.cache[slot] {
            if occupant.index == index {
                return Ok(occupant.node.clone());
            }
        }
        self.evict(slot)?;
        let node = self.read_page(index)?;
        let result = node.clone();
        self.cache[slot] = Some(CacheSlot {
            index,
            dirty: false,
            node,
        });
        Ok(result)
    }

    fn set_node(&mut self, index: u64, node: &Node) -> RtreeResult<()> {
        if index >= self.count {
            return Err(RtreeError::IndexError {
                index,
                count: self.count,
            });
        }
        // Validate encodability eagerly so a bad write fails now, not at
        // eviction time when the caller has moved on.
        encode_node(node, self.dim, self.node_size)?;

        let slot = (index as usize) % SLOTS;
        let same_slot_holds_other = matches!(&self.cache[slot], Some(o) if o.index != index);
        if same_slot_holds_other {
            self.evict(slot)?;
        }
        self.cache[slot] = Some(CacheSlot {
            index,
            dirty: true,
            node: node.clone(),
        });
        Ok(())
    }

    fn add_node(&mut self, node: &Node) -> RtreeResult<u64> {
        let index = self.count;
        self.write_page(index, node)?;
        self.count += 1;
        Ok(index)
    }
}

impl Drop for DiskStorage {
    fn drop(&mut self) {
        let _ = self.flush_all();
        let _ = self.file.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::LeafEntry;
    use tempfile::tempdir;

    #[test]
    fn create_then_reopen_preserves_root() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.rtree");
        {
            let mut storage =
                DiskStorage::create_in_file(&path, 2, 256, SplitType::Quadratic).unwrap();
            assert_eq!(storage.count(), 1);
            let leaf = Node::Leaf(vec![LeafEntry { coord: vec![1, 2], data: 99 }]);
            storage.set_node(0, &leaf).unwrap();
        }
        let mut reopened = DiskStorage::open_from_file(&path).unwrap();
        assert_eq!(reopened.dim(), 2);
        assert_eq!(reopened.node_size(), 256);
        assert_eq!(reopened.count(), 1);
        let node = reopened.get_node(0).unwrap();
        assert_eq!(node.as_leaf().unwrap()[0].data, 99);
    }

    #[test]
    fn add_node_survives_cache_eviction() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.rtree");
        let mut storage = DiskStorage::create_in_file(&path, 1, 64, SplitType::Linear).unwrap();
        let mut last_idx = 0;
        for i in 0..(SLOTS as i64 + 5) {
            let leaf = Node::Leaf(vec![LeafEntry { coord: vec![i], data: i }]);
            last_idx = storage.add_node(&leaf).unwrap();
        }
        let node = storage.get_node(last_idx).unwrap();
        assert_eq!(node.as_leaf().unwrap()[0].data, SLOTS as i64 + 4);
    }

    #[test]
    fn dirty_write_flushes_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.rtree");
        {
            let mut storage =
                DiskStorage::create_in_file(&path, 1, 64, SplitType::Linear).unwrap();
            let leaf = Node::Leaf(vec![LeafEntry { coord: vec![7], data: 7 }]);
            storage.set_node(0, &leaf).unwrap();
        }
        let mut reopened = DiskStorage::open_from_file(&path).unwrap();
        let node = reopened.get_node(0).unwrap();
        assert_eq!(node.as_leaf().unwrap()[0].data, 7);
    }

    #[test]
    fn out_of_range_get_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.rtree");
        let mut storage = DiskStorage::create_in_file(&path, 1, 64, SplitType::Linear).unwrap();
        assert!(matches!(
            storage.get_node(5),
            Err(RtreeError::IndexError { index: 5, count: 1 })
        ));
    }
}
