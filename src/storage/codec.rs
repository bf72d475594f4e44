// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Bit-exact on-disk encoding for the file header and node pages.
//!
//! The layout must interoperate byte-for-byte with other-language
//! implementations of the same format, so encoding is hand-rolled rather
//! than routed through a generic serializer — the same reasoning (and the
//! same manual `to_bytes`/`from_bytes` shape) as this codebase's other
//! fixed-layout page header for B+-tree pages.

use crate::error::{RtreeError, RtreeResult};
use crate::node::{entry_size, LeafEntry, Node, NonLeafEntry, SplitType};

/// Size in bytes of the file header: dim (4) + node_size (8) + split_type (1).
pub const FILE_HEADER_SIZE: u64 = 13;

/// Size in bytes of the node-page header: is_leaf (1) + entry count (8).
pub const NODE_HEADER_SIZE: u64 = 9;

/// Encodes the file header.
pub fn encode_file_header(dim: usize, node_size: u64, split_type: SplitType) -> [u8; 13] {
    let mut buf = [0u8; 13];
    buf[0..4].copy_from_slice(&(dim as u32).to_le_bytes());
    buf[4..12].copy_from_slice(&node_size.to_le_bytes());
    buf[12] = split_type.as_u8();
    buf
}

/// Decodes and validates the file header.
pub fn decode_file_header(bytes: &[u8]) -> RtreeResult<(usize, u64, SplitType)> {
    if bytes.len() < FILE_HEADER_SIZE as usize {
        return Err(RtreeError::ConfigError {
            reason: format!(
                "header truncated: need {} bytes, got {}",
                FILE_HEADER_SIZE,
                bytes.len()
            ),
        });
    }
    let dim = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
    let node_size = u64::from_le_bytes(bytes[4..12].try_into().unwrap());
    let split_type = SplitType::from_u8(bytes[12]).ok_or_else(|| RtreeError::ConfigError {
        reason: format!("unknown split type discriminant {}", bytes[12]),
    })?;
    Ok((dim, node_size, split_type))
}

/// Encodes a node into a buffer of exactly `node_size` bytes.
///
/// ## Errors
/// `ConfigError` if the node's entries don't fit in `node_size` bytes.
pub fn encode_node(node: &Node, dim: usize, node_size: u64) -> RtreeResult<Vec<u8>> {
    let (is_leaf, count) = (node.is_leaf(), node.len() as u64);
    let esize = entry_size(dim, is_leaf);
    let needed = NODE_HEADER_SIZE + count * esize;
    if needed > node_size {
        return Err(RtreeError::ConfigError {
            reason: format!(
                "node_size too small for this dimension: need {} bytes, have {}",
                needed, node_size
            ),
        });
    }

    let mut buf = vec![0u8; node_size as usize];
    buf[0] = if is_leaf { 1 } else { 0 };
    buf[1..9].copy_from_slice(&count.to_le_bytes());

    let mut offset = NODE_HEADER_SIZE as usize;
    match node {
        Node::Leaf(entries) => {
            for entry in entries {
                offset = write_leaf_entry(&mut buf, offset, entry);
            }
        }
        Node::NonLeaf(entries) => {
            for entry in entries {
                offset = write_non_leaf_entry(&mut buf, offset, entry);
            }
        }
    }
    Ok(buf)
}

fn write_leaf_entry(buf: &mut [u8], mut offset: usize, entry: &LeafEntry) -> usize {
    for &c in &entry.coord {
        buf[offset..offset + 8].copy_from_slice(&c.to_le_bytes());
        offset += 8;
    }
    buf[offset..offset + 8].copy_from_slice(&entry.data.to_le_bytes());
    offset + 8
}

fn write_non_leaf_entry(buf: &mut [u8], mut offset: usize, entry: &NonLeafEntry) -> usize {
    for &c in &entry.lo {
        buf[offset..offset + 8].copy_from_slice(&c.to_le_bytes());
        offset += 8;
    }
    for &c in &entry.hi {
        buf[offset..offset + 8].copy_from_slice(&c.to_le_bytes());
        offset += 8;
    }
    buf[offset..offset + 8].copy_from_slice(&(entry.child as i64).to_le_bytes());
    offset + 8
}

/// Decodes a node page. Trailing bytes beyond the last entry are ignored.
pub fn decode_node(bytes: &[u8], dim: usize) -> RtreeResult<Node> {
    if (bytes.len() as u64) < NODE_HEADER_SIZE {
        return Err(RtreeError::InvariantViolation {
            reason: format!("node page shorter than header: {} bytes", bytes.len()),
        });
    }
    let is_leaf = match bytes[0] {
        0 => false,
        1 => true,
        other => {
            return Err(RtreeError::InvariantViolation {
                reason: format!("invalid is_leaf byte {}", other),
            })
        }
    };
    let count = u64::from_le_bytes(bytes[1..9].try_into().unwrap()) as usize;
    let esize = entry_size(dim, is_leaf) as usize;
    let needed = NODE_HEADER_SIZE as usize + count * esize;
    if bytes.len() < needed {
        return Err(RtreeError::InvariantViolation {
            reason: format!("node page truncated: need {} bytes, got {}", needed, bytes.len()),
        });
    }

    let mut offset = NODE_HEADER_SIZE as usize;
    if is_leaf {
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let (coord, new_offset) = read_i64_vec(bytes, offset, dim);
            let data = read_i64(bytes, new_offset);
            entries.push(LeafEntry { coord, data });
            offset = new_offset + 8;
        }
        Ok(Node::Leaf(entries))
    } else {
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let (lo, o1) = read_i64_vec(bytes, offset, dim);
            let (hi, o2) = read_i64_vec(bytes, o1, dim);
            let child = read_i64(bytes, o2) as u64;
            entries.push(NonLeafEntry { lo, hi, child });
            offset = o2 + 8;
        }
        Ok(Node::NonLeaf(entries))
    }
}

fn read_i64(bytes: &[u8], offset: usize) -> i64 {
    i64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

fn read_i64_vec(bytes: &[u8], mut offset: usize, dim: usize) -> (Vec<i64>, usize) {
    let mut out = Vec::with_capacity(dim);
    for _ in 0..dim {
        out.push(read_i64(bytes, offset));
        offset += 8;
    }
    (out, offset)
}
