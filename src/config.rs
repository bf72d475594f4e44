// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Construction-time validation for R-tree configuration.
//!
//! Centralises the checks every `Storage` backend needs before it can
//! accept nodes: dimension bounds and minimum node size.

use crate::error::RtreeError;
use crate::node::{entry_size, SplitType};

/// Recommended dimension bounds (spec's UI clamp, not a hard format
/// invariant — enforced here because this is the only entry point callers
/// have into the format).
pub const MIN_DIM: usize = 1;
pub const MAX_DIM: usize = 30;

/// Validates a dimension.
///
/// ## Example
/// ```
/// use rtree_index::config::validate_dim;
///
/// assert!(validate_dim(2).is_ok());
/// assert!(validate_dim(0).is_err());
/// assert!(validate_dim(31).is_err());
/// ```
pub fn validate_dim(dim: usize) -> Result<(), RtreeError> {
    if !(MIN_DIM..=MAX_DIM).contains(&dim) {
        return Err(RtreeError::ConfigError {
            reason: format!(
                "dimension must be between {} and {}, got {}",
                MIN_DIM, MAX_DIM, dim
            ),
        });
    }
    Ok(())
}

/// Minimum node size in bytes for a tree of the given dimension: the
/// 9-byte node header plus two non-leaf entries.
pub fn min_node_size(dim: usize) -> u64 {
    9 + 2 * entry_size(dim, false)
}

/// Validates a node size against the configured dimension.
///
/// ## Example
/// ```
/// use rtree_index::config::validate_node_size;
///
/// assert!(validate_node_size(2, 128).is_ok());
/// assert!(validate_node_size(2, 8).is_err());
/// ```
pub fn validate_node_size(dim: usize, node_size: u64) -> Result<(), RtreeError> {
    let min = min_node_size(dim);
    if node_size < min {
        return Err(RtreeError::ConfigError {
            reason: format!(
                "node_size too small for this dimension: got {}, need at least {}",
                node_size, min
            ),
        });
    }
    Ok(())
}

/// Validates the full `(dim, node_size, split_type)` triple used to create
/// a tree.
pub fn validate_config(dim: usize, node_size: u64, split_type: SplitType) -> Result<(), RtreeError> {
    validate_dim(dim)?;
    validate_node_size(dim, node_size)?;
    let _ = split_type;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_dimension() {
        assert!(validate_dim(0).is_err());
        assert!(validate_dim(1).is_ok());
        assert!(validate_dim(30).is_ok());
        assert!(validate_dim(31).is_err());
    }

    #[test]
    fn rejects_too_small_node_size() {
        let min = min_node_size(2);
        assert!(validate_node_size(2, min).is_ok());
        assert!(validate_node_size(2, min - 1).is_err());
    }
}
