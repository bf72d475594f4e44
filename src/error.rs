// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the R-tree index.
//!
//! Provides structured error handling with detailed context for debugging.

use std::fmt;

/// Standard Result type for all R-tree operations.
pub type RtreeResult<T> = Result<T, RtreeError>;

/// Error types for R-tree operations.
#[derive(Debug, Clone)]
pub enum RtreeError {
    /// Invalid dimension/node-size combination at tree creation.
    ConfigError { reason: String },

    /// Underlying file read/write failed.
    IoError { operation: String, reason: String },

    /// `get_node`/`set_node` addressed a node index that does not exist.
    ///
    /// Always a bug in the tree algorithms or storage bookkeeping, never a
    /// condition a caller can trigger directly.
    IndexError { index: u64, count: u64 },

    /// A node would not fit in `node_size` bytes once serialized, or a
    /// split was needed and not performed.
    InvariantViolation { reason: String },
}

impl fmt::Display for RtreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError { reason } => {
                write!(f, "configuration error: {}", reason)
            }
            Self::IoError { operation, reason } => {
                write!(f, "I/O error during '{}': {}", operation, reason)
            }
            Self::IndexError { index, count } => {
                write!(f, "node index {} out of range (count = {})", index, count)
            }
            Self::InvariantViolation { reason } => {
                write!(f, "invariant violation: {}", reason)
            }
        }
    }
}

impl std::error::Error for RtreeError {}

// Convenience conversion from std::io::Error
impl From<std::io::Error> for RtreeError {
    fn from(err: std::io::Error) -> Self {
        RtreeError::IoError {
            operation: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}
