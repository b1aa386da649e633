// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Error types shared across the monitoring engine

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::error;

/// Errors raised by the durable event store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure while preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by frame sources
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source cannot currently deliver frames
    #[error("frame source unavailable: {0}")]
    Unavailable(String),

    /// An image file could not be decoded
    #[error("malformed image {path:?}: {reason}")]
    Malformed {
        /// Offending file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The image codec rejected the data
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be rendered as TOML
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Values that parse but cannot be used
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while loading classifier weights
#[derive(Debug, Error)]
pub enum ModelError {
    /// Weights file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed weights file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Weights the scorer cannot use
    #[error("invalid model: {0}")]
    Invalid(String),
}

/// Errors raised by an individual sensor read
#[derive(Debug, Error)]
pub enum SensorError {
    /// Sensor gave no reading
    #[error("sensor {0} did not respond")]
    NoResponse(String),

    /// Sensor reported an error
    #[error("sensor {name} failed: {reason}")]
    Failed {
        /// Sensor name
        name: String,
        /// Failure detail
        reason: String,
    },
}

/// Acquire a guard on shared state, terminating the process if the lock is poisoned.
///
/// A poisoned lock means another thread panicked mid-update, so the guarded
/// invariants can no longer be trusted and there is nothing safe to continue with.
pub(crate) fn lock_or_abort<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => {
            error!("{} lock poisoned; shared state is no longer trustworthy, aborting", what);
            std::process::abort()
        }
    }
}
