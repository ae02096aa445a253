//! Error types for covermap

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for covermap operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Band '{band}' not found (available: {available})")]
    BandNotFound { band: String, available: String },

    #[error("Duplicate band name: {0}")]
    DuplicateBand(String),

    #[error("Asset not found: {}", path.display())]
    AssetNotFound { path: PathBuf },

    #[error("Catalog error in {}: {reason}", path.display())]
    Catalog { path: PathBuf, reason: String },

    #[error("{partition} partition is empty")]
    EmptyPartition { partition: &'static str },

    #[error("Class {class} has only {count} samples, need at least {required}")]
    InsufficientSamples {
        class: usize,
        count: usize,
        required: usize,
    },

    #[error("Class {class} outside the legend, expected 0..{n_classes}")]
    ClassOutOfRange { class: usize, n_classes: usize },

    #[error("Export '{description}' needs {pixels} pixels, limit is {max_pixels}")]
    PixelLimitExceeded {
        description: String,
        pixels: u64,
        max_pixels: u64,
    },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for covermap operations
pub type Result<T> = std::result::Result<T, Error>;
