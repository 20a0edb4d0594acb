use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building the catalog, opening streams or running frames
#[derive(Error, Debug)]
pub enum CardScanError {
    #[error("Failed to load reference image '{label}' from {}: {source}", path.display())]
    CatalogLoad {
        label: String,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Invalid catalog manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },
    #[error("Could not open stream {}: {source}", path.display())]
    StreamOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read frame {index}: {reason}")]
    FrameRead { index: usize, reason: String },
    #[error("Failed to write frame {index}: {reason}")]
    FrameWrite { index: usize, reason: String },
    #[error("Rectified region is empty")]
    EmptyCrop,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Worker count must be at least 1")]
    InvalidWorkerCount,
    #[error("Frame {0} was delivered twice")]
    DuplicateFrame(usize),
    #[error("Frames missing from output, next expected index {next}, {pending} buffered")]
    MissingFrames { next: usize, pending: usize },
}

pub type Result<T> = std::result::Result<T, CardScanError>;
