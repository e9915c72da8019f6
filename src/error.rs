use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("failed to parse terrain config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read terrain config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid terrain config: {0}")]
    InvalidConfig(String),
    #[error("grid of shape {expected:?} cannot hold {found} values")]
    ShapeMismatch {
        expected: (usize, usize),
        found: usize,
    },
}
