//! Error types for uniq-queue.
//!
//! Queue operations themselves never fail; these cover construction,
//! configuration and telemetry setup.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unique queue built without a merge function")]
    MissingMerge,

    #[error("unknown merge policy: {0:?} (expected \"retain_old\" or \"retain_new\")")]
    UnknownPolicy(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
