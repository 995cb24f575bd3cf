use crate::parser::ParseError;
use std::io;
use thiserror::Error;

/// Errors that cross a fallible setup/teardown boundary: socket creation,
/// reactor creation, config/log init, worker startup. Per-connection
/// failures never surface here — they resolve to a response or a closed
/// descriptor without propagating.
#[derive(Debug, Error)]
pub enum CrateError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("request parse error: {0:?}")]
    Parse(#[from] ParseError),

    #[error("connection slab is full")]
    SlabFull,

    #[error("worker {0} failed to start: {1}")]
    WorkerStartup(usize, String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CrateError>;
