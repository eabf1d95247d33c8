use std::path::PathBuf;
use thiserror::Error;

/// The media asset behind a widget could not be turned into frames.
#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to determine format for {path}: {reason}")]
    UnknownFormat { path: PathBuf, reason: String },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("{path} did not contain renderable frames")]
    Empty { path: PathBuf },
}

/// The profile file could not be read, parsed or written.
#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("profile file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("profile file {path} is not valid: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A profile operation was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("A profile named '{0}' already exists.")]
    DuplicateName(String),
}
