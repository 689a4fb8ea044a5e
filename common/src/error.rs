use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Unable to find the marker")]
    MissingMarker,
    #[error("Malformed configuration: {0}")]
    MalformedConfig(#[from] serde_json::Error),
    #[error("Configuration is missing field {0}")]
    MissingField(&'static str),
    #[error("Configuration field {0} is not a number")]
    InvalidField(&'static str),
    #[error("Malformed results table: {0}")]
    Table(#[from] csv::Error),
    #[error("Results table is missing column {0}")]
    MissingColumn(&'static str),
}

impl RecordError {
    /// Skippable errors exclude the file from the aggregates, the rest abort the run
    pub fn is_skippable(&self) -> bool {
        !matches!(self, Self::Table(_) | Self::MissingColumn(_))
    }
}

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Could not read directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("Failed to process {path:?}: {source}")]
    Record { path: PathBuf, source: RecordError },
    #[error("Run key {0} assigned twice")]
    KeyCollision(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("No runs to plot")]
    NoData,
    #[error("Loading metrics failed: {0}")]
    Store(#[from] StoreError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Drawing failed: {0}")]
    Draw(String),
}

/// Why a directory entry was left out of the aggregates
#[derive(Error, Debug)]
pub enum SkipReason {
    #[error("Could not list entry: {0}")]
    Entry(#[from] walkdir::Error),
    #[error("Could not read file: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("{0}")]
    Record(#[from] RecordError),
}
