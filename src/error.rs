use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a frame's object list. Any of these leaves the frame
/// store with an empty object list and its frame number untouched.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Frame {frame} is outside the playable range {start}..={end}")]
    OutOfRange { frame: u32, start: u32, end: u32 },

    #[error("Could not read frame record {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("A network error occurred while fetching a frame record: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error! status: {status} ({url})")]
    HttpStatus { url: String, status: reqwest::StatusCode },

    #[error("Frame record for frame {0} is empty")]
    EmptyContent(u32),

    #[error("Frame loader thread is no longer running")]
    LoaderDisconnected,
}

/// A single malformed record line. These are logged and the line is dropped;
/// they never fail a load.
#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    #[error("expected 10 fields, found {0}")]
    FieldCount(usize),

    #[error("field {index} ({value:?}) is not a number")]
    NotNumeric { index: usize, value: String },

    #[error("class id {0} is not an integer")]
    InvalidClassId(f64),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid color {0:?}, expected #rrggbb or #rrggbbaa")]
    InvalidColor(String),
}
