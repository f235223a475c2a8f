use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::SourceConfig;
use crate::error::LoadError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Retrieves the raw record text for one frame.
pub trait FrameSource: Send {
    /// Human readable location of a frame's record, for logging.
    fn address(&self, frame_number: u32) -> String;

    fn fetch(&self, frame_number: u32) -> Result<String, LoadError>;
}

/// `<sequence>_<frame>.txt`, frame number not zero-padded.
pub fn record_file_name(sequence_name: &str, frame_number: u32) -> String {
    format!("{sequence_name}_{frame_number}.txt")
}

/// Frame records stored as files in a local directory.
pub struct DirectorySource {
    base: PathBuf,
    sequence_name: String,
}

impl DirectorySource {
    pub fn new(base: impl Into<PathBuf>, sequence_name: impl Into<String>) -> Self {
        Self { base: base.into(), sequence_name: sequence_name.into() }
    }

    fn path(&self, frame_number: u32) -> PathBuf {
        self.base.join(record_file_name(&self.sequence_name, frame_number))
    }
}

impl FrameSource for DirectorySource {
    fn address(&self, frame_number: u32) -> String {
        self.path(frame_number).display().to_string()
    }

    fn fetch(&self, frame_number: u32) -> Result<String, LoadError> {
        let path = self.path(frame_number);
        std::fs::read_to_string(&path).map_err(|source| LoadError::Io { path, source })
    }
}

/// Frame records served over HTTP(S).
pub struct HttpSource {
    client: Client,
    base_url: String,
    sequence_name: String,
}

impl HttpSource {
    pub fn new(base_url: &str, sequence_name: impl Into<String>) -> Result<Self, LoadError> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), sequence_name: sequence_name.into() })
    }
}

impl FrameSource for HttpSource {
    fn address(&self, frame_number: u32) -> String {
        format!("{}/{}", self.base_url, record_file_name(&self.sequence_name, frame_number))
    }

    fn fetch(&self, frame_number: u32) -> Result<String, LoadError> {
        let url = self.address(frame_number);
        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::HttpStatus { url, status });
        }
        Ok(response.text()?)
    }
}

/// Pick a source implementation for the configured base path.
pub fn source_from_config(config: &SourceConfig) -> Result<Box<dyn FrameSource>, LoadError> {
    if config.is_remote() {
        Ok(Box::new(HttpSource::new(&config.base_path, config.sequence_name.clone())?))
    } else {
        Ok(Box::new(DirectorySource::new(&config.base_path, config.sequence_name.clone())))
    }
}
