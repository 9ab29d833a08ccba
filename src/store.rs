//! Raw headerless PCM store on disk.
//!
//! Capture truncates and appends; playback reads sequentially from the start.
//! Exclusive access is the transport's job, the store does no locking.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::AudioError;

pub type SampleSink = Box<dyn Write + Send>;
pub type SampleSource = Box<dyn Read + Send>;

/// Where recorded samples live between a capture run and a playback run.
pub trait SampleStore: Send + Sync {
    /// Create (or truncate) the store and return an append handle.
    fn create_sink(&self) -> Result<SampleSink, AudioError>;

    /// Open the store for reading from its first byte.
    ///
    /// Fails with [`AudioError::SourceMissing`] when nothing has been recorded.
    fn open_source(&self) -> Result<SampleSource, AudioError>;

    /// Size of the last recording, 0 if there is none.
    fn recorded_bytes(&self) -> u64;
}

#[derive(Debug, Clone)]
pub struct DurableSampleStore {
    path: PathBuf,
}

impl DurableSampleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleStore for DurableSampleStore {
    fn create_sink(&self) -> Result<SampleSink, AudioError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    AudioError::store(format!("create {}: {}", parent.display(), e))
                })?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| AudioError::store(format!("open {}: {}", self.path.display(), e)))?;

        log::debug!("Sample store truncated: {}", self.path.display());
        Ok(Box::new(BufWriter::new(file)))
    }

    fn open_source(&self) -> Result<SampleSource, AudioError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(AudioError::SourceMissing),
            Err(e) => {
                return Err(AudioError::store(format!("open {}: {}", self.path.display(), e)));
            }
        };

        let len = file
            .metadata()
            .map_err(|e| AudioError::store(format!("stat {}: {}", self.path.display(), e)))?
            .len();
        if len == 0 {
            return Err(AudioError::SourceMissing);
        }

        Ok(Box::new(BufReader::new(file)))
    }

    fn recorded_bytes(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}
