use thiserror::Error;

/// Errors surfaced by the capture/playback engines and the transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The endpoint could not be opened or configured at the requested format,
    /// or it failed while a run was in progress.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("permission denied: capture is not authorized")]
    PermissionDenied,

    #[error("no recorded audio to play")]
    SourceMissing,

    #[error("sample store I/O failed: {0}")]
    StoreIoFailure(String),

    /// The other engine currently holds the store.
    #[error("busy: {0} is active")]
    Busy(&'static str),
}

impl AudioError {
    pub(crate) fn device(err: impl std::fmt::Display) -> Self {
        Self::DeviceUnavailable(format!("{:#}", err))
    }

    pub(crate) fn store(err: impl std::fmt::Display) -> Self {
        Self::StoreIoFailure(err.to_string())
    }
}
