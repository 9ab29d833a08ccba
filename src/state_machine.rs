use serde::Serialize;

/// Which engine, if any, currently owns the sample store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    Idle,
    Recording,
    Playing,
}

impl TransportState {
    /// Recording and playback are mutually exclusive, so each control is only
    /// operable when the other one is not active.
    pub fn can_toggle_recording(&self) -> bool {
        !matches!(self, Self::Playing)
    }

    pub fn can_toggle_playback(&self) -> bool {
        !matches!(self, Self::Recording)
    }
}
