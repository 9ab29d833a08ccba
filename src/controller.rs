use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::audio::{
    AudioBackend, AudioFormatSpec, CaptureEngine, EngineEvent, EngineEventReceiver, EngineKind,
    EngineState, PlaybackEngine, RunId, RunOutcome,
};
use crate::error::AudioError;
use crate::permission::PermissionGate;
use crate::state_machine::TransportState;
use crate::store::SampleStore;

/// Snapshot handed to whatever renders the controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportStatus {
    pub state: TransportState,
    pub is_recording: bool,
    pub is_playing: bool,
    pub is_capture_authorized: bool,
    /// Whether the record control should be operable right now
    pub can_toggle_recording: bool,
    pub can_toggle_playback: bool,
    pub recorded_secs: f64,
}

/// Coordinates the two engines so that at most one of them touches the
/// store at any time.
pub struct TransportController {
    state: TransportState,
    active_run: Option<RunId>,
    format: AudioFormatSpec,
    store: Arc<dyn SampleStore>,
    gate: Arc<dyn PermissionGate>,
    capture: CaptureEngine,
    playback: PlaybackEngine,
}

impl TransportController {
    /// Returns the controller and the receiver on which engine runs report
    /// how they ended. Feed those events back through
    /// [`handle_engine_event`](Self::handle_engine_event).
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        store: Arc<dyn SampleStore>,
        gate: Arc<dyn PermissionGate>,
    ) -> (Self, EngineEventReceiver) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let controller = Self {
            state: TransportState::Idle,
            active_run: None,
            format: AudioFormatSpec::CD_MONO,
            capture: CaptureEngine::new(backend.clone(), Some(events_tx.clone())),
            playback: PlaybackEngine::new(backend, Some(events_tx)),
            store,
            gate,
        };
        (controller, events_rx)
    }

    /// A run that has already ended on its own counts as idle even before
    /// its event has been handled.
    pub fn state(&self) -> TransportState {
        if self.owner_finished() {
            TransportState::Idle
        } else {
            self.state
        }
    }

    pub fn status(&self) -> TransportStatus {
        let state = self.state();
        TransportStatus {
            state,
            is_recording: state == TransportState::Recording,
            is_playing: state == TransportState::Playing,
            is_capture_authorized: self.gate.is_capture_authorized(),
            can_toggle_recording: self.can_toggle_recording(),
            can_toggle_playback: self.can_toggle_playback(),
            recorded_secs: self.format.duration_of(self.store.recorded_bytes()).as_secs_f64(),
        }
    }

    /// Recording needs an idle or recording transport and capture permission.
    pub fn can_toggle_recording(&self) -> bool {
        self.state().can_toggle_recording() && self.gate.is_capture_authorized()
    }

    pub fn can_toggle_playback(&self) -> bool {
        self.state().can_toggle_playback()
    }

    pub async fn request_start_recording(&mut self) -> Result<(), AudioError> {
        self.reap_finished();
        match self.state {
            TransportState::Recording => return Ok(()),
            TransportState::Playing => return Err(AudioError::Busy(EngineKind::Playback.as_str())),
            TransportState::Idle => {}
        }

        let authorized = self.gate.is_capture_authorized()
            || self.gate.request_capture_authorization().await;
        if !authorized {
            log::warn!("Recording refused: capture permission denied");
            return Err(AudioError::PermissionDenied);
        }

        let run = self.capture.start(&self.format, self.store.as_ref(), authorized)?;
        self.enter(TransportState::Recording, run);
        Ok(())
    }

    pub fn request_stop_recording(&mut self) {
        self.capture.stop();
        if self.state == TransportState::Recording {
            self.enter_idle();
        }
    }

    pub fn request_start_playback(&mut self) -> Result<(), AudioError> {
        self.reap_finished();
        match self.state {
            TransportState::Playing => return Ok(()),
            TransportState::Recording => return Err(AudioError::Busy(EngineKind::Capture.as_str())),
            TransportState::Idle => {}
        }

        let run = self.playback.start(&self.format, self.store.as_ref())?;
        self.enter(TransportState::Playing, run);
        Ok(())
    }

    pub fn request_stop_playback(&mut self) {
        self.playback.stop();
        if self.state == TransportState::Playing {
            self.enter_idle();
        }
    }

    /// Apply a run's own ending (playback exhausted, loop failure).
    ///
    /// Returns the error to surface, if the run failed. Events from runs the
    /// controller has already left behind do not change the transport, but
    /// their failures are still returned.
    pub fn handle_engine_event(&mut self, event: EngineEvent) -> Option<AudioError> {
        let owner = match event.kind {
            EngineKind::Capture => TransportState::Recording,
            EngineKind::Playback => TransportState::Playing,
        };
        if self.state != owner || self.active_run != Some(event.run) {
            log::debug!("Stale {} event for run {}", event.kind.as_str(), event.run);
            return match event.outcome {
                RunOutcome::Failed(e) => Some(e),
                RunOutcome::Exhausted | RunOutcome::Cancelled => None,
            };
        }

        // Reap the finished thread
        match event.kind {
            EngineKind::Capture => self.capture.stop(),
            EngineKind::Playback => self.playback.stop(),
        }
        self.enter_idle();

        match event.outcome {
            RunOutcome::Failed(e) => Some(e),
            RunOutcome::Exhausted => {
                log::info!("Playback finished after {} bytes", event.bytes);
                None
            }
            RunOutcome::Cancelled => None,
        }
    }

    /// Stop both engines whatever the current state.
    pub fn shutdown(&mut self) {
        self.capture.stop();
        self.playback.stop();
        self.enter_idle();
    }

    /// The engine owning the current state has no live run left.
    fn owner_finished(&self) -> bool {
        let engine = match self.state {
            TransportState::Idle => return false,
            TransportState::Recording => self.capture.state(),
            TransportState::Playing => self.playback.state(),
        };
        engine == EngineState::Idle
    }

    fn reap_finished(&mut self) {
        if !self.owner_finished() {
            return;
        }
        match self.state {
            TransportState::Recording => self.capture.stop(),
            TransportState::Playing => self.playback.stop(),
            TransportState::Idle => {}
        }
        self.enter_idle();
    }

    fn enter(&mut self, state: TransportState, run: RunId) {
        log::debug!("Transport {:?} -> {:?} (run {})", self.state, state, run);
        self.state = state;
        self.active_run = Some(run);
    }

    fn enter_idle(&mut self) {
        if self.state != TransportState::Idle {
            log::debug!("Transport {:?} -> Idle", self.state);
        }
        self.state = TransportState::Idle;
        self.active_run = None;
    }
}

impl Drop for TransportController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
