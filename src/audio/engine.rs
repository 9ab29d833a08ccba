//! Run bookkeeping shared by the capture and playback engines.
//!
//! Each run is a dedicated OS thread (NOT a tokio task) so blocking device
//! I/O never contends with the async control loop. Cancellation is a flag the
//! loop polls between blocking calls; `stop()` joins the thread, so it returns
//! only after the run has released its device, buffer and store handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::AudioError;

/// Identifies one start..finish cycle of an engine.
pub type RunId = u64;

pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Capture,
    Playback,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Playback => "playback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Stopping,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// `stop()` was observed at an iteration boundary.
    Cancelled,
    /// Playback reached the end of the store.
    Exhausted,
    Failed(AudioError),
}

/// Posted by the run thread after it has released its resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub kind: EngineKind,
    pub run: RunId,
    pub outcome: RunOutcome,
    /// Bytes moved between device and store during the run.
    pub bytes: u64,
}

struct ActiveRun {
    id: RunId,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub(crate) struct EngineCore {
    kind: EngineKind,
    thread_name: &'static str,
    state: Arc<Mutex<EngineState>>,
    run: Option<ActiveRun>,
    next_run: RunId,
    events: Option<EngineEventSender>,
}

impl EngineCore {
    pub(crate) fn new(
        kind: EngineKind,
        thread_name: &'static str,
        events: Option<EngineEventSender>,
    ) -> Self {
        Self {
            kind,
            thread_name,
            state: Arc::new(Mutex::new(EngineState::Idle)),
            run: None,
            next_run: 1,
            events,
        }
    }

    pub(crate) fn state(&self) -> EngineState {
        *self.state.lock()
    }

    pub(crate) fn current_run(&self) -> Option<RunId> {
        self.run.as_ref().map(|run| run.id)
    }

    pub(crate) fn ensure_idle(&mut self) -> Result<(), AudioError> {
        if self.state() != EngineState::Idle {
            return Err(AudioError::Busy(self.kind.as_str()));
        }
        // A run that finished on its own still has a handle to reap
        self.join_finished();
        Ok(())
    }

    /// Spawn the run thread. `body` owns every resource of the run and must
    /// drop them before returning its outcome and byte count.
    pub(crate) fn spawn<F>(&mut self, body: F) -> Result<RunId, AudioError>
    where
        F: FnOnce(&AtomicBool) -> (RunOutcome, u64) + Send + 'static,
    {
        self.ensure_idle()?;

        let id = self.next_run;
        self.next_run += 1;
        let cancel = Arc::new(AtomicBool::new(false));
        *self.state.lock() = EngineState::Running;

        let handle = {
            let kind = self.kind;
            let cancel = cancel.clone();
            let state = self.state.clone();
            let events = self.events.clone();
            thread::Builder::new()
                .name(self.thread_name.into())
                .spawn(move || {
                    let (outcome, bytes) = body(cancel.as_ref());
                    match &outcome {
                        RunOutcome::Failed(e) => {
                            log::error!("{} run {} failed after {} bytes: {}", kind.as_str(), id, bytes, e)
                        }
                        other => {
                            log::info!("{} run {} ended ({:?}), {} bytes", kind.as_str(), id, other, bytes)
                        }
                    }
                    *state.lock() = EngineState::Idle;
                    if let Some(events) = events {
                        let _ = events.send(EngineEvent { kind, run: id, outcome, bytes });
                    }
                })
        };

        match handle {
            Ok(handle) => {
                self.run = Some(ActiveRun { id, cancel, handle });
                Ok(id)
            }
            Err(e) => {
                *self.state.lock() = EngineState::Idle;
                Err(AudioError::device(format!("failed to spawn {}: {}", self.thread_name, e)))
            }
        }
    }

    /// Signal the run to exit and wait for it. No-op when idle.
    ///
    /// Returns once the current blocking device call has come back and the
    /// run has released everything, i.e. within about one buffer duration.
    pub(crate) fn stop(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };

        {
            let mut state = self.state.lock();
            if *state == EngineState::Running {
                *state = EngineState::Stopping;
            }
        }
        run.cancel.store(true, Ordering::Release);
        if run.handle.join().is_err() {
            log::error!("{} thread panicked", self.thread_name);
        }
        *self.state.lock() = EngineState::Idle;
    }

    fn join_finished(&mut self) {
        if let Some(run) = self.run.take() {
            if run.handle.join().is_err() {
                log::error!("{} thread panicked", self.thread_name);
            }
        }
    }
}

impl Drop for EngineCore {
    fn drop(&mut self) {
        self.stop();
    }
}
