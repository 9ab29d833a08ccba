//! Microphone → store pipeline.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use super::endpoint::{AudioBackend, InputEndpoint};
use super::engine::{EngineCore, EngineEventSender, EngineKind, EngineState, RunId, RunOutcome};
use super::format::AudioFormatSpec;
use super::frame_buffer::FrameBuffer;
use crate::error::AudioError;
use crate::store::SampleStore;

/// Pulls frames from an input endpoint and appends them to the store.
pub struct CaptureEngine {
    backend: Arc<dyn AudioBackend>,
    core: EngineCore,
}

impl CaptureEngine {
    pub fn new(backend: Arc<dyn AudioBackend>, events: Option<EngineEventSender>) -> Self {
        Self {
            backend,
            core: EngineCore::new(EngineKind::Capture, "audio-record", events),
        }
    }

    pub fn state(&self) -> EngineState {
        self.core.state()
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.core.current_run()
    }

    /// Open the input device, truncate the store and start the pull loop.
    ///
    /// `authorized` is the caller's verdict from the permission gate; the
    /// device is not touched without it. The store is only truncated once the
    /// device has opened, so a failed start leaves the previous take intact.
    pub fn start(
        &mut self,
        format: &AudioFormatSpec,
        store: &dyn SampleStore,
        authorized: bool,
    ) -> Result<RunId, AudioError> {
        if !authorized {
            return Err(AudioError::PermissionDenied);
        }
        self.core.ensure_idle()?;

        let input = self.backend.open_input(format).map_err(AudioError::device)?;
        let capacity = input.min_buffer_bytes();
        if capacity == 0 {
            return Err(AudioError::DeviceUnavailable("capture device reported no buffer size".into()));
        }
        let sink = store.create_sink()?;

        log::info!(
            "Recording started: rate={}, ch={}, buffer={} bytes",
            format.sample_rate,
            format.channels,
            capacity,
        );

        self.core.spawn(move |cancel| {
            let mut input = input;
            let mut sink = sink;
            let mut buffer = FrameBuffer::with_capacity(capacity);
            let mut written = 0u64;

            let result = pull_loop(input.as_mut(), &mut sink, &mut buffer, cancel, &mut written);

            // Device first, then the store
            drop(input);
            let result = result.and_then(|()| sink.flush().map_err(AudioError::store));
            drop(sink);

            let outcome = match result {
                Ok(()) => RunOutcome::Cancelled,
                Err(e) => RunOutcome::Failed(e),
            };
            (outcome, written)
        })
    }

    /// Idempotent. Blocks until the in-flight read returns and the device and
    /// store are closed.
    pub fn stop(&mut self) {
        if self.core.current_run().is_some() {
            log::info!("Recording stopping");
        }
        self.core.stop();
    }
}

fn pull_loop(
    input: &mut dyn InputEndpoint,
    sink: &mut dyn Write,
    buffer: &mut FrameBuffer,
    cancel: &AtomicBool,
    written: &mut u64,
) -> Result<(), AudioError> {
    while !cancel.load(Ordering::Acquire) {
        // The backend has already tried to recover, an error here is final
        let read = input.read(buffer.as_mut_slice()).map_err(AudioError::device)?;
        if read == 0 {
            thread::yield_now();
            continue;
        }

        let frame = buffer.filled(read);
        sink.write_all(frame).map_err(AudioError::store)?;
        *written += frame.len() as u64;
    }
    Ok(())
}
