//! Store → speaker pipeline.

use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::endpoint::{AudioBackend, OutputEndpoint};
use super::engine::{EngineCore, EngineEventSender, EngineKind, EngineState, RunId, RunOutcome};
use super::format::AudioFormatSpec;
use super::frame_buffer::FrameBuffer;
use crate::error::AudioError;
use crate::store::SampleStore;

/// Pushes the recorded store to an output endpoint until it runs dry.
pub struct PlaybackEngine {
    backend: Arc<dyn AudioBackend>,
    core: EngineCore,
}

impl PlaybackEngine {
    pub fn new(backend: Arc<dyn AudioBackend>, events: Option<EngineEventSender>) -> Self {
        Self {
            backend,
            core: EngineCore::new(EngineKind::Playback, "audio-play", events),
        }
    }

    pub fn state(&self) -> EngineState {
        self.core.state()
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.core.current_run()
    }

    /// Open the store from its beginning, then the output device, and start
    /// the push loop. The run ends by itself with [`RunOutcome::Exhausted`]
    /// once the store is played out.
    pub fn start(
        &mut self,
        format: &AudioFormatSpec,
        store: &dyn SampleStore,
    ) -> Result<RunId, AudioError> {
        self.core.ensure_idle()?;

        let source = store.open_source()?;
        let output = self.backend.open_output(format).map_err(AudioError::device)?;
        let capacity = output.min_buffer_bytes();
        if capacity == 0 {
            return Err(AudioError::DeviceUnavailable("playback device reported no buffer size".into()));
        }

        log::info!(
            "Playback started: rate={}, ch={}, buffer={} bytes",
            format.sample_rate,
            format.channels,
            capacity,
        );

        self.core.spawn(move |cancel| {
            let mut source = source;
            let mut output = output;
            let mut buffer = FrameBuffer::with_capacity(capacity);
            let mut played = 0u64;

            let outcome = match push_loop(&mut source, output.as_mut(), &mut buffer, cancel, &mut played) {
                Ok(outcome) => outcome,
                Err(e) => RunOutcome::Failed(e),
            };
            drop(output);
            drop(source);
            (outcome, played)
        })
    }

    /// Idempotent. Blocks until the in-flight write returns; queued audio is
    /// discarded rather than played out.
    pub fn stop(&mut self) {
        if self.core.current_run().is_some() {
            log::info!("Playback stopping");
        }
        self.core.stop();
    }
}

fn push_loop(
    source: &mut dyn Read,
    output: &mut dyn OutputEndpoint,
    buffer: &mut FrameBuffer,
    cancel: &AtomicBool,
    played: &mut u64,
) -> Result<RunOutcome, AudioError> {
    loop {
        if cancel.load(Ordering::Acquire) {
            return Ok(RunOutcome::Cancelled);
        }

        let read = fill(source, buffer.as_mut_slice()).map_err(AudioError::store)?;
        if read == 0 {
            // Let the tail of the take reach the speaker before closing
            output.drain().map_err(AudioError::device)?;
            return Ok(RunOutcome::Exhausted);
        }

        if cancel.load(Ordering::Acquire) {
            return Ok(RunOutcome::Cancelled);
        }

        output.write(buffer.filled(read)).map_err(AudioError::device)?;
        *played += read as u64;
    }
}

/// Read until `buf` is full or the source ends, so every write but the last
/// carries a whole buffer.
fn fill(source: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
