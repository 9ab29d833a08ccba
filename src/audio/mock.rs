//! Scripted endpoints and stores standing in for ALSA and the disk in tests.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use parking_lot::Mutex;

use super::endpoint::{AudioBackend, InputEndpoint, OutputEndpoint};
use super::format::AudioFormatSpec;
use crate::error::AudioError;
use crate::store::{SampleSink, SampleSource, SampleStore};

/// One scripted result of `InputEndpoint::read`.
#[derive(Debug, Clone)]
pub enum ReadStep {
    Data(Vec<u8>),
    /// Nothing captured this cycle
    Empty,
    /// The device is gone and could not be recovered
    Fault,
}

/// What the endpoints did, shared with the test.
#[derive(Default)]
pub struct MockShared {
    pub open_input_calls: AtomicUsize,
    pub open_output_calls: AtomicUsize,
    pub input_drained: AtomicBool,
    pub input_closed: AtomicBool,
    pub output_closed: AtomicBool,
    pub output_drained: AtomicBool,
    pub writes: Mutex<Vec<Vec<u8>>>,
}

impl MockShared {
    pub fn write_calls(&self) -> usize {
        self.writes.lock().len()
    }

    pub fn played_bytes(&self) -> Vec<u8> {
        self.writes.lock().concat()
    }
}

pub struct MockBackend {
    pub shared: Arc<MockShared>,
    buffer_bytes: usize,
    script: Mutex<Vec<ReadStep>>,
    read_delay: Duration,
    write_delay: Duration,
    fail_input: bool,
    fail_output: bool,
}

impl MockBackend {
    pub fn new(buffer_bytes: usize) -> Self {
        Self {
            shared: Arc::new(MockShared::default()),
            buffer_bytes,
            script: Mutex::new(Vec::new()),
            read_delay: Duration::ZERO,
            write_delay: Duration::ZERO,
            fail_input: false,
            fail_output: false,
        }
    }

    pub fn with_script(self, script: Vec<ReadStep>) -> Self {
        *self.script.lock() = script;
        self
    }

    /// Feed `bytes` as consecutive full-buffer reads.
    pub fn with_capture(self, bytes: &[u8]) -> Self {
        let steps = bytes
            .chunks(self.buffer_bytes)
            .map(|chunk| ReadStep::Data(chunk.to_vec()))
            .collect();
        self.with_script(steps)
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    /// Simulates a device that takes real time to accept a buffer.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    pub fn failing_input(mut self) -> Self {
        self.fail_input = true;
        self
    }

    pub fn failing_output(mut self) -> Self {
        self.fail_output = true;
        self
    }
}

impl AudioBackend for MockBackend {
    fn open_input(&self, _format: &AudioFormatSpec) -> Result<Box<dyn InputEndpoint>> {
        self.shared.open_input_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_input {
            return Err(anyhow!("no capture device"));
        }
        self.shared.input_drained.store(false, Ordering::SeqCst);
        self.shared.input_closed.store(false, Ordering::SeqCst);
        Ok(Box::new(ScriptedInput {
            steps: std::mem::take(&mut *self.script.lock()).into(),
            buffer_bytes: self.buffer_bytes,
            delay: self.read_delay,
            shared: self.shared.clone(),
        }))
    }

    fn open_output(&self, _format: &AudioFormatSpec) -> Result<Box<dyn OutputEndpoint>> {
        self.shared.open_output_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_output {
            return Err(anyhow!("no playback device"));
        }
        self.shared.output_closed.store(false, Ordering::SeqCst);
        Ok(Box::new(RecordingOutput {
            buffer_bytes: self.buffer_bytes,
            delay: self.write_delay,
            shared: self.shared.clone(),
        }))
    }
}

struct ScriptedInput {
    steps: VecDeque<ReadStep>,
    buffer_bytes: usize,
    delay: Duration,
    shared: Arc<MockShared>,
}

impl InputEndpoint for ScriptedInput {
    fn min_buffer_bytes(&self) -> usize {
        self.buffer_bytes
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        match self.steps.pop_front() {
            Some(ReadStep::Data(mut chunk)) => {
                if chunk.len() > buf.len() {
                    let rest = chunk.split_off(buf.len());
                    self.steps.push_front(ReadStep::Data(rest));
                }
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            Some(ReadStep::Empty) => Ok(0),
            Some(ReadStep::Fault) => Err(anyhow!("device disconnected")),
            None => {
                // Idle microphone: nothing arrives, like a device blocking
                self.shared.input_drained.store(true, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(1));
                Ok(0)
            }
        }
    }
}

impl Drop for ScriptedInput {
    fn drop(&mut self) {
        self.shared.input_closed.store(true, Ordering::SeqCst);
    }
}

struct RecordingOutput {
    buffer_bytes: usize,
    delay: Duration,
    shared: Arc<MockShared>,
}

impl OutputEndpoint for RecordingOutput {
    fn min_buffer_bytes(&self) -> usize {
        self.buffer_bytes
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.shared.writes.lock().push(buf.to_vec());
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        self.shared.output_drained.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for RecordingOutput {
    fn drop(&mut self) {
        self.shared.output_closed.store(true, Ordering::SeqCst);
    }
}

/// A store whose disk is full.
pub struct FullDiskStore;

impl SampleStore for FullDiskStore {
    fn create_sink(&self) -> Result<SampleSink, AudioError> {
        Ok(Box::new(FullDisk))
    }

    fn open_source(&self) -> Result<SampleSource, AudioError> {
        Err(AudioError::SourceMissing)
    }

    fn recorded_bytes(&self) -> u64 {
        0
    }
}

struct FullDisk;

impl Write for FullDisk {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("no space left on device"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Deterministic non-repeating-ish PCM bytes.
pub fn pcm_pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 251) as u8).collect()
}

/// Poll `cond` every millisecond until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}
