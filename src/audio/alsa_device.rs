//! ALSA PCM device wrappers for audio capture and playback.

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::{Direction, ValueOr};
use anyhow::{Context, Result, bail};

use super::endpoint::{AudioBackend, InputEndpoint, OutputEndpoint};
use super::format::AudioFormatSpec;

/// Give up on a chunk after this many consecutive XRUN recoveries.
const MAX_WRITE_RECOVERIES: u32 = 3;

/// Parameters negotiated with the ALSA hardware.
#[derive(Debug, Clone)]
pub struct AlsaParams {
    pub sample_rate: u32,
    pub channels: u32,
    /// Period size in frames (one frame = channels × sample_width)
    pub period_size: usize,
}

/// Endpoints backed by named ALSA PCM devices.
#[derive(Debug, Clone)]
pub struct AlsaBackend {
    /// e.g. "default", "plughw:0,0"
    pub capture_device: String,
    pub playback_device: String,
}

impl AlsaBackend {
    pub fn new(capture_device: impl Into<String>, playback_device: impl Into<String>) -> Self {
        Self {
            capture_device: capture_device.into(),
            playback_device: playback_device.into(),
        }
    }
}

impl AudioBackend for AlsaBackend {
    fn open_input(&self, format: &AudioFormatSpec) -> Result<Box<dyn InputEndpoint>> {
        let (pcm, params) = open_capture(&self.capture_device, format)?;
        Ok(Box::new(AlsaInput {
            pcm,
            frame_bytes: format.bytes_per_frame(),
            period_bytes: params.period_size * format.bytes_per_frame(),
        }))
    }

    fn open_output(&self, format: &AudioFormatSpec) -> Result<Box<dyn OutputEndpoint>> {
        let (pcm, params) = open_playback(&self.playback_device, format)?;
        Ok(Box::new(AlsaOutput {
            pcm,
            frame_bytes: format.bytes_per_frame(),
            period_bytes: params.period_size * format.bytes_per_frame(),
        }))
    }
}

/// Open a PCM device for capture (recording).
pub fn open_capture(device: &str, format: &AudioFormatSpec) -> Result<(PCM, AlsaParams)> {
    open_pcm(device, Direction::Capture, format, "Capture")
}

/// Open a PCM device for playback.
pub fn open_playback(device: &str, format: &AudioFormatSpec) -> Result<(PCM, AlsaParams)> {
    open_pcm(device, Direction::Playback, format, "Playback")
}

fn open_pcm(
    device: &str,
    direction: Direction,
    format: &AudioFormatSpec,
    dir_name: &str,
) -> Result<(PCM, AlsaParams)> {
    if format.bits_per_sample != 16 {
        bail!("Unsupported sample width: {} bits", format.bits_per_sample);
    }

    let pcm = PCM::new(device, direction, false)
        .with_context(|| format!("Failed to open PCM device '{}' for {}", device, dir_name))?;

    // Configure hardware parameters
    {
        let hwp = HwParams::any(&pcm).with_context(|| "Failed to initialize HwParams")?;
        hwp.set_access(Access::RWInterleaved)?;
        hwp.set_format(Format::S16LE)
            .with_context(|| format!("'{}' does not support S16LE", device))?;
        hwp.set_channels(format.channels as u32)
            .with_context(|| format!("'{}' does not support {} channel(s)", device, format.channels))?;
        hwp.set_rate(format.sample_rate, ValueOr::Nearest)
            .with_context(|| format!("'{}' does not support {} Hz", device, format.sample_rate))?;
        pcm.hw_params(&hwp)?;
    }

    // Read back actual negotiated parameters
    let (actual_rate, actual_channels, period_size) = {
        let hwp = pcm.hw_params_current()?;
        let rate = hwp.get_rate()?;
        let ch = hwp.get_channels()?;
        let ps = hwp.get_period_size()? as usize;
        (rate, ch, ps)
    };

    // The store has no header, so anything but the exact format would corrupt it
    if actual_rate != format.sample_rate || actual_channels != format.channels as u32 {
        bail!(
            "'{}' negotiated {} Hz/{} ch instead of {} Hz/{} ch",
            device,
            actual_rate,
            actual_channels,
            format.sample_rate,
            format.channels,
        );
    }
    if period_size == 0 {
        bail!("'{}' reported a zero period size", device);
    }

    let params = AlsaParams {
        sample_rate: actual_rate,
        channels: actual_channels,
        period_size,
    };

    log::info!(
        "ALSA {}: device={}, rate={}, channels={}, period_size={}",
        dir_name,
        device,
        actual_rate,
        actual_channels,
        period_size,
    );

    Ok((pcm, params))
}

/// Split a byte count into whole frames and the leftover bytes.
fn whole_frames(len: usize, frame_bytes: usize) -> (usize, usize) {
    (len / frame_bytes, len % frame_bytes)
}

struct AlsaInput {
    pcm: PCM,
    frame_bytes: usize,
    period_bytes: usize,
}

impl InputEndpoint for AlsaInput {
    fn min_buffer_bytes(&self) -> usize {
        self.period_bytes
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.pcm.io_bytes().readi(buf) {
            Ok(frames) => Ok(frames * self.frame_bytes),
            Err(e) => {
                log::warn!("ALSA capture error: {}, recovering...", e);
                self.pcm
                    .prepare()
                    .with_context(|| "Failed to recover PCM capture")?;
                Ok(0)
            }
        }
    }
}

struct AlsaOutput {
    pcm: PCM,
    frame_bytes: usize,
    period_bytes: usize,
}

impl OutputEndpoint for AlsaOutput {
    fn min_buffer_bytes(&self) -> usize {
        self.period_bytes
    }

    // Retry loop covers short writes and XRUN recovery without losing frames
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        let io = self.pcm.io_bytes();
        let (total_frames, partial) = whole_frames(buf.len(), self.frame_bytes);
        if partial != 0 {
            log::warn!("Dropping {} trailing byte(s) that do not form a whole frame", partial);
        }
        let mut frames_written = 0;
        let mut retry_count = 0u32;

        while frames_written < total_frames {
            let offset = frames_written * self.frame_bytes;
            match io.writei(&buf[offset..total_frames * self.frame_bytes]) {
                Ok(n) => {
                    frames_written += n;
                    retry_count = 0;
                }
                Err(e) => {
                    log::warn!("ALSA XRUN or error: {}, recovering...", e);
                    retry_count += 1;
                    self.pcm
                        .prepare()
                        .with_context(|| "Failed to recover PCM playback")?;
                    if retry_count >= MAX_WRITE_RECOVERIES {
                        bail!(
                            "Max recovery retries ({}) reached with {} frames unwritten",
                            retry_count,
                            total_frames - frames_written
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        self.pcm.drain().with_context(|| "Failed to drain PCM playback")
    }
}
