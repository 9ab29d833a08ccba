//! Fixed PCM format shared by the recorder, the player and the raw store.

use std::time::Duration;

/// Immutable description of the PCM stream.
///
/// The store has no header, so writer and reader must agree on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormatSpec {
    /// Samples per second per channel
    pub sample_rate: u32,
    /// Signed little-endian linear sample width
    pub bits_per_sample: u16,
    pub channels: u16,
}

impl AudioFormatSpec {
    /// 44.1 kHz, S16LE, mono.
    pub const CD_MONO: Self = Self {
        sample_rate: 44_100,
        bits_per_sample: 16,
        channels: 1,
    };

    /// Bytes in one interleaved frame (one sample for each channel).
    pub const fn bytes_per_frame(&self) -> usize {
        (self.bits_per_sample as usize / 8) * self.channels as usize
    }

    pub const fn bytes_per_second(&self) -> usize {
        self.bytes_per_frame() * self.sample_rate as usize
    }

    /// Byte length of `duration` worth of audio, rounded down to a whole frame.
    pub fn bytes_for(&self, duration: Duration) -> usize {
        let frames = (duration.as_secs_f64() * self.sample_rate as f64) as usize;
        frames * self.bytes_per_frame()
    }

    /// Playing time represented by `bytes` of raw PCM.
    pub fn duration_of(&self, bytes: u64) -> Duration {
        let frames = bytes / self.bytes_per_frame() as u64;
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }
}

impl Default for AudioFormatSpec {
    fn default() -> Self {
        Self::CD_MONO
    }
}
