//! Blocking PCM endpoint abstraction.
//!
//! Engines only ever see these traits; whether the platform API underneath is
//! callback- or poll-driven is the backend's business.

use anyhow::Result;

use super::format::AudioFormatSpec;

/// A capture device opened at a fixed format.
///
/// Dropping the endpoint closes the device.
pub trait InputEndpoint: Send {
    /// Smallest read the hardware is happy with, in bytes.
    fn min_buffer_bytes(&self) -> usize;

    /// Block until audio is available and copy up to `buf.len()` bytes into
    /// `buf`. `Ok(0)` means nothing was captured this cycle, including after a
    /// recovered overrun. `Err` means the device cannot be recovered and ends
    /// the run.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// A playback device opened at a fixed format.
///
/// Dropping the endpoint closes the device and discards anything queued.
pub trait OutputEndpoint: Send {
    fn min_buffer_bytes(&self) -> usize;

    /// Block until the device has accepted every byte of `buf`.
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Block until queued audio has been played out.
    fn drain(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens endpoints on a concrete audio stack.
pub trait AudioBackend: Send + Sync {
    fn open_input(&self, format: &AudioFormatSpec) -> Result<Box<dyn InputEndpoint>>;

    fn open_output(&self, format: &AudioFormatSpec) -> Result<Box<dyn OutputEndpoint>>;
}
