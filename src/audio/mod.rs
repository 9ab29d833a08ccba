//! audio - Capture and playback engines over blocking PCM endpoints
//!
//! Uses ALSA for device I/O. Each engine run owns its device, its frame
//! buffer and its store handle on a dedicated thread.

mod alsa_device;
mod capture;
mod endpoint;
mod engine;
mod format;
mod frame_buffer;
mod playback;

#[cfg(test)]
pub(crate) mod mock;

pub use alsa_device::AlsaBackend;
pub use capture::CaptureEngine;
pub use endpoint::{AudioBackend, InputEndpoint, OutputEndpoint};
pub use engine::{
    EngineEvent, EngineEventReceiver, EngineEventSender, EngineKind, EngineState, RunId, RunOutcome,
};
pub use format::AudioFormatSpec;
pub use frame_buffer::FrameBuffer;
pub use playback::PlaybackEngine;
