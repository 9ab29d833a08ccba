//! pcm_lab - capture the microphone to a raw PCM store and play it back.
//!
//! Two engines move fixed-size S16LE frames between an ALSA endpoint and the
//! store on their own threads; the [`TransportController`] keeps them
//! mutually exclusive and applies the permission gate.

pub mod audio;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod permission;
pub mod state_machine;
pub mod store;
pub mod ui_bridge;

pub use controller::{TransportController, TransportStatus};
pub use error::AudioError;
