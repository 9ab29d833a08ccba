//! Command-line arguments and logging setup.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::config::Config;

/// pcm_lab - record the microphone to a raw PCM file and play it back
#[derive(Parser, Debug)]
#[command(name = "pcm_lab")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// ALSA capture device (overrides config.toml)
    #[arg(long)]
    pub capture_device: Option<String>,

    /// ALSA playback device (overrides config.toml)
    #[arg(long)]
    pub playback_device: Option<String>,

    /// Raw PCM store location (overrides config.toml)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Increase logging verbosity (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    /// Fold the command-line overrides into the build-time configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(device) = &self.capture_device {
            config.capture_device = device.clone();
        }
        if let Some(device) = &self.playback_device {
            config.playback_device = device.clone();
        }
        if let Some(path) = &self.store {
            config.store_path = path.clone();
        }
    }
}

/// Crate modules log at the requested level, dependencies stay at warn.
/// `RUST_LOG` still applies on top.
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn);
    builder.filter_module("pcm_lab", args.log_level());
    builder.parse_default_env();
    builder.format_timestamp_millis().init();
}
