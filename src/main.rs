use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;

use pcm_lab::audio::AlsaBackend;
use pcm_lab::cli::{self, Args};
use pcm_lab::config::Config;
use pcm_lab::permission::SettingsPermissionGate;
use pcm_lab::store::DurableSampleStore;
use pcm_lab::ui_bridge::{self, UiBridge, UiCommand, UiEvent};
use pcm_lab::{AudioError, TransportController};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    cli::init_logging(&args);

    let mut config = Config::new().map_err(anyhow::Error::msg)?;
    args.apply(&mut config);

    log::info!(
        "{} {} starting - capture: \"{}\", playback: \"{}\", store: {}",
        config.app_name,
        config.app_version,
        config.capture_device,
        config.playback_device,
        config.store_path.display(),
    );

    let backend = Arc::new(AlsaBackend::new(
        config.capture_device.clone(),
        config.playback_device.clone(),
    ));
    let store = Arc::new(DurableSampleStore::new(config.store_path.clone()));
    let gate = Arc::new(SettingsPermissionGate::new(
        config.capture_granted,
        config.grant_on_request,
    ));
    let (mut transport, mut rx_engine_event) =
        TransportController::new(backend, store, gate.clone());

    // Terminal input runs as its own task and feeds the main loop
    let (tx_ui_event, mut rx_ui_event) = mpsc::channel::<UiEvent>(16);
    let bridge = UiBridge::new(tx_ui_event);
    tokio::spawn(async move {
        if let Err(e) = bridge.run().await {
            log::error!("UiBridge error: {}", e);
        }
    });

    println!("{}", ui_bridge::HELP);
    println!("{}", ui_bridge::render_status(&transport.status()));

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!("Received Ctrl+C, shutting down...");
                break;
            }

            // Runs that ended on their own: playback ran out, or a loop failed
            Some(event) = rx_engine_event.recv() => {
                if let Some(e) = transport.handle_engine_event(event) {
                    report(&e);
                }
                println!("{}", ui_bridge::render_status(&transport.status()));
            }

            Some(event) = rx_ui_event.recv() => {
                match event {
                    UiEvent::Command(UiCommand::Quit) | UiEvent::Closed => break,
                    UiEvent::Command(cmd) => {
                        if let Err(e) = handle_command(&mut transport, &gate, cmd).await {
                            report(&e);
                        }
                        println!("{}", ui_bridge::render_status(&transport.status()));
                    }
                    UiEvent::Invalid(msg) => println!("{} ({})", msg, ui_bridge::HELP),
                }
            }
        }
    }

    transport.shutdown();
    log::info!("Shutdown complete");
    Ok(())
}

async fn handle_command(
    transport: &mut TransportController,
    gate: &SettingsPermissionGate,
    cmd: UiCommand,
) -> Result<(), AudioError> {
    match cmd {
        UiCommand::ToggleRecording => {
            if transport.status().is_recording {
                transport.request_stop_recording();
                Ok(())
            } else {
                transport.request_start_recording().await
            }
        }
        UiCommand::TogglePlayback => {
            if transport.status().is_playing {
                transport.request_stop_playback();
                Ok(())
            } else {
                transport.request_start_playback()
            }
        }
        UiCommand::Stop => {
            transport.request_stop_recording();
            transport.request_stop_playback();
            Ok(())
        }
        UiCommand::Grant => {
            gate.grant();
            Ok(())
        }
        UiCommand::Revoke => {
            gate.revoke();
            Ok(())
        }
        UiCommand::Help => {
            println!("{}", ui_bridge::HELP);
            Ok(())
        }
        UiCommand::Status | UiCommand::Quit => Ok(()),
    }
}

fn report(err: &AudioError) {
    log::warn!("{}", err);
    eprintln!("Error: {}", err);
}
