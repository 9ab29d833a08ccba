use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::controller::TransportStatus;

/// Commands typed at the terminal, one per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    /// Start or stop recording, like the record button
    ToggleRecording,
    TogglePlayback,
    /// Stop whatever is active
    Stop,
    Status,
    Grant,
    Revoke,
    Help,
    Quit,
}

impl FromStr for UiCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        match line.trim().to_ascii_lowercase().as_str() {
            "r" | "record" => Ok(Self::ToggleRecording),
            "p" | "play" => Ok(Self::TogglePlayback),
            "s" | "stop" => Ok(Self::Stop),
            "" | "status" => Ok(Self::Status),
            "grant" => Ok(Self::Grant),
            "revoke" => Ok(Self::Revoke),
            "h" | "help" | "?" => Ok(Self::Help),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command: {}", other)),
        }
    }
}

pub enum UiEvent {
    Command(UiCommand),
    Invalid(String),
    /// stdin closed
    Closed,
}

pub const HELP: &str = "commands: record (r), play (p), stop (s), status, grant, revoke, help, quit (q)";

/// Turns stdin lines into [`UiEvent`]s on a channel.
pub struct UiBridge {
    tx: mpsc::Sender<UiEvent>,
}

impl UiBridge {
    pub fn new(tx: mpsc::Sender<UiEvent>) -> Self {
        Self { tx }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let event = match line.parse::<UiCommand>() {
                Ok(cmd) => UiEvent::Command(cmd),
                Err(msg) => UiEvent::Invalid(msg),
            };
            if self.tx.send(event).await.is_err() {
                return Ok(());
            }
        }
        let _ = self.tx.send(UiEvent::Closed).await;
        Ok(())
    }
}

/// One-line JSON rendering of the transport for the terminal.
pub fn render_status(status: &TransportStatus) -> String {
    serde_json::to_string(status).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
}
