//! Bubble writer - drains the emit channel to file
//!
//! Emissions are written in JSONL format (one tagged JSON object per line)
//! to the file specified in config. This stands in for the rendering
//! collaborator on deployments without a live display attached.

use crate::io::emit_channel::EmitMessage;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

/// Consumes emit messages and appends them to the bubble file
pub struct BubbleWriter {
    file_path: String,
    rx: mpsc::Receiver<EmitMessage>,
}

impl BubbleWriter {
    pub fn new(file_path: &str, rx: mpsc::Receiver<EmitMessage>) -> Self {
        info!(file_path = %file_path, "bubble_writer_initialized");
        Self { file_path: file_path.to_string(), rx }
    }

    /// Drain the channel until shutdown or all senders drop
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("bubble_writer_shutdown");
                        return;
                    }
                }
                message = self.rx.recv() => {
                    match message {
                        Some(msg) => self.write_message(&msg),
                        None => return, // Channel closed
                    }
                }
            }
        }
    }

    fn write_message(&self, message: &EmitMessage) {
        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "emit_serialize_failed");
                return;
            }
        };

        if let Err(e) = self.append_line(&json) {
            error!(file = %self.file_path, error = %e, "bubble_write_failed");
        }
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "bubble_written");

        Ok(())
    }
}
