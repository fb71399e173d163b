pub mod common;
pub mod metadata;
pub mod thumbnail;
pub mod watermark;

pub use metadata::{build_metadata_command, metadata_command};
pub use thumbnail::{attachment_mime_type, build_embed_thumb_command};
pub use watermark::build_watermark_command;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::debug;

/// A ready-to-run transcoder invocation. `args[0]` is the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeCommand {
    pub args: Vec<String>,
    pub output: PathBuf,
}

impl TranscodeCommand {
    pub fn program(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }

    pub fn arguments(&self) -> &[String] {
        self.args.get(1..).unwrap_or_default()
    }
}

/// Latest values reported on the transcoder's `-progress` stream
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranscodeProgress {
    pub out_time_secs: Option<f64>,
    pub total_size_bytes: Option<u64>,
    pub speed_x: Option<f64>,
    pub finished: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TranscodeProgress {
    /// Fold one `key=value` progress line into the snapshot.
    /// Returns true when the line carried a known key.
    pub fn apply_line(&mut self, line: &str) -> bool {
        let Some((k, v)) = line.trim().split_once('=') else {
            return false;
        };

        match k {
            "out_time_ms" | "out_time_us" => {
                // Both keys carry microseconds
                match v.parse::<u64>() {
                    Ok(us) => self.out_time_secs = Some(us as f64 / 1_000_000.0),
                    Err(_) => return false,
                }
            }
            "out_time" => {
                if self.out_time_secs.is_none() {
                    self.out_time_secs = parse_out_time(v);
                }
            }
            "total_size" => match v.parse::<u64>() {
                Ok(sz) => self.total_size_bytes = Some(sz),
                Err(_) => return false,
            },
            "speed" => match v.trim().trim_end_matches('x').parse::<f64>() {
                Ok(s) => self.speed_x = Some(s),
                Err(_) => return false,
            },
            "progress" => {
                if v == "end" {
                    self.finished = true;
                }
            }
            _ => return false,
        }

        self.updated_at = Some(Utc::now());
        true
    }
}

/// Parse `HH:MM:SS.micro` into seconds
pub fn parse_out_time(val: &str) -> Option<f64> {
    let parts: Vec<&str> = val.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let h = parts.first()?.parse::<f64>().ok()?;
    let m = parts.get(1)?.parse::<f64>().ok()?;
    let s = parts.get(2)?.parse::<f64>().ok()?;
    Some(h * 3600.0 + m * 60.0 + s)
}

/// Run a transcode command to completion, publishing progress as it arrives.
///
/// Returns the output path on success; on failure the error carries the exit
/// code and collected stderr.
pub async fn execute_transcode(
    command: &TranscodeCommand,
    progress_tx: Option<watch::Sender<TranscodeProgress>>,
) -> Result<PathBuf> {
    if command.program().is_empty() {
        return Err(anyhow!("Command has no program"));
    }

    debug!("Executing transcode command: {:?}", command.args);

    let mut child = Command::new(command.program())
        .args(command.arguments())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to spawn {}", command.program()))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("Failed to capture stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("Failed to capture stderr"))?;

    // Collect stderr for diagnostics
    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut output = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            output.push(line);
        }
        output
    });

    let mut progress = TranscodeProgress::default();
    let mut reader = BufReader::new(stdout).lines();
    while let Some(line) = reader.next_line().await? {
        if !progress.apply_line(&line) {
            continue;
        }
        if let Some(tx) = &progress_tx {
            tx.send_replace(progress.clone());
        }
        if progress.finished {
            break;
        }
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("Failed to wait for {}", command.program()))?;

    let stderr_lines = stderr_task
        .await
        .map_err(|e| anyhow!("Failed to read stderr: {}", e))?;

    if !status.success() {
        return Err(anyhow!(
            "{} failed with exit code: {:?}\nStderr:\n{}",
            command.program(),
            status.code(),
            stderr_lines.join("\n")
        ));
    }

    Ok(command.output.clone())
}
