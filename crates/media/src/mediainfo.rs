use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

use crate::config::MediaConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    General,
    Video,
    Audio,
    Text,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaTrack {
    pub kind: TrackKind,
    pub duration: Option<f64>,
    pub height: Option<u32>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaInfoReport {
    pub tracks: Vec<MediaTrack>,
}

impl MediaInfoReport {
    pub fn first_video(&self) -> Option<&MediaTrack> {
        self.tracks.iter().find(|t| t.kind == TrackKind::Video)
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Audio)
    }

    pub fn text_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Text)
    }
}

// mediainfo --Output=JSON encodes every value as a string
#[derive(Debug, Deserialize)]
struct RawOutput {
    media: Option<RawMedia>,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    #[serde(default)]
    track: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "Duration")]
    duration: Option<String>,
    #[serde(rename = "Height")]
    height: Option<String>,
    #[serde(rename = "Language")]
    language: Option<String>,
}

/// Run mediainfo on a file and parse its JSON report
pub async fn run_mediainfo(config: &MediaConfig, path: &Path) -> Result<MediaInfoReport> {
    let output = Command::new(&config.mediainfo_path)
        .arg("--Output=JSON")
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to execute {}", config.mediainfo_path))?;

    if !output.stderr.is_empty() {
        info!(
            "MediaInfo command output: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    if !output.status.success() {
        anyhow::bail!("mediainfo exited with status {:?}", output.status.code());
    }

    parse_report(&output.stdout)
}

/// Parse mediainfo's JSON output
pub fn parse_report(json: &[u8]) -> Result<MediaInfoReport> {
    let raw: RawOutput =
        serde_json::from_slice(json).context("Failed to parse mediainfo JSON output")?;

    let tracks = raw
        .media
        .map(|m| m.track)
        .unwrap_or_default()
        .into_iter()
        .map(|t| MediaTrack {
            kind: match t.kind.as_deref() {
                Some("General") => TrackKind::General,
                Some("Video") => TrackKind::Video,
                Some("Audio") => TrackKind::Audio,
                Some("Text") => TrackKind::Text,
                _ => TrackKind::Other,
            },
            duration: t.duration.and_then(|d| d.trim().parse::<f64>().ok()),
            height: t.height.and_then(|h| h.trim().parse::<u32>().ok()),
            language: t.language.filter(|l| !l.trim().is_empty()),
        })
        .collect();

    Ok(MediaInfoReport { tracks })
}
