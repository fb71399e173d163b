use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error};

use crate::config::MediaConfig;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to execute {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ffprobe exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("invalid ffprobe JSON output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no streams found in ffprobe output")]
    NoStreams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Other(String),
}

impl From<&str> for StreamKind {
    fn from(codec_type: &str) -> Self {
        match codec_type {
            "video" => StreamKind::Video,
            "audio" => StreamKind::Audio,
            "subtitle" => StreamKind::Subtitle,
            other => StreamKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeStream {
    pub index: usize,
    pub kind: StreamKind,
    pub codec_name: Option<String>,
    pub height: Option<u32>,
    pub language: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormatInfo {
    pub filename: Option<String>,
    pub duration: Option<f64>,
    pub size: Option<u64>,
}

// Internal FFprobe JSON structures
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    streams: Option<Vec<FfprobeStream>>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    filename: Option<String>,
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: usize,
    codec_type: Option<String>,
    codec_name: Option<String>,
    height: Option<u32>,
    tags: Option<FfprobeTags>,
}

#[derive(Debug, Deserialize)]
struct FfprobeTags {
    language: Option<String>,
    title: Option<String>,
}

/// Enumerate the streams of a media file
pub async fn probe_streams(
    config: &MediaConfig,
    path: &Path,
) -> Result<Vec<ProbeStream>, ProbeError> {
    let stdout = run_ffprobe(config, "-show_streams", path).await?;
    parse_streams(&stdout)
}

/// Read container-level format information
pub async fn probe_format(config: &MediaConfig, path: &Path) -> Result<FormatInfo, ProbeError> {
    let stdout = run_ffprobe(config, "-show_format", path).await?;
    parse_format(&stdout)
}

/// Basename reported by the container, falling back to the input path.
/// Returns `None` when the probe fails.
pub async fn probe_filename(config: &MediaConfig, path: &Path) -> Option<String> {
    match probe_format(config, path).await {
        Ok(format) => {
            let name = format
                .filename
                .as_deref()
                .map(Path::new)
                .unwrap_or(path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string());
            debug!("Extracted filename: {:?}", name);
            name
        }
        Err(e) => {
            error!("Error getting file info for {}: {}", path.display(), e);
            None
        }
    }
}

async fn run_ffprobe(
    config: &MediaConfig,
    section: &str,
    path: &Path,
) -> Result<Vec<u8>, ProbeError> {
    let output = Command::new(&config.ffprobe_path)
        .args(["-hide_banner", "-loglevel", "error", "-print_format", "json", section])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| ProbeError::Spawn {
            binary: config.ffprobe_path.clone(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!("Error getting stream info: {}", stderr);
        return Err(ProbeError::Failed {
            code: output.status.code(),
            stderr,
        });
    }

    Ok(output.stdout)
}

/// Parse `-show_streams` JSON output
pub fn parse_streams(json: &[u8]) -> Result<Vec<ProbeStream>, ProbeError> {
    let output: FfprobeOutput = serde_json::from_slice(json)?;
    let streams = output.streams.ok_or(ProbeError::NoStreams)?;

    Ok(streams
        .into_iter()
        .map(|stream| {
            let (language, title) = match stream.tags {
                Some(tags) => (tags.language, tags.title),
                None => (None, None),
            };
            ProbeStream {
                index: stream.index,
                kind: StreamKind::from(stream.codec_type.as_deref().unwrap_or("unknown")),
                codec_name: stream.codec_name,
                height: stream.height,
                language,
                title,
            }
        })
        .collect())
}

/// Parse `-show_format` JSON output
pub fn parse_format(json: &[u8]) -> Result<FormatInfo, ProbeError> {
    let output: FfprobeOutput = serde_json::from_slice(json)?;

    Ok(match output.format {
        Some(fmt) => FormatInfo {
            filename: fmt.filename,
            duration: fmt.duration.and_then(|d| d.parse::<f64>().ok()),
            size: fmt.size.and_then(|s| s.parse::<u64>().ok()),
        },
        None => FormatInfo::default(),
    })
}
