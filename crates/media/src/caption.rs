use anyhow::{Context, Result};
use md5::{Digest, Md5};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use tokio::io::AsyncReadExt;
use tracing::{debug, error};

use crate::config::MediaConfig;
use crate::language::join_display_names;
use crate::mediainfo::{run_mediainfo, MediaInfoReport};
use crate::quality::video_quality;
use crate::readable::{readable_file_size, readable_time};

/// Rendered in place of any placeholder without a value
pub const MISSING_FIELD: &str = "Unknown";

/// Caption values keyed by placeholder name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptionFields {
    values: HashMap<String, String>,
}

impl CaptionFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Value for `key`, or `Unknown` when it was never set
    pub fn get(&self, key: &str) -> &str {
        self.values
            .get(key)
            .map(String::as_str)
            .unwrap_or(MISSING_FIELD)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CaptionFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = CaptionFields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(.+?)\s+(\d{4})\b").expect("year pattern is valid")
    })
}

/// Drop the extension and, when a four-digit year follows the title,
/// reformat as `Title (Year)`
pub fn clean_filename(filename: &str) -> String {
    let stem = match filename.rfind('.') {
        Some(dot) if dot > 0 => &filename[..dot],
        _ => filename,
    };

    match year_pattern().captures(stem) {
        Some(caps) => format!("{} ({})", caps[1].trim(), &caps[2]),
        None => stem.to_string(),
    }
}

/// Substitute `{name}` placeholders from `fields`.
///
/// `{{` and `}}` produce literal braces. Anything after `:` or `!` inside a
/// placeholder is ignored. An unterminated `{` is copied through as-is.
pub fn render_template(template: &str, fields: &CaptionFields) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
        } else {
            match tail.find('}') {
                Some(end) => {
                    let inner = &tail[1..end];
                    let key = inner.split([':', '!']).next().unwrap_or_default();
                    out.push_str(fields.get(key));
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        }
    }

    out.push_str(rest);
    out
}

/// Hex MD5 digest of a file, read in `chunk_size` pieces
pub async fn file_md5(path: &Path, chunk_size: usize) -> Result<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {} for hashing", path.display()))?;

    let mut hasher = Md5::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Assemble caption values from a mediainfo report
pub fn build_caption_fields(
    filename: &str,
    size_bytes: u64,
    report: &MediaInfoReport,
    md5_hash: &str,
) -> CaptionFields {
    let video = report.first_video();

    let duration = video
        .and_then(|v| v.duration)
        .map(f64::round_ties_even)
        .unwrap_or(0.0);
    let quality = video_quality(video.and_then(|v| v.height));

    let audios = join_display_names(report.audio_tracks().filter_map(|t| t.language.as_deref()));
    let subtitles = join_display_names(report.text_tracks().filter_map(|t| t.language.as_deref()));

    let mut fields = CaptionFields::new();
    fields.insert("filename", clean_filename(filename));
    fields.insert("size", readable_file_size(size_bytes));
    fields.insert("duration", readable_time(duration, true));
    fields.insert("quality", quality);
    fields.insert(
        "audios",
        if audios.is_empty() { MISSING_FIELD.to_string() } else { audios },
    );
    fields.insert(
        "subtitles",
        if subtitles.is_empty() { "-".to_string() } else { subtitles },
    );
    fields.insert("md5_hash", md5_hash);
    fields
}

/// Build a caption for `directory/filename` from `template`.
///
/// Never fails: if the file cannot be inspected the bare filename is returned.
pub async fn generate_caption(
    config: &MediaConfig,
    directory: &Path,
    filename: &str,
    template: &str,
) -> String {
    match try_generate_caption(config, directory, filename, template).await {
        Ok(caption) => caption,
        Err(e) => {
            error!("Failed to retrieve media info: {:#}. File may not exist!", e);
            filename.to_string()
        }
    }
}

async fn try_generate_caption(
    config: &MediaConfig,
    directory: &Path,
    filename: &str,
    template: &str,
) -> Result<String> {
    let path = directory.join(filename);

    let report = run_mediainfo(config, &path).await?;
    let size_bytes = tokio::fs::metadata(&path)
        .await
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    let md5_hash = file_md5(&path, config.hash_chunk_size).await?;

    let fields = build_caption_fields(filename, size_bytes, &report, &md5_hash);
    debug!("Caption fields for {}: {:?}", path.display(), fields);

    Ok(render_template(template, &fields))
}
