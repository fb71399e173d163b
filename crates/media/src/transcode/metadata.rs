// Stream title/language rewrite command builder

use std::path::Path;
use tracing::{debug, warn};

use super::common::{input_flags, metadata_flag, output_flags, temp_output_path};
use super::TranscodeCommand;
use crate::config::MediaConfig;
use crate::language::title_language;
use crate::probe::{probe_filename, probe_streams, ProbeStream, StreamKind};

/// Subtitle codecs whose metadata the transcoder cannot rewrite in place
const UNSUPPORTED_SUBTITLE_CODECS: &[&str] = &["webvtt", "unknown"];

/// Build a stream-copy command that clears container metadata and stamps
/// `key` into every mapped stream's title.
///
/// Only the first video stream is kept. Audio titles are prefixed with the
/// track language. Subtitles in unsupported codecs are dropped.
pub fn build_metadata_command(
    config: &MediaConfig,
    input: &Path,
    streams: &[ProbeStream],
    key: &str,
) -> TranscodeCommand {
    let output = temp_output_path(config, input);
    let title = format!("title={}", key);

    let mut command = input_flags(config, input);
    command.extend(
        [
            "-map_metadata",
            "-1",
            "-c",
            "copy",
            "-metadata:s:v:0",
            title.as_str(),
            "-metadata",
            title.as_str(),
        ]
        .map(String::from),
    );

    let mut mapped_video = false;
    let mut audio_index = 0;
    let mut subtitle_index = 0;

    for stream in streams {
        let map = ["-map".to_string(), format!("0:{}", stream.index)];

        match &stream.kind {
            StreamKind::Video => {
                if mapped_video {
                    debug!("Dropping extra video stream {}", stream.index);
                    continue;
                }
                mapped_video = true;
                command.extend(map);
                command.extend(metadata_flag("-metadata:s:v:0", "title", key));
                if let Some(lang) = &stream.language {
                    command.extend(metadata_flag("-metadata:s:v:0", "language", lang));
                }
            }
            StreamKind::Audio => {
                let specifier = format!("-metadata:s:a:{}", audio_index);
                let lang_code = stream.language.as_deref().unwrap_or("");
                let lang_name = title_language(lang_code);
                let title_value = if lang_name.is_empty() {
                    key.to_string()
                } else {
                    format!("{}-{}", lang_name, key)
                };

                command.extend(map);
                command.extend(metadata_flag(&specifier, "title", &title_value));
                if !lang_code.is_empty() {
                    command.extend(metadata_flag(&specifier, "language", lang_code));
                }
                audio_index += 1;
            }
            StreamKind::Subtitle => {
                let codec_name = stream.codec_name.as_deref().unwrap_or("unknown");
                if UNSUPPORTED_SUBTITLE_CODECS.contains(&codec_name) {
                    warn!(
                        "Skipping unsupported subtitle metadata modification: {} for stream {}",
                        codec_name, stream.index
                    );
                    continue;
                }

                let specifier = format!("-metadata:s:s:{}", subtitle_index);
                command.extend(map);
                command.extend(metadata_flag(&specifier, "title", key));
                if let Some(lang) = &stream.language {
                    command.extend(metadata_flag(&specifier, "language", lang));
                }
                subtitle_index += 1;
            }
            StreamKind::Other(_) => {
                command.extend(map);
            }
        }
    }

    command.extend(output_flags(config, &output));

    TranscodeCommand {
        args: command,
        output,
    }
}

/// Probe `input` and build its metadata rewrite command.
///
/// Returns `None` when the file cannot be probed or has no streams.
pub async fn metadata_command(
    config: &MediaConfig,
    input: &Path,
    key: &str,
) -> Option<TranscodeCommand> {
    let streams = match probe_streams(config, input).await {
        Ok(streams) if !streams.is_empty() => streams,
        Ok(_) => {
            warn!("No streams found in {}", input.display());
            return None;
        }
        Err(e) => {
            warn!("Cannot build metadata command for {}: {}", input.display(), e);
            return None;
        }
    };

    if let Some(name) = probe_filename(config, input).await {
        debug!("Rewriting metadata for {}", name);
    }

    Some(build_metadata_command(config, input, &streams, key))
}
