// Text watermark overlay command builder

use std::path::Path;

use super::common::{input_flags, output_flags, temp_output_path};
use super::TranscodeCommand;
use crate::config::MediaConfig;

/// Build a command that burns `key` into the top-left corner of the video
pub fn build_watermark_command(config: &MediaConfig, input: &Path, key: &str) -> TranscodeCommand {
    let output = temp_output_path(config, input);

    let mut command = input_flags(config, input);
    command.push("-vf".to_string());
    command.push(drawtext_filter(
        key,
        &config.watermark_font.to_string_lossy(),
        config.watermark_font_size,
    ));
    command.extend(output_flags(config, &output));

    TranscodeCommand {
        args: command,
        output,
    }
}

/// drawtext filter value for the watermark
pub fn drawtext_filter(text: &str, font: &str, font_size: u32) -> String {
    format!(
        "drawtext=text='{}':fontfile={}:fontsize={}:fontcolor=white:x=10:y=10",
        escape_filter_text(text),
        escape_filter_value(font),
        font_size
    )
}

/// Escape text placed inside a single-quoted filter option.
///
/// Three parsers see the value: the graph parser strips the quotes, the
/// option parser unescapes one level of backslashes, then drawtext's text
/// expansion treats `\` and `%` as special. Colons need one backslash,
/// while backslashes and percent signs must survive to the expansion stage
/// still escaped. A quote closes the string, emits `\\\'` (which reaches
/// the option parser as `\'`) and reopens.
pub fn escape_filter_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\'' => out.push_str(r"'\\\''"),
            '\\' => out.push_str(r"\\\\"),
            ':' => out.push_str(r"\:"),
            '%' => out.push_str(r"\\%"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ':' | '\'' | ',' | ';' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
