// Attachment (cover thumbnail) embedding command builder

use std::path::Path;

use super::common::{input_flags, output_flags, temp_output_path};
use super::TranscodeCommand;
use crate::config::MediaConfig;

/// MIME type for an attachment, from its extension
pub fn attachment_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

/// Build a stream-copy command that attaches `attachment` to the container
pub fn build_embed_thumb_command(
    config: &MediaConfig,
    input: &Path,
    attachment: &Path,
) -> TranscodeCommand {
    let output = temp_output_path(config, input);

    let mut command = input_flags(config, input);
    command.push("-attach".to_string());
    command.push(attachment.to_string_lossy().to_string());
    command.push("-metadata:s:t".to_string());
    command.push(format!("mimetype={}", attachment_mime_type(attachment)));
    command.push("-c".to_string());
    command.push("copy".to_string());
    command.push("-map".to_string());
    command.push("0".to_string());
    command.extend(output_flags(config, &output));

    TranscodeCommand {
        args: command,
        output,
    }
}
