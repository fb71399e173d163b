use anyhow::{anyhow, Context, Result};
use std::process::Command;

use crate::config::MediaConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCheck {
    pub binary: String,
    pub result: Result<String, String>,
}

impl ToolCheck {
    pub fn is_available(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run `binary <version_flag>` and return the first line it prints
pub fn check_tool(binary: &str, version_flag: &str) -> Result<String> {
    let output = Command::new(binary)
        .arg(version_flag)
        .output()
        .with_context(|| {
            format!(
                "Failed to execute {} {}. Is it installed and in PATH?",
                binary, version_flag
            )
        })?;

    if !output.status.success() {
        return Err(anyhow!("{} {} command failed", binary, version_flag));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    first_line(&stdout).ok_or_else(|| anyhow!("{} printed no version information", binary))
}

/// Check every external binary the helpers shell out to
pub fn check_tools(config: &MediaConfig) -> Vec<ToolCheck> {
    [
        (config.ffprobe_path.as_str(), "-version"),
        (config.mediainfo_path.as_str(), "--Version"),
        (config.transcoder_path.as_str(), "-version"),
    ]
    .into_iter()
    .map(|(binary, flag)| ToolCheck {
        binary: binary.to_string(),
        result: check_tool(binary, flag).map_err(|e| format!("{:#}", e)),
    })
    .collect()
}

/// First non-blank line of a tool's output, trimmed
pub fn first_line(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
