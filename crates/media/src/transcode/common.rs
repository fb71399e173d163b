// Common transcoder command components

use std::path::{Path, PathBuf};

use crate::config::MediaConfig;

/// Returns the leading flags every command shares:
/// - quiet banner and error-only logging
/// - machine readable progress on stdout
/// - the input file
pub fn input_flags(config: &MediaConfig, input: &Path) -> Vec<String> {
    vec![
        config.transcoder_path.clone(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
    ]
}

/// Returns the trailing thread limit and output path
pub fn output_flags(config: &MediaConfig, output: &Path) -> Vec<String> {
    vec![
        "-threads".to_string(),
        config.transcode_threads().to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Temp output written next to the input: `<input><temp_suffix>`
pub fn temp_output_path(config: &MediaConfig, input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(&config.temp_suffix);
    PathBuf::from(name)
}

/// Pair of flags setting one metadata key, e.g. `-metadata:s:a:0 title=...`
pub fn metadata_flag(specifier: &str, key: &str, value: &str) -> [String; 2] {
    [specifier.to_string(), format!("{}={}", key, value)]
}
