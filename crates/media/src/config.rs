use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CAPTION_TEMPLATE: &str = "<b>{filename}</b>\n\n\
Size: {size}\n\
Duration: {duration}\n\
Quality: {quality}\n\
Audio: {audios}\n\
Subtitles: {subtitles}\n\
MD5: <code>{md5_hash}</code>";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub ffprobe_path: String,
    pub mediainfo_path: String,
    pub transcoder_path: String,
    /// Thread count passed to the transcoder; `None` means half the CPUs
    pub threads: Option<usize>,
    pub temp_suffix: String,
    pub watermark_font: PathBuf,
    pub watermark_font_size: u32,
    pub caption_template: String,
    pub hash_chunk_size: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: "ffprobe".to_string(),
            mediainfo_path: "mediainfo".to_string(),
            transcoder_path: "ffmpeg".to_string(),
            threads: None,
            temp_suffix: ".temp.mkv".to_string(),
            watermark_font: PathBuf::from("default.otf"),
            watermark_font_size: 20,
            caption_template: DEFAULT_CAPTION_TEMPLATE.to_string(),
            hash_chunk_size: 4096,
        }
    }
}

impl MediaConfig {
    /// Threads handed to the transcoder, never below one
    pub fn transcode_threads(&self) -> usize {
        match self.threads {
            Some(n) => n.max(1),
            None => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1);
                (cpus / 2).max(1)
            }
        }
    }
}

pub fn load_config(path: Option<&std::path::Path>) -> Result<MediaConfig> {
    let config = if let Some(config_path) = path {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

            toml::from_str::<MediaConfig>(&contents)
                .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?
        } else {
            #[cfg(not(test))]
            tracing::warn!("Config file not found at {:?}, using defaults", config_path);
            MediaConfig::default()
        }
    } else {
        #[cfg(not(test))]
        tracing::info!("No config path provided, using defaults");
        MediaConfig::default()
    };

    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &MediaConfig) -> Result<()> {
    for (field, value) in [
        ("ffprobe_path", &config.ffprobe_path),
        ("mediainfo_path", &config.mediainfo_path),
        ("transcoder_path", &config.transcoder_path),
    ] {
        if value.trim().is_empty() {
            anyhow::bail!("{} cannot be empty", field);
        }
    }

    if config.threads == Some(0) {
        anyhow::bail!("threads must be at least 1 when set");
    }

    if !config.temp_suffix.starts_with('.') {
        anyhow::bail!("temp_suffix must start with a '.'");
    }

    if config.watermark_font_size == 0 {
        anyhow::bail!("watermark_font_size must be at least 1");
    }

    if config.hash_chunk_size == 0 {
        anyhow::bail!("hash_chunk_size must be at least 1");
    }

    Ok(())
}
