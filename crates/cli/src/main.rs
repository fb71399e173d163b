use anyhow::Result;
use clap::{Parser, Subcommand};
use mirror_media::config::{load_config, MediaConfig};
use mirror_media::transcode::{
    build_embed_thumb_command, build_watermark_command, execute_transcode, metadata_command,
    TranscodeCommand, TranscodeProgress,
};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mirrorctl")]
#[command(about = "Caption, probe and retag media files for the mirror bot", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the caption for a file, or for every file under a directory
    Caption {
        path: PathBuf,
        /// Template overriding the configured one
        #[arg(short, long)]
        template: Option<String>,
    },
    /// Print ffprobe stream information as JSON
    Probe { file: PathBuf },
    /// Rewrite stream titles and languages
    Metadata {
        file: PathBuf,
        #[arg(short, long)]
        key: String,
        /// Execute the command instead of printing it
        #[arg(long)]
        run: bool,
    },
    /// Overlay a text watermark
    Watermark {
        file: PathBuf,
        #[arg(short, long)]
        key: String,
        #[arg(long)]
        run: bool,
    },
    /// Attach a thumbnail image
    EmbedThumb {
        file: PathBuf,
        #[arg(long, value_name = "IMAGE")]
        thumb: PathBuf,
        #[arg(long)]
        run: bool,
    },
    /// Check that the external tools are installed
    CheckTools,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with timestamps and levels
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    match args.command {
        Cmd::Caption { path, template } => {
            let template = template.unwrap_or_else(|| config.caption_template.clone());
            caption(&config, &path, &template).await
        }
        Cmd::Probe { file } => {
            let streams = mirror_media::probe::probe_streams(&config, &file).await?;
            println!("{}", serde_json::to_string_pretty(&streams)?);
            Ok(())
        }
        Cmd::Metadata { file, key, run } => {
            match metadata_command(&config, &file, &key).await {
                Some(command) => emit(command, run).await,
                None => Err(anyhow::anyhow!(
                    "Could not read streams from {}",
                    file.display()
                )),
            }
        }
        Cmd::Watermark { file, key, run } => {
            emit(build_watermark_command(&config, &file, &key), run).await
        }
        Cmd::EmbedThumb { file, thumb, run } => {
            emit(build_embed_thumb_command(&config, &file, &thumb), run).await
        }
        Cmd::CheckTools => {
            let checks = mirror_media::tools::check_tools(&config);
            let mut missing = 0;
            for check in &checks {
                match &check.result {
                    Ok(version) => info!("{}: {}", check.binary, version),
                    Err(e) => {
                        warn!("{}: {}", check.binary, e);
                        missing += 1;
                    }
                }
            }
            if missing > 0 {
                warn!("{} of {} tools unavailable", missing, checks.len());
            }
            Ok(())
        }
    }
}

async fn caption(config: &MediaConfig, path: &Path, template: &str) -> Result<()> {
    for file in mirror_media::scan::collect_media_files(path)? {
        let (Some(directory), Some(filename)) = (file.parent(), file.file_name()) else {
            warn!("Skipping path without a file name: {}", file.display());
            continue;
        };
        let filename = filename.to_string_lossy();
        let text =
            mirror_media::generate_caption(config, directory, &filename, template).await;
        println!("{}\n", text);
    }
    Ok(())
}

async fn emit(command: TranscodeCommand, run: bool) -> Result<()> {
    if !run {
        println!("{}", command.args.join(" "));
        return Ok(());
    }

    info!("Writing {}", command.output.display());
    let (tx, mut rx) = watch::channel(TranscodeProgress::default());

    let reporter = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let progress = rx.borrow_and_update().clone();
            info!(
                "time={:.1}s size={} speed={}",
                progress.out_time_secs.unwrap_or(0.0),
                progress
                    .total_size_bytes
                    .map(mirror_media::readable::readable_file_size)
                    .unwrap_or_else(|| "-".to_string()),
                progress
                    .speed_x
                    .map(|s| format!("{:.2}x", s))
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
    });

    let result = execute_transcode(&command, Some(tx)).await;
    reporter.await.ok();

    match result {
        Ok(output) => {
            info!("Done: {}", output.display());
            Ok(())
        }
        Err(e) => {
            error!("Transcode failed: {}", e);
            Err(e)
        }
    }
}
