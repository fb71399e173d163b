use mirror_media::config::MediaConfig;
use mirror_media::probe::{ProbeStream, StreamKind};
use mirror_media::transcode::common::temp_output_path;
use mirror_media::transcode::watermark::{drawtext_filter, escape_filter_text};
use mirror_media::transcode::{
    attachment_mime_type, build_embed_thumb_command, build_metadata_command,
    build_watermark_command, execute_transcode, metadata_command, parse_out_time,
    TranscodeCommand, TranscodeProgress,
};
use std::path::{Path, PathBuf};

fn test_config() -> MediaConfig {
    MediaConfig {
        threads: Some(2),
        ..Default::default()
    }
}

fn stream(index: usize, kind: StreamKind, codec: Option<&str>, lang: Option<&str>) -> ProbeStream {
    ProbeStream {
        index,
        kind,
        codec_name: codec.map(str::to_string),
        height: None,
        language: lang.map(str::to_string),
        title: None,
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_metadata_command_full_layout() {
    let streams = vec![
        stream(0, StreamKind::Video, Some("h264"), Some("eng")),
        stream(1, StreamKind::Video, Some("mjpeg"), None),
        stream(2, StreamKind::Audio, Some("aac"), Some("tam")),
        stream(3, StreamKind::Audio, Some("ac3"), None),
        stream(4, StreamKind::Subtitle, Some("subrip"), Some("eng")),
        stream(5, StreamKind::Subtitle, Some("webvtt"), Some("eng")),
        stream(6, StreamKind::Other("data".to_string()), Some("bin_data"), None),
    ];

    let command =
        build_metadata_command(&test_config(), Path::new("/tmp/movie.mkv"), &streams, "KEY");

    let expected = strings(&[
        "ffmpeg", "-hide_banner", "-loglevel", "error", "-progress", "pipe:1",
        "-i", "/tmp/movie.mkv",
        "-map_metadata", "-1", "-c", "copy",
        "-metadata:s:v:0", "title=KEY", "-metadata", "title=KEY",
        "-map", "0:0", "-metadata:s:v:0", "title=KEY", "-metadata:s:v:0", "language=eng",
        "-map", "0:2", "-metadata:s:a:0", "title=Tamil-KEY", "-metadata:s:a:0", "language=tam",
        "-map", "0:3", "-metadata:s:a:1", "title=KEY",
        "-map", "0:4", "-metadata:s:s:0", "title=KEY", "-metadata:s:s:0", "language=eng",
        "-map", "0:6",
        "-threads", "2", "/tmp/movie.mkv.temp.mkv",
    ]);

    assert_eq!(command.args, expected);
    assert_eq!(command.output, PathBuf::from("/tmp/movie.mkv.temp.mkv"));
}

#[test]
fn test_metadata_command_unmapped_language_is_capitalised_code() {
    let streams = vec![stream(0, StreamKind::Audio, Some("opus"), Some("jpn"))];
    let command = build_metadata_command(&test_config(), Path::new("a.mkv"), &streams, "K");

    assert!(command.args.contains(&"title=Jpn-K".to_string()));
    assert!(command.args.contains(&"language=jpn".to_string()));
}

#[test]
fn test_metadata_command_skips_subtitle_without_codec() {
    let streams = vec![
        stream(0, StreamKind::Subtitle, None, Some("eng")),
        stream(1, StreamKind::Subtitle, Some("ass"), None),
    ];
    let command = build_metadata_command(&test_config(), Path::new("a.mkv"), &streams, "K");

    assert!(!command.args.contains(&"0:0".to_string()));
    assert!(command.args.contains(&"0:1".to_string()));
    assert!(command.args.contains(&"-metadata:s:s:0".to_string()));
    assert!(!command.args.iter().any(|a| a.starts_with("language=")));
}

#[tokio::test]
async fn test_metadata_command_unprobeable_file_is_none() {
    let config = MediaConfig {
        ffprobe_path: "/nonexistent/bin/ffprobe-for-tests".to_string(),
        ..test_config()
    };
    assert!(metadata_command(&config, Path::new("/tmp/x.mkv"), "K").await.is_none());
}

#[test]
fn test_watermark_command() {
    let config = MediaConfig {
        watermark_font: PathBuf::from("fonts/default.otf"),
        ..test_config()
    };
    let command = build_watermark_command(&config, Path::new("/dl/clip.mp4"), "MyChannel");

    let expected = strings(&[
        "ffmpeg", "-hide_banner", "-loglevel", "error", "-progress", "pipe:1",
        "-i", "/dl/clip.mp4",
        "-vf",
        "drawtext=text='MyChannel':fontfile=fonts/default.otf:fontsize=20:fontcolor=white:x=10:y=10",
        "-threads", "2", "/dl/clip.mp4.temp.mkv",
    ]);
    assert_eq!(command.args, expected);
}

#[test]
fn test_watermark_text_escaping() {
    assert_eq!(escape_filter_text("plain text"), "plain text");
    assert_eq!(escape_filter_text("a:b"), r"a\:b");
    assert_eq!(escape_filter_text("100%"), r"100\\%");
    assert_eq!(escape_filter_text(r"back\slash"), r"back\\\\slash");
    assert_eq!(escape_filter_text(r"50%\off"), r"50\\%\\\\off");
    assert_eq!(escape_filter_text("it's"), r"it'\\\''s");
}

#[test]
fn test_drawtext_filter_escapes_font_path() {
    let filter = drawtext_filter("x", r"C:\fonts\a.otf", 32);
    assert_eq!(
        filter,
        r"drawtext=text='x':fontfile=C\:\\fonts\\a.otf:fontsize=32:fontcolor=white:x=10:y=10"
    );
}

#[test]
fn test_attachment_mime_type() {
    assert_eq!(attachment_mime_type(Path::new("thumb.jpg")), "image/jpeg");
    assert_eq!(attachment_mime_type(Path::new("thumb.JPEG")), "image/jpeg");
    assert_eq!(attachment_mime_type(Path::new("thumb.png")), "image/png");
    assert_eq!(attachment_mime_type(Path::new("thumb.webp")), "application/octet-stream");
    assert_eq!(attachment_mime_type(Path::new("thumb")), "application/octet-stream");
}

#[test]
fn test_embed_thumb_command() {
    let command = build_embed_thumb_command(
        &test_config(),
        Path::new("/dl/show.mkv"),
        Path::new("/thumbs/cover.png"),
    );

    let expected = strings(&[
        "ffmpeg", "-hide_banner", "-loglevel", "error", "-progress", "pipe:1",
        "-i", "/dl/show.mkv",
        "-attach", "/thumbs/cover.png",
        "-metadata:s:t", "mimetype=image/png",
        "-c", "copy", "-map", "0",
        "-threads", "2", "/dl/show.mkv.temp.mkv",
    ]);
    assert_eq!(command.args, expected);
    assert_eq!(command.output, PathBuf::from("/dl/show.mkv.temp.mkv"));
}

#[test]
fn test_custom_transcoder_and_suffix() {
    let config = MediaConfig {
        transcoder_path: "xtra".to_string(),
        temp_suffix: ".tmp.mkv".to_string(),
        threads: Some(1),
        ..Default::default()
    };
    let command = build_watermark_command(&config, Path::new("v.mp4"), "k");
    assert_eq!(command.program(), "xtra");
    assert_eq!(command.output, PathBuf::from("v.mp4.tmp.mkv"));
    assert_eq!(temp_output_path(&config, Path::new("v.mp4")), command.output);
    assert_eq!(command.args.last().map(String::as_str), Some("v.mp4.tmp.mkv"));
}

#[test]
fn test_progress_line_parsing() {
    let mut progress = TranscodeProgress::default();

    assert!(progress.apply_line("out_time_ms=12500000"));
    assert!(progress.apply_line("total_size=1048576"));
    assert!(progress.apply_line("speed=1.25x"));
    assert!(!progress.apply_line("frame=300"));
    assert!(!progress.apply_line("garbage"));
    assert!(!progress.apply_line("speed=N/A"));

    assert_eq!(progress.out_time_secs, Some(12.5));
    assert_eq!(progress.total_size_bytes, Some(1_048_576));
    assert_eq!(progress.speed_x, Some(1.25));
    assert!(!progress.finished);
    assert!(progress.updated_at.is_some());

    assert!(progress.apply_line("progress=continue"));
    assert!(!progress.finished);
    assert!(progress.apply_line("progress=end"));
    assert!(progress.finished);
}

#[test]
fn test_out_time_fallback() {
    let mut progress = TranscodeProgress::default();
    progress.apply_line("out_time=00:01:30.500000");
    assert_eq!(progress.out_time_secs, Some(90.5));

    assert_eq!(parse_out_time("01:00:00"), Some(3600.0));
    assert_eq!(parse_out_time("N/A"), None);
}

#[tokio::test]
async fn test_execute_transcode_missing_binary() {
    let command = TranscodeCommand {
        args: strings(&["/nonexistent/bin/ffmpeg-for-tests", "-version"]),
        output: PathBuf::from("out.mkv"),
    };
    assert!(execute_transcode(&command, None).await.is_err());
}

#[tokio::test]
async fn test_execute_transcode_empty_command() {
    let command = TranscodeCommand {
        args: Vec::new(),
        output: PathBuf::from("out.mkv"),
    };
    let err = execute_transcode(&command, None).await.unwrap_err();
    assert!(err.to_string().contains("no program"));
}

fn shell_command(script: &str) -> TranscodeCommand {
    TranscodeCommand {
        args: strings(&["sh", "-c", script]),
        output: PathBuf::from("/dl/clip.mp4.temp.mkv"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_transcode_publishes_progress() {
    let (tx, rx) = tokio::sync::watch::channel(TranscodeProgress::default());
    let command = shell_command(
        r"printf 'out_time_ms=1500000\ntotal_size=2048\nspeed=1.5x\nprogress=continue\nout_time_ms=3000000\nprogress=end\n'",
    );

    let output = execute_transcode(&command, Some(tx)).await.unwrap();
    assert_eq!(output, PathBuf::from("/dl/clip.mp4.temp.mkv"));

    let last = rx.borrow().clone();
    assert_eq!(last.out_time_secs, Some(3.0));
    assert_eq!(last.total_size_bytes, Some(2048));
    assert_eq!(last.speed_x, Some(1.5));
    assert!(last.finished);
    assert!(last.updated_at.is_some());
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_transcode_stops_reading_at_end() {
    let (tx, rx) = tokio::sync::watch::channel(TranscodeProgress::default());
    let command = shell_command(
        r"printf 'out_time_ms=1000000\nprogress=end\nout_time_ms=9000000\n'",
    );

    execute_transcode(&command, Some(tx)).await.unwrap();
    assert_eq!(rx.borrow().out_time_secs, Some(1.0));
    assert!(rx.borrow().finished);
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_transcode_failure_carries_code_and_stderr() {
    let (tx, rx) = tokio::sync::watch::channel(TranscodeProgress::default());
    let command = shell_command(
        r"printf 'out_time_ms=1000000\nprogress=end\n'; echo oops >&2; exit 3",
    );

    let err = execute_transcode(&command, Some(tx)).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("exit code: Some(3)"), "{}", message);
    assert!(message.contains("oops"), "{}", message);

    let last = rx.borrow().clone();
    assert_eq!(last.out_time_secs, Some(1.0));
    assert!(last.finished);
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_transcode_without_progress_channel() {
    let command = shell_command("echo progress=end");
    assert!(execute_transcode(&command, None).await.is_ok());
}

/// True once the process is gone or only a zombie awaiting reaping
#[cfg(target_os = "linux")]
fn process_exited(pid: &str) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => stat
            .rsplit_once(')')
            .map(|(_, rest)| rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
        Err(_) => true,
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_execute_transcode_cancel_kills_child() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let pid_file = temp_dir.path().join("pid");
    let command = shell_command(&format!(
        "echo $$ > '{}'; exec sleep 30",
        pid_file.display()
    ));

    let run = execute_transcode(&command, None);
    let timed_out = tokio::time::timeout(std::time::Duration::from_millis(500), run).await;
    assert!(timed_out.is_err());

    let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
    let mut exited = false;
    for _ in 0..50 {
        if process_exited(&pid) {
            exited = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert!(exited, "transcoder {} still running after cancellation", pid);
}
