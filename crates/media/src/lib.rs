// Media helpers for the mirror/leech bot: captions, transcode commands and
// transfer status

pub mod caption;
pub mod config;
pub mod language;
pub mod mediainfo;
pub mod probe;
pub mod quality;
pub mod readable;
pub mod scan;
pub mod status;
pub mod tools;
pub mod transcode;

// Re-export commonly used types
pub use caption::{generate_caption, render_template, CaptionFields};
pub use config::MediaConfig;
pub use status::{DriveTransferStatus, SharedCounters, TaskStatus, TransferKind};
pub use transcode::{execute_transcode, TranscodeCommand, TranscodeProgress};
