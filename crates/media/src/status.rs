use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::readable::{readable_file_size, readable_time};

/// Rendered when the remaining time cannot be computed
pub const ETA_UNKNOWN: &str = "-";

pub const DRIVE_TOOL: &str = "gdriveAPI";

/// Live counters owned by a running transfer. Readers poll them; the
/// transfer side updates them on its own schedule.
pub trait TransferCounters: Send + Sync {
    fn processed_bytes(&self) -> u64;
    /// Instantaneous speed in bytes per second
    fn speed(&self) -> u64;
}

/// Atomic counters a transfer task can share with its status reporter
#[derive(Debug, Default)]
pub struct SharedCounters {
    processed: AtomicU64,
    speed: AtomicU64,
}

impl SharedCounters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_processed(&self, bytes: u64) {
        self.processed.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn set_processed(&self, bytes: u64) {
        self.processed.store(bytes, Ordering::Relaxed);
    }

    pub fn set_speed(&self, bytes_per_sec: u64) {
        self.speed.store(bytes_per_sec, Ordering::Relaxed);
    }
}

impl TransferCounters for SharedCounters {
    fn processed_bytes(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    fn speed(&self) -> u64 {
        self.speed.load(Ordering::Relaxed)
    }
}

impl<T: TransferCounters + ?Sized> TransferCounters for Arc<T> {
    fn processed_bytes(&self) -> u64 {
        (**self).processed_bytes()
    }

    fn speed(&self) -> u64 {
        (**self).speed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferKind {
    Upload,
    Download,
    Clone,
}

impl TransferKind {
    /// `up` and `dl` select upload and download; anything else is a clone
    pub fn from_code(code: &str) -> Self {
        match code {
            "up" => TransferKind::Upload,
            "dl" => TransferKind::Download,
            _ => TransferKind::Clone,
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransferKind::Upload => "Upload",
            TransferKind::Download => "Download",
            TransferKind::Clone => "Clone",
        };
        f.write_str(label)
    }
}

/// Read-only view a reporting layer renders for any running task
pub trait TaskStatus: Send + Sync {
    fn name(&self) -> &str;
    fn gid(&self) -> &str;
    fn size(&self) -> String;
    fn processed_bytes(&self) -> String;
    fn status(&self) -> TransferKind;
    fn progress(&self) -> String;
    fn speed(&self) -> String;
    fn eta(&self) -> String;
    fn tool(&self) -> &str;
}

/// Point-in-time copy of a transfer's readable fields
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub name: String,
    pub gid: String,
    pub status: TransferKind,
    pub size: String,
    pub processed_bytes: String,
    pub progress: String,
    pub speed: String,
    pub eta: String,
    pub tool: String,
    pub taken_at: DateTime<Utc>,
}

/// Status adapter for a cloud-drive transfer
pub struct DriveTransferStatus<C> {
    counters: C,
    name: String,
    size: u64,
    gid: String,
    kind: TransferKind,
}

impl<C: TransferCounters> DriveTransferStatus<C> {
    pub fn new(
        counters: C,
        name: impl Into<String>,
        size: u64,
        gid: impl Into<String>,
        kind: TransferKind,
    ) -> Self {
        Self {
            counters,
            name: name.into(),
            size,
            gid: gid.into(),
            kind,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.size
    }

    /// Percent complete, 0 when the total size is unknown
    pub fn progress_raw(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        self.counters.processed_bytes() as f64 / self.size as f64 * 100.0
    }

    /// Seconds left at the current speed, `None` when speed is zero
    pub fn eta_secs(&self) -> Option<f64> {
        let speed = self.counters.speed();
        if speed == 0 {
            return None;
        }
        let remaining = self.size.saturating_sub(self.counters.processed_bytes());
        Some(remaining as f64 / speed as f64)
    }

    pub fn task(&self) -> &C {
        &self.counters
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            name: self.name.clone(),
            gid: self.gid.clone(),
            status: self.kind,
            size: TaskStatus::size(self),
            processed_bytes: TaskStatus::processed_bytes(self),
            progress: TaskStatus::progress(self),
            speed: TaskStatus::speed(self),
            eta: TaskStatus::eta(self),
            tool: DRIVE_TOOL.to_string(),
            taken_at: Utc::now(),
        }
    }
}

impl<C: TransferCounters> TaskStatus for DriveTransferStatus<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn gid(&self) -> &str {
        &self.gid
    }

    fn size(&self) -> String {
        readable_file_size(self.size)
    }

    fn processed_bytes(&self) -> String {
        readable_file_size(self.counters.processed_bytes())
    }

    fn status(&self) -> TransferKind {
        self.kind
    }

    fn progress(&self) -> String {
        format!("{:.2}%", self.progress_raw())
    }

    fn speed(&self) -> String {
        format!("{}/s", readable_file_size(self.counters.speed()))
    }

    fn eta(&self) -> String {
        match self.eta_secs() {
            Some(secs) => readable_time(secs, false),
            None => ETA_UNKNOWN.to_string(),
        }
    }

    fn tool(&self) -> &str {
        DRIVE_TOOL
    }
}

/// Short random task id
pub fn new_gid() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}
