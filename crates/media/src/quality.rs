/// Height thresholds, ascending. A height maps to the first entry whose
/// threshold it does not exceed.
///
/// Anything below 800px is still treated as 720p, and 800px and up counts as
/// 1080p so cropped widescreen encodes are labelled correctly.
pub const QUALITY_THRESHOLDS: &[(u32, &str)] = &[
    (272, "LQ/360p"),
    (360, "SD/480p"),
    (540, "HD/720p"),
    (799, "HD/720p"),
    (1080, "FHD/1080p"),
    (2160, "QHD/2160p"),
    (4320, "UHD/4320p"),
    (8640, "FUHD/8640p"),
];

pub const UNKNOWN_QUALITY: &str = "Unknown";

/// Classify a video height into a quality label
pub fn video_quality(height: Option<u32>) -> &'static str {
    let height = match height {
        Some(h) if h > 0 => h,
        _ => return UNKNOWN_QUALITY,
    };

    QUALITY_THRESHOLDS
        .iter()
        .find(|(threshold, _)| height <= *threshold)
        .map(|(_, label)| *label)
        .unwrap_or(UNKNOWN_QUALITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_sorted() {
        assert!(QUALITY_THRESHOLDS.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
