use std::fmt::Display;

/// Bitrate at or below which a source is remuxed instead of re-encoded.
/// Matches the original policy; overridable from the command line so the
/// decision stays testable.
pub const DEFAULT_COPY_THRESHOLD_KBPS: f64 = 1000.0;

/// How a single file gets turned into an MP4.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Repackage streams into an MP4 container without re-encoding.
    Copy,
    /// Decode and re-encode to 720p at the fixed quality target.
    Compress,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Copy => write!(f, "copy"),
            Mode::Compress => write!(f, "compress"),
        }
    }
}

/// Pick a conversion mode from a measured bitrate. Sources at or below the
/// threshold are cheap enough to keep as-is.
pub fn decide(bitrate_kbps: f64, threshold_kbps: f64) -> Mode {
    if bitrate_kbps <= threshold_kbps {
        Mode::Copy
    } else {
        Mode::Compress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_bitrate_is_copied() {
        assert_eq!(decide(500.0, DEFAULT_COPY_THRESHOLD_KBPS), Mode::Copy);
        assert_eq!(decide(0.0, DEFAULT_COPY_THRESHOLD_KBPS), Mode::Copy);
    }

    #[test]
    fn test_high_bitrate_is_compressed() {
        assert_eq!(decide(1000.1, DEFAULT_COPY_THRESHOLD_KBPS), Mode::Compress);
        assert_eq!(decide(5000.0, DEFAULT_COPY_THRESHOLD_KBPS), Mode::Compress);
    }

    #[test]
    fn test_threshold_boundary_is_copied() {
        assert_eq!(decide(1000.0, DEFAULT_COPY_THRESHOLD_KBPS), Mode::Copy);
    }

    #[test]
    fn test_custom_threshold() {
        assert_eq!(decide(2000.0, 2500.0), Mode::Copy);
        assert_eq!(decide(2000.0, 1500.0), Mode::Compress);
    }
}
