use std::fmt::Display;
use std::path::Path;

use serde::Deserialize;

use crate::error::ProbeError;
use crate::ffmpeg::FFmpeg;

/// Display-only facts about the first video stream of a file.
#[derive(Clone, Debug)]
pub struct StreamInfo {
    pub codec: String,
    pub width: u64,
    pub height: u64,
}

impl Display for StreamInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}x{}", self.codec, self.width, self.height)
    }
}

#[derive(Deserialize, Debug)]
struct FFProbeJsonOutput {
    streams: Vec<FFProbeJsonStream>,
}

#[derive(Deserialize, Debug)]
struct FFProbeJsonStream {
    codec_name: Option<String>,
    width: Option<u64>,
    height: Option<u64>,
}

/// Container duration in seconds.
pub fn duration_secs(ffmpeg: &FFmpeg, path: &Path) -> Result<f64, ProbeError> {
    query_format_value(ffmpeg, path, "format=duration")
}

/// Average stream bitrate in kilobits per second.
pub fn bitrate_kbps(ffmpeg: &FFmpeg, path: &Path) -> Result<f64, ProbeError> {
    query_format_value(ffmpeg, path, "format=bit_rate").map(|bps| bps / 1000.0)
}

/// Ask ffprobe for a single format entry printed as a bare value, e.g.
/// `2425.237007` for `format=duration`.
fn query_format_value(ffmpeg: &FFmpeg, path: &Path, entry: &str) -> Result<f64, ProbeError> {
    let output = ffmpeg
        .ffprobe()
        .args([
            "-v",
            "error",
            "-show_entries",
            entry,
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .map_err(|err| ProbeError::for_file(path, &format!("failed to run ffprobe: {err}")))?;
    if !output.status.success() {
        return Err(ProbeError::for_file(path, "ffprobe did not exit successfully"));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_probe_value(&stdout)
        .ok_or_else(|| ProbeError::for_file(path, &format!("ffprobe returned a non-numeric {entry}: {:?}", stdout.trim())))
}

fn parse_probe_value(stdout: &str) -> Option<f64> {
    stdout.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Codec and resolution of the first video stream, for progress display.
/// Callers treat failure as cosmetic; the conversion itself only needs the
/// duration and bitrate probes above.
pub fn stream_info(ffmpeg: &FFmpeg, path: &Path) -> Result<StreamInfo, ProbeError> {
    let output = ffmpeg
        .ffprobe()
        .args([
            "-v",
            "error",
            "-of",
            "json",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(path)
        .output()
        .map_err(|err| ProbeError::for_file(path, &format!("failed to run ffprobe: {err}")))?;
    if !output.status.success() {
        return Err(ProbeError::for_file(path, "ffprobe did not exit successfully"));
    }
    let utf8 = String::from_utf8_lossy(&output.stdout);
    let deserialized = serde_json::from_str::<FFProbeJsonOutput>(&utf8)
        .map_err(|err| ProbeError::for_file(path, &format!("unexpected ffprobe json: {err}")))?;
    match deserialized.streams.first() {
        Some(stream) => Ok(StreamInfo {
            codec: stream.codec_name.clone().unwrap_or_default(),
            width: stream.width.unwrap_or(0),
            height: stream.height.unwrap_or(0),
        }),
        None => Err(ProbeError::for_file(path, "no video streams found")),
    }
}
