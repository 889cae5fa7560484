use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{ChildStderr, Command, Stdio};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use regex::Regex;

use crate::error::EncodeError;
use crate::ffmpeg::FFmpeg;

/// Target vertical resolution for compressed output. Width follows the
/// source aspect ratio.
const SCALE_FILTER: &str = "scale=-1:720";
const GPU_ENCODER: &str = "h264_nvenc";
const CPU_ENCODER: &str = "libx264";
const QUALITY: &str = "32";
const TARGET_BITRATE: &str = "1000k";

/// How often the progress loop rechecks the stop flag while the encoder is
/// quiet between progress lines.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Flags shared by every ffmpeg invocation: quiet logs, machine-readable
/// progress on stdout, overwrite existing output.
const FFMPEG_BASE_ARGS: &[&str] = &[
    "-hide_banner",
    "-nostats",
    "-loglevel",
    "warning",
    "-progress",
    "pipe:1",
    "-y",
];

/// Matches an elapsed-time marker anywhere in a progress line, e.g.
/// `out_time=00:01:30.500000`. No other assumption is made about the line
/// shape; lines without a marker are skipped.
static TIME_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"time=(\d+):(\d+):(\d+(?:\.\d+)?)").expect("Failed to create time marker regex")
});

/// Remux the source into an MP4 container without re-encoding streams.
pub fn run_copy(
    ffmpeg: &FFmpeg,
    input: &Path,
    output: &Path,
    stop: &AtomicBool,
    on_progress: &mut dyn FnMut(f64),
) -> Result<(), EncodeError> {
    let mut cmd = ffmpeg.ffmpeg();
    cmd.args(FFMPEG_BASE_ARGS)
        .arg("-i")
        .arg(input)
        .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
        .arg(output);
    run(cmd, input, output, stop, on_progress)
}

/// Scale the source to 720p and re-encode at the fixed quality and bitrate
/// target, with the NVENC encoder when `use_gpu` is set.
pub fn run_compress(
    ffmpeg: &FFmpeg,
    input: &Path,
    output: &Path,
    use_gpu: bool,
    stop: &AtomicBool,
    on_progress: &mut dyn FnMut(f64),
) -> Result<(), EncodeError> {
    let encoder = if use_gpu { GPU_ENCODER } else { CPU_ENCODER };
    let mut cmd = ffmpeg.ffmpeg();
    cmd.args(FFMPEG_BASE_ARGS)
        .arg("-i")
        .arg(input)
        .args(["-vf", SCALE_FILTER])
        .args(["-c:v", encoder])
        .args(["-crf", QUALITY])
        .args(["-b:v", TARGET_BITRATE])
        .args(["-f", "mp4"])
        .arg(output);
    run(cmd, input, output, stop, on_progress)
}

/// Common subprocess lifecycle: spawn, stream progress lines until the pipe
/// closes, wait for exit. Reports monotonically non-decreasing elapsed
/// seconds through `on_progress`, at most once per parsed line; a run with no
/// parsable lines simply reports nothing.
///
/// stderr is drained on its own thread for the whole run; a child emitting
/// warnings faster than anyone reads them would otherwise fill the pipe and
/// stall both processes. The progress loop wakes on a short tick so the stop
/// flag is honored even while the child is silent.
fn run(
    mut cmd: Command,
    input: &Path,
    output: &Path,
    stop: &AtomicBool,
    on_progress: &mut dyn FnMut(f64),
) -> Result<(), EncodeError> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| EncodeError::for_file(input, None, &format!("failed to run ffmpeg: {err}")))?;

    let stderr = child.stderr.take();
    let stderr_thread = thread::spawn(move || read_stderr_to_end(stderr));

    let stdout = child.stdout.take();
    let (line_tx, line_rx) = mpsc::channel();
    let stdout_thread = thread::spawn(move || {
        if let Some(stdout) = stdout {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        }
    });

    let mut clock = ProgressClock::new();
    let mut interrupted = false;
    loop {
        match line_rx.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(line) => {
                if let Some(seconds) = parse_time_marker(&line) {
                    on_progress(clock.clamp(seconds));
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            // the child exited (or was killed) and the pipe closed
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if !interrupted && stop.load(Ordering::SeqCst) {
            let _ = child.kill();
            interrupted = true;
        }
    }

    let _ = stdout_thread.join();
    let detail = stderr_thread.join().ok().flatten().unwrap_or_default();

    let status = child
        .wait()
        .map_err(|err| EncodeError::for_file(input, None, &format!("failed to wait for ffmpeg: {err}")))?;

    if interrupted {
        let _ = fs::remove_file(output);
        return Err(EncodeError::for_file(input, None, "interrupted by stop request"));
    }

    if status.success() {
        Ok(())
    } else {
        let _ = fs::remove_file(output);
        let detail = match detail.trim() {
            "" => String::from("ffmpeg did not exit successfully"),
            trimmed => String::from(trimmed),
        };
        Err(EncodeError::for_file(input, status.code(), &detail))
    }
}

/// Extract elapsed seconds from a progress line containing a `time=` marker.
fn parse_time_marker(line: &str) -> Option<f64> {
    let captures = TIME_MARKER.captures(line)?;
    let hours = captures.get(1)?.as_str().parse::<f64>().ok()?;
    let minutes = captures.get(2)?.as_str().parse::<f64>().ok()?;
    let seconds = captures.get(3)?.as_str().parse::<f64>().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Keeps reported progress from ever going backwards, whatever order the
/// encoder emits timestamps in.
struct ProgressClock {
    elapsed: f64,
}

impl ProgressClock {
    fn new() -> Self {
        ProgressClock { elapsed: 0.0 }
    }

    fn clamp(&mut self, seconds: f64) -> f64 {
        if seconds > self.elapsed {
            self.elapsed = seconds;
        }
        self.elapsed
    }
}

fn read_stderr_to_end(stderr: Option<ChildStderr>) -> Option<String> {
    let mut buf = String::new();
    match stderr {
        Some(mut stream) => match stream.read_to_string(&mut buf) {
            Ok(_) => Some(buf),
            Err(_) => None,
        },
        None => None,
    }
}
