use std::path::PathBuf;
use std::process::Command;

pub mod encoder;
pub mod probe;

/// Hardware acceleration name looked for in `ffmpeg -hwaccels` output.
const CUDA_ACCEL: &str = "cuda";

/// Locates the external ffmpeg/ffprobe binaries. When `bin_dir` is set the
/// binaries are resolved inside it instead of relying on `PATH`; nothing here
/// mutates the process environment.
#[derive(Clone, Debug)]
pub struct FFmpeg {
    bin_dir: Option<PathBuf>,
}

impl FFmpeg {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        FFmpeg { bin_dir }
    }

    pub fn ffmpeg(&self) -> Command {
        self.command("ffmpeg")
    }

    pub fn ffprobe(&self) -> Command {
        self.command("ffprobe")
    }

    fn command(&self, name: &str) -> Command {
        match &self.bin_dir {
            Some(dir) => Command::new(dir.join(name)),
            None => Command::new(name),
        }
    }

    pub fn is_installed(&self) -> bool {
        let cmd = self.ffmpeg().arg("-version").output();
        match cmd {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    /// One-shot check for NVIDIA hardware encoding support. ffmpeg prints its
    /// acceleration list on stdout but some builds route it to stderr, so
    /// both streams are searched.
    pub fn supports_cuda(&self) -> bool {
        let cmd = self.ffmpeg().args(["-hide_banner", "-hwaccels"]).output();
        match cmd {
            Ok(output) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                output.status.success() && combined.to_lowercase().contains(CUDA_ACCEL)
            }
            Err(_) => false,
        }
    }
}
