use std::path::PathBuf;

/// Whether the NVENC encoder should be used for compressed output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpuPreference {
    /// Probe `ffmpeg -hwaccels` once and use the GPU when CUDA is listed.
    Auto,
    Forced,
    Disabled,
}

impl GpuPreference {
    pub fn from_flags(force: bool, disable: bool) -> Self {
        // an explicit opt-out wins over an explicit opt-in
        if disable {
            GpuPreference::Disabled
        } else if force {
            GpuPreference::Forced
        } else {
            GpuPreference::Auto
        }
    }
}

/// Everything a run needs, built once from the command line and passed down.
/// The tool location is explicit here instead of mutating the process `PATH`.
#[derive(Clone, Debug)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub copy_threshold_kbps: f64,
    pub gpu: GpuPreference,
    pub ffmpeg_dir: Option<PathBuf>,
}
