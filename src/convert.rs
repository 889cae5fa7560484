use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::Sender;

use crate::driver::DriverMessage;
use crate::error::TaskError;
use crate::ffmpeg::{FFmpeg, encoder, probe};
use crate::strategy::{self, Mode};
use crate::task::VideoTask;

/// Runs one task from probe to finished output. The batch driver only sees
/// this trait, so its scheduling can be exercised without ffmpeg.
pub trait Convert: Send + Sync {
    fn convert(
        &self,
        slot: usize,
        task: &VideoTask,
        events: &Sender<DriverMessage>,
    ) -> Result<Mode, TaskError>;
}

pub struct FFmpegConvert {
    ffmpeg: FFmpeg,
    copy_threshold_kbps: f64,
    stop: Arc<AtomicBool>,
}

impl FFmpegConvert {
    pub fn new(ffmpeg: FFmpeg, copy_threshold_kbps: f64, stop: Arc<AtomicBool>) -> Self {
        FFmpegConvert {
            ffmpeg,
            copy_threshold_kbps,
            stop,
        }
    }
}

impl Convert for FFmpegConvert {
    fn convert(
        &self,
        slot: usize,
        task: &VideoTask,
        events: &Sender<DriverMessage>,
    ) -> Result<Mode, TaskError> {
        let _ = events.send(DriverMessage::TaskStarted {
            slot,
            task: task.clone(),
        });

        let bitrate = probe::bitrate_kbps(&self.ffmpeg, &task.source)?;
        let duration = probe::duration_secs(&self.ffmpeg, &task.source)?;
        let mode = strategy::decide(bitrate, self.copy_threshold_kbps);
        // cosmetic only; a file that defeats the json probe can still convert
        let info = probe::stream_info(&self.ffmpeg, &task.source).ok();

        let _ = events.send(DriverMessage::TaskRunning {
            slot,
            task: task.clone(),
            mode,
            total_secs: duration,
            source_size: file_size(&task.source),
            info,
        });

        let mut report = |seconds: f64| {
            let _ = events.send(DriverMessage::TaskProgress { slot, seconds });
        };

        match mode {
            Mode::Copy => {
                encoder::run_copy(&self.ffmpeg, &task.source, &task.destination, &self.stop, &mut report)?;
            }
            Mode::Compress => {
                encoder::run_compress(
                    &self.ffmpeg,
                    &task.source,
                    &task.destination,
                    task.use_gpu,
                    &self.stop,
                    &mut report,
                )?;
            }
        }

        Ok(mode)
    }
}

fn file_size(path: &Path) -> u64 {
    match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(_) => 0,
    }
}
