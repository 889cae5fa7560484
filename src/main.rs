pub mod config;
pub mod convert;
pub mod driver;
pub mod error;
pub mod ffmpeg;
pub mod progress;
pub mod scanner;
pub mod strategy;
pub mod task;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use rustop::opts;

use config::{Config, GpuPreference};
use convert::FFmpegConvert;
use driver::BatchDriver;
use ffmpeg::FFmpeg;
use progress::BatchProgress;
use task::VideoTask;

fn main() -> ExitCode {
    let (args, _rest) = opts! {
        synopsis "Batch convert a directory of videos to compact MP4 files";
        opt gpu:bool=false, desc:"Use the NVENC encoder without probing for CUDA support.";
        opt no_gpu:bool=false, desc:"Use the software encoder even when CUDA is available.";
        opt jobs:usize=driver::DEFAULT_WORKERS, desc:"Number of files to convert in parallel.";
        opt threshold:f64=strategy::DEFAULT_COPY_THRESHOLD_KBPS, desc:"Bitrate in kbps at or below which files are remuxed instead of re-encoded.";
        opt ffmpeg_dir:Option<String>, desc:"Directory containing the ffmpeg and ffprobe binaries.";
        param indir:String, desc:"Directory to scan for video files";
        param outdir:String, desc:"Directory for converted files";
    }
    .parse_or_exit();

    let config = Config {
        input_dir: PathBuf::from(&args.indir),
        output_dir: PathBuf::from(&args.outdir),
        workers: args.jobs.max(1),
        copy_threshold_kbps: args.threshold,
        gpu: GpuPreference::from_flags(args.gpu, args.no_gpu),
        ffmpeg_dir: args.ffmpeg_dir.map(PathBuf::from),
    };

    let f = FFmpeg::new(config.ffmpeg_dir.clone());
    if !f.is_installed() {
        println!("ffmpeg is not installed.");
        return ExitCode::FAILURE;
    }

    let input_dir = match fs::canonicalize(&config.input_dir) {
        Ok(dir) => dir,
        Err(err) => {
            println!("Unable to open {:?}: {}", config.input_dir, err);
            return ExitCode::FAILURE;
        }
    };
    if !input_dir.is_dir() {
        println!("{:?} is not a directory.", input_dir);
        return ExitCode::FAILURE;
    }
    if let Err(err) = fs::create_dir_all(&config.output_dir) {
        println!("Unable to create output directory {:?}: {}", config.output_dir, err);
        return ExitCode::FAILURE;
    }

    let use_gpu = match config.gpu {
        GpuPreference::Forced => true,
        GpuPreference::Disabled => false,
        GpuPreference::Auto => f.supports_cuda(),
    };
    if use_gpu {
        println!("Encoding with h264_nvenc (GPU).");
    } else {
        println!("Encoding with libx264 (CPU).");
    }

    let files = match scanner::scan(&input_dir) {
        Ok(files) => files,
        Err(err) => {
            println!("{err}");
            return ExitCode::FAILURE;
        }
    };
    if files.is_empty() {
        println!("No video files found in {:?}.", input_dir);
        return ExitCode::SUCCESS;
    }

    let stop = Arc::new(AtomicBool::new(false));
    if let Err(err) = signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop)) {
        println!("Unable to register SIGINT handler: {err}");
    }

    let tasks: Vec<VideoTask> = files
        .into_iter()
        .map(|source| VideoTask::for_source(source, &config.output_dir, use_gpu))
        .collect();
    let total = tasks.len();
    println!("Converting {} file(s) with {} worker(s).", total, config.workers);

    let converter = Arc::new(FFmpegConvert::new(
        f,
        config.copy_threshold_kbps,
        Arc::clone(&stop),
    ));
    let batch = BatchDriver::new(config.workers, converter, Arc::clone(&stop));

    let mut ui = BatchProgress::new(total, config.workers);
    let report = batch.process_all(tasks, &mut |msg| ui.observe(msg));
    ui.finish();

    println!(
        "Processed {} of {} file(s); {} failed.",
        report.completed,
        total,
        report.errors.len()
    );
    for err in &report.errors {
        println!("  {err}");
    }

    // per-file failures are logged above but never fail the run
    ExitCode::SUCCESS
}
