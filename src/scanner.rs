use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DiscoveryError;

/// Container extensions recognized as convertible video files.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "ts"];

pub fn is_video_file(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            VIDEO_EXTENSIONS.iter().any(|known| *known == ext)
        }
        None => false,
    }
}

/// Walk `dir` recursively and collect every recognized video file, sorted so
/// scheduling order is deterministic. Any unreadable directory or entry fails
/// the whole scan; per-file isolation only starts once tasks exist.
pub fn scan(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut files = Vec::new();
    let mut dirpaths = vec![PathBuf::from(dir)];
    while let Some(current_dir) = dirpaths.pop() {
        let entries = fs::read_dir(&current_dir)
            .map_err(|err| DiscoveryError::for_dir(&current_dir, &err.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|err| DiscoveryError::for_dir(&current_dir, &err.to_string()))?;
            let ft = entry
                .file_type()
                .map_err(|err| DiscoveryError::for_dir(&current_dir, &err.to_string()))?;
            if ft.is_file() {
                let path = entry.path();
                if is_video_file(&path) {
                    files.push(path);
                }
            } else if ft.is_dir() {
                dirpaths.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}
