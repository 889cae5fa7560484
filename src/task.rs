use std::path::{Path, PathBuf};

/// Suffix appended to the source file stem for the converted output.
const OUTPUT_SUFFIX: &str = "_s";

/// One scheduled file conversion. Immutable once created; the mode (copy or
/// compress) is decided inside the task after the bitrate probe.
#[derive(Clone, Debug)]
pub struct VideoTask {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub use_gpu: bool,
}

impl VideoTask {
    pub fn for_source(source: PathBuf, output_dir: &Path, use_gpu: bool) -> Self {
        let destination = generate_output_filename(&source, output_dir);
        VideoTask {
            source,
            destination,
            use_gpu,
        }
    }

    pub fn file_name(&self) -> String {
        match self.source.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.source.display().to_string(),
        }
    }
}

/// Output naming is derived 1:1 from the source basename, so no two tasks in
/// a batch ever target the same output path and the destination is always
/// distinct from the source.
fn generate_output_filename(source: &Path, output_dir: &Path) -> PathBuf {
    let stem = match source.file_stem() {
        Some(stem) => stem.to_string_lossy().into_owned(),
        None => source.display().to_string(),
    };
    output_dir.join(format!("{stem}{OUTPUT_SUFFIX}.mp4"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_output_filename() {
        assert_eq!(
            generate_output_filename(&PathBuf::from("/foo/bar/baz.mkv"), &PathBuf::from("/out")),
            PathBuf::from("/out/baz_s.mp4")
        );
        assert_eq!(
            generate_output_filename(&PathBuf::from("bar/movie.ts"), &PathBuf::from("converted")),
            PathBuf::from("converted/movie_s.mp4")
        );
    }

    #[test]
    fn test_generate_output_filename_uppercase_extension() {
        assert_eq!(
            generate_output_filename(&PathBuf::from("/foo/CLIP.MOV"), &PathBuf::from("/out")),
            PathBuf::from("/out/CLIP_s.mp4")
        );
    }

    #[test]
    fn test_destination_differs_from_source_in_same_directory() {
        let task = VideoTask::for_source(PathBuf::from("/videos/a.mp4"), &PathBuf::from("/videos"), false);
        assert_ne!(task.source, task.destination);
        assert_eq!(task.destination, PathBuf::from("/videos/a_s.mp4"));
    }

    #[test]
    fn test_file_name() {
        let task = VideoTask::for_source(PathBuf::from("/videos/a.mp4"), &PathBuf::from("/out"), true);
        assert_eq!(task.file_name(), "a.mp4");
        assert!(task.use_gpu);
    }
}
