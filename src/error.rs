use std::error::Error;
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// ffprobe could not report duration or bitrate for a file.
/// Fatal to the single task only, never to the batch.
#[derive(Debug)]
pub struct ProbeError {
    path: PathBuf,
    msg: String,
}

impl ProbeError {
    pub fn for_file(path: &Path, msg: &str) -> Self {
        ProbeError {
            path: PathBuf::from(path),
            msg: String::from(msg),
        }
    }
}

impl Error for ProbeError {}

impl Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error probing {:?}: {}", &self.path, &self.msg)
    }
}

/// ffmpeg could not be spawned, was interrupted, or exited non-zero.
#[derive(Debug)]
pub struct EncodeError {
    path: PathBuf,
    code: Option<i32>,
    msg: String,
}

impl EncodeError {
    pub fn for_file(path: &Path, code: Option<i32>, msg: &str) -> Self {
        EncodeError {
            path: PathBuf::from(path),
            code,
            msg: String::from(msg),
        }
    }
}

impl Error for EncodeError {}

impl Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(
                f,
                "Error encoding {:?}: ffmpeg exited with {}: {}",
                &self.path, code, &self.msg
            ),
            None => write!(f, "Error encoding {:?}: {}", &self.path, &self.msg),
        }
    }
}

/// The directory walk itself failed. Fatal to the whole run; there are no
/// per-file tasks to isolate the failure to yet.
#[derive(Debug)]
pub struct DiscoveryError {
    path: PathBuf,
    msg: String,
}

impl DiscoveryError {
    pub fn for_dir(path: &Path, msg: &str) -> Self {
        DiscoveryError {
            path: PathBuf::from(path),
            msg: String::from(msg),
        }
    }
}

impl Error for DiscoveryError {}

impl Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error scanning {:?}: {}", &self.path, &self.msg)
    }
}

/// Anything that can sink a single task. Caught at the task boundary and
/// recorded in the batch report; sibling tasks keep running.
#[derive(Debug)]
pub enum TaskError {
    Probe(ProbeError),
    Encode(EncodeError),
}

impl From<ProbeError> for TaskError {
    fn from(err: ProbeError) -> Self {
        TaskError::Probe(err)
    }
}

impl From<EncodeError> for TaskError {
    fn from(err: EncodeError) -> Self {
        TaskError::Encode(err)
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TaskError::Probe(err) => Some(err),
            TaskError::Encode(err) => Some(err),
        }
    }
}

impl Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskError::Probe(err) => write!(f, "{err}"),
            TaskError::Encode(err) => write!(f, "{err}"),
        }
    }
}
