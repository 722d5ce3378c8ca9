use std::path::{Path, PathBuf};

use crate::error::{PipeError, Result};

/// Well-known name prefix shared by every host's pipe and log file.
pub const PIPE_PREFIX: &str = "chrometabsfinder";

const PIPE_SUFFIX: &str = ".pipe";
const LOG_SUFFIX: &str = ".log";

/// Filesystem layout for one host instance: a base directory plus an
/// instance identifier.
///
/// The identifier is normally the host's process id, but it is explicit
/// configuration rather than ambient state so tests can substitute a temp
/// directory and a synthetic id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeNaming {
    base_dir: PathBuf,
    id: String,
}

impl PipeNaming {
    /// Layout rooted at `base_dir` for the instance `id`.
    pub fn new(base_dir: impl Into<PathBuf>, id: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            id: id.into(),
        }
    }

    /// Layout for the current process, keyed by its pid.
    pub fn for_current_process(base_dir: impl Into<PathBuf>) -> Self {
        Self::new(base_dir, std::process::id().to_string())
    }

    /// Path of this instance's named pipe: `<dir>/chrometabsfinder.<id>.pipe`.
    pub fn pipe_path(&self) -> PathBuf {
        self.base_dir
            .join(format!("{PIPE_PREFIX}.{}{PIPE_SUFFIX}", self.id))
    }

    /// Path of this instance's log file: `<dir>/chrometabsfinder.<id>.log`.
    pub fn log_path(&self) -> PathBuf {
        self.base_dir
            .join(format!("{PIPE_PREFIX}.{}{LOG_SUFFIX}", self.id))
    }

    /// The base directory this layout is rooted at.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The instance identifier.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Scan `base_dir` for live host pipes (`chrometabsfinder.*.pipe`).
///
/// A single snapshot of the filesystem: hosts may appear or disappear
/// between this scan and any subsequent open. A missing base directory
/// yields an empty set, not an error — no directory means no hosts.
pub fn discover(base_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let base_dir = base_dir.as_ref();
    let entries = match std::fs::read_dir(base_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(PipeError::Discover {
                path: base_dir.to_path_buf(),
                source: err,
            })
        }
    };

    let mut pipes = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| PipeError::Discover {
            path: base_dir.to_path_buf(),
            source: err,
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if matches_pipe_name(name) {
            pipes.push(entry.path());
        }
    }
    pipes.sort();
    Ok(pipes)
}

fn matches_pipe_name(name: &str) -> bool {
    let Some(middle) = name
        .strip_prefix(PIPE_PREFIX)
        .and_then(|rest| rest.strip_prefix('.'))
        .and_then(|rest| rest.strip_suffix(PIPE_SUFFIX))
    else {
        return false;
    };
    !middle.is_empty()
}
