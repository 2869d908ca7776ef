use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use policyrag_core::IngestionError;

const LOCK_FILE: &str = ".ingest.lock";

/// Exclusive marker file in the store root holding the owner's PID, removed on drop.
#[derive(Debug)]
pub struct IngestLock {
    path: PathBuf,
}

impl IngestLock {
    /// A lock left behind by a process that no longer exists is reclaimed once.
    pub fn acquire(store_dir: &Path) -> Result<Self, IngestionError> {
        fs::create_dir_all(store_dir)?;
        let path = store_dir.join(LOCK_FILE);
        match Self::create(&path) {
            Err(IngestionError::Locked(_)) if holder_is_gone(&path) => {
                tracing::warn!(path = %path.display(), "removing stale ingestion lock");
                fs::remove_file(&path)?;
                Self::create(&path)
            }
            other => other,
        }
    }

    fn create(path: &Path) -> Result<Self, IngestionError> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut f) => {
                writeln!(f, "{}", std::process::id())?;
                Ok(Self { path: path.to_path_buf() })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(IngestionError::Locked(path.display().to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// True only when the recorded PID is readable and that process is known to be dead.
fn holder_is_gone(path: &Path) -> bool {
    let Some(pid) = fs::read_to_string(path).ok().and_then(|s| s.trim().parse::<u32>().ok()) else {
        return false;
    };
    process_is_gone(pid)
}

#[cfg(target_os = "linux")]
fn process_is_gone(pid: u32) -> bool {
    Path::new("/proc/self").exists() && !Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(not(target_os = "linux"))]
fn process_is_gone(_pid: u32) -> bool {
    false
}

impl Drop for IngestLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "could not remove ingestion lock");
        }
    }
}
