use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::Label;

/// Records the pid of a running instance so a controller can signal it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<runtime dir>/<application>.pid`, falling back to the temp dir.
    pub fn for_label(label: &Label) -> Self {
        let dir = directories::ProjectDirs::from(
            &label.qualifier,
            &label.organization,
            &label.application,
        )
        .and_then(|dirs| dirs.runtime_dir().map(Path::to_owned))
        .unwrap_or_else(std::env::temp_dir);
        Self::new(dir.join(format!("{}.pid", label.application)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> io::Result<Option<i32>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => contents.trim().parse().map(Some).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid pid file {:?}: {e}", self.path),
                )
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes the current pid. The file is removed when the guard drops.
    pub fn create(&self) -> io::Result<PidFileGuard> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, std::process::id().to_string())?;
        debug!("Wrote pid file {:?}", self.path);
        Ok(PidFileGuard {
            path: self.path.clone(),
        })
    }
}

#[must_use]
#[derive(Debug)]
pub struct PidFileGuard {
    path: PathBuf,
}

impl Drop for PidFileGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Error removing pid file {:?}: {e:?}", self.path);
        }
    }
}

#[cfg(test)]
#[path = "./pid_file_test.rs"]
mod pid_file_test;
