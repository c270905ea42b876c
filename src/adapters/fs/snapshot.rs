use crate::domain::ports::SnapshotStore;
use crate::error::RtsError;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File system snapshot store: one file per snapshot name under a directory.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn write_atomically(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let temp_path = path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn read(&self, name: &str) -> Result<Option<String>> {
        let path = self.path(name);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read snapshot file: {}", path.display())),
        }
    }

    fn write(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.path(name);
        self.write_atomically(&path, contents)
            .map_err(|source| RtsError::Persistence { path, source })?;
        Ok(())
    }
}
