//! Persists an [`EncodedFrame`] under a numbered path, and reads it back.
//!
//! Modeled on the FMF writer's small, explicit error enum (`fmf::FMFError`)
//! and its `#[from] std::io::Error` variant.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::annotate::EncodedFrame;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("creating images directory {path}: {source}")]
    CreateDir { path: PathBuf, source: std::io::Error },
    #[error("writing {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("reading {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("setting permissions on {path}: {source}")]
    Permissions { path: PathBuf, source: std::io::Error },
}

/// Scoped write/read access to `images/cap_XXXXXX.ppm` under a working
/// directory.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = base_dir.as_ref().join("images");
        fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir { path: dir.clone(), source })?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, slot: u64) -> PathBuf {
        self.dir.join(format!("cap_{:06}.ppm", slot))
    }

    /// Creates or truncates the slot's file and writes the full encoded
    /// frame. A short write is impossible to observe through `write_all`:
    /// any error here is treated as fatal by the caller, per spec.
    pub fn write(&self, slot: u64, encoded: &EncodedFrame) -> Result<(), StoreError> {
        let path = self.path_for(slot);
        let mut file = File::create(&path).map_err(|source| StoreError::Write { path: path.clone(), source })?;
        file.write_all(encoded.as_bytes())
            .map_err(|source| StoreError::Write { path: path.clone(), source })?;
        set_world_read_write(&path)?;
        Ok(())
    }

    pub fn read(&self, slot: u64) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(slot);
        let mut file = File::open(&path).map_err(|source| StoreError::Read { path: path.clone(), source })?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|source| StoreError::Read { path: path.clone(), source })?;
        Ok(buf)
    }
}

#[cfg(unix)]
fn set_world_read_write(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o666))
        .map_err(|source| StoreError::Permissions { path: path.to_path_buf(), source })
}

#[cfg(not(unix))]
fn set_world_read_write(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}
