//! Local filesystem backend
//!
//! A disk is a directory on the host. Each volume is a sub-directory of
//! the disk root and objects are plain files below it.

use crate::backend::StorageBackend;
use crate::os;
use async_trait::async_trait;
use objectio_common::error::{to_access_error, to_file_error, to_volume_error};
use objectio_common::path::{SLASH_SEPARATOR, is_dir_path};
use objectio_common::{DiskError, DiskResult};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, error};

/// Disk backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalDisk {
    root: PathBuf,
}

impl LocalDisk {
    /// Open a disk rooted at `root`, which must be an existing directory
    pub async fn new(root: impl Into<PathBuf>) -> DiskResult<Self> {
        let disk = Self { root: root.into() };
        disk.check_root().await?;
        Ok(disk)
    }

    /// Disk root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `volume` can be used as a directory name under the root
    pub fn is_valid_volname(volume: &str) -> bool {
        !volume.is_empty()
            && volume != "."
            && volume != ".."
            && !volume.contains(SLASH_SEPARATOR)
            && !volume.contains('\\')
    }

    async fn check_root(&self) -> DiskResult<()> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(DiskError::DiskNotFound),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(DiskError::DiskNotFound),
            Err(e) => Err(to_access_error(e, DiskError::DiskAccessDenied)),
        }
    }

    fn volume_dir(&self, volume: &str) -> DiskResult<PathBuf> {
        if !Self::is_valid_volname(volume) {
            return Err(DiskError::InvalidArgument(format!(
                "invalid volume name: {volume:?}"
            )));
        }
        Ok(self.root.join(volume))
    }

    fn object_path(&self, volume: &str, path: &str) -> DiskResult<PathBuf> {
        let volume_dir = self.volume_dir(volume)?;
        let relative = Path::new(path.trim_start_matches(SLASH_SEPARATOR));

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(DiskError::InvalidArgument(format!(
                "path escapes volume: {path:?}"
            )));
        }

        Ok(volume_dir.join(relative))
    }

    /// Remove directories left empty by a delete, stopping at the volume
    async fn prune_empty_parents(volume_dir: &Path, file_path: &Path) {
        let mut current = file_path.parent();
        while let Some(dir) = current {
            if dir == volume_dir || !dir.starts_with(volume_dir) {
                break;
            }
            // Fails once a directory still has entries, which ends the walk
            if fs::remove_dir(dir).await.is_err() {
                break;
            }
            debug!("pruned empty directory {}", dir.display());
            current = dir.parent();
        }
    }
}

#[async_trait]
impl StorageBackend for LocalDisk {
    fn endpoint(&self) -> String {
        self.root.display().to_string()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn make_volume(&self, volume: &str) -> DiskResult<()> {
        let volume_dir = self.volume_dir(volume)?;
        self.check_root().await?;

        match fs::create_dir(&volume_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(DiskError::VolumeExists),
            Err(e) => {
                error!("local disk make volume failed: {e}");
                Err(to_volume_error(e))
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_dir(&self, volume: &str, dir_path: &str) -> DiskResult<Vec<String>> {
        let volume_dir = self.volume_dir(volume)?;
        let abs = self.object_path(volume, dir_path)?;
        self.check_root().await?;

        match os::read_dir(&abs).await {
            Ok(entries) => Ok(entries),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Err(e) = fs::metadata(&volume_dir).await {
                    return Err(to_access_error(e, DiskError::VolumeAccessDenied));
                }
                Err(DiskError::FileNotFound)
            }
            Err(e) => Err(to_file_error(e)),
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete_file(&self, volume: &str, path: &str) -> DiskResult<()> {
        if path.is_empty() || is_dir_path(path) {
            return Err(DiskError::IsNotRegular);
        }
        let volume_dir = self.volume_dir(volume)?;
        let abs = self.object_path(volume, path)?;
        self.check_root().await?;

        match fs::symlink_metadata(&abs).await {
            Ok(meta) if meta.is_dir() => return Err(DiskError::IsNotRegular),
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Err(e) = fs::metadata(&volume_dir).await {
                    return Err(to_access_error(e, DiskError::VolumeAccessDenied));
                }
                return Err(DiskError::FileNotFound);
            }
            Err(e) => return Err(to_file_error(e)),
        }

        fs::remove_file(&abs).await.map_err(to_file_error)?;
        Self::prune_empty_parents(&volume_dir, &abs).await;

        Ok(())
    }
}
