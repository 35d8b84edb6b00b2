//! Storage backend abstraction
//!
//! A backend is one independently failing unit of storage: a local
//! directory, a remote disk server, or an in-memory double in tests.
//! The bootstrap code only ever talks to disks through this trait.

use async_trait::async_trait;
use objectio_common::DiskResult;
use std::sync::Arc;

/// Shared handle to a backend, cheap to hand to a spawned task
pub type DiskStore = Arc<dyn StorageBackend>;

/// Operations a disk must provide to be brought up by the object layer.
///
/// # Entry naming
///
/// [`list_dir`](Self::list_dir) returns the immediate children of a
/// directory. A child that is itself a directory MUST carry a trailing
/// `/`; a leaf file MUST NOT. Recursive cleanup decides whether to
/// descend or delete purely from that suffix, so a backend that gets it
/// wrong will either try to delete a directory as a file or try to list
/// a file.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Human-readable location of this disk, used in logs
    fn endpoint(&self) -> String;

    /// Create a top-level volume.
    ///
    /// Returns [`DiskError::VolumeExists`](objectio_common::DiskError::VolumeExists)
    /// when the volume is already present and
    /// [`DiskError::DiskNotFound`](objectio_common::DiskError::DiskNotFound)
    /// when the disk cannot be reached.
    async fn make_volume(&self, volume: &str) -> DiskResult<()>;

    /// List the immediate children of `dir_path` inside `volume`.
    ///
    /// Returns [`DiskError::FileNotFound`](objectio_common::DiskError::FileNotFound)
    /// when `dir_path` does not exist.
    async fn list_dir(&self, volume: &str, dir_path: &str) -> DiskResult<Vec<String>>;

    /// Delete exactly the leaf file at `path`.
    ///
    /// A missing file is reported as
    /// [`DiskError::FileNotFound`](objectio_common::DiskError::FileNotFound);
    /// callers that tolerate concurrent removal decide whether that matters.
    async fn delete_file(&self, volume: &str, path: &str) -> DiskResult<()>;
}
