//! In-memory backend
//!
//! Directories are implicit: a directory exists as long as some file
//! lives below it, the way object stores model prefixes. Faults can be
//! injected per operation and path, and every call is recorded so tests
//! can check what a caller actually did to the disk.

use crate::backend::StorageBackend;
use async_trait::async_trait;
use objectio_common::path::{SLASH_SEPARATOR, is_dir_path, retain_slash};
use objectio_common::{DiskError, DiskResult};
use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Backend operation a fault can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiskOp {
    MakeVolume,
    ListDir,
    DeleteFile,
}

type FaultFn = Arc<dyn Fn() -> DiskError + Send + Sync>;

/// How listings are ordered
#[derive(Debug, Clone, Default)]
enum ListingOrder {
    #[default]
    Sorted,
    Shuffled(u64),
}

/// Disk that keeps everything in memory
pub struct MemoryDisk {
    name: String,
    online: AtomicBool,
    /// volume -> full paths of the files it holds
    volumes: RwLock<BTreeMap<String, BTreeSet<String>>>,
    /// (op, volume or path) -> error to report
    faults: RwLock<HashMap<(DiskOp, String), FaultFn>>,
    /// directory -> preferred order of its children
    orders: RwLock<HashMap<String, Vec<String>>>,
    listing: RwLock<ListingOrder>,
    make_volume_calls: Mutex<Vec<String>>,
    list_calls: Mutex<Vec<String>>,
    delete_attempts: Mutex<Vec<String>>,
}

impl std::fmt::Debug for MemoryDisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDisk")
            .field("name", &self.name)
            .field("online", &self.online.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MemoryDisk {
    /// Create an empty, online disk
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            online: AtomicBool::new(true),
            volumes: RwLock::new(BTreeMap::new()),
            faults: RwLock::new(HashMap::new()),
            orders: RwLock::new(HashMap::new()),
            listing: RwLock::new(ListingOrder::default()),
            make_volume_calls: Mutex::new(Vec::new()),
            list_calls: Mutex::new(Vec::new()),
            delete_attempts: Mutex::new(Vec::new()),
        }
    }

    /// Add an (empty) volume
    #[must_use]
    pub fn with_volume(self, volume: &str) -> Self {
        self.volumes.write().entry(volume.to_string()).or_default();
        self
    }

    /// Add a file, creating its volume if needed
    #[must_use]
    pub fn with_file(self, volume: &str, path: &str) -> Self {
        let path = normalize(path).to_string();
        self.volumes
            .write()
            .entry(volume.to_string())
            .or_default()
            .insert(path);
        self
    }

    /// Fail every `op` on `target` with the error built by `fault`.
    ///
    /// `target` is the volume name for [`DiskOp::MakeVolume`] and the
    /// volume-relative path otherwise.
    #[must_use]
    pub fn with_fault<F>(self, op: DiskOp, target: &str, fault: F) -> Self
    where
        F: Fn() -> DiskError + Send + Sync + 'static,
    {
        self.faults
            .write()
            .insert((op, normalize(target).to_string()), Arc::new(fault));
        self
    }

    /// Return the children of `dir` in the given order; unknown names go last
    #[must_use]
    pub fn with_listing_order(self, dir: &str, order: &[&str]) -> Self {
        self.orders.write().insert(
            normalize(dir).to_string(),
            order.iter().map(ToString::to_string).collect(),
        );
        self
    }

    /// Shuffle every listing with a seeded generator
    #[must_use]
    pub fn with_shuffled_listings(self, seed: u64) -> Self {
        *self.listing.write() = ListingOrder::Shuffled(seed);
        self
    }

    /// Take the disk offline (or back online)
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Whether `volume` exists
    pub fn has_volume(&self, volume: &str) -> bool {
        self.volumes.read().contains_key(volume)
    }

    /// Files currently stored in `volume`, sorted
    pub fn files(&self, volume: &str) -> Vec<String> {
        self.volumes
            .read()
            .get(volume)
            .map(|files| files.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Volumes passed to `make_volume`, in call order
    pub fn make_volume_calls(&self) -> Vec<String> {
        self.make_volume_calls.lock().clone()
    }

    /// Directories passed to `list_dir`, in call order
    pub fn list_calls(&self) -> Vec<String> {
        self.list_calls.lock().clone()
    }

    /// Paths passed to `delete_file`, in call order, successful or not
    pub fn delete_attempts(&self) -> Vec<String> {
        self.delete_attempts.lock().clone()
    }

    fn check(&self, op: DiskOp, target: &str) -> DiskResult<()> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(DiskError::DiskNotFound);
        }
        if let Some(fault) = self.faults.read().get(&(op, target.to_string())) {
            return Err(fault());
        }
        Ok(())
    }

    fn order_children(&self, dir: &str, mut children: Vec<String>) -> Vec<String> {
        if let Some(order) = self.orders.read().get(dir) {
            children.sort_by_key(|c| order.iter().position(|o| o == c).unwrap_or(usize::MAX));
            return children;
        }
        if let ListingOrder::Shuffled(seed) = *self.listing.read() {
            let mut rng = StdRng::seed_from_u64(seed ^ dir.len() as u64);
            children.shuffle(&mut rng);
        }
        children
    }
}

/// Volume-relative paths are stored without a leading separator
fn normalize(path: &str) -> &str {
    path.trim_start_matches(SLASH_SEPARATOR)
}

#[async_trait]
impl StorageBackend for MemoryDisk {
    fn endpoint(&self) -> String {
        format!("memory://{}", self.name)
    }

    async fn make_volume(&self, volume: &str) -> DiskResult<()> {
        self.make_volume_calls.lock().push(volume.to_string());
        self.check(DiskOp::MakeVolume, volume)?;

        let mut volumes = self.volumes.write();
        if volumes.contains_key(volume) {
            return Err(DiskError::VolumeExists);
        }
        volumes.insert(volume.to_string(), BTreeSet::new());
        Ok(())
    }

    async fn list_dir(&self, volume: &str, dir_path: &str) -> DiskResult<Vec<String>> {
        let dir = retain_slash(normalize(dir_path));
        let dir = dir.as_str();
        self.list_calls.lock().push(dir.to_string());
        self.check(DiskOp::ListDir, dir)?;

        let children: Vec<String> = {
            let volumes = self.volumes.read();
            let files = volumes.get(volume).ok_or(DiskError::VolumeNotFound)?;

            let mut children = BTreeSet::new();
            for file in files {
                let Some(rest) = file.strip_prefix(dir) else {
                    continue;
                };
                if rest.is_empty() {
                    continue;
                }
                match rest.split_once(SLASH_SEPARATOR) {
                    Some((child, _)) => children.insert(format!("{child}{SLASH_SEPARATOR}")),
                    None => children.insert(rest.to_string()),
                };
            }
            children.into_iter().collect()
        };

        // The volume root always exists; any other directory only while it has files
        if children.is_empty() && !dir.is_empty() {
            return Err(DiskError::FileNotFound);
        }

        Ok(self.order_children(dir, children))
    }

    async fn delete_file(&self, volume: &str, path: &str) -> DiskResult<()> {
        let path = normalize(path);
        self.delete_attempts.lock().push(path.to_string());
        self.check(DiskOp::DeleteFile, path)?;

        if path.is_empty() || is_dir_path(path) {
            return Err(DiskError::IsNotRegular);
        }

        let mut volumes = self.volumes.write();
        let files = volumes.get_mut(volume).ok_or(DiskError::VolumeNotFound)?;
        if files.remove(path) {
            return Ok(());
        }

        let as_dir = format!("{path}{SLASH_SEPARATOR}");
        if files.iter().any(|f| f.starts_with(&as_dir)) {
            Err(DiskError::IsNotRegular)
        } else {
            Err(DiskError::FileNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryDisk {
        MemoryDisk::new("disk-0")
            .with_file("vol", "a/b")
            .with_file("vol", "a/c/d")
    }

    #[tokio::test]
    async fn test_make_volume() {
        let disk = MemoryDisk::new("disk-0");
        disk.make_volume("vol").await.unwrap();
        assert!(disk.has_volume("vol"));
        assert!(disk.make_volume("vol").await.unwrap_err().is_volume_exists());
        assert_eq!(disk.make_volume_calls(), vec!["vol", "vol"]);
    }

    #[tokio::test]
    async fn test_list_dir_marks_implicit_directories() {
        let disk = sample();
        assert_eq!(disk.list_dir("vol", "a/").await.unwrap(), vec!["b", "c/"]);
        assert_eq!(disk.list_dir("vol", "a/c/").await.unwrap(), vec!["d"]);
        assert_eq!(disk.list_dir("vol", "").await.unwrap(), vec!["a/"]);
        assert!(disk.list_dir("vol", "x/").await.unwrap_err().is_not_found());
        assert!(matches!(
            disk.list_dir("other", "a/").await.unwrap_err(),
            DiskError::VolumeNotFound
        ));
    }

    #[tokio::test]
    async fn test_listing_order_override() {
        let disk = sample().with_listing_order("a/", &["c/", "b"]);
        assert_eq!(disk.list_dir("vol", "a/").await.unwrap(), vec!["c/", "b"]);
    }

    #[tokio::test]
    async fn test_delete_file() {
        let disk = sample();
        disk.delete_file("vol", "a/b").await.unwrap();
        assert_eq!(disk.files("vol"), vec!["a/c/d"]);

        assert!(disk.delete_file("vol", "a/b").await.unwrap_err().is_not_found());
        assert!(matches!(
            disk.delete_file("vol", "a/c").await.unwrap_err(),
            DiskError::IsNotRegular
        ));
        assert_eq!(disk.delete_attempts(), vec!["a/b", "a/b", "a/c"]);
    }

    #[tokio::test]
    async fn test_faults_and_offline() {
        let disk = sample().with_fault(DiskOp::ListDir, "a/c/", || DiskError::FaultyDisk);
        assert!(matches!(
            disk.list_dir("vol", "a/c/").await.unwrap_err(),
            DiskError::FaultyDisk
        ));
        assert!(disk.list_dir("vol", "a/").await.is_ok());

        disk.set_online(false);
        assert!(disk.make_volume("new").await.unwrap_err().is_disk_not_found());
        assert!(disk.delete_file("vol", "a/b").await.unwrap_err().is_disk_not_found());
    }
}
