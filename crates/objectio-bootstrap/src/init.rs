//! Object layer initialization
//!
//! Every disk gets the same treatment, concurrently: make sure the
//! metadata volume exists, then purge the temporary objects a previous
//! run may have left behind. One bad disk never keeps the others from
//! being initialized.

use crate::cleanup::cleanup_dir;
use futures::future::join_all;
use objectio_common::config::{DEFAULT_META_VOLUME, DEFAULT_TMP_PREFIX, StorageConfig};
use objectio_common::{DiskError, DiskResult, Result, to_object_err};
use objectio_storage::{DiskStore, StorageBackend};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reserved names inside every disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaLayout {
    /// Metadata volume
    pub volume: String,
    /// Prefix of temporary objects inside the metadata volume
    pub tmp_prefix: String,
}

impl Default for MetaLayout {
    fn default() -> Self {
        Self {
            volume: DEFAULT_META_VOLUME.to_string(),
            tmp_prefix: DEFAULT_TMP_PREFIX.to_string(),
        }
    }
}

impl From<&StorageConfig> for MetaLayout {
    fn from(config: &StorageConfig) -> Self {
        Self {
            volume: config.meta_volume.clone(),
            tmp_prefix: config.tmp_prefix.clone(),
        }
    }
}

/// Initialize the object layer on all `disks`.
///
/// One task is spawned per disk and all of them run to completion, even
/// after a failure. Every failure is logged; the one from the lowest disk
/// index is returned, translated with the metadata volume and temporary
/// prefix as context.
#[tracing::instrument(skip_all, fields(disks = disks.len()))]
pub async fn init_object_layer(disks: &[DiskStore], layout: &MetaLayout) -> Result<()> {
    let tasks: Vec<_> = disks
        .iter()
        .enumerate()
        .map(|(index, disk)| {
            let disk = Arc::clone(disk);
            let layout = layout.clone();
            tokio::spawn(async move { init_disk(index, disk.as_ref(), &layout).await })
        })
        .collect();

    // Slot `i` holds the outcome of disk `i`; join_all keeps input order
    let errs: Vec<Option<DiskError>> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| match joined {
            Ok(res) => res.err(),
            Err(e) => Some(DiskError::other(format!("disk init task failed: {e}"))),
        })
        .collect();

    for (index, err) in errs.iter().enumerate() {
        if let Some(err) = err {
            error!(
                index,
                endpoint = %disks[index].endpoint(),
                "failed to initialize disk: {err}"
            );
        }
    }

    match errs.into_iter().flatten().next() {
        Some(err) => Err(to_object_err(err, &layout.volume, &layout.tmp_prefix)),
        None => {
            info!("initialized {} disks", disks.len());
            Ok(())
        }
    }
}

async fn init_disk(index: usize, disk: &dyn StorageBackend, layout: &MetaLayout) -> DiskResult<()> {
    match disk.make_volume(&layout.volume).await {
        Ok(()) => debug!(index, "created volume {}", layout.volume),
        Err(e) if e.is_volume_exists() => {}
        // Left for the layers above to retry or exclude
        Err(e) if e.is_disk_not_found() => {
            warn!(index, endpoint = %disk.endpoint(), "disk not reachable while creating {}", layout.volume);
        }
        Err(e) => return Err(e),
    }

    cleanup_dir(disk, &layout.volume, &layout.tmp_prefix).await?;
    debug!(index, "cleaned up {}/{}", layout.volume, layout.tmp_prefix);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use objectio_common::Error;
    use objectio_storage::{DiskOp, LocalDisk, MemoryDisk};

    const META: &str = DEFAULT_META_VOLUME;

    fn disk_with_tmp(name: &str) -> MemoryDisk {
        MemoryDisk::new(name)
            .with_file(META, "tmp/upload-1/part.1")
            .with_file(META, "tmp/upload-1/xl.meta")
            .with_file(META, "tmp/stray")
            .with_file(META, "format.json")
    }

    fn stores(disks: &[Arc<MemoryDisk>]) -> Vec<DiskStore> {
        disks.iter().map(|d| Arc::clone(d) as DiskStore).collect()
    }

    #[tokio::test]
    async fn test_init_fresh_disks() {
        let disks: Vec<_> = (0..4).map(|i| Arc::new(MemoryDisk::new(format!("disk-{i}")))).collect();

        init_object_layer(&stores(&disks), &MetaLayout::default()).await.unwrap();

        for disk in &disks {
            assert!(disk.has_volume(META));
            assert_eq!(disk.make_volume_calls(), vec![META]);
            assert_eq!(disk.list_calls(), vec!["tmp/"]);
        }
    }

    #[tokio::test]
    async fn test_init_existing_volume_is_cleaned() {
        let disks: Vec<_> = (0..3).map(|i| Arc::new(disk_with_tmp(&format!("disk-{i}")))).collect();

        init_object_layer(&stores(&disks), &MetaLayout::default()).await.unwrap();

        for disk in &disks {
            assert_eq!(disk.files(META), vec!["format.json"]);
        }
    }

    #[tokio::test]
    async fn test_init_no_disks() {
        init_object_layer(&[], &MetaLayout::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_init_unreachable_on_make_volume_still_cleans() {
        let disk = Arc::new(
            disk_with_tmp("disk-0").with_fault(DiskOp::MakeVolume, META, || DiskError::DiskNotFound),
        );

        init_object_layer(&stores(&[Arc::clone(&disk)]), &MetaLayout::default())
            .await
            .unwrap();

        assert_eq!(disk.files(META), vec!["format.json"]);
    }

    #[tokio::test]
    async fn test_init_offline_disk_fails_cleanup() {
        let disk = Arc::new(MemoryDisk::new("disk-0"));
        disk.set_online(false);

        let err = init_object_layer(&stores(&[Arc::clone(&disk)]), &MetaLayout::default())
            .await
            .unwrap_err();

        match err {
            Error::DiskNotFound { bucket, object } => {
                assert_eq!(bucket, META);
                assert_eq!(object, DEFAULT_TMP_PREFIX);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Cleanup was attempted despite the failed volume creation
        assert_eq!(disk.list_calls(), vec!["tmp/"]);
    }

    #[tokio::test]
    async fn test_init_one_failure_does_not_stop_others() {
        let disks: Vec<_> = (0..4)
            .map(|i| {
                let disk = disk_with_tmp(&format!("disk-{i}"));
                let disk = if i == 1 {
                    disk.with_fault(DiskOp::MakeVolume, META, || DiskError::other("disk-1 broken"))
                } else {
                    disk
                };
                Arc::new(disk)
            })
            .collect();

        let err = init_object_layer(&stores(&disks), &MetaLayout::default())
            .await
            .unwrap_err();

        assert!(matches!(err.disk_error(), Some(DiskError::Other(m)) if m == "disk-1 broken"));

        // The failing disk never got to cleanup
        assert!(disks[1].list_calls().is_empty());
        assert_eq!(disks[1].files(META).len(), 4);

        for i in [0, 2, 3] {
            assert_eq!(disks[i].files(META), vec!["format.json"], "disk {i}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_init_reports_lowest_index_failure() {
        let disks: Vec<_> = (0..7)
            .map(|i| {
                let disk = disk_with_tmp(&format!("disk-{i}"));
                let disk = match i {
                    2 => disk.with_fault(DiskOp::ListDir, "tmp/", || DiskError::other("disk-2 broken")),
                    5 => disk.with_fault(DiskOp::MakeVolume, META, || DiskError::other("disk-5 broken")),
                    _ => disk,
                };
                Arc::new(disk)
            })
            .collect();

        for _ in 0..10 {
            let err = init_object_layer(&stores(&disks), &MetaLayout::default())
                .await
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("storage error on {META}/{DEFAULT_TMP_PREFIX}: disk-2 broken")
            );
        }
    }

    #[tokio::test]
    async fn test_init_translates_named_conditions() {
        let disk = Arc::new(
            disk_with_tmp("disk-0")
                .with_fault(DiskOp::DeleteFile, "tmp/stray", || DiskError::FileAccessDenied),
        );

        let err = init_object_layer(&stores(&[disk]), &MetaLayout::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::PrefixAccessDenied { ref bucket, ref object } if bucket == META && object == "tmp"
        ));
    }

    #[tokio::test]
    async fn test_init_custom_layout() {
        let disk = Arc::new(
            MemoryDisk::new("disk-0")
                .with_file("meta", "staging/a")
                .with_file("meta", "keep/b"),
        );
        let layout = MetaLayout {
            volume: "meta".to_string(),
            tmp_prefix: "staging".to_string(),
        };

        init_object_layer(&stores(&[Arc::clone(&disk)]), &layout).await.unwrap();

        assert_eq!(disk.make_volume_calls(), vec!["meta"]);
        assert_eq!(disk.files("meta"), vec!["keep/b"]);
    }

    /// Disk whose volume creation panics
    struct PanickingDisk;

    #[async_trait]
    impl StorageBackend for PanickingDisk {
        fn endpoint(&self) -> String {
            "panic://0".to_string()
        }

        async fn make_volume(&self, _volume: &str) -> DiskResult<()> {
            panic!("controller reset");
        }

        async fn list_dir(&self, _volume: &str, _dir_path: &str) -> DiskResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn delete_file(&self, _volume: &str, _path: &str) -> DiskResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_init_panicking_disk_is_isolated() {
        let healthy = Arc::new(disk_with_tmp("disk-1"));
        let disks: Vec<DiskStore> = vec![
            Arc::new(PanickingDisk) as DiskStore,
            Arc::clone(&healthy) as DiskStore,
        ];

        let err = init_object_layer(&disks, &MetaLayout::default()).await.unwrap_err();

        assert!(matches!(err.disk_error(), Some(DiskError::Other(m)) if m.starts_with("disk init task failed")));
        assert_eq!(healthy.files(META), vec!["format.json"]);
    }

    #[tokio::test]
    async fn test_init_local_disks() {
        let dirs: Vec<_> = (0..3).map(|_| tempfile::tempdir().unwrap()).collect();
        let mut disks: Vec<DiskStore> = Vec::new();
        for dir in &dirs {
            disks.push(Arc::new(LocalDisk::new(dir.path()).await.unwrap()));
        }

        // A crashed upload on the second disk
        let tmp = dirs[1].path().join(META).join("tmp").join("upload-7");
        std::fs::create_dir_all(&tmp).unwrap();
        std::fs::write(tmp.join("part.1"), b"partial").unwrap();

        init_object_layer(&disks, &MetaLayout::default()).await.unwrap();

        for dir in &dirs {
            assert!(dir.path().join(META).is_dir());
        }
        assert!(!dirs[1].path().join(META).join("tmp").exists());

        // Restart: everything already in place
        init_object_layer(&disks, &MetaLayout::default()).await.unwrap();
    }
}
