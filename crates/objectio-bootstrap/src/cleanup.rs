//! Recursive directory cleanup
//!
//! Deletes every file below a directory of one disk. The walk is safe to
//! repeat and safe to run after a previous walk was interrupted: a
//! directory or file that is already gone counts as cleaned.

use futures::FutureExt;
use futures::future::BoxFuture;
use objectio_common::DiskResult;
use objectio_common::path::{SLASH_SEPARATOR, is_dir_path, path_join, retain_slash};
use objectio_storage::StorageBackend;
use tracing::{debug, warn};

/// Delete everything below `dir_path` in `volume`.
///
/// `dir_path` is always treated as a directory, with or without a
/// trailing `/`; an empty path means the whole volume. Entries ending in
/// `/` are descended into, anything else is deleted as a file. Empty
/// directories are left for the backend to deal with.
///
/// The first failure other than "not found" aborts the walk and is
/// returned as is.
#[tracing::instrument(level = "debug", skip(disk), fields(endpoint = %disk.endpoint()))]
pub async fn cleanup_dir(disk: &dyn StorageBackend, volume: &str, dir_path: &str) -> DiskResult<()> {
    let joined = path_join(&[dir_path]);
    let root = match joined.trim_end_matches(SLASH_SEPARATOR) {
        // Volume root, spelled however the caller spelled it
        "" | "." => SLASH_SEPARATOR.to_string(),
        _ => retain_slash(&joined),
    };

    delete_entry(disk, volume, root).await
}

fn delete_entry<'a>(
    disk: &'a dyn StorageBackend,
    volume: &'a str,
    entry_path: String,
) -> BoxFuture<'a, DiskResult<()>> {
    async move {
        if !is_dir_path(&entry_path) {
            return match disk.delete_file(volume, &entry_path).await {
                Ok(()) => {
                    debug!("deleted {volume}/{entry_path}");
                    Ok(())
                }
                // Removed by someone else since it was listed
                Err(e) if e.is_not_found() => Ok(()),
                Err(e) => Err(e),
            };
        }

        let entries = match disk.list_dir(volume, &entry_path).await {
            Ok(entries) => entries,
            // Never existed, or already cleaned up
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e),
        };

        for entry in entries {
            if !is_child_name(&entry) {
                warn!("skipping unexpected entry {entry:?} under {volume}/{entry_path}");
                continue;
            }
            delete_entry(disk, volume, path_join(&[entry_path.as_str(), entry.as_str()])).await?;
        }

        Ok(())
    }
    .boxed()
}

/// A single path element, optionally marked as a directory
fn is_child_name(entry: &str) -> bool {
    let name = entry.strip_suffix(SLASH_SEPARATOR).unwrap_or(entry);
    !name.is_empty() && name != "." && name != ".." && !name.contains(SLASH_SEPARATOR)
}
