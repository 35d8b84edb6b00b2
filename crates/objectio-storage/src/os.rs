//! Filesystem helpers for the local disk backend

use objectio_common::path::SLASH_SEPARATOR;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Return the entries of `dir_path`.
///
/// Regular files are returned by name, directories with a trailing `/`.
/// Symlinks and special files are skipped, as are entries whose type
/// cannot be read (typically removed between the listing and the stat).
///
/// A name that is not valid UTF-8 cannot be addressed through a volume
/// path, so it fails the listing with `InvalidData`.
pub async fn read_dir(dir_path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let mut dir = fs::read_dir(dir_path.as_ref()).await?;
    let mut entries = Vec::new();

    while let Some(entry) = dir.next_entry().await? {
        let name = entry.file_name().into_string().map_err(|raw| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("non UTF-8 entry {raw:?} in {}", dir_path.as_ref().display()),
            )
        })?;
        if name.is_empty() || name == "." || name == ".." {
            continue;
        }

        // DirEntry::file_type does not follow symlinks
        let file_type = match entry.file_type().await {
            Ok(t) => t,
            Err(e) => {
                debug!("skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };

        if file_type.is_file() {
            entries.push(name);
        } else if file_type.is_dir() {
            entries.push(format!("{name}{SLASH_SEPARATOR}"));
        }
    }

    Ok(entries)
}
