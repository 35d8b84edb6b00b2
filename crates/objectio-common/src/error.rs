//! Error types for ObjectIO
//!
//! Two layers of errors live here:
//! - [`DiskError`]: what a single storage backend reports
//! - [`Error`]: what the object layer surfaces, with bucket/object context
//!
//! [`to_object_err`] translates the former into the latter.

use thiserror::Error;

/// Result type for backend-local operations
pub type DiskResult<T> = std::result::Result<T, DiskError>;

/// Common result type for ObjectIO operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by a single storage backend
#[derive(Debug, Error)]
pub enum DiskError {
    #[error("volume already exists")]
    VolumeExists,

    #[error("volume not found")]
    VolumeNotFound,

    #[error("volume is not empty")]
    VolumeNotEmpty,

    #[error("volume access denied")]
    VolumeAccessDenied,

    #[error("disk not found")]
    DiskNotFound,

    #[error("disk access denied")]
    DiskAccessDenied,

    #[error("disk full")]
    DiskFull,

    #[error("faulty disk")]
    FaultyDisk,

    #[error("file not found")]
    FileNotFound,

    #[error("file access denied")]
    FileAccessDenied,

    #[error("file name too long")]
    FileNameTooLong,

    #[error("not a regular file")]
    IsNotRegular,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("disk I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl DiskError {
    /// Create an error not covered by the named conditions
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// The volume being created is already present
    #[must_use]
    pub fn is_volume_exists(&self) -> bool {
        matches!(self, Self::VolumeExists)
    }

    /// The backend cannot be reached at all
    #[must_use]
    pub fn is_disk_not_found(&self) -> bool {
        matches!(self, Self::DiskNotFound)
    }

    /// The file or directory does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound)
    }
}

/// Classify an I/O error raised while touching a file
pub fn to_file_error(err: std::io::Error) -> DiskError {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound | ErrorKind::InvalidInput => DiskError::FileNotFound,
        ErrorKind::PermissionDenied
        | ErrorKind::NotADirectory
        | ErrorKind::DirectoryNotEmpty => DiskError::FileAccessDenied,
        ErrorKind::IsADirectory => DiskError::IsNotRegular,
        ErrorKind::UnexpectedEof => DiskError::FaultyDisk,
        ErrorKind::StorageFull => DiskError::DiskFull,
        ErrorKind::InvalidFilename => DiskError::FileNameTooLong,
        _ => DiskError::Io(err),
    }
}

/// Classify an I/O error raised while touching a volume directory
pub fn to_volume_error(err: std::io::Error) -> DiskError {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => DiskError::VolumeNotFound,
        ErrorKind::PermissionDenied => DiskError::DiskAccessDenied,
        ErrorKind::DirectoryNotEmpty => DiskError::VolumeNotEmpty,
        ErrorKind::NotADirectory => DiskError::IsNotRegular,
        _ => to_file_error(err),
    }
}

/// Classify an access check failure, reporting `denied` for permission problems
pub fn to_access_error(err: std::io::Error, denied: DiskError) -> DiskError {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::PermissionDenied | ErrorKind::NotADirectory => denied,
        ErrorKind::NotFound => DiskError::VolumeNotFound,
        ErrorKind::UnexpectedEof => DiskError::FaultyDisk,
        _ => to_volume_error(err),
    }
}

/// Object layer error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    #[error("bucket already exists: {0}")]
    BucketExists(String),

    #[error("bucket not empty: {0}")]
    BucketNotEmpty(String),

    #[error("object not found: {bucket}/{object}")]
    ObjectNotFound { bucket: String, object: String },

    #[error("object name invalid: {bucket}/{object}")]
    ObjectNameInvalid { bucket: String, object: String },

    #[error("prefix access denied: {bucket}/{object}")]
    PrefixAccessDenied { bucket: String, object: String },

    #[error("object exists as directory: {bucket}/{object}")]
    ObjectExistsAsDirectory { bucket: String, object: String },

    #[error("storage reached its minimum free disk threshold")]
    StorageFull,

    #[error("disk not found while accessing {bucket}/{object}")]
    DiskNotFound { bucket: String, object: String },

    #[error("storage error on {bucket}/{object}: {source}")]
    Storage {
        bucket: String,
        object: String,
        #[source]
        source: DiskError,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if this is a not found error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BucketNotFound(_) | Self::ObjectNotFound { .. }
        )
    }

    /// Check if the failure may clear up on its own (offline or full disks)
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DiskNotFound { .. }
                | Self::StorageFull
                | Self::Storage {
                    source: DiskError::FaultyDisk,
                    ..
                }
        )
    }

    /// The backend error this was translated from, if it was kept verbatim
    #[must_use]
    pub fn disk_error(&self) -> Option<&DiskError> {
        match self {
            Self::Storage { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Translate a backend error into an object layer error.
///
/// `volume` and `path` are the bucket and object the failing operation
/// touched. Named conditions become their object layer counterpart;
/// anything else is wrapped unchanged in [`Error::Storage`].
pub fn to_object_err(err: DiskError, volume: &str, path: &str) -> Error {
    let bucket = volume.to_string();
    let object = path.to_string();

    match err {
        DiskError::DiskFull => Error::StorageFull,
        DiskError::VolumeNotFound => Error::BucketNotFound(bucket),
        DiskError::VolumeExists => Error::BucketExists(bucket),
        DiskError::VolumeNotEmpty => Error::BucketNotEmpty(bucket),
        DiskError::FileNotFound => Error::ObjectNotFound { bucket, object },
        DiskError::FileNameTooLong => Error::ObjectNameInvalid { bucket, object },
        DiskError::FileAccessDenied => Error::PrefixAccessDenied { bucket, object },
        DiskError::IsNotRegular => Error::ObjectExistsAsDirectory { bucket, object },
        DiskError::DiskNotFound => Error::DiskNotFound { bucket, object },
        source => Error::Storage {
            bucket,
            object,
            source,
        },
    }
}
