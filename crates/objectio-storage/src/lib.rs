//! ObjectIO Storage - Disk backends
//!
//! This crate defines what the object layer needs from a disk and
//! provides the backends ObjectIO ships with:
//! - Local filesystem disks (one directory per volume)
//! - In-memory disks with fault injection, for tests

pub mod backend;
pub mod local;
pub mod memory;
pub mod os;

// Re-exports
pub use backend::{DiskStore, StorageBackend};
pub use local::LocalDisk;
pub use memory::{DiskOp, MemoryDisk};
