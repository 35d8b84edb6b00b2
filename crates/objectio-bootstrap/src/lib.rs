//! ObjectIO Bootstrap - Bringing disks into a usable state
//!
//! Runs once at startup, before any request is served:
//! - Creates the reserved metadata volume on every disk
//! - Purges temporary objects left behind by interrupted operations
//!
//! The recursive cleanup is also usable on its own wherever a subtree
//! of a disk has to be discarded.

pub mod cleanup;
pub mod init;

pub use cleanup::cleanup_dir;
pub use init::{MetaLayout, init_object_layer};
