//! Storage layer - the disk collaborator.
//!
//! - [`DiskManager`] - Low-level file I/O and page id allocation
//! - [`Page`] - The fixed-size opaque page buffer

mod disk_manager;
mod page;

pub use disk_manager::DiskManager;
pub use page::Page;
