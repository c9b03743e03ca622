//! pagepool - a fixed-capacity buffer pool for page-based storage engines.
//!
//! The pool mediates all access to fixed-size disk pages: it decides which
//! pages are resident in memory, pins them against eviction while in use,
//! and picks the least-recently-unpinned resident page to evict when a new
//! one is needed.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       callers                           │
//! └───────────────────────────┬─────────────────────────────┘
//!                             ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │              Buffer Pool (buffer/)                      │
//! │   BufferPoolManager + Frame + PageGuards + Stats        │
//! │   ┌─────────────────────────────────────────────────┐   │
//! │   │  LruReplacer: least-recently-unpinned eviction  │   │
//! │   └─────────────────────────────────────────────────┘   │
//! └───────────────────────────┬─────────────────────────────┘
//!                             ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │              Storage Layer (storage/)                   │
//! │              DiskManager + Page                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers only ever talk to the [`BufferPoolManager`]. It consults the
//! page table, then the free list, then the replacement policy, then the
//! disk manager, always in that order, to satisfy a request.
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Error, config)
//! - [`buffer`] - Buffer pool management and eviction policy
//! - [`storage`] - Disk I/O and the page type
//!
//! # Quick Start
//! ```no_run
//! use pagepool::{BufferPoolManager, DiskManager};
//!
//! let dm = DiskManager::create("my_database.db").unwrap();
//! let bpm = BufferPoolManager::new(64, dm);
//!
//! // Allocate a page and write to it
//! let mut guard = bpm.new_page().unwrap();
//! guard.as_mut_slice()[0] = 0xAB;
//! // guard drops: page written through and unpinned
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, FrameId, PageId, Result};

pub use buffer::replacer::LruReplacer;
pub use buffer::{BufferPoolManager, BufferPoolStats, Frame, PageReadGuard, PageWriteGuard, StatsSnapshot};
pub use storage::{DiskManager, Page};
