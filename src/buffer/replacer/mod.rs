//! Eviction policy implementations (replacers).
//!
//! The pool ships with [`LruReplacer`], which evicts the frame that has
//! been unpinned the longest without being re-pinned.

mod lru;

pub use lru::LruReplacer;
