//! Error types for pagepool.

use thiserror::Error;

/// Convenient Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in pagepool.
///
/// Every failure is reported synchronously to the immediate caller; no
/// operation retries or recovers internally, and the pool remains usable
/// after any failed call.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying database file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist on disk.
    #[error("page {0} not found on disk")]
    PageNotFound(u32),

    /// No frame available: every frame is pinned and nothing can be evicted.
    ///
    /// The caller is expected to back off and retry at a higher level; the
    /// pool never blocks waiting for a frame.
    #[error("buffer pool exhausted: all frames are pinned")]
    PoolExhausted,

    /// Operation referenced a page id that is not resident in the pool.
    #[error("page {0} is not resident in the buffer pool")]
    PageNotResident(u32),

    /// Delete requested on a page with outstanding pins.
    #[error("page {0} is pinned and cannot be deleted")]
    PagePinned(u32),

    /// Unpin called more times than the matching fetch (pin count already 0).
    #[error("page {0} is not pinned (unbalanced unpin)")]
    PageNotPinned(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(42);
        assert_eq!(format!("{}", err), "page 42 not found on disk");

        let err = Error::PoolExhausted;
        assert_eq!(
            format!("{}", err),
            "buffer pool exhausted: all frames are pinned"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: Error = io_err.into();
        assert!(err.source().is_some());
        assert!(Error::PoolExhausted.source().is_none());
    }
}
