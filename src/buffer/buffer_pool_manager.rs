//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between disk and memory
//! - Pin-based reference counting
//! - Write-back of dirty pages on eviction, write-through on dirty unpin
//! - LRU victim selection among unpinned resident frames

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::Ordering;

use log::{trace, warn};
use parking_lot::Mutex;

use crate::buffer::replacer::LruReplacer;
use crate::buffer::{BufferPoolStats, Frame, PageReadGuard, PageWriteGuard};
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::DiskManager;

/// Everything the pool mutates while satisfying a request, behind one lock.
///
/// Every public operation holds this lock for its entire duration, disk I/O
/// included. This serializes all pool activity with I/O latency, trading
/// throughput for a correctness argument that fits in one sentence.
struct PoolInner {
    /// Maps resident page ids to frame ids (injective).
    page_table: HashMap<PageId, FrameId>,

    /// Frame ids not currently holding any page (FIFO: first freed, first
    /// reused).
    free_list: VecDeque<FrameId>,

    /// Eviction policy over unpinned resident frames. Guards its own state
    /// with an internal lock; it never calls back into the pool, so the
    /// nesting cannot deadlock.
    replacer: LruReplacer,

    /// The disk collaborator. Only ever touched under this lock.
    disk: DiskManager,
}

/// Manages a fixed pool of frames caching disk pages.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                     BufferPoolManager                        │
/// │  ┌────────────────────────────────────┐  ┌────────────────┐  │
/// │  │       Mutex<PoolInner>             │  │ frames: Vec    │  │
/// │  │  page_table   PageId → FrameId ────┼─▶│ [F0][F1][F2]…  │  │
/// │  │  free_list    VecDeque<FrameId>    │  │ (content locks │  │
/// │  │  replacer     LruReplacer          │  │  + atomics)    │  │
/// │  │  disk         DiskManager          │  └────────────────┘  │
/// │  └────────────────────────────────────┘  stats (atomics)     │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Invariants
/// Before and after every public operation:
/// - Every page-table entry points at a frame whose stored page id equals
///   the key.
/// - A frame is in exactly one of {free list, replacer set, pinned} and its
///   pin count is 0 iff (resident) it is in the replacer set.
/// - |free| + |pinned resident| + |unpinned resident| = pool capacity.
///
/// # Blocking
/// No operation waits for a frame: when every frame is pinned, fetch and
/// allocation fail with [`Error::PoolExhausted`] and the caller retries at a
/// higher level.
///
/// # Usage
/// ```ignore
/// let dm = DiskManager::create("test.db")?;
/// let bpm = BufferPoolManager::new(10, dm);
///
/// let mut guard = bpm.new_page()?;
/// guard.as_mut_slice()[0] = 0xAB;
/// // guard drops: written through, unpinned
///
/// let guard = bpm.fetch_page_read(page_id)?;
/// let data = guard.as_slice();
/// ```
pub struct BufferPoolManager {
    /// Fixed array of frames allocated at startup and reused for the pool's
    /// entire lifetime.
    frames: Vec<Frame>,

    /// The pool's critical section: tables, free list, replacer, disk.
    inner: Mutex<PoolInner>,

    /// Performance statistics (lock-free).
    stats: BufferPoolStats,

    /// Number of frames in the pool (immutable after construction).
    pool_size: usize,
}

impl BufferPoolManager {
    /// Create a new buffer pool manager.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize, disk_manager: DiskManager) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();
        let free_list: VecDeque<FrameId> = (0..pool_size).map(FrameId::new).collect();

        Self {
            frames,
            inner: Mutex::new(PoolInner {
                page_table: HashMap::new(),
                free_list,
                replacer: LruReplacer::new(pool_size),
                disk: disk_manager,
            }),
            stats: BufferPoolStats::new(),
            pool_size,
        }
    }

    // ========================================================================
    // Public API: Fetch pages
    // ========================================================================

    /// Fetch a page for reading (shared access).
    ///
    /// A resident page is returned without touching disk; otherwise the page
    /// is loaded into a frame taken from the free list or evicted from the
    /// replacer.
    ///
    /// # Errors
    /// - [`Error::PageNotFound`] if the page doesn't exist on disk
    /// - [`Error::PoolExhausted`] if every frame is pinned
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let frame_id = self.fetch_page_internal(page_id)?;
        let lock = self.frames[frame_id.0].page();

        Ok(PageReadGuard::new(self, frame_id, page_id, lock))
    }

    /// Fetch a page for writing (exclusive access).
    ///
    /// Same as [`Self::fetch_page_read`], but the returned guard marks the
    /// page dirty and writes it through when dropped.
    ///
    /// # Errors
    /// - [`Error::PageNotFound`] if the page doesn't exist on disk
    /// - [`Error::PoolExhausted`] if every frame is pinned
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let frame_id = self.fetch_page_internal(page_id)?;
        let lock = self.frames[frame_id.0].page_mut();

        Ok(PageWriteGuard::new(self, frame_id, page_id, lock))
    }

    /// Like [`Self::fetch_page_read`], for callers that treat failure as a
    /// normal outcome.
    pub fn checked_read_page(&self, page_id: PageId) -> Option<PageReadGuard<'_>> {
        self.fetch_page_read(page_id).ok()
    }

    /// Like [`Self::fetch_page_write`], for callers that treat failure as a
    /// normal outcome.
    pub fn checked_write_page(&self, page_id: PageId) -> Option<PageWriteGuard<'_>> {
        self.fetch_page_write(page_id).ok()
    }

    // ========================================================================
    // Public API: Create and delete pages
    // ========================================================================

    /// Allocate a fresh page id on disk without bringing it into the pool.
    pub fn allocate_page_id(&self) -> Result<PageId> {
        let mut inner = self.inner.lock();
        inner.disk.allocate_page()
    }

    /// Allocate a new page on disk and pin it in the pool.
    ///
    /// The frame's buffer is zeroed and the page starts **dirty**: it has
    /// never been durably written, so a later eviction or flush must not
    /// skip it.
    ///
    /// The id is allocated before a frame is reserved; if frame acquisition
    /// fails the id is not rolled back.
    ///
    /// # Errors
    /// - [`Error::PoolExhausted`] if every frame is pinned
    /// - I/O errors from id allocation or victim write-back
    pub fn new_page(&self) -> Result<PageWriteGuard<'_>> {
        let (frame_id, page_id) = {
            let mut inner = self.inner.lock();

            let page_id = inner.disk.allocate_page()?;
            let frame_id = self.acquire_frame(&mut inner)?;

            let frame = &self.frames[frame_id.0];
            frame.page_mut().reset();
            frame.set_page_id(Some(page_id));
            frame.pin();
            frame.mark_dirty();

            inner.page_table.insert(page_id, frame_id);
            inner.replacer.pin(frame_id);

            (frame_id, page_id)
        };

        let lock = self.frames[frame_id.0].page_mut();

        Ok(PageWriteGuard::new(self, frame_id, page_id, lock))
    }

    /// Delete a page from the pool and release its id.
    ///
    /// Deleting a non-resident page succeeds trivially; the id is still
    /// released. Deleting a pinned page fails and leaves all state
    /// unchanged.
    ///
    /// # Errors
    /// - [`Error::PagePinned`] if the page has outstanding pins
    pub fn delete_page(&self, page_id: PageId) -> Result<()> {
        let mut inner = self.inner.lock();

        let frame_id = match inner.page_table.get(&page_id) {
            Some(&fid) => fid,
            None => {
                inner.disk.deallocate_page(page_id);
                return Ok(());
            }
        };

        let frame = &self.frames[frame_id.0];
        if frame.is_pinned() {
            return Err(Error::PagePinned(page_id.0));
        }

        inner.page_table.remove(&page_id);
        // The frame is being destroyed, not kept as an eviction candidate
        inner.replacer.pin(frame_id);
        frame.reset();
        inner.free_list.push_back(frame_id);
        inner.disk.deallocate_page(page_id);

        Ok(())
    }

    // ========================================================================
    // Public API: Unpin and flush
    // ========================================================================

    /// Unpin a page, for callers managing pins manually (see
    /// [`PageReadGuard::forget`]). Guard-managed pins unpin themselves.
    ///
    /// The dirty flag accumulates with logical OR: `is_dirty = false` never
    /// clears an existing mark. A dirty unpin writes the page through to
    /// disk immediately. When the pin count reaches 0 the frame becomes an
    /// eviction candidate.
    ///
    /// # Errors
    /// - [`Error::PageNotResident`] if the page is not in the pool
    /// - [`Error::PageNotPinned`] if its pin count is already 0
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<()> {
        let mut inner = self.inner.lock();

        let frame_id = *inner
            .page_table
            .get(&page_id)
            .ok_or(Error::PageNotResident(page_id.0))?;
        let frame = &self.frames[frame_id.0];

        if !frame.is_pinned() {
            return Err(Error::PageNotPinned(page_id.0));
        }

        if is_dirty {
            frame.mark_dirty();
            let page = frame.page();
            inner.disk.write_page(page_id, &page)?;
            drop(page);
            self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
        }

        if frame.unpin() == 0 {
            inner.replacer.unpin(frame_id);
        }

        Ok(())
    }

    /// Flush a page to disk unconditionally and clear its dirty flag.
    ///
    /// Idempotent: flushing a clean page still performs the write and
    /// succeeds.
    ///
    /// # Errors
    /// - [`Error::PageNotResident`] if the page is not in the pool
    /// - I/O errors from the disk write
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let mut inner = self.inner.lock();

        let frame_id = *inner
            .page_table
            .get(&page_id)
            .ok_or(Error::PageNotResident(page_id.0))?;
        let frame = &self.frames[frame_id.0];

        let page = frame.page();
        inner.disk.write_page(page_id, &page)?;
        drop(page);

        frame.clear_dirty();
        self.stats.pages_written.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }

    /// Write every resident dirty page to disk and clear its flag.
    ///
    /// Residency, pin state and the page table are untouched.
    ///
    /// # Errors
    /// - I/O errors from disk writes
    pub fn flush_all_pages(&self) -> Result<()> {
        let mut inner = self.inner.lock();

        let pages: Vec<(PageId, FrameId)> =
            inner.page_table.iter().map(|(&pid, &fid)| (pid, fid)).collect();

        for (page_id, frame_id) in pages {
            let frame = &self.frames[frame_id.0];
            if !frame.is_dirty() {
                continue;
            }

            let page = frame.page();
            inner.disk.write_page(page_id, &page)?;
            drop(page);

            frame.clear_dirty();
            self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
        }

        Ok(())
    }

    // ========================================================================
    // Public API: Stats and introspection
    // ========================================================================

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get the number of free frames.
    pub fn free_frame_count(&self) -> usize {
        self.inner.lock().free_list.len()
    }

    /// Get the number of resident pages.
    pub fn page_count(&self) -> usize {
        self.inner.lock().page_table.len()
    }

    /// Get the number of unpinned resident frames (eviction candidates).
    pub fn evictable_count(&self) -> usize {
        self.inner.lock().replacer.size()
    }

    /// Get the pin count of a resident page, or `None` if not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let inner = self.inner.lock();
        let frame_id = *inner.page_table.get(&page_id)?;
        Some(self.frames[frame_id.0].pin_count())
    }

    /// Check whether a page is resident.
    pub fn contains_page(&self, page_id: PageId) -> bool {
        self.inner.lock().page_table.contains_key(&page_id)
    }

    // ========================================================================
    // Internal: Called by guards on drop
    // ========================================================================

    /// Unpin a frame whose pin is held by a guard.
    ///
    /// The guard has already released the frame's content lock. Drop cannot
    /// propagate errors, so a failed write-through is logged and the unpin
    /// still completes.
    pub(crate) fn unpin_frame(&self, frame_id: FrameId, is_dirty: bool) {
        let frame = &self.frames[frame_id.0];

        // One critical section for the write-through, the pin drop and the
        // replacer registration: a concurrent fetch must never observe a
        // pinned frame in the evictable set.
        let mut inner = self.inner.lock();

        if is_dirty {
            frame.mark_dirty();
            if let Some(page_id) = frame.page_id() {
                let page = frame.page();
                match inner.disk.write_page(page_id, &page) {
                    Ok(()) => {
                        self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        warn!("write-through of {} failed: {}", page_id, e);
                    }
                }
            }
        }

        if frame.unpin() == 0 {
            inner.replacer.unpin(frame_id);
        }
    }

    // ========================================================================
    // Internal: Core fetch logic
    // ========================================================================

    /// Bring a page into the pool and pin it, returning its frame id.
    fn fetch_page_internal(&self, page_id: PageId) -> Result<FrameId> {
        let mut inner = self.inner.lock();

        if let Some(&frame_id) = inner.page_table.get(&page_id) {
            // Hit: no disk traffic, just re-pin
            inner.replacer.pin(frame_id);
            self.frames[frame_id.0].pin();
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(frame_id);
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        let frame_id = self.acquire_frame(&mut inner)?;

        let page_data = match inner.disk.read_page(page_id) {
            Ok(data) => data,
            Err(e) => {
                // Keep capacity conserved: the reserved frame goes back to
                // the free list before the error surfaces.
                inner.free_list.push_back(frame_id);
                return Err(e);
            }
        };
        self.stats.pages_read.fetch_add(1, Ordering::Relaxed);

        let frame = &self.frames[frame_id.0];
        frame
            .page_mut()
            .as_mut_slice()
            .copy_from_slice(page_data.as_slice());
        frame.set_page_id(Some(page_id));
        frame.clear_dirty();
        frame.pin();

        inner.page_table.insert(page_id, frame_id);
        inner.replacer.pin(frame_id);

        Ok(frame_id)
    }

    // ========================================================================
    // Internal: Frame acquisition and eviction
    // ========================================================================

    /// Produce an empty frame: free list first, then an evicted victim.
    ///
    /// A dirty victim is written back exactly once before its frame is
    /// reused. The returned frame is reset (no page id, pin 0, clean, zeroed
    /// buffer) and belongs to neither the free list nor the replacer.
    fn acquire_frame(&self, inner: &mut PoolInner) -> Result<FrameId> {
        if let Some(frame_id) = inner.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = inner.replacer.victim().ok_or(Error::PoolExhausted)?;
        let frame = &self.frames[frame_id.0];

        if let Some(old_page_id) = frame.page_id() {
            if frame.is_dirty() {
                let page = frame.page();
                if let Err(e) = inner.disk.write_page(old_page_id, &page) {
                    // Failed write-back: the victim stays resident and
                    // evictable so the pool's accounting holds.
                    drop(page);
                    inner.replacer.unpin(frame_id);
                    return Err(e);
                }
                drop(page);
                frame.clear_dirty();
                self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
            }

            trace!("evicting {} from {}", old_page_id, frame_id);
            inner.page_table.remove(&old_page_id);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }

        frame.reset();
        Ok(frame_id)
    }
}
