//! LRU (Least-Recently-Unpinned) replacement policy.
//!
//! Tracks the set of frames eligible for eviction, ordered by when each
//! frame last became eligible. "Recency" here is recency of *becoming
//! unpinned*, not recency of content access: a frame pinned and unpinned
//! many times is tracked only at its last unpin.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use crate::common::FrameId;

/// An LRU eviction policy over frame ids.
///
/// Recency is an ordered map keyed by a monotonically increasing
/// "last-unpinned" sequence number, so the victim is always the map's first
/// entry and no linked-list pointer surgery is needed.
///
/// # Thread Safety
/// All state lives behind an internal `Mutex`, independent of the pool's
/// lock. The pool always holds its own lock before calling in here, and the
/// replacer never calls back into the pool, so the nesting cannot deadlock.
pub struct LruReplacer {
    inner: Mutex<LruInner>,
}

struct LruInner {
    /// Structural capacity: the tracked set never grows past this.
    capacity: usize,

    /// Next "last-unpinned" sequence number to hand out.
    next_seq: u64,

    /// Recency order: sequence number → frame id, oldest first.
    order: BTreeMap<u64, FrameId>,

    /// Membership: frame id → its sequence number in `order`.
    entries: HashMap<FrameId, u64>,
}

impl LruReplacer {
    /// Create a replacer that tracks at most `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruInner {
                capacity,
                next_seq: 0,
                order: BTreeMap::new(),
                entries: HashMap::new(),
            }),
        }
    }

    /// Mark a frame as eligible for eviction (its pin count reached 0).
    ///
    /// Inserted as most-recently-eligible. No-op if the frame is already
    /// tracked: a repeated unpin does not refresh its position.
    pub fn unpin(&self, frame_id: FrameId) {
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&frame_id) {
            return;
        }

        // The pool only unpins a frame once per pin/unpin cycle, so the set
        // can't actually overflow; drop the oldest entry if it ever would.
        if inner.entries.len() == inner.capacity {
            if let Some((_, oldest)) = inner.order.pop_first() {
                inner.entries.remove(&oldest);
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.insert(seq, frame_id);
        inner.entries.insert(frame_id, seq);
    }

    /// Remove a frame from the tracked set, if present.
    ///
    /// Idempotent. Called whenever the pool begins reusing or re-pinning a
    /// frame.
    pub fn pin(&self, frame_id: FrameId) {
        let mut inner = self.inner.lock();

        if let Some(seq) = inner.entries.remove(&frame_id) {
            inner.order.remove(&seq);
        }
    }

    /// Remove and return the least-recently-made-eligible frame.
    ///
    /// Returns `None` if nothing is evictable.
    pub fn victim(&self) -> Option<FrameId> {
        let mut inner = self.inner.lock();

        let (_, frame_id) = inner.order.pop_first()?;
        inner.entries.remove(&frame_id);
        Some(frame_id)
    }

    /// Number of currently tracked (evictable) frames.
    pub fn size(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_victim_order_is_unpin_order() {
        let replacer = LruReplacer::new(10);

        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(2));

        assert_eq!(replacer.size(), 3);

        assert_eq!(replacer.victim(), Some(FrameId::new(0)));
        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
        assert_eq!(replacer.victim(), Some(FrameId::new(2)));
        assert_eq!(replacer.victim(), None);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_repeated_unpin_does_not_refresh() {
        let replacer = LruReplacer::new(10);

        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(0)); // already tracked, position unchanged

        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.victim(), Some(FrameId::new(0)));
        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
    }

    #[test]
    fn test_pin_removes_from_tracked_set() {
        let replacer = LruReplacer::new(10);

        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(2));

        replacer.pin(FrameId::new(1));
        assert_eq!(replacer.size(), 2);

        assert_eq!(replacer.victim(), Some(FrameId::new(0)));
        assert_eq!(replacer.victim(), Some(FrameId::new(2)));
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn test_pin_absent_frame_is_noop() {
        let replacer = LruReplacer::new(10);

        replacer.pin(FrameId::new(7));
        assert_eq!(replacer.size(), 0);

        replacer.unpin(FrameId::new(0));
        replacer.pin(FrameId::new(7));
        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.victim(), Some(FrameId::new(0)));
    }

    #[test]
    fn test_unpin_after_victim_reenters_as_newest() {
        let replacer = LruReplacer::new(10);

        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));

        assert_eq!(replacer.victim(), Some(FrameId::new(0)));

        // 0 becomes eligible again, now newer than 1
        replacer.unpin(FrameId::new(0));
        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
        assert_eq!(replacer.victim(), Some(FrameId::new(0)));
    }

    #[test]
    fn test_capacity_bound() {
        let replacer = LruReplacer::new(2);

        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(2)); // oldest (0) falls out

        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
        assert_eq!(replacer.victim(), Some(FrameId::new(2)));
    }
}
