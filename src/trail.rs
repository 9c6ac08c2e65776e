//! Trail identifiers and their allocator.
//!
//! A trail correlates every event and marker belonging to one logical flow.
//! IDs come from a [`TrailAllocator`]: unique, increasing, starting at 1 and
//! never reused while the process runs. Most applications use the shared
//! allocator behind [`Trail::next`]; components that want an isolated
//! sequence (tests, embedded tools) hold their own allocator.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide allocator used by [`Trail::next`].
static SHARED_ALLOCATOR: TrailAllocator = TrailAllocator::new();

/// An opaque trail identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Trail(u64);

impl Trail {
    /// Allocate a fresh trail from the process-wide allocator.
    pub fn next() -> Self {
        SHARED_ALLOCATOR.allocate()
    }

    /// Wrap an existing trail ID (e.g. one received from another component).
    #[inline]
    pub const fn from_id(id: u64) -> Self {
        Self(id)
    }

    /// The raw trail ID.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Trail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out increasing trail IDs. Safe to share between threads.
#[derive(Debug)]
pub struct TrailAllocator {
    next: AtomicU64,
}

impl TrailAllocator {
    /// Allocator whose first trail is 1.
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    /// Allocator whose first trail is `first` (clamped to at least 1).
    pub const fn starting_at(first: u64) -> Self {
        let first = if first == 0 { 1 } else { first };
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Allocate the next trail.
    pub fn allocate(&self) -> Trail {
        Trail(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The ID the next call to `allocate` will return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for TrailAllocator {
    fn default() -> Self {
        Self::new()
    }
}
