//! Request id generation
//!
//! Ids come from an [`IdGenerator`]. The default is a process-wide
//! [`AtomicIdGenerator`] starting at 1; tests and callers that need
//! deterministic ids inject their own generator.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of request ids
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Next id. Never returns the same value twice for one generator.
    fn next_id(&self) -> i64;
}

/// Monotonic counter backed by an atomic integer
#[derive(Debug)]
pub struct AtomicIdGenerator {
    next: AtomicI64,
}

impl AtomicIdGenerator {
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    pub const fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }

    /// The id the next call to [`IdGenerator::next_id`] will return
    pub fn peek(&self) -> i64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for AtomicIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for AtomicIdGenerator {
    fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for Arc<G> {
    fn next_id(&self) -> i64 {
        (**self).next_id()
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for &G {
    fn next_id(&self) -> i64 {
        (**self).next_id()
    }
}

static GLOBAL_IDS: AtomicIdGenerator = AtomicIdGenerator::new();

/// Process-wide generator used by [`Request::new`](crate::Request::new)
pub fn global() -> &'static AtomicIdGenerator {
    &GLOBAL_IDS
}
