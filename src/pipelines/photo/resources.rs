// SPDX-License-Identifier: GPL-3.0-only

//! Bookkeeping for intermediate capture resources
//!
//! Every buffer and file the capture path creates is wrapped in a
//! [`Tracked`] handle registered with a [`ResourceLedger`]. Dropping the
//! handle releases the resource and updates the ledger, so after a capture
//! finishes (or fails) `live()` must be back where it started.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::trace;

/// Kind of intermediate resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Full-resolution decoded photo
    DecodedSource,
    /// Off-screen surface the filtered photo is drawn into
    RenderTarget,
    /// Pixels read back from the render target for encoding
    Snapshot,
    /// Encoded output staged on disk
    TempFile,
}

#[derive(Debug, Default)]
struct LedgerInner {
    live: AtomicUsize,
    live_bytes: AtomicUsize,
    peak_bytes: AtomicUsize,
    total: AtomicU64,
}

/// Counts live intermediate resources and their bytes
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    inner: Arc<LedgerInner>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` as a live resource of `bytes` bytes
    pub fn track<T>(&self, kind: ResourceKind, value: T, bytes: usize) -> Tracked<T> {
        self.inner.live.fetch_add(1, Ordering::SeqCst);
        self.inner.total.fetch_add(1, Ordering::SeqCst);
        let now = self.inner.live_bytes.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.inner.peak_bytes.fetch_max(now, Ordering::SeqCst);
        trace!(?kind, bytes, "Resource acquired");

        Tracked {
            value,
            kind,
            bytes,
            ledger: self.clone(),
        }
    }

    /// Resources currently alive
    pub fn live(&self) -> usize {
        self.inner.live.load(Ordering::SeqCst)
    }

    pub fn live_bytes(&self) -> usize {
        self.inner.live_bytes.load(Ordering::SeqCst)
    }

    /// Highest simultaneous byte count seen
    pub fn peak_bytes(&self) -> usize {
        self.inner.peak_bytes.load(Ordering::SeqCst)
    }

    /// Resources ever registered
    pub fn total(&self) -> u64 {
        self.inner.total.load(Ordering::SeqCst)
    }

    fn release(&self, kind: ResourceKind, bytes: usize) {
        self.inner.live.fetch_sub(1, Ordering::SeqCst);
        self.inner.live_bytes.fetch_sub(bytes, Ordering::SeqCst);
        trace!(?kind, bytes, "Resource released");
    }
}

/// Resource registered with a ledger; released when dropped
#[derive(Debug)]
pub struct Tracked<T> {
    value: T,
    kind: ResourceKind,
    bytes: usize,
    ledger: ResourceLedger,
}

impl<T> Tracked<T> {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.ledger.release(self.kind, self.bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_and_release() {
        let ledger = ResourceLedger::new();
        let a = ledger.track(ResourceKind::DecodedSource, vec![0u8; 100], 100);
        let b = ledger.track(ResourceKind::RenderTarget, vec![0u8; 40], 40);
        assert_eq!(ledger.live(), 2);
        assert_eq!(ledger.live_bytes(), 140);
        assert_eq!(a.len(), 100);

        drop(a);
        assert_eq!(ledger.live(), 1);
        drop(b);
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.live_bytes(), 0);
        assert_eq!(ledger.peak_bytes(), 140);
        assert_eq!(ledger.total(), 2);
    }
}
