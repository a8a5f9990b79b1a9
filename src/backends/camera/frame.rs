// SPDX-License-Identifier: GPL-3.0-only

//! Live frame contract and scoped release discipline
//!
//! Frames belong to the camera collaborator. A render callback owns one for
//! its duration only and must release it exactly once, whatever happens. The
//! [`FrameGuard`] takes the frame by value, so it cannot be touched after
//! release, and releases it from `Drop`, which also runs on early return and
//! panic unwinding.

use crate::errors::FrameError;
use crate::filters::Paint;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

/// One frame handed to a render callback
pub trait Frame {
    /// Whether the backing buffer can be rendered into
    fn is_valid(&self) -> bool;

    /// Frame size in pixels
    fn dimensions(&self) -> (u32, u32);

    /// Render the frame in place through `paint`
    fn render(&mut self, paint: &Paint<'_>) -> Result<(), FrameError>;

    /// Return the frame to its owner; called exactly once by [`FrameGuard`]
    fn release(&mut self);
}

/// Owns a frame for one callback and releases it on every exit path
pub struct FrameGuard<F: Frame> {
    frame: Option<F>,
}

impl<F: Frame> FrameGuard<F> {
    pub fn new(frame: F) -> Self {
        Self { frame: Some(frame) }
    }

    /// Release now instead of at end of scope
    pub fn release(self) {
        drop(self);
    }
}

impl<F: Frame> Deref for FrameGuard<F> {
    type Target = F;

    fn deref(&self) -> &F {
        // Only `Drop` takes the frame out
        self.frame.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<F: Frame> DerefMut for FrameGuard<F> {
    fn deref_mut(&mut self) -> &mut F {
        self.frame.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<F: Frame> Drop for FrameGuard<F> {
    fn drop(&mut self) {
        if let Some(mut frame) = self.frame.take() {
            frame.release();
        }
    }
}

#[derive(Debug, Default)]
struct PoolInner {
    free: Mutex<Vec<Vec<u8>>>,
    outstanding: AtomicUsize,
    acquired: AtomicU64,
    released: AtomicU64,
    double_releases: AtomicU64,
    leaked: AtomicU64,
}

/// Counters describing how a pool's frames were handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Frames currently handed out and not yet released
    pub outstanding: usize,
    pub acquired: u64,
    pub released: u64,
    /// Release called on an already released frame
    pub double_releases: u64,
    /// Frames dropped without ever being released
    pub leaked: u64,
}

/// Recycling pool of RGBA frame buffers
///
/// Stands in for the camera runtime's frame pool: buffers come back only
/// through [`Frame::release`].
#[derive(Debug, Clone, Default)]
pub struct FramePool {
    inner: Arc<PoolInner>,
}

impl FramePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a valid frame of the given size (contents unspecified)
    pub fn acquire(&self, width: u32, height: u32) -> PooledFrame {
        self.acquire_with_validity(width, height, true)
    }

    /// Hand out a frame whose buffer is not ready for rendering
    pub fn acquire_invalid(&self, width: u32, height: u32) -> PooledFrame {
        self.acquire_with_validity(width, height, false)
    }

    fn acquire_with_validity(&self, width: u32, height: u32, valid: bool) -> PooledFrame {
        let len = width as usize * height as usize * 4;
        let mut buffer = self
            .inner
            .free
            .lock()
            .ok()
            .and_then(|mut free| free.pop())
            .unwrap_or_default();
        buffer.resize(len, 0);

        self.inner.outstanding.fetch_add(1, Ordering::SeqCst);
        self.inner.acquired.fetch_add(1, Ordering::SeqCst);

        PooledFrame {
            width,
            height,
            valid,
            buffer: Some(buffer),
            pool: Arc::clone(&self.inner),
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            outstanding: self.inner.outstanding.load(Ordering::SeqCst),
            acquired: self.inner.acquired.load(Ordering::SeqCst),
            released: self.inner.released.load(Ordering::SeqCst),
            double_releases: self.inner.double_releases.load(Ordering::SeqCst),
            leaked: self.inner.leaked.load(Ordering::SeqCst),
        }
    }

    /// Buffers waiting to be reused
    pub fn idle_buffers(&self) -> usize {
        self.inner.free.lock().map(|free| free.len()).unwrap_or(0)
    }
}

/// RGBA frame borrowed from a [`FramePool`]
#[derive(Debug)]
pub struct PooledFrame {
    width: u32,
    height: u32,
    valid: bool,
    buffer: Option<Vec<u8>>,
    pool: Arc<PoolInner>,
}

impl PooledFrame {
    /// Pixels as packed RGBA; empty once released
    pub fn pixels(&self) -> &[u8] {
        self.buffer.as_deref().unwrap_or(&[])
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        self.buffer.as_deref_mut().unwrap_or(&mut [])
    }

    pub fn is_released(&self) -> bool {
        self.buffer.is_none()
    }
}

impl Frame for PooledFrame {
    fn is_valid(&self) -> bool {
        self.valid && self.buffer.is_some()
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn render(&mut self, paint: &Paint<'_>) -> Result<(), FrameError> {
        let expected = self.width as usize * self.height as usize * 4;
        let buffer = self
            .buffer
            .as_deref_mut()
            .ok_or_else(|| FrameError::Render("frame already released".to_string()))?;
        if buffer.len() != expected {
            return Err(FrameError::BufferSize {
                expected,
                actual: buffer.len(),
            });
        }
        paint.apply(buffer);
        Ok(())
    }

    fn release(&mut self) {
        match self.buffer.take() {
            Some(buffer) => {
                if let Ok(mut free) = self.pool.free.lock() {
                    free.push(buffer);
                }
                self.pool.outstanding.fetch_sub(1, Ordering::SeqCst);
                self.pool.released.fetch_add(1, Ordering::SeqCst);
            }
            None => {
                error!("Frame released twice");
                self.pool.double_releases.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

impl Drop for PooledFrame {
    fn drop(&mut self) {
        if self.buffer.is_some() {
            warn!(
                width = self.width,
                height = self.height,
                "Frame dropped without release"
            );
            self.pool.leaked.fetch_add(1, Ordering::SeqCst);
            self.pool.outstanding.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
