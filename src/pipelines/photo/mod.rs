// SPDX-License-Identifier: GPL-3.0-only

//! Still-image filter pipeline
//!
//! Two paths share the kernel:
//!
//! ```text
//! Preview:  encoded bytes → PreviewImage → draw(box, paint) → display
//!
//! Capture:  encoded photo → decode → bounded render target
//!                     → fused resize + filter → snapshot → encode
//!                     → temp file → PhotoLibrary
//! ```
//!
//! # Key Features
//!
//! - **Bounded memory**: the filtered image never exceeds the processing ceiling
//! - **Non-blocking**: CPU work runs on the blocking pool
//! - **Single flight**: a capture requested while one is running is ignored
//! - **Leak free**: every intermediate is tracked and released on all paths

pub mod capture;
pub mod encoding;
pub mod preview;
pub mod processing;
pub mod resources;

pub use capture::{CapturePipeline, CaptureReport, CaptureSettings, PhotoSource};
pub use encoding::{EncodedImage, EncodingFormat, EncodingQuality, PhotoEncoder};
pub use preview::PreviewImage;
pub use resources::{ResourceKind, ResourceLedger, Tracked};

use crate::errors::PipelineError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

/// What a capture request resulted in
#[derive(Debug)]
pub enum CaptureOutcome {
    Saved(CaptureReport),
    /// Another capture was already running; nothing was done
    Busy,
    Failed {
        /// Short text for the user
        message: &'static str,
        error: PipelineError,
    },
}

/// Clears the busy flag when dropped
struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Entry point for capture requests from the UI
///
/// At most one capture runs at a time; errors stop here and become a
/// [`CaptureOutcome::Failed`] with a user-facing message.
pub struct CaptureController {
    pipeline: Arc<CapturePipeline>,
    busy: Arc<AtomicBool>,
}

impl CaptureController {
    pub fn new(pipeline: CapturePipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn pipeline(&self) -> &CapturePipeline {
        &self.pipeline
    }

    pub async fn capture(&self, source: PhotoSource) -> CaptureOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            info!("Capture already in progress, ignoring request");
            return CaptureOutcome::Busy;
        };

        match self.pipeline.run(source).await {
            Ok(report) => CaptureOutcome::Saved(report),
            Err(e) => {
                error!(error = %e, "Capture failed");
                CaptureOutcome::Failed {
                    message: e.user_message(),
                    error: e,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_guard_is_exclusive() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = BusyGuard::acquire(&flag).unwrap();
        assert!(BusyGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(BusyGuard::acquire(&flag).is_some());
    }
}
