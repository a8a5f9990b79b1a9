// SPDX-License-Identifier: GPL-3.0-only

//! Live preview pipeline
//!
//! ```text
//! CameraBackend → operating mode → frames → FrameStreamProcessor → display
//!                                              │
//!                                              └─ render(paint) in place,
//!                                                 release exactly once
//! ```

use crate::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraDevice, ChannelFrameSource,
    FormatSelection, FormatSelectionCache, Frame, FrameBudget, FrameGuard, FrameLoopController,
    PermissionGate, PermissionProvider, ScreenState, select_camera,
};
use crate::config::Config;
use crate::constants::FRAME_POLL_INTERVAL;
use crate::filters::{Paint, SimulationFidelity};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::SyncSender;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// What happened to one delivered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// Frame was not valid; nothing rendered
    Skipped,
    /// Render reported an error; frame still released
    Failed,
}

/// Frame counters since the processor was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub delivered: u64,
    pub rendered: u64,
    pub skipped: u64,
    pub failed: u64,
    /// Rendered frames that took longer than one inter-frame interval
    pub over_budget: u64,
}

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    rendered: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    over_budget: AtomicU64,
}

/// Applies the tritan kernel to each live frame before it reaches the display
///
/// The paint is bound to the process-wide kernel, so nothing is rebuilt per
/// frame. Each call handles exactly one frame, synchronously, and releases
/// it before returning.
#[derive(Debug)]
pub struct FrameStreamProcessor {
    paint: Paint<'static>,
    budget: FrameBudget,
    counters: Counters,
}

impl FrameStreamProcessor {
    pub fn new(fidelity: SimulationFidelity, target_fps: f64) -> Self {
        Self {
            paint: Paint::shared(fidelity),
            budget: FrameBudget::new(target_fps),
            counters: Counters::default(),
        }
    }

    /// Render one frame through the kernel and release it
    pub fn process<F: Frame>(&self, frame: F) -> FrameOutcome {
        let mut frame = FrameGuard::new(frame);
        self.counters.delivered.fetch_add(1, Ordering::Relaxed);

        if !frame.is_valid() {
            trace!("Skipping invalid frame");
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            return FrameOutcome::Skipped;
        }

        let start = Instant::now();
        match frame.render(&self.paint) {
            Ok(()) => {
                self.counters.rendered.fetch_add(1, Ordering::Relaxed);
                let elapsed = start.elapsed();
                let interval = self.budget.interval();
                if !interval.is_zero() && elapsed > interval {
                    self.counters.over_budget.fetch_add(1, Ordering::Relaxed);
                    let (width, height) = frame.dimensions();
                    debug!(
                        width,
                        height,
                        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                        budget_ms = interval.as_secs_f64() * 1000.0,
                        "Frame render exceeded budget"
                    );
                }
                FrameOutcome::Rendered
            }
            Err(e) => {
                warn!(error = %e, "Frame render failed");
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                FrameOutcome::Failed
            }
        }
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            rendered: self.counters.rendered.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            over_budget: self.counters.over_budget.load(Ordering::Relaxed),
        }
    }

    pub fn fidelity(&self) -> Option<SimulationFidelity> {
        self.paint.fidelity()
    }
}

/// State of the live screen after [`LiveSession::start`]
#[derive(Debug, Clone, PartialEq)]
pub enum LiveState {
    /// Waiting for camera permission; re-check later
    Waiting,
    /// Camera configured and streaming
    Streaming {
        device: CameraDevice,
        selection: FormatSelection,
    },
}

/// One live preview session on a camera backend
pub struct LiveSession<B: CameraBackend> {
    backend: B,
    config: Config,
    cache: FormatSelectionCache,
}

impl<B: CameraBackend> LiveSession<B> {
    pub fn new(backend: B, config: Config) -> Self {
        Self {
            backend,
            config: config.validated(),
            cache: FormatSelectionCache::new(),
        }
    }

    /// Check permission, pick a camera and an operating mode, configure it
    ///
    /// Repeated calls reuse the cached operating mode unless the device or
    /// the configured constraints changed.
    pub fn start<P: PermissionProvider>(
        &mut self,
        permissions: &PermissionGate<P>,
    ) -> BackendResult<LiveState> {
        if permissions.check() == ScreenState::Waiting {
            info!("Camera permission not granted, waiting");
            return Ok(LiveState::Waiting);
        }

        let devices = self.backend.enumerate_cameras();
        let device = select_camera(&devices)
            .cloned()
            .ok_or(BackendError::NoCameraFound)?;

        let capabilities = self.backend.capabilities(&device);
        let selection = self
            .cache
            .select(
                &device,
                &capabilities,
                self.config.target_fps,
                self.config.live_max_width,
                self.config.live_max_height,
                self.config.kernel_ns_per_pixel,
            )
            .ok_or(BackendError::NoFormats)?;

        let request = selection.to_request();
        info!(device = %device.name, mode = %request, degraded = selection.degraded, "Configuring camera");
        self.backend.configure(&device, &request)?;

        Ok(LiveState::Streaming { device, selection })
    }

    /// Processor matching this session's configuration
    pub fn processor(&self) -> FrameStreamProcessor {
        FrameStreamProcessor::new(self.config.live_fidelity, self.config.target_fps)
    }

    /// Filter frames sent on the returned sender on a dedicated delivery thread
    ///
    /// `send` blocks until the loop takes the frame. After the loop stops it
    /// returns the frame in `SendError`, and the producer releases it. The
    /// processor is shared with the loop so its statistics can be read while
    /// frames flow.
    pub fn spawn_frame_loop<F>(
        &self,
    ) -> (SyncSender<F>, FrameLoopController, Arc<FrameStreamProcessor>)
    where
        F: Frame + Send + 'static,
    {
        let processor = Arc::new(self.processor());
        let worker = Arc::clone(&processor);
        let (sender, source) = ChannelFrameSource::channel(FRAME_POLL_INTERVAL);
        let controller = FrameLoopController::start("live-preview", source, move |frame| {
            worker.process(frame);
        });
        (sender, controller, processor)
    }

    /// Apply new constraints; the next `start` re-selects if they differ
    pub fn set_config(&mut self, config: Config) {
        self.config = config.validated();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
