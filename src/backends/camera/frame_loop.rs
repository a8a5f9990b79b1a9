// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for the live frame loop
//!
//! Frames arrive from a single producer and are pushed one at a time through
//! a synchronous callback on a dedicated thread. The channel has no capacity:
//! a frame changes hands only when the loop takes it, so a frame the loop
//! never took is still owned (and must be released) by the producer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of polling a frame source once
#[derive(Debug)]
pub enum FramePoll<F> {
    /// Next frame in delivery order
    Frame(F),
    /// Nothing arrived yet; poll again
    Idle,
    /// Producer is gone; the loop ends
    Closed,
}

/// Single-producer source of frames
pub trait FrameSource: Send {
    type Frame;

    fn poll_frame(&mut self) -> FramePoll<Self::Frame>;

    /// Frame the source already holds, without waiting
    ///
    /// Called after a stop until it returns `None`, so a source that buffers
    /// frames hands each one to the callback instead of dropping it. Must not
    /// wait for new frames.
    fn try_frame(&mut self) -> Option<Self::Frame> {
        None
    }
}

/// Frame source backed by a rendezvous channel
///
/// `send` on the returned sender blocks until the loop takes the frame. Once
/// the loop has stopped it fails with `SendError(frame)`, handing the frame
/// back to the producer.
pub struct ChannelFrameSource<F> {
    receiver: Receiver<F>,
    poll_interval: Duration,
}

impl<F> ChannelFrameSource<F> {
    pub fn channel(poll_interval: Duration) -> (SyncSender<F>, Self) {
        let (sender, receiver) = mpsc::sync_channel(0);
        (
            sender,
            Self {
                receiver,
                poll_interval,
            },
        )
    }
}

impl<F: Send> FrameSource for ChannelFrameSource<F> {
    type Frame = F;

    fn poll_frame(&mut self) -> FramePoll<F> {
        match self.receiver.recv_timeout(self.poll_interval) {
            Ok(frame) => FramePoll::Frame(frame),
            Err(RecvTimeoutError::Timeout) => FramePoll::Idle,
            Err(RecvTimeoutError::Disconnected) => FramePoll::Closed,
        }
    }
}

/// Controller for a frame loop running in a separate thread
///
/// # Example
///
/// ```ignore
/// let (tx, source) = ChannelFrameSource::channel(FRAME_POLL_INTERVAL);
/// let processor = FrameStreamProcessor::new(SimulationFidelity::Brettel, 30.0);
/// let mut controller = FrameLoopController::start(
///     "live-preview",
///     source,
///     move |frame| {
///         processor.process(frame);
///     },
/// );
/// // camera pushes frames into `tx`...
/// controller.stop();
/// ```
pub struct FrameLoopController {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    /// Signal to stop the loop
    stop_signal: Arc<AtomicBool>,
    /// Name for logging
    name: String,
}

impl FrameLoopController {
    /// Start pulling frames from `source` and handing each to `on_frame`
    ///
    /// The loop ends when the source closes or [`stop`](Self::stop) is called.
    /// `on_frame` runs to completion before the next frame is pulled. On stop,
    /// frames the source still buffers go through `on_frame` before the
    /// source is dropped.
    pub fn start<S, C>(name: &str, mut source: S, mut on_frame: C) -> Self
    where
        S: FrameSource + 'static,
        C: FnMut(S::Frame) + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting frame loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %name_clone, "Frame loop thread started");

            loop {
                if stop_signal_clone.load(Ordering::SeqCst) {
                    debug!(name = %name_clone, "Stop signal received");
                    let mut drained = 0usize;
                    while let Some(frame) = source.try_frame() {
                        on_frame(frame);
                        drained += 1;
                    }
                    if drained > 0 {
                        debug!(name = %name_clone, drained, "Handled buffered frames on stop");
                    }
                    break;
                }

                match source.poll_frame() {
                    FramePoll::Frame(frame) => on_frame(frame),
                    FramePoll::Idle => {}
                    FramePoll::Closed => {
                        debug!(name = %name_clone, "Frame source closed");
                        break;
                    }
                }
            }

            info!(name = %name_clone, "Frame loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop without waiting
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting frame loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending the stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for frame loop thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Frame loop thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for FrameLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "FrameLoopController dropped, stopping loop");
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[test]
    fn test_frames_handled_in_order_until_close() {
        let (tx, source) = ChannelFrameSource::channel(Duration::from_millis(5));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let mut controller = FrameLoopController::start(
            "test-order",
            source,
            move |n: u32| seen_clone.lock().unwrap().push(n),
        );

        for n in 0..20 {
            tx.send(n).unwrap();
        }
        drop(tx);
        controller.join();

        assert_eq!(*seen.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_stop_signal() {
        let (tx, source) = ChannelFrameSource::<u32>::channel(Duration::from_millis(5));
        let mut controller = FrameLoopController::start("test-stop", source, |_| {});
        assert!(controller.is_running());
        controller.stop();
        assert!(!controller.is_running());
        drop(tx);
    }

    /// Holds frames back until asked for them directly
    struct Buffered {
        queue: VecDeque<u32>,
    }

    impl FrameSource for Buffered {
        type Frame = u32;

        fn poll_frame(&mut self) -> FramePoll<u32> {
            std::thread::sleep(Duration::from_millis(1));
            FramePoll::Idle
        }

        fn try_frame(&mut self) -> Option<u32> {
            self.queue.pop_front()
        }
    }

    #[test]
    fn test_stop_hands_over_buffered_frames() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let source = Buffered {
            queue: VecDeque::from([1, 2, 3]),
        };

        let mut controller = FrameLoopController::start("test-drain", source, move |n| {
            seen_clone.lock().unwrap().push(n);
        });
        controller.stop();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_send_after_stop_returns_frame() {
        let (tx, source) = ChannelFrameSource::<u32>::channel(Duration::from_millis(5));
        let mut controller = FrameLoopController::start("test-returned", source, |_| {});
        controller.stop();
        assert_eq!(tx.send(7).unwrap_err().0, 7);
    }
}
