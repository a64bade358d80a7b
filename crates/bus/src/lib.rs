//! Frame bus between camera capture and recognition.
//!
//! Capture pushes frames without blocking. When the bus is full the oldest
//! queued frame is evicted, so the backlog always ends in the newest capture.
//! Recognition pulls only that newest frame and discards the rest
//! (keep-latest coalescing). Letter-mode timing depends on wall-clock gaps,
//! so a stale queue would be worse than a dropped frame.

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use signa_context::CameraFacing;
use tokio::sync::Notify;

/// Default bus capacity in frames.
pub const DEFAULT_FRAME_CAPACITY: usize = 4;

/// One captured camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic sequence number for ordering.
    pub seq: u64,
    /// Capture timestamp in milliseconds (monotonic clock of the capture source).
    pub ts_ms: u64,
    /// Camera that produced the frame.
    pub facing: CameraFacing,
    pub width: u32,
    pub height: u32,
    /// Pixel data (shared ownership for zero-copy hand-off).
    pub pixels: Arc<[u8]>,
}

impl Frame {
    pub fn new(
        seq: u64,
        ts_ms: u64,
        facing: CameraFacing,
        width: u32,
        height: u32,
        pixels: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            seq,
            ts_ms,
            facing,
            width,
            height,
            pixels: pixels.into(),
        }
    }
}

/// Configuration for the frame bus.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FrameBusConfig {
    /// Queue capacity in frames. Kept small; older frames are coalesced away anyway.
    pub capacity: usize,
}

impl Default for FrameBusConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_FRAME_CAPACITY,
        }
    }
}

struct BusState {
    frames: VecDeque<Frame>,
    capacity: usize,
    next_seq: u64,
    senders: usize,
    receiver_alive: bool,
}

struct Shared {
    state: Mutex<BusState>,
    frame_ready: Notify,
    space_ready: Notify,
    dropped_frames: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

enum Push {
    Sent,
    Full,
    Closed,
}

enum Pull {
    Frame(Frame),
    Empty,
    Closed,
}

/// Sender half of the frame bus.
pub struct FrameBusSender {
    shared: Arc<Shared>,
}

impl FrameBusSender {
    /// Send a frame without waiting. A full bus evicts its oldest frame.
    ///
    /// Returns false only when the receiver is gone.
    pub fn send(
        &self,
        ts_ms: u64,
        facing: CameraFacing,
        width: u32,
        height: u32,
        pixels: impl Into<Arc<[u8]>>,
    ) -> bool {
        matches!(
            self.push(ts_ms, facing, width, height, pixels.into(), true),
            Push::Sent
        )
    }

    /// Send a frame, waiting until the receiver makes room.
    ///
    /// Used for recorded input where every frame must reach recognition.
    pub async fn send_async(
        &self,
        ts_ms: u64,
        facing: CameraFacing,
        width: u32,
        height: u32,
        pixels: impl Into<Arc<[u8]>>,
    ) -> bool {
        let pixels = pixels.into();
        loop {
            let mut space = pin!(self.shared.space_ready.notified());
            space.as_mut().enable();

            match self.push(ts_ms, facing, width, height, Arc::clone(&pixels), false) {
                Push::Sent => return true,
                Push::Closed => return false,
                Push::Full => space.await,
            }
        }
    }

    /// Frames evicted from a full bus before recognition saw them.
    pub fn dropped_frames(&self) -> u64 {
        self.shared.dropped_frames.load(Ordering::Relaxed)
    }

    fn push(
        &self,
        ts_ms: u64,
        facing: CameraFacing,
        width: u32,
        height: u32,
        pixels: Arc<[u8]>,
        evict: bool,
    ) -> Push {
        let mut state = self.shared.lock();
        if !state.receiver_alive {
            tracing::debug!("Frame bus closed");
            return Push::Closed;
        }
        if !evict && state.frames.len() >= state.capacity {
            return Push::Full;
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state
            .frames
            .push_back(Frame::new(seq, ts_ms, facing, width, height, pixels));
        let evicted = if state.frames.len() > state.capacity {
            state.frames.pop_front()
        } else {
            None
        };
        drop(state);

        if let Some(old) = evicted {
            let dropped = self.shared.dropped_frames.fetch_add(1, Ordering::Relaxed) + 1;
            // Rate-limit logging: only log every 30th drop (~1s of video)
            if dropped % 30 == 1 {
                tracing::warn!(
                    dropped,
                    evicted_seq = old.seq,
                    seq,
                    "Frame bus full, evicting oldest frame"
                );
            }
        }
        self.shared.frame_ready.notify_one();
        Push::Sent
    }
}

impl Clone for FrameBusSender {
    fn clone(&self) -> Self {
        self.shared.lock().senders += 1;
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for FrameBusSender {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.senders = state.senders.saturating_sub(1);
        let closed = state.senders == 0;
        drop(state);
        if closed {
            self.shared.frame_ready.notify_one();
        }
    }
}

/// Receiver half of the frame bus.
pub struct FrameBusReceiver {
    shared: Arc<Shared>,
    coalesced_frames: u64,
}

impl FrameBusReceiver {
    /// Receive the oldest queued frame.
    ///
    /// Returns `None` once every sender is dropped and the bus is empty.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.wait_for(|frames| frames.pop_front().map(|frame| (frame, 0)))
            .await
    }

    /// Wait for a frame, then skip ahead to the newest one available.
    ///
    /// Returns `None` once every sender is dropped and the bus is empty.
    pub async fn recv_latest(&mut self) -> Option<Frame> {
        self.wait_for(|frames| {
            let latest = frames.pop_back()?;
            let skipped = frames.len() as u64;
            frames.clear();
            Some((latest, skipped))
        })
        .await
    }

    /// Number of frames skipped by keep-latest coalescing.
    pub fn coalesced_frames(&self) -> u64 {
        self.coalesced_frames
    }

    async fn wait_for(
        &mut self,
        mut take: impl FnMut(&mut VecDeque<Frame>) -> Option<(Frame, u64)>,
    ) -> Option<Frame> {
        let shared = Arc::clone(&self.shared);
        loop {
            let mut ready = pin!(shared.frame_ready.notified());
            ready.as_mut().enable();

            match self.pull(&mut take) {
                Pull::Frame(frame) => return Some(frame),
                Pull::Closed => return None,
                Pull::Empty => ready.await,
            }
        }
    }

    fn pull(
        &mut self,
        take: &mut impl FnMut(&mut VecDeque<Frame>) -> Option<(Frame, u64)>,
    ) -> Pull {
        let mut state = self.shared.lock();
        let Some((frame, skipped)) = take(&mut state.frames) else {
            return if state.senders == 0 {
                Pull::Closed
            } else {
                Pull::Empty
            };
        };
        drop(state);

        if skipped > 0 {
            self.coalesced_frames += skipped;
            tracing::trace!(skipped, seq = frame.seq, "Coalesced frames");
        }
        self.shared.space_ready.notify_waiters();
        Pull::Frame(frame)
    }
}

impl Drop for FrameBusReceiver {
    fn drop(&mut self) {
        self.shared.lock().receiver_alive = false;
        self.shared.space_ready.notify_waiters();
    }
}

/// Frame bus for keep-latest delivery.
pub struct FrameBus {
    sender: FrameBusSender,
    receiver: Option<FrameBusReceiver>,
}

impl FrameBus {
    pub fn new() -> Self {
        Self::with_config(FrameBusConfig::default())
    }

    pub fn with_config(config: FrameBusConfig) -> Self {
        let capacity = config.capacity.max(1);
        let shared = Arc::new(Shared {
            state: Mutex::new(BusState {
                frames: VecDeque::with_capacity(capacity.min(64)),
                capacity,
                next_seq: 0,
                senders: 1,
                receiver_alive: true,
            }),
            frame_ready: Notify::new(),
            space_ready: Notify::new(),
            dropped_frames: AtomicU64::new(0),
        });

        tracing::debug!(capacity, "Created frame bus");

        Self {
            sender: FrameBusSender {
                shared: Arc::clone(&shared),
            },
            receiver: Some(FrameBusReceiver {
                shared,
                coalesced_frames: 0,
            }),
        }
    }

    pub fn sender(&self) -> FrameBusSender {
        self.sender.clone()
    }

    /// Take the receiver (can only be called once).
    pub fn take_receiver(&mut self) -> Option<FrameBusReceiver> {
        self.receiver.take()
    }
}

impl Default for FrameBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Real-time recognition metrics with atomic fields for lock-free updates.
///
/// Shared via `Arc<PipelineStatus>` and updated from the recognition loop.
#[derive(Debug, Default)]
pub struct PipelineStatus {
    frames_processed: AtomicU64,
    frames_coalesced: AtomicU64,
    /// Results discarded because a reset happened while they were in flight.
    stale_results: AtomicU64,
    classifier_failures: AtomicU64,
    /// Last classifier call duration in milliseconds.
    inference_time_ms: AtomicU64,
    events_emitted: AtomicU64,
}

impl PipelineStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn frames_coalesced(&self) -> u64 {
        self.frames_coalesced.load(Ordering::Relaxed)
    }

    pub fn stale_results(&self) -> u64 {
        self.stale_results.load(Ordering::Relaxed)
    }

    pub fn classifier_failures(&self) -> u64 {
        self.classifier_failures.load(Ordering::Relaxed)
    }

    pub fn inference_time_ms(&self) -> u64 {
        self.inference_time_ms.load(Ordering::Relaxed)
    }

    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    pub fn increment_frames_processed(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_frames_coalesced(&self, value: u64) {
        self.frames_coalesced.store(value, Ordering::Relaxed);
    }

    pub fn increment_stale_results(&self) {
        self.stale_results.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_classifier_failures(&self) {
        self.classifier_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_inference_time_ms(&self, value: u64) {
        self.inference_time_ms.store(value, Ordering::Relaxed);
    }

    pub fn increment_events_emitted(&self) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Create a snapshot for serialization/display.
    pub fn snapshot(&self) -> PipelineStatusSnapshot {
        PipelineStatusSnapshot {
            frames_processed: self.frames_processed(),
            frames_coalesced: self.frames_coalesced(),
            stale_results: self.stale_results(),
            classifier_failures: self.classifier_failures(),
            inference_time_ms: self.inference_time_ms(),
            events_emitted: self.events_emitted(),
        }
    }
}

/// Snapshot of pipeline status for serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PipelineStatusSnapshot {
    pub frames_processed: u64,
    pub frames_coalesced: u64,
    pub stale_results: u64,
    pub classifier_failures: u64,
    pub inference_time_ms: u64,
    pub events_emitted: u64,
}
