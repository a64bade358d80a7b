//! Frame bus listener driving a recognition session.
//!
//! Pulls the newest frame from the bus, classifies it on a blocking thread,
//! and feeds the result to the session unless a reset overtook it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use signa_bus::{Frame, FrameBusReceiver, PipelineStatus};
use signa_classifier::{Classifier, ClassifierError, Detection};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::handle::{FrameOutcome, SessionHandle};

/// Start/stop switch for a session's recognition loop.
///
/// A run owns a child of `run_token`; `stop` cancels it and lets the frame
/// being classified finish before the loop exits. Starting again cancels any
/// previous run and issues a new token, so one handle serves any number of runs.
pub struct RecognitionListenerHandle {
    active: Arc<AtomicBool>,
    run_token: Mutex<CancellationToken>,
}

/// What a spawned recognition loop needs from its handle.
struct Run {
    cancelled: CancellationToken,
    active: Arc<AtomicBool>,
}

impl Run {
    /// A cancelled run was stopped or superseded, so the flag is no longer its to clear.
    fn finish(self) {
        if !self.cancelled.is_cancelled() {
            self.active.store(false, Ordering::Release);
        }
    }
}

impl RecognitionListenerHandle {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            run_token: Mutex::new(CancellationToken::new()),
        }
    }

    /// True from `start_recognition_listener` until the loop exits or `stop` is called.
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.current_run().cancel();
        self.active.store(false, Ordering::Release);
        tracing::debug!("Recognition stop requested");
    }

    fn begin_run(&self) -> Run {
        let token = CancellationToken::new();
        let cancelled = token.child_token();
        let previous = std::mem::replace(&mut *self.current_run(), token);
        previous.cancel();
        self.active.store(true, Ordering::Release);
        Run {
            cancelled,
            active: Arc::clone(&self.active),
        }
    }

    fn current_run(&self) -> MutexGuard<'_, CancellationToken> {
        self.run_token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RecognitionListenerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the recognition loop.
///
/// The task ends when the handle is stopped or every bus sender is dropped,
/// and yields the receiver back so a later run can reuse it.
pub fn start_recognition_listener(
    session: SessionHandle,
    classifier: Arc<dyn Classifier>,
    receiver: FrameBusReceiver,
    pipeline_status: Arc<PipelineStatus>,
    handle: Arc<RecognitionListenerHandle>,
) -> JoinHandle<FrameBusReceiver> {
    let run = handle.begin_run();

    tokio::spawn(async move {
        tracing::info!(
            session_id = %session.session_id(),
            classifier = classifier.name(),
            "Recognition listener started"
        );
        let mut receiver = receiver;
        let mut frames_processed = 0u64;
        let mut last_applied_ts: Option<u64> = None;
        let mut degraded = false;

        loop {
            let frame = tokio::select! {
                biased;
                _ = run.cancelled.cancelled() => {
                    tracing::info!("Recognition listener cancelled");
                    break;
                }
                frame = receiver.recv_latest() => frame,
            };

            let Some(frame) = frame else {
                tracing::info!("Frame bus closed, stopping listener");
                break;
            };
            pipeline_status.set_frames_coalesced(receiver.coalesced_frames());

            // Frames still in flight from the other camera after a switch.
            if frame.facing != session.facing().await {
                tracing::trace!(seq = frame.seq, facing = %frame.facing, "Skipping frame from inactive camera");
                continue;
            }

            let generation = session.generation().await;
            let ts_ms = frame.ts_ms;
            let detection = match classify_frame(&classifier, frame, &pipeline_status).await {
                Ok(detection) => detection,
                Err(e) => {
                    pipeline_status.increment_classifier_failures();
                    if let ClassifierError::Unavailable(reason) = &e {
                        if !degraded {
                            degraded = true;
                            session.report_degraded(classifier.name(), reason);
                        }
                    }
                    tracing::warn!(error = %e, ts_ms, "Classification failed, treating frame as empty");
                    None
                }
            };

            pipeline_status.increment_frames_processed();
            frames_processed += 1;

            if last_applied_ts.is_some_and(|last| ts_ms < last) {
                pipeline_status.increment_stale_results();
                tracing::debug!(ts_ms, "Discarding result older than the last applied frame");
                continue;
            }

            match session
                .process_detection_at(generation, detection, ts_ms)
                .await
            {
                FrameOutcome::Applied(event) => {
                    last_applied_ts = Some(ts_ms);
                    if event.is_some() {
                        pipeline_status.increment_events_emitted();
                    }
                }
                FrameOutcome::Stale => pipeline_status.increment_stale_results(),
            }

            if frames_processed % 30 == 0 {
                tracing::debug!(frames_processed, "Recognition listener progress");
            }
        }

        run.finish();
        tracing::info!(frames_processed, "Recognition listener stopped");
        receiver
    })
}

/// Run the classifier on the blocking pool and record how long it took.
#[tracing::instrument(
    level = "trace",
    skip(classifier, frame, pipeline_status),
    fields(seq = frame.seq, ts_ms = frame.ts_ms)
)]
async fn classify_frame(
    classifier: &Arc<dyn Classifier>,
    frame: Frame,
    pipeline_status: &PipelineStatus,
) -> signa_classifier::Result<Option<Detection>> {
    let classifier = Arc::clone(classifier);
    let started = Instant::now();

    let result = tokio::task::spawn_blocking(move || classifier.classify(&frame))
        .await
        .map_err(|e| ClassifierError::InferenceFailed(format!("classifier task failed: {e}")))?;

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    pipeline_status.set_inference_time_ms(elapsed_ms);
    result
}
