mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use signa_application::{
    load_settings, start_recognition_listener, RecognitionListenerHandle, RecognitionSession,
    RecognitionSettings, SessionHandle,
};
use signa_bus::{FrameBus, PipelineStatus};
use signa_classifier::{load_trace, Classifier, ClassifierRegistry, TraceAction, TraceEntry};
use signa_events::{EventBus, EventBusRef};
use tracing_subscriber::EnvFilter;

use crate::cli::CliArgs;

/// Replayed frames carry a single placeholder pixel; the classifier answers from the trace.
const REPLAY_FRAME_SIZE: u32 = 1;

/// Prints every event as `<topic> <json>` on stdout.
struct StdoutEventBus;

impl EventBus for StdoutEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        println!("{topic} {payload}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let default_filter = if args.debug {
        "debug"
    } else {
        "info,signa=debug"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let settings = match &args.settings {
        Some(path) => load_settings(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => RecognitionSettings::default(),
    };
    let entries = load_trace(&args.trace)
        .with_context(|| format!("loading trace from {}", args.trace.display()))?;
    tracing::info!(
        trace = %args.trace.display(),
        entries = entries.len(),
        pipeline = args.pipeline,
        "Starting replay"
    );

    let events: EventBusRef = Arc::new(StdoutEventBus);
    let handle = SessionHandle::new(RecognitionSession::from_settings(&settings), events);

    if args.pipeline {
        replay_through_pipeline(&handle, &settings, &args, &entries).await?;
    } else {
        replay_direct(&handle, &entries).await;
    }

    let snapshot = handle.snapshot().await;
    println!(
        "{}",
        serde_json::to_string_pretty(&snapshot).context("serializing final snapshot")?
    );
    Ok(())
}

/// Feed every recorded frame straight into the session, in order.
async fn replay_direct(handle: &SessionHandle, entries: &[TraceEntry]) {
    for entry in entries {
        match entry.action {
            Some(action) => apply_action(handle, action).await,
            None => {
                handle.process_detection(entry.detection(), entry.ts_ms).await;
            }
        }
    }
}

/// Send recorded frames over the frame bus to a listener backed by the configured classifier.
async fn replay_through_pipeline(
    handle: &SessionHandle,
    settings: &RecognitionSettings,
    args: &CliArgs,
    entries: &[TraceEntry],
) -> anyhow::Result<()> {
    let model_path = settings
        .classifier
        .model_path
        .clone()
        .unwrap_or_else(|| args.trace.clone());
    let classifier: Arc<dyn Classifier> = ClassifierRegistry::with_builtin()
        .load(&settings.classifier.model_id, &model_path)
        .with_context(|| format!("loading classifier '{}'", settings.classifier.model_id))?
        .into();

    let mut bus = FrameBus::with_config(settings.frame_bus.clone());
    let receiver = bus
        .take_receiver()
        .context("frame bus receiver already taken")?;
    let sender = bus.sender();
    let status = Arc::new(PipelineStatus::new());
    let listener = Arc::new(RecognitionListenerHandle::new());
    let task = start_recognition_listener(
        handle.clone(),
        classifier,
        receiver,
        Arc::clone(&status),
        Arc::clone(&listener),
    );

    let mut last_ts: Option<u64> = None;
    for entry in entries {
        if args.realtime {
            if let Some(last) = last_ts {
                let gap = entry.ts_ms.saturating_sub(last);
                tokio::time::sleep(Duration::from_millis(gap)).await;
            }
            last_ts = Some(entry.ts_ms);
        }

        match entry.action {
            Some(action) => apply_action(handle, action).await,
            None => {
                let facing = handle.facing().await;
                let sent = sender
                    .send_async(
                        entry.ts_ms,
                        facing,
                        REPLAY_FRAME_SIZE,
                        REPLAY_FRAME_SIZE,
                        vec![0u8; 3],
                    )
                    .await;
                if !sent {
                    tracing::warn!(ts_ms = entry.ts_ms, "Frame bus closed early");
                    break;
                }
            }
        }
    }

    let dropped_frames = sender.dropped_frames();
    // Closing the bus lets the listener drain what is queued and exit.
    drop(sender);
    drop(bus);
    task.await.context("recognition listener panicked")?;

    let snapshot = status.snapshot();
    tracing::info!(
        frames_processed = snapshot.frames_processed,
        frames_coalesced = snapshot.frames_coalesced,
        stale_results = snapshot.stale_results,
        classifier_failures = snapshot.classifier_failures,
        events_emitted = snapshot.events_emitted,
        dropped_frames,
        "Pipeline replay finished"
    );
    Ok(())
}

async fn apply_action(handle: &SessionHandle, action: TraceAction) {
    tracing::debug!(?action, "Applying recorded control action");
    match action {
        TraceAction::ToggleMode => {
            handle.toggle_mode().await;
        }
        TraceAction::ToggleFacing => {
            handle.toggle_facing().await;
        }
        TraceAction::Clear => handle.clear().await,
        TraceAction::DeleteLast => {
            handle.delete_last().await;
        }
    }
}
