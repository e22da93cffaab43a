//! Session engine: single-writer analysis loop plus the concurrency shell
//! around it.
//!
//! All mutable state (tracker, analytics, counters) lives inside
//! [`SessionEngine`] and is owned by exactly one worker task. The feeder task
//! pulls frames from the [`DetectionSource`] and hands them over a bounded
//! queue, so a slow worker applies backpressure to the source instead of
//! buffering unboundedly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use court_vision_analytics::{
    GameAnalytics, GameEvent, PlayerStatistics, PossessionRecord, PossessionSummary, ShotAttempt,
    ShotChart,
};
use court_vision_common::{FrameDetections, VideoMetadata};
use court_vision_tracking::{FrameTracks, PlayerTracker, TrackHistory, TrackSnapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::context::SessionContext;
use crate::error::SessionError;
use crate::source::DetectionSource;

/// Output of one accepted frame
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub tracks: FrameTracks,
    pub events: Vec<GameEvent>,
}

/// Point-in-time counters published over the progress channel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionProgress {
    pub frames_processed: u64,
    pub frames_rejected: u64,
    pub detections_dropped: u64,
    pub live_tracks: usize,
    pub possession_changes: usize,
    pub shot_attempts: usize,
    pub last_timestamp: f64,
    pub finished: bool,
}

/// Aggregate counters for a finished session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub frames_processed: u64,
    pub frames_rejected: u64,
    pub detections_dropped: u64,
    pub tracks_evicted: u64,
    pub ball_detection_rate: f64,
    pub possession_changes: usize,
    pub shot_attempts: usize,
    pub aborted: bool,
}

/// Everything a finished session produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResults {
    pub video: VideoMetadata,
    pub histories: Vec<TrackHistory>,
    pub final_tracks: Vec<TrackSnapshot>,
    pub possession_log: Vec<PossessionRecord>,
    pub possession_summary: PossessionSummary,
    pub shot_log: Vec<ShotAttempt>,
    pub shot_chart: ShotChart,
    pub statistics: Vec<PlayerStatistics>,
    pub summary: SessionSummary,
}

impl FinalResults {
    /// Pretty-printed JSON for export
    pub fn to_json_pretty(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Per-session analysis state. One frame in, at most one outcome out.
pub struct SessionEngine {
    context: SessionContext,
    video: VideoMetadata,
    tracker: PlayerTracker,
    analytics: GameAnalytics,
    last_timestamp: Option<f64>,
    frames_processed: u64,
    frames_rejected: u64,
    detections_dropped: u64,
}

impl SessionEngine {
    pub fn new(
        config: &SessionConfig,
        context: SessionContext,
        video: VideoMetadata,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let tracker = PlayerTracker::new(config.tracker.clone());
        let analytics = GameAnalytics::new(config.analytics.clone(), &video)?;
        Ok(Self {
            context,
            video,
            tracker,
            analytics,
            last_timestamp: None,
            frames_processed: 0,
            frames_rejected: 0,
            detections_dropped: 0,
        })
    }

    /// Process one frame of detections.
    ///
    /// Frames whose timestamp does not advance past the previous accepted
    /// frame are rejected with `Ok(None)`; they are counted but never reach
    /// the tracker. Malformed detections within an accepted frame are dropped
    /// individually and the rest of the frame proceeds.
    pub fn process_frame(
        &mut self,
        frame: &FrameDetections,
    ) -> Result<Option<FrameOutcome>, SessionError> {
        if let Some(last) = self.last_timestamp {
            if frame.timestamp <= last {
                warn!(
                    frame_id = frame.frame_id,
                    timestamp = frame.timestamp,
                    last_accepted = last,
                    "Rejecting non-monotonic frame"
                );
                self.frames_rejected += 1;
                return Ok(None);
            }
        }

        let mut valid = Vec::with_capacity(frame.detections.len());
        for detection in &frame.detections {
            match detection.validate() {
                Ok(()) => valid.push(detection.clone()),
                Err(e) => {
                    self.detections_dropped += 1;
                    debug!(frame_id = frame.frame_id, error = %e, "Dropping detection");
                }
            }
        }

        let tracks = self.tracker.step(&valid, frame.frame_id, frame.timestamp)?;
        let events = self.analytics.observe_frame(&tracks);

        if self.context.verbose && !events.is_empty() {
            for event in &events {
                info!(frame_id = frame.frame_id, event = ?event, "Game event");
            }
        }

        self.last_timestamp = Some(frame.timestamp);
        self.frames_processed += 1;

        Ok(Some(FrameOutcome { tracks, events }))
    }

    /// Frames seen, accepted or not; drives the progress publication cadence.
    pub fn frames_seen(&self) -> u64 {
        self.frames_processed + self.frames_rejected
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            frames_processed: self.frames_processed,
            frames_rejected: self.frames_rejected,
            detections_dropped: self.detections_dropped,
            live_tracks: self.tracker.live_count(),
            possession_changes: self.analytics.possession_log().len(),
            shot_attempts: self.analytics.shot_log().len(),
            last_timestamp: self.last_timestamp.unwrap_or(0.0),
            finished: false,
        }
    }

    /// Consume the engine and project everything it accumulated.
    pub fn finalize(self, aborted: bool) -> FinalResults {
        let histories = self.tracker.histories();
        let statistics = self.analytics.statistics(&histories, &self.video);
        let summary = SessionSummary {
            frames_processed: self.frames_processed,
            frames_rejected: self.frames_rejected,
            detections_dropped: self.detections_dropped,
            tracks_evicted: self.tracker.evicted_count(),
            ball_detection_rate: self.analytics.ball_detection_rate(),
            possession_changes: self.analytics.possession_log().len(),
            shot_attempts: self.analytics.shot_log().len(),
            aborted,
        };
        info!(
            frames = summary.frames_processed,
            rejected = summary.frames_rejected,
            shots = summary.shot_attempts,
            possession_changes = summary.possession_changes,
            "Session finalized"
        );
        FinalResults {
            final_tracks: self.tracker.snapshot(),
            possession_summary: self.analytics.possession_summary(),
            possession_log: self.analytics.possession_log().to_vec(),
            shot_log: self.analytics.shot_log().to_vec(),
            shot_chart: self.analytics.shot_chart(),
            video: self.video,
            histories,
            statistics,
            summary,
        }
    }
}

/// Handle to a running session
pub struct SessionHandle {
    progress: watch::Receiver<SessionProgress>,
    abort: Arc<AtomicBool>,
    worker: JoinHandle<Result<FinalResults, SessionError>>,
}

impl SessionHandle {
    /// Latest published progress snapshot
    pub fn progress(&self) -> SessionProgress {
        self.progress.borrow().clone()
    }

    /// Request the session to stop at the next frame boundary
    pub fn abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// Wait for the session to finish and collect its results
    pub async fn join(self) -> Result<FinalResults, SessionError> {
        self.worker
            .await
            .map_err(|e| SessionError::WorkerFailed(format!("worker panicked: {e}")))?
    }
}

/// Start a session over the given source.
///
/// Spawns two tasks onto the current runtime: a feeder that drains the source
/// into a bounded queue, and a worker that owns the [`SessionEngine`]. A
/// source that fails mid-stream fails the whole session; [`SessionHandle::join`]
/// then returns the source's error instead of results. Must be called from
/// within a Tokio runtime.
pub fn run_session<S>(
    mut source: S,
    config: SessionConfig,
    context: SessionContext,
) -> Result<SessionHandle, SessionError>
where
    S: DetectionSource + 'static,
{
    let video = source.metadata().clone();
    let mut engine = SessionEngine::new(&config, context.clone(), video)?;

    let (frame_tx, mut frame_rx) =
        mpsc::channel::<Result<FrameDetections, SessionError>>(config.queue_capacity);
    let (progress_tx, progress_rx) = watch::channel(SessionProgress::default());
    let abort = Arc::new(AtomicBool::new(false));
    let progress_interval = context.progress_interval.max(1);

    let feeder_abort = abort.clone();
    tokio::spawn(async move {
        loop {
            if feeder_abort.load(Ordering::Relaxed) {
                break;
            }
            match source.next_frame().await {
                Ok(Some(frame)) => {
                    if frame_tx.send(Ok(frame)).await.is_err() {
                        // Worker is gone; nothing left to feed.
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    // A stream that dies mid-session is session-fatal; the
                    // worker turns this into its own failure result.
                    warn!(error = %e, "Detection source failed");
                    let _ = frame_tx.send(Err(e)).await;
                    break;
                }
            }
        }
    });

    let worker_abort = abort.clone();
    let worker = tokio::spawn(async move {
        let mut aborted = false;
        while let Some(next) = frame_rx.recv().await {
            if worker_abort.load(Ordering::Relaxed) {
                aborted = true;
                break;
            }
            let frame = next?;
            engine.process_frame(&frame)?;
            if engine.frames_seen() % progress_interval == 0 {
                let _ = progress_tx.send(engine.progress());
            }
        }

        let mut final_progress = engine.progress();
        final_progress.finished = true;
        let results = engine.finalize(aborted);
        let _ = progress_tx.send(final_progress);
        Ok(results)
    });

    Ok(SessionHandle {
        progress: progress_rx,
        abort,
        worker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use court_vision_common::{BoundingBox, Detection, DetectionClass};

    fn video() -> VideoMetadata {
        VideoMetadata::new(1920, 1080, 30.0, 300)
    }

    fn engine() -> SessionEngine {
        SessionEngine::new(
            &SessionConfig::default(),
            SessionContext::batch(),
            video(),
        )
        .unwrap()
    }

    fn player(x: f32, y: f32) -> Detection {
        Detection::new(
            BoundingBox::new(x, y, x + 40.0, y + 80.0),
            0.9,
            DetectionClass::Player,
        )
    }

    fn frame(frame_id: u64, timestamp: f64, detections: Vec<Detection>) -> FrameDetections {
        FrameDetections {
            frame_id,
            timestamp,
            detections,
        }
    }

    #[test]
    fn test_non_monotonic_frame_is_rejected() {
        let mut engine = engine();
        let out = engine.process_frame(&frame(0, 1.0, vec![])).unwrap();
        assert!(out.is_some());

        let out = engine.process_frame(&frame(1, 0.5, vec![])).unwrap();
        assert!(out.is_none());
        let out = engine.process_frame(&frame(2, 1.0, vec![])).unwrap();
        assert!(out.is_none(), "equal timestamps do not advance");

        let progress = engine.progress();
        assert_eq!(progress.frames_processed, 1);
        assert_eq!(progress.frames_rejected, 2);
    }

    #[test]
    fn test_malformed_detection_dropped_frame_survives() {
        let mut engine = engine();
        let inverted = Detection::new(
            BoundingBox::new(100.0, 100.0, 50.0, 50.0),
            0.9,
            DetectionClass::Player,
        );
        let out = engine
            .process_frame(&frame(0, 0.0, vec![inverted, player(200.0, 200.0)]))
            .unwrap()
            .expect("the frame itself is accepted");
        assert_eq!(out.events.len(), 0);

        let progress = engine.progress();
        assert_eq!(progress.frames_processed, 1);
        assert_eq!(progress.detections_dropped, 1);
        assert_eq!(engine.tracker.live_count(), 1, "valid detection spawned");
    }

    #[test]
    fn test_finalize_reports_counters() {
        let mut engine = engine();
        for f in 0..5 {
            engine
                .process_frame(&frame(f, f as f64 / 30.0, vec![player(100.0, 100.0)]))
                .unwrap();
        }
        let results = engine.finalize(false);
        assert_eq!(results.summary.frames_processed, 5);
        assert!(!results.summary.aborted);
        assert_eq!(results.histories.len(), 1);
        assert_eq!(results.statistics.len(), 1);
    }

    #[test]
    fn test_final_results_serialize_to_json() {
        let results = engine().finalize(false);
        let json = results.to_json_pretty().unwrap();
        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"statistics\""));
        assert!(json.contains("\"shot_chart\""));
    }
}
