//! Detection sources feeding a session

use std::collections::VecDeque;

use async_trait::async_trait;
use court_vision_common::{FrameDetections, VideoMetadata};

use crate::error::SessionError;

/// Anything that can supply per-frame detections to a session.
///
/// Implementations deliver frames in capture order; the session worker is
/// responsible for rejecting out-of-order timestamps, so a source does not
/// have to guarantee monotonicity after seeks or decoder hiccups.
#[async_trait]
pub trait DetectionSource: Send {
    /// Metadata of the underlying video
    fn metadata(&self) -> &VideoMetadata;

    /// Next frame of detections, or `None` once the source is exhausted
    async fn next_frame(&mut self) -> Result<Option<FrameDetections>, SessionError>;
}

/// In-memory source replaying a pre-recorded detection sequence.
///
/// Used for tests and for re-running analysis over persisted detections
/// without touching the upstream detector.
pub struct ReplaySource {
    metadata: VideoMetadata,
    frames: VecDeque<FrameDetections>,
}

impl ReplaySource {
    pub fn new(metadata: VideoMetadata, frames: Vec<FrameDetections>) -> Self {
        Self {
            metadata,
            frames: frames.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl DetectionSource for ReplaySource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    async fn next_frame(&mut self) -> Result<Option<FrameDetections>, SessionError> {
        Ok(self.frames.pop_front())
    }
}
