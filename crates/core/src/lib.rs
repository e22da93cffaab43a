//! Session orchestration for basketball video analysis.
//!
//! Wires a detection source into the tracking and analytics layers under a
//! single-writer concurrency model: per session, one feeder task, one worker
//! task, and a bounded frame queue between them. Observers read progress from
//! a watch channel instead of touching session state.
//!
//! # Example
//! ```no_run
//! use court_vision_common::VideoMetadata;
//! use court_vision_core::{run_session, ReplaySource, SessionConfig, SessionContext};
//!
//! # async fn example() -> Result<(), court_vision_core::SessionError> {
//! let source = ReplaySource::new(VideoMetadata::new(1920, 1080, 30.0, 900), vec![]);
//! let handle = run_session(source, SessionConfig::default(), SessionContext::realtime())?;
//!
//! let results = handle.join().await?;
//! println!("{}", results.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod session;
pub mod source;

pub use config::SessionConfig;
pub use context::{ExecutionMode, SessionContext};
pub use error::SessionError;
pub use session::{
    run_session, FinalResults, FrameOutcome, SessionEngine, SessionHandle, SessionProgress,
    SessionSummary,
};
pub use source::{DetectionSource, ReplaySource};

use anyhow::Context as _;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global log subscriber.
///
/// Call once at startup; later calls fail because a subscriber is already
/// installed.
pub fn init_logging(verbose: bool) -> Result<(), SessionError> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test covers both paths: the process-wide subscriber can only be
    // installed once.
    #[test]
    fn test_init_logging_installs_once() {
        init_logging(false).unwrap();
        assert!(init_logging(true).is_err());
    }
}
