//! Error types for the session layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    #[error("Tracking error: {0}")]
    Tracking(#[from] court_vision_tracking::TrackingError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] court_vision_analytics::AnalyticsError),

    #[error("Detection source failed: {0}")]
    Source(String),

    #[error("Session worker terminated unexpectedly: {0}")]
    WorkerFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}
