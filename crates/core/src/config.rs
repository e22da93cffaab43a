//! Session configuration loaded from YAML or built in code

use std::path::Path;

use court_vision_analytics::AnalyticsConfig;
use court_vision_tracking::TrackerConfig;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Full configuration for one analysis session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Tracker tunables
    pub tracker: TrackerConfig,

    /// Event-inference tunables
    pub analytics: AnalyticsConfig,

    /// Capacity of the frame queue between feeder and worker
    pub queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            analytics: AnalyticsConfig::default(),
            queue_capacity: 8,
        }
    }
}

impl SessionConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, SessionError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        self.tracker.validate()?;
        self.analytics.validate()?;
        if self.queue_capacity == 0 {
            return Err(SessionError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
