//! Execution context for analysis sessions

use serde::{Deserialize, Serialize};

/// Execution mode that determines optimization priorities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Interactive mode - verbose logging, per-frame event reporting
    Interactive,

    /// Realtime mode - minimum latency, progress published every frame
    Realtime,

    /// Batch mode - maximum throughput, progress published sparsely
    Batch,
}

/// Context threaded through a session's worker
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Execution mode
    pub mode: ExecutionMode,

    /// Whether verbose logging is enabled
    pub verbose: bool,

    /// Frames between progress publications (1 = every frame)
    pub progress_interval: u64,
}

impl SessionContext {
    /// Create an interactive context
    pub fn interactive() -> Self {
        Self {
            mode: ExecutionMode::Interactive,
            verbose: true,
            progress_interval: 1,
        }
    }

    /// Create a realtime context
    pub fn realtime() -> Self {
        Self {
            mode: ExecutionMode::Realtime,
            verbose: false,
            progress_interval: 1,
        }
    }

    /// Create a batch context
    pub fn batch() -> Self {
        Self {
            mode: ExecutionMode::Batch,
            verbose: false,
            progress_interval: 30,
        }
    }

    /// Create a custom context
    pub fn new(mode: ExecutionMode) -> Self {
        match mode {
            ExecutionMode::Interactive => Self::interactive(),
            ExecutionMode::Realtime => Self::realtime(),
            ExecutionMode::Batch => Self::batch(),
        }
    }
}
