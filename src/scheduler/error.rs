use thiserror::Error;

use crate::task::TaskError;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("task '{task}' failed")]
    Task {
        task: String,
        #[source]
        source: TaskError,
    },

    #[error("unknown task '{0}' (see `gust list`)")]
    UnknownTask(String),

    #[error("{step} failed")]
    Service {
        step: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("task '{0}' panicked")]
    Panicked(String),
}

impl ScheduleError {
    /// Whether the whole run must stop, not just the current sequence.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Task { source, .. } => source.is_fatal(),
            Self::Service { .. } | Self::Panicked(_) => true,
            Self::UnknownTask(_) => false,
        }
    }
}
