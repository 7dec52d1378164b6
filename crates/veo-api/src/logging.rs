//! Tracing setup and structured task logging.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use veo_models::TaskId;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. JSON lines when `json` is set,
/// colored text otherwise.
pub fn init_tracing(level: &str, json: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()?;
    }

    Ok(())
}

/// Task logger for lifecycle events.
///
/// Every line carries the task id and the generation backend.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    task_id: String,
    operation: String,
}

impl TaskLogger {
    pub fn new(task_id: &TaskId, operation: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Task started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Task progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Task warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Task failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Task completed: {}", message
        );
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping a task's driver future.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "task",
            task_id = %self.task_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_logger_creation() {
        let task_id = TaskId::new();
        let logger = TaskLogger::new(&task_id, "veo");

        assert_eq!(logger.task_id(), task_id.as_str());
        assert_eq!(logger.operation(), "veo");
    }
}
