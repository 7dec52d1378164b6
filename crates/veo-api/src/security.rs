//! Input validation and sanitization utilities.

use uuid::Uuid;
use veo_models::TaskId;

use crate::error::ApiError;

/// Characters of a prompt included in log lines.
const PROMPT_PREVIEW_LENGTH: usize = 100;

/// Validate task ID format (hyphenated UUID).
pub fn is_valid_task_id(id: &str) -> bool {
    id.len() == 36 && Uuid::try_parse(id).is_ok()
}

/// Parse a path task ID. Ids that cannot exist are reported as not found.
pub fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    if is_valid_task_id(raw) {
        Ok(TaskId::from_string(raw.to_lowercase()))
    } else {
        Err(ApiError::not_found(format!("Task {} not found", raw)))
    }
}

/// Shorten and strip control characters from a prompt for logging.
pub fn prompt_preview(prompt: &str) -> String {
    let mut preview: String = prompt
        .chars()
        .filter(|c| !c.is_control())
        .take(PROMPT_PREVIEW_LENGTH)
        .collect();
    if prompt.chars().count() > PROMPT_PREVIEW_LENGTH {
        preview.push_str("...");
    }
    preview
}
