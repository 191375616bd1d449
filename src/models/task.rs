use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum; the canonical wire and
/// storage form is lowercase (`low`, `medium`, `high`), but incoming
/// values are accepted in any casing.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority (the default).
    Medium,
    /// High priority.
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(format!(
                "Invalid priority '{}'. Use: low, medium, or high",
                other
            )),
        }
    }
}

// Deserialization goes through FromStr so that "HIGH", "High" and "high"
// all normalize to the same canonical variant at the boundary.
impl<'de> Deserialize<'de> for TaskPriority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// An action applied to a set of task ids in one atomic bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Complete,
    Incomplete,
    Delete,
}

impl BulkAction {
    /// Past-tense label used in the bulk-update response message.
    pub fn past_tense(&self) -> &'static str {
        match self {
            BulkAction::Complete => "completed",
            BulkAction::Incomplete => "marked incomplete",
            BulkAction::Delete => "deleted",
        }
    }
}

impl FromStr for BulkAction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "complete" => Ok(BulkAction::Complete),
            "incomplete" => Ok(BulkAction::Incomplete),
            "delete" => Ok(BulkAction::Delete),
            _ => Err("Invalid action. Use: complete, incomplete, or delete".to_string()),
        }
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some("Title is required".into());
        return Err(error);
    }
    Ok(())
}

/// Input structure for creating a task.
/// The title is trimmed before storage; a title that is empty after
/// trimming is rejected.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(max = 250), custom = "validate_title")]
    pub title: String,

    pub description: Option<String>,

    /// Defaults to medium when omitted.
    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,

    #[validate(length(max = 100))]
    pub category: Option<String>,
}

/// Partial update payload for an existing task.
/// Omitted fields keep their stored values; a supplied title goes through
/// the same trim/non-empty validation as on creation.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(max = 250), custom = "validate_title")]
    pub title: Option<String>,

    pub description: Option<String>,

    pub completed: Option<bool>,

    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,

    #[validate(length(max = 100))]
    pub category: Option<String>,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// The title of the task, stored trimmed.
    pub title: String,
    /// An optional description for the task.
    pub description: Option<String>,
    /// Whether the task has been completed.
    pub completed: bool,
    /// The priority of the task.
    pub priority: TaskPriority,
    /// Optional due date for the task.
    pub due_date: Option<DateTime<Utc>>,
    /// Optional category/tag for the task.
    pub category: Option<String>,
    /// Timestamp of when the task was created. Immutable.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the task.
    pub updated_at: DateTime<Utc>,
    /// Identifier of the user who owns the task.
    pub user_id: i32,
    /// Derived on every read, never persisted: the due date has passed and
    /// the task is not completed.
    #[sqlx(default)]
    #[serde(default)]
    pub is_overdue: bool,
}

/// Represents query parameters for filtering tasks when listing them.
/// All supplied filters combine conjunctively.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Filter tasks by completion state.
    pub completed: Option<bool>,
    /// Filter tasks by priority (case-insensitive).
    pub priority: Option<TaskPriority>,
    /// Search term matched as a case-insensitive substring against title
    /// or description.
    pub search: Option<String>,
}

/// Request body for the bulk-update endpoint.
/// Both fields default to empty so that missing keys surface as the
/// domain-level "required" validation error rather than a parse failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    #[serde(default)]
    pub task_ids: Vec<Uuid>,
    #[serde(default)]
    pub action: String,
}

/// Response body for the bulk-update endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
    pub message: String,
    pub updated_count: u64,
}

/// Per-priority task counts for a single user.
#[derive(Debug, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

/// Aggregate statistics over one user's tasks, computed from a single
/// consistent snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskStats {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    /// Percentage of completed tasks, rounded to 2 decimals. Zero when the
    /// user has no tasks.
    pub completion_rate: f64,
    pub priority_breakdown: PriorityBreakdown,
}

impl TaskStats {
    /// Builds the aggregate record from raw counts, guarding the
    /// completion-rate division against an empty task list.
    pub fn from_counts(total: i64, completed: i64, high: i64, medium: i64, low: i64) -> Self {
        let completion_rate = if total > 0 {
            (completed as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };

        Self {
            total_tasks: total,
            completed_tasks: completed,
            pending_tasks: total - completed,
            completion_rate,
            priority_breakdown: PriorityBreakdown { high, medium, low },
        }
    }
}

impl Task {
    /// Creates a new `Task` from `TaskInput` and the owner's `user_id`.
    /// Assigns a fresh UUID, trims the title, defaults the priority to
    /// medium, and sets `created_at`/`updated_at` to now.
    pub fn new(input: TaskInput, user_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            completed: false,
            priority: input.priority.unwrap_or_default(),
            due_date: input.due_date,
            category: input.category,
            created_at: now,
            updated_at: now,
            user_id,
            is_overdue: false,
        }
    }

    /// Recomputes the derived `is_overdue` flag against the current time.
    /// Applied after every fetch so the flag is never stale.
    pub fn with_overdue(mut self) -> Self {
        self.is_overdue = self
            .due_date
            .map_or(false, |due| !self.completed && due < Utc::now());
        self
    }
}
