//! Task snapshot model, as read from the external task store.
//!
//! The scheduler never mutates these; it reads one snapshot per planning request.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TaskId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Only pending and in-progress tasks can still occupy time on a schedule.
    pub fn is_actionable(self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    /// Accepts canonical names plus the store's legacy `todo` / `done` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "pending" | "todo" => Ok(TaskStatus::Pending),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// Urgency level 1 (most urgent) ..= 5 (least urgent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    Critical = 1,
    High = 2,
    Medium = 3,
    Low = 4,
    Minimal = 5,
}

impl Priority {
    /// Clamp an arbitrary store value into 1..=5.
    pub fn clamped(level: i64) -> Self {
        match level {
            i64::MIN..=1 => Priority::Critical,
            2 => Priority::High,
            3 => Priority::Medium,
            4 => Priority::Low,
            _ => Priority::Minimal,
        }
    }

    pub fn level(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1..=5 => Ok(Self::clamped(i64::from(level))),
            other => Err(format!("priority must be 1..=5, got {other}")),
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p.level()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub priority: Priority,

    /// Minutes. `None` or non-positive means "use the configured default".
    #[serde(default)]
    pub duration_minutes: Option<i64>,

    /// Optional deadline (UTC).
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,

    pub status: TaskStatus,

    /// Waiting on something outside the user's control.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub blocked: bool,

    /// Not workable before this local calendar day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Tags that park a task outside daily planning.
pub const PARKED_TAGS: [&str; 2] = ["someday", "on_hold"];

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            priority: Priority::Medium,
            duration_minutes: None,
            deadline: None,
            status: TaskStatus::Pending,
            blocked: false,
            start_date: None,
            tags: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn blocked(mut self) -> Self {
        self.blocked = true;
        self
    }

    pub fn with_start_date(mut self, day: NaiveDate) -> Self {
        self.start_date = Some(day);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Carries a `someday` / `on_hold` tag (case-insensitive, `-` and `_` alike).
    pub fn is_parked(&self) -> bool {
        self.tags.iter().any(|t| {
            let t = t.trim().replace('-', "_");
            PARKED_TAGS.iter().any(|p| t.eq_ignore_ascii_case(p))
        })
    }
}
