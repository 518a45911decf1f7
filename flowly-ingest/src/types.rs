use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use flowly_core::time::parse_local_deadline_to_utc;
use flowly_core::{Priority, Task, TaskStatus};
use serde::Deserialize;
use tracing::warn;

use crate::duration::DurationParser;

/// Export-format agnostic task row: every field still raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawTaskRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub priority: Option<String>,
    #[serde(alias = "duration")]
    pub duration_minutes: Option<String>,
    pub deadline: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "is_blocked")]
    pub blocked: Option<String>,
    pub start_date: Option<String>,
    /// Separated by `,`, `;` or `|`.
    pub tags: Option<String>,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn split_tags(s: &str) -> Vec<String> {
    s.split([',', ';', '|'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalizes raw rows into `Task` snapshots.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    tz: Tz,
    durations: DurationParser,
}

impl RecordNormalizer {
    pub fn new(tz: Tz) -> Result<Self> {
        Ok(Self {
            tz,
            durations: DurationParser::new()?,
        })
    }

    /// `None` when the row cannot describe a task (no id/title, unknown status).
    pub fn to_task(&self, raw: &RawTaskRecord) -> Option<Task> {
        let (Some(id), Some(title)) = (non_empty(&raw.id), non_empty(&raw.title)) else {
            warn!(?raw, "skipping task row without id or title");
            return None;
        };

        let status = match non_empty(&raw.status).unwrap_or("").parse::<TaskStatus>() {
            Ok(s) => s,
            Err(e) => {
                warn!(task_id = id, error = %e, "skipping task row");
                return None;
            }
        };

        let priority = match non_empty(&raw.priority).map(|p| p.parse::<f64>()) {
            Some(Ok(level)) if level.is_finite() => Priority::clamped(level.round() as i64),
            Some(_) => {
                warn!(task_id = id, raw = ?raw.priority, "unreadable priority, using medium");
                Priority::Medium
            }
            None => Priority::Medium,
        };

        let duration_minutes = non_empty(&raw.duration_minutes)
            .and_then(|d| self.durations.parse_minutes(d));

        let deadline = non_empty(&raw.deadline).and_then(|d| match self.parse_deadline(d) {
            Ok(dt) => Some(dt),
            Err(e) => {
                warn!(task_id = id, error = %e, "ignoring unreadable deadline");
                None
            }
        });

        let blocked = match non_empty(&raw.blocked).map(parse_flag) {
            Some(Some(flag)) => flag,
            Some(None) => {
                warn!(task_id = id, raw = ?raw.blocked, "unreadable blocked flag, using false");
                false
            }
            None => false,
        };

        let start_date = non_empty(&raw.start_date).and_then(|d| {
            match NaiveDate::parse_from_str(d.get(..10).unwrap_or(d), "%Y-%m-%d") {
                Ok(day) => Some(day),
                Err(e) => {
                    warn!(task_id = id, error = %e, "ignoring unreadable start date");
                    None
                }
            }
        });

        Some(Task {
            id: id.to_string(),
            title: title.to_string(),
            priority,
            duration_minutes,
            deadline,
            status,
            blocked,
            start_date,
            tags: non_empty(&raw.tags).map(split_tags).unwrap_or_default(),
        })
    }

    /// RFC 3339, "YYYY-MM-DD HH:MM" (local), or "YYYY-MM-DD" (23:59 local).
    pub fn parse_deadline(&self, s: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            let end_of_day = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN);
            let local = self
                .tz
                .from_local_datetime(&date.and_time(end_of_day))
                .earliest()
                .ok_or_else(|| anyhow::anyhow!("no local end of day for {date} in {}", self.tz))?;
            return Ok(local.with_timezone(&Utc));
        }
        parse_local_deadline_to_utc(s, self.tz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, title: &str) -> RawTaskRecord {
        RawTaskRecord {
            id: Some(id.into()),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    #[test]
    fn normalizes_loose_fields() {
        let n = RecordNormalizer::new(chrono_tz::America::Chicago).unwrap();
        let t = n
            .to_task(&RawTaskRecord {
                priority: Some("9".into()),
                duration_minutes: Some("1h 15m".into()),
                deadline: Some("2026-02-20".into()),
                status: Some("todo".into()),
                ..raw("7", "Pay rent")
            })
            .unwrap();

        assert_eq!(t.priority, Priority::Minimal);
        assert_eq!(t.duration_minutes, Some(75));
        assert_eq!(t.status, TaskStatus::Pending);
        // 23:59 CST
        assert_eq!(t.deadline.unwrap().to_rfc3339(), "2026-02-21T05:59:00+00:00");
    }

    #[test]
    fn bad_optional_fields_degrade_to_absent() {
        let n = RecordNormalizer::new(Tz::UTC).unwrap();
        let t = n
            .to_task(&RawTaskRecord {
                priority: Some("urgent!".into()),
                duration_minutes: Some("a while".into()),
                deadline: Some("next week".into()),
                ..raw("1", "Vague task")
            })
            .unwrap();

        assert_eq!(t.priority, Priority::Medium);
        assert_eq!(t.duration_minutes, None);
        assert_eq!(t.deadline, None);
    }

    #[test]
    fn skips_rows_missing_identity_or_with_unknown_status() {
        let n = RecordNormalizer::new(Tz::UTC).unwrap();
        assert!(n.to_task(&raw("", "no id")).is_none());
        assert!(n.to_task(&raw("1", "  ")).is_none());
        assert!(n
            .to_task(&RawTaskRecord {
                status: Some("archived".into()),
                ..raw("1", "x")
            })
            .is_none());
    }

    #[test]
    fn reads_eligibility_fields() {
        let n = RecordNormalizer::new(Tz::UTC).unwrap();
        let t = n
            .to_task(&RawTaskRecord {
                blocked: Some("yes".into()),
                start_date: Some("2026-03-01T00:00:00Z".into()),
                tags: Some("work; someday |".into()),
                ..raw("1", "Parked")
            })
            .unwrap();

        assert!(t.blocked);
        assert_eq!(t.start_date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(t.tags, vec!["work".to_string(), "someday".to_string()]);
        assert!(t.is_parked());

        let t = n
            .to_task(&RawTaskRecord {
                blocked: Some("maybe".into()),
                start_date: Some("soon".into()),
                ..raw("2", "Loose")
            })
            .unwrap();
        assert!(!t.blocked);
        assert_eq!(t.start_date, None);
    }

    #[test]
    fn rfc3339_deadline_keeps_its_offset() {
        let n = RecordNormalizer::new(Tz::UTC).unwrap();
        let dt = n.parse_deadline("2026-02-20T10:00:00+02:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-02-20T08:00:00+00:00");
        let dt = n.parse_deadline("2026-02-20 10:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-02-20T10:00:00+00:00");
    }
}
