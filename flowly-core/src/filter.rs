//! Task filter: selects tasks that can occupy time today and resolves their
//! scheduling attributes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PlanConfig;
use crate::task::{Priority, Task, TaskId};
use crate::time::local_day;

/// A task that survived filtering, with durations and deadline pressure resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibleTask {
    pub task: Task,
    pub priority: Priority,
    /// Always positive.
    pub duration_minutes: i64,
    pub deadline: Option<DateTime<Utc>>,
    /// Deadline strictly before `now`.
    pub overdue: bool,
    /// Duration alone exceeds the workday.
    pub over_capacity: bool,
    /// The configured default replaced a missing or non-positive duration.
    pub duration_defaulted: bool,
}

impl EligibleTask {
    pub fn id(&self) -> &TaskId {
        &self.task.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    StatusNotActionable,
    Blocked,
    /// `start_date` is after today in the plan timezone.
    NotStarted,
    /// Tagged `someday` or `on_hold`.
    OnHold,
    InvalidDuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterNotice {
    pub task_id: TaskId,
    pub reason: FilterReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub eligible: Vec<EligibleTask>,
    /// Excluded from planning.
    pub rejected: Vec<FilterNotice>,
    /// Kept after a best-effort repair.
    pub repaired: Vec<FilterNotice>,
}

/// A deadline strictly in the past relative to `now`.
pub fn is_overdue(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    deadline.is_some_and(|d| d < now)
}

/// Why `task` cannot be worked on today, if anything.
fn rejection(task: &Task, today: NaiveDate) -> Option<FilterReason> {
    if !task.status.is_actionable() {
        Some(FilterReason::StatusNotActionable)
    } else if task.blocked {
        Some(FilterReason::Blocked)
    } else if task.start_date.is_some_and(|d| d > today) {
        Some(FilterReason::NotStarted)
    } else if task.is_parked() {
        Some(FilterReason::OnHold)
    } else {
        None
    }
}

/// Pure function of the snapshot, `now`, and the config.
pub fn filter_tasks(tasks: &[Task], config: &PlanConfig, now: DateTime<Utc>) -> FilterOutcome {
    let mut out = FilterOutcome::default();
    let workday = config.workday_minutes();
    let today = local_day(now, config.timezone);

    for task in tasks {
        if let Some(reason) = rejection(task, today) {
            debug!(task_id = %task.id, ?reason, "excluding task");
            out.rejected.push(FilterNotice {
                task_id: task.id.clone(),
                reason,
            });
            continue;
        }

        let (duration_minutes, duration_defaulted) = match task.duration_minutes {
            Some(m) if m > 0 => (m, false),
            _ => (i64::from(config.default_duration_minutes), true),
        };
        if duration_defaulted {
            debug!(task_id = %task.id, raw = ?task.duration_minutes, "defaulting task duration");
            out.repaired.push(FilterNotice {
                task_id: task.id.clone(),
                reason: FilterReason::InvalidDuration,
            });
        }

        out.eligible.push(EligibleTask {
            task: task.clone(),
            priority: task.priority,
            duration_minutes,
            deadline: task.deadline,
            overdue: is_overdue(task.deadline, now),
            over_capacity: duration_minutes > workday,
            duration_defaulted,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 21, 8, 0, 0).unwrap()
    }

    #[test]
    fn drops_completed_and_cancelled() {
        let tasks = vec![
            Task::new("a", "open"),
            Task::new("b", "started").with_status(TaskStatus::InProgress),
            Task::new("c", "done").with_status(TaskStatus::Completed),
            Task::new("d", "dropped").with_status(TaskStatus::Cancelled),
        ];
        let out = filter_tasks(&tasks, &PlanConfig::default(), now());

        let ids: Vec<_> = out.eligible.iter().map(|e| e.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(out.rejected.len(), 2);
        assert!(out
            .rejected
            .iter()
            .all(|n| n.reason == FilterReason::StatusNotActionable));
    }

    #[test]
    fn drops_blocked_future_and_parked_tasks() {
        let today = now().date_naive();
        let tasks = vec![
            Task::new("stuck", "waiting on vendor").blocked(),
            Task::new("later", "starts tomorrow").with_start_date(today + Duration::days(1)),
            Task::new("started", "started today").with_start_date(today),
            Task::new("dream", "learn piano").with_tag("someday"),
            Task::new("paused", "paused").with_tag("ON_HOLD"),
            Task::new("home", "tagged").with_tag("home"),
        ];
        let out = filter_tasks(&tasks, &PlanConfig::default(), now());

        let ids: Vec<_> = out.eligible.iter().map(|e| e.id().as_str()).collect();
        assert_eq!(ids, vec!["started", "home"]);
        let reasons: Vec<_> = out.rejected.iter().map(|n| n.reason).collect();
        assert_eq!(
            reasons,
            vec![
                FilterReason::Blocked,
                FilterReason::NotStarted,
                FilterReason::OnHold,
                FilterReason::OnHold,
            ]
        );
    }

    #[test]
    fn start_date_is_read_in_plan_timezone() {
        // 03:00 UTC on 02-21 is still 02-20 in Chicago.
        let early = Utc.with_ymd_and_hms(2026, 2, 21, 3, 0, 0).unwrap();
        let cfg = crate::config::PlanRequest {
            timezone: Some("America/Chicago".into()),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let tasks = vec![Task::new("a", "a").with_start_date(day)];

        let out = filter_tasks(&tasks, &cfg, early);
        assert_eq!(out.rejected[0].reason, FilterReason::NotStarted);
        assert_eq!(filter_tasks(&tasks, &PlanConfig::default(), early).eligible.len(), 1);
    }

    #[test]
    fn invalid_duration_is_repaired_not_rejected() {
        let tasks = vec![
            Task::new("zero", "zero").with_duration(0),
            Task::new("neg", "negative").with_duration(-20),
            Task::new("none", "missing"),
            Task::new("ok", "fine").with_duration(45),
        ];
        let out = filter_tasks(&tasks, &PlanConfig::default(), now());

        assert_eq!(out.eligible.len(), 4);
        assert!(out.rejected.is_empty());
        assert_eq!(out.repaired.len(), 3);
        for e in &out.eligible {
            if e.id() == "ok" {
                assert_eq!(e.duration_minutes, 45);
                assert!(!e.duration_defaulted);
            } else {
                assert_eq!(e.duration_minutes, 30);
                assert!(e.duration_defaulted);
            }
        }
    }

    #[test]
    fn flags_overdue_and_over_capacity() {
        let tasks = vec![
            Task::new("late", "late").with_deadline(now() - Duration::minutes(1)),
            Task::new("exact", "due now").with_deadline(now()),
            Task::new("huge", "huge").with_duration(481),
            Task::new("full", "full day").with_duration(480),
        ];
        let out = filter_tasks(&tasks, &PlanConfig::default(), now());
        let get = |id: &str| out.eligible.iter().find(|e| e.id() == id).unwrap();

        assert!(get("late").overdue);
        assert!(!get("exact").overdue);
        assert!(get("huge").over_capacity);
        assert!(!get("full").over_capacity);
    }
}
