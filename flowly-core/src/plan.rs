//! The "today plan" record and its structural checks.
//!
//! serde-ready: the CLI persists plans as JSON and prints them with `--json`.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::PlanConfig;
use crate::error::PlanError;
use crate::packer::{BreakKind, DeferReason};
use crate::task::{Task, TaskId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub task_id: TaskId,
    /// 1-based position in the rank order.
    pub priority_rank: u32,
    pub planned_start: DateTime<FixedOffset>,
    pub planned_end: DateTime<FixedOffset>,
    pub duration_minutes: i64,
    pub note: Option<String>,
    /// Snapshot of the task at generation time.
    pub task: Task,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanBreak {
    pub kind: BreakKind,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl PlanBreak {
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDeferral {
    pub task_id: TaskId,
    /// The rank the task would have had if it fit.
    pub priority_rank: u32,
    pub reason: DeferReason,
    pub note: Option<String>,
    pub task: Task,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub generated_at: DateTime<Utc>,
    pub timezone: Tz,
    pub day: NaiveDate,
    pub day_start: DateTime<FixedOffset>,
    pub day_end: DateTime<FixedOffset>,
    pub config: PlanConfig,
    pub entries: Vec<PlanEntry>,
    #[serde(default)]
    pub breaks: Vec<PlanBreak>,
    #[serde(default)]
    pub deferrals: Vec<PlanDeferral>,
    pub deferred_task_ids: Vec<TaskId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub planned_tasks: usize,
    pub deferred_tasks: usize,
    pub planned_minutes: i64,
    pub break_minutes: i64,
    pub capacity_minutes: i64,
    pub capacity_used_percent: f64,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.deferrals.is_empty()
    }

    pub fn summary(&self) -> PlanSummary {
        let planned_minutes: i64 = self.entries.iter().map(|e| e.duration_minutes).sum();
        let capacity_minutes = self.config.workday_minutes();
        let capacity_used_percent = if capacity_minutes > 0 {
            (planned_minutes as f64 * 1000.0 / capacity_minutes as f64).round() / 10.0
        } else {
            0.0
        };

        PlanSummary {
            planned_tasks: self.entries.len(),
            deferred_tasks: self.deferrals.len(),
            planned_minutes,
            break_minutes: self.breaks.iter().map(PlanBreak::minutes).sum(),
            capacity_minutes,
            capacity_used_percent,
        }
    }

    /// Check the structural invariants every stored plan must hold.
    ///
    /// A failure here is a programming error in the pipeline, never a
    /// task-level outcome.
    pub fn verify(&self) -> Result<(), PlanError> {
        let violation = |msg: String| Err(PlanError::Invariant(msg));

        let mut prev_end = self.day_start;
        for e in &self.entries {
            if e.planned_start < prev_end {
                return violation(format!(
                    "entry {} starts at {} before previous end {}",
                    e.task_id, e.planned_start, prev_end
                ));
            }
            if e.planned_end > self.day_end {
                return violation(format!(
                    "entry {} ends at {} after workday end {}",
                    e.task_id, e.planned_end, self.day_end
                ));
            }
            if (e.planned_end - e.planned_start).num_minutes() != e.duration_minutes {
                return violation(format!(
                    "entry {} spans {} minutes, expected {}",
                    e.task_id,
                    (e.planned_end - e.planned_start).num_minutes(),
                    e.duration_minutes
                ));
            }
            prev_end = e.planned_end;
        }

        let n = self.entries.len() + self.deferrals.len();
        let ranks: HashSet<u32> = self
            .entries
            .iter()
            .map(|e| e.priority_rank)
            .chain(self.deferrals.iter().map(|d| d.priority_rank))
            .collect();
        if ranks.len() != n || !ranks.iter().all(|r| (1..=n as u32).contains(r)) {
            return violation(format!("priority ranks are not a permutation of 1..={n}"));
        }

        let deferred: Vec<&TaskId> = self.deferrals.iter().map(|d| &d.task_id).collect();
        if deferred.len() != self.deferred_task_ids.len()
            || deferred.iter().zip(&self.deferred_task_ids).any(|(a, b)| *a != b)
        {
            return violation("deferred_task_ids disagree with deferrals".to_string());
        }

        Ok(())
    }
}
