//! Timeline packer: greedy single pass over ranked tasks into a bounded workday.
//!
//! Rules:
//! - a task that cannot fit in an empty day is deferred (`exceeds_workday_capacity`)
//! - a task that does not fit in the remaining time is deferred and the pass continues,
//!   so a later, shorter task can still use the gap
//! - every placed task is followed by a short break; every `long_break_every`-th
//!   placement gets a long break instead
//! - breaks are truncated at the end of the workday and never un-place a task
//!
//! There is no backtracking: once placed, a task keeps its slot.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::PlanConfig;
use crate::filter::EligibleTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferReason {
    ExceedsWorkdayCapacity,
    InsufficientRemainingTime,
    DayFull,
}

impl DeferReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DeferReason::ExceedsWorkdayCapacity => "exceeds_workday_capacity",
            DeferReason::InsufficientRemainingTime => "insufficient_remaining_time",
            DeferReason::DayFull => "day_full",
        }
    }
}

impl fmt::Display for DeferReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    Short,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackSettings {
    pub workday_minutes: i64,
    pub short_break_minutes: i64,
    pub long_break_minutes: i64,
    pub long_break_every: u32,
}

impl From<&PlanConfig> for PackSettings {
    fn from(cfg: &PlanConfig) -> Self {
        Self {
            workday_minutes: cfg.workday_minutes(),
            short_break_minutes: i64::from(cfg.short_break_minutes),
            long_break_minutes: i64::from(cfg.long_break_minutes),
            long_break_every: cfg.long_break_every.max(1),
        }
    }
}

/// `rank_index` points into the ranked slice handed to [`pack_timeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub rank_index: usize,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deferral {
    pub rank_index: usize,
    pub reason: DeferReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakSlot {
    pub kind: BreakKind,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOutcome {
    pub day_start: DateTime<Tz>,
    pub budget_end: DateTime<Tz>,
    pub placed: Vec<Placement>,
    pub deferred: Vec<Deferral>,
    /// Breaks between placed tasks; zero-length and trailing breaks are dropped.
    pub breaks: Vec<BreakSlot>,
    pub work_minutes: i64,
}

pub fn pack_timeline(
    ranked: &[EligibleTask],
    day_start: DateTime<Tz>,
    settings: &PackSettings,
) -> PackOutcome {
    let budget_end = day_start + Duration::minutes(settings.workday_minutes);

    let mut cursor = day_start;
    let mut elapsed_work_minutes = 0i64;
    let mut since_long_break = 0u32;
    let mut trailing_break = false;

    let mut placed = Vec::new();
    let mut deferred = Vec::new();
    let mut breaks = Vec::new();

    for (rank_index, task) in ranked.iter().enumerate() {
        let reason = if cursor >= budget_end {
            Some(DeferReason::DayFull)
        } else if task.over_capacity || task.duration_minutes > settings.workday_minutes {
            Some(DeferReason::ExceedsWorkdayCapacity)
        } else if cursor + Duration::minutes(task.duration_minutes) > budget_end {
            Some(DeferReason::InsufficientRemainingTime)
        } else {
            None
        };

        if let Some(reason) = reason {
            debug!(task_id = %task.id(), %reason, "deferring task");
            deferred.push(Deferral { rank_index, reason });
            continue;
        }

        let end = cursor + Duration::minutes(task.duration_minutes);
        placed.push(Placement {
            rank_index,
            start: cursor,
            end,
        });
        cursor = end;
        elapsed_work_minutes += task.duration_minutes;
        since_long_break += 1;
        trailing_break = false;

        let (kind, minutes) = if since_long_break >= settings.long_break_every {
            since_long_break = 0;
            (BreakKind::Long, settings.long_break_minutes)
        } else {
            (BreakKind::Short, settings.short_break_minutes)
        };
        let break_end = (cursor + Duration::minutes(minutes)).min(budget_end);
        if break_end > cursor {
            breaks.push(BreakSlot {
                kind,
                start: cursor,
                end: break_end,
            });
            cursor = break_end;
            trailing_break = true;
        }
    }

    if trailing_break {
        breaks.pop();
    }

    PackOutcome {
        day_start,
        budget_end,
        placed,
        deferred,
        breaks,
        work_minutes: elapsed_work_minutes,
    }
}
