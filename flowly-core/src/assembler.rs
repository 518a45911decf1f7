//! Plan assembler: turns ranked + packed tasks into a `Plan` record.

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::PlanConfig;
use crate::filter::EligibleTask;
use crate::packer::{DeferReason, PackOutcome};
use crate::plan::{Plan, PlanBreak, PlanDeferral, PlanEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoteCode {
    Overdue,
    DurationDefaulted,
    Deferred(DeferReason),
}

impl NoteCode {
    fn as_str(self) -> &'static str {
        match self {
            NoteCode::Overdue => "overdue",
            NoteCode::DurationDefaulted => "duration_defaulted",
            NoteCode::Deferred(reason) => reason.as_str(),
        }
    }
}

fn note_for(task: &EligibleTask, deferred: Option<DeferReason>) -> Option<String> {
    let mut codes = Vec::new();
    if let Some(reason) = deferred {
        codes.push(NoteCode::Deferred(reason));
    }
    if task.overdue {
        codes.push(NoteCode::Overdue);
    }
    if task.duration_defaulted {
        codes.push(NoteCode::DurationDefaulted);
    }

    if codes.is_empty() {
        None
    } else {
        Some(codes.iter().map(|c| c.as_str()).collect::<Vec<_>>().join("; "))
    }
}

/// `ranked` must be the same slice the packer ran over; rank = index + 1.
pub fn assemble_plan(
    ranked: &[EligibleTask],
    packed: &PackOutcome,
    config: &PlanConfig,
    day: NaiveDate,
    now: DateTime<Utc>,
) -> Plan {
    let rank_of = |i: usize| (i + 1) as u32;

    let entries = packed
        .placed
        .iter()
        .map(|p| {
            let t = &ranked[p.rank_index];
            PlanEntry {
                task_id: t.id().clone(),
                priority_rank: rank_of(p.rank_index),
                planned_start: p.start.fixed_offset(),
                planned_end: p.end.fixed_offset(),
                duration_minutes: t.duration_minutes,
                note: note_for(t, None),
                task: t.task.clone(),
            }
        })
        .collect();

    let deferrals: Vec<PlanDeferral> = packed
        .deferred
        .iter()
        .map(|d| {
            let t = &ranked[d.rank_index];
            PlanDeferral {
                task_id: t.id().clone(),
                priority_rank: rank_of(d.rank_index),
                reason: d.reason,
                note: note_for(t, Some(d.reason)),
                task: t.task.clone(),
            }
        })
        .collect();

    let breaks = packed
        .breaks
        .iter()
        .map(|b| PlanBreak {
            kind: b.kind,
            start: b.start.fixed_offset(),
            end: b.end.fixed_offset(),
        })
        .collect();

    Plan {
        generated_at: now,
        timezone: config.timezone,
        day,
        day_start: packed.day_start.fixed_offset(),
        day_end: packed.budget_end.fixed_offset(),
        config: config.clone(),
        entries,
        breaks,
        deferred_task_ids: deferrals.iter().map(|d| d.task_id.clone()).collect(),
        deferrals,
    }
}
