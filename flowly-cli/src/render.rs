//! Plain-text rendering of a plan for the terminal.

use chrono::{DateTime, FixedOffset};
use flowly_core::{BreakKind, Plan};
use std::fmt::Write;

fn hm(t: &DateTime<FixedOffset>) -> String {
    t.format("%H:%M").to_string()
}

pub fn render_plan(plan: &Plan) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Plan for {} ({})\n", plan.day, plan.timezone);
    let _ = writeln!(
        out,
        "Workday {}-{}, generated {}\n",
        hm(&plan.day_start),
        hm(&plan.day_end),
        plan.generated_at.to_rfc3339()
    );

    if plan.entries.is_empty() {
        out.push_str("All clear for today: nothing scheduled.\n");
    }

    // Entries and breaks interleaved by start time.
    let mut rows: Vec<(DateTime<FixedOffset>, String)> = Vec::new();
    for e in &plan.entries {
        let mut line = format!(
            "{}-{}  #{:<2} {} (p{}, {}m)",
            hm(&e.planned_start),
            hm(&e.planned_end),
            e.priority_rank,
            e.task.title,
            e.task.priority.level(),
            e.duration_minutes
        );
        if let Some(note) = &e.note {
            let _ = write!(line, " [{note}]");
        }
        rows.push((e.planned_start, line));
    }
    for b in &plan.breaks {
        let kind = match b.kind {
            BreakKind::Short => "short break",
            BreakKind::Long => "long break",
        };
        rows.push((b.start, format!("{}-{}      {kind}", hm(&b.start), hm(&b.end))));
    }
    rows.sort_by_key(|(start, _)| *start);
    for (_, line) in rows {
        let _ = writeln!(out, "{line}");
    }

    if !plan.deferrals.is_empty() {
        out.push_str("\n## Deferred\n\n");
        for d in &plan.deferrals {
            let _ = writeln!(
                out,
                "- #{} {} ({}){}",
                d.priority_rank,
                d.task.title,
                d.task_id,
                d.note.as_deref().map(|n| format!(": {n}")).unwrap_or_default()
            );
        }
    }

    let s = plan.summary();
    out.push_str("\n## Summary\n\n");
    let _ = writeln!(
        out,
        "{} planned, {} deferred | {} min of work ({}% of {} min) | {} min of breaks",
        s.planned_tasks,
        s.deferred_tasks,
        s.planned_minutes,
        s.capacity_used_percent,
        s.capacity_minutes,
        s.break_minutes
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use flowly_core::{build_plan, PlanConfig, Task};

    #[test]
    fn renders_schedule_breaks_and_deferrals() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 7, 0, 0).unwrap();
        let tasks = vec![
            Task::new("a", "Write report").with_duration(60),
            Task::new("b", "Review PR").with_duration(30),
            Task::new("c", "Migrate database").with_duration(900),
        ];
        let plan = build_plan(&tasks, &PlanConfig::default(), now).unwrap();
        let text = render_plan(&plan);

        assert!(text.contains("# Plan for 2026-03-04 (UTC)"));
        assert!(text.contains("09:00-09:30  #1  Review PR"));
        assert!(text.contains("09:30-09:45      short break"));
        assert!(text.contains("09:45-10:45  #2  Write report"));
        assert!(text.contains("- #3 Migrate database (c): exceeds_workday_capacity"));
        assert!(text.contains("2 planned, 1 deferred"));
    }

    #[test]
    fn empty_plan_says_all_clear() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 7, 0, 0).unwrap();
        let plan = build_plan(&[], &PlanConfig::default(), now).unwrap();
        assert!(render_plan(&plan).contains("All clear for today"));
    }
}
