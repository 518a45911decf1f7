//! Priority ranker: a total order over eligible tasks.
//!
//! Ordering, most significant first:
//! - overdue before not overdue
//! - priority ASC (1 best)
//! - deadline ASC, and any deadline before none
//! - duration ASC (quick wins first)
//! - id ASC

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::filter::{is_overdue, EligibleTask};

#[derive(Debug, Clone, PartialEq, Eq)]
struct RankKey<'a> {
    overdue: bool,
    priority: u8,
    deadline: Option<DateTime<Utc>>,
    duration_minutes: i64,
    id: &'a str,
}

impl<'a> RankKey<'a> {
    fn of(task: &'a EligibleTask, now: DateTime<Utc>) -> Self {
        Self {
            overdue: is_overdue(task.deadline, now),
            priority: task.priority.level(),
            deadline: task.deadline,
            duration_minutes: task.duration_minutes,
            id: task.id(),
        }
    }
}

impl PartialOrd for RankKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // `true` sorts after `false`, so compare overdue reversed.
        other
            .overdue
            .cmp(&self.overdue)
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| match (self.deadline, other.deadline) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| self.duration_minutes.cmp(&other.duration_minutes))
            .then_with(|| self.id.cmp(other.id))
    }
}

/// Compare two eligible tasks under the ranking order.
pub fn compare(a: &EligibleTask, b: &EligibleTask, now: DateTime<Utc>) -> Ordering {
    RankKey::of(a, now).cmp(&RankKey::of(b, now))
}

/// Sort eligible tasks into rank order. Position `i` gets `priority_rank = i + 1`.
pub fn rank_tasks(mut tasks: Vec<EligibleTask>, now: DateTime<Utc>) -> Vec<EligibleTask> {
    tasks.sort_by(|a, b| compare(a, b, now));
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlanConfig;
    use crate::filter::filter_tasks;
    use crate::task::{Priority, Task};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 21, 8, 0, 0).unwrap()
    }

    fn ranked_ids(tasks: Vec<Task>) -> Vec<String> {
        let eligible = filter_tasks(&tasks, &PlanConfig::default(), now()).eligible;
        rank_tasks(eligible, now())
            .into_iter()
            .map(|e| e.task.id)
            .collect()
    }

    #[test]
    fn overdue_low_priority_beats_fresh_high_priority() {
        let ids = ranked_ids(vec![
            Task::new("fresh", "p1").with_priority(Priority::Critical),
            Task::new("late", "p5")
                .with_priority(Priority::Minimal)
                .with_deadline(now() - Duration::hours(2)),
        ]);
        assert_eq!(ids, vec!["late", "fresh"]);
    }

    #[test]
    fn priority_then_deadline_then_duration_then_id() {
        let ids = ranked_ids(vec![
            Task::new("p3", "medium").with_priority(Priority::Medium),
            Task::new("p2-none", "no deadline").with_priority(Priority::High),
            Task::new("p2-late", "later deadline")
                .with_priority(Priority::High)
                .with_deadline(now() + Duration::days(2)),
            Task::new("p2-soon", "sooner deadline")
                .with_priority(Priority::High)
                .with_deadline(now() + Duration::days(1)),
            Task::new("p1-b", "long")
                .with_priority(Priority::Critical)
                .with_duration(90),
            Task::new("p1-a", "short")
                .with_priority(Priority::Critical)
                .with_duration(20),
            Task::new("p1-c", "short twin")
                .with_priority(Priority::Critical)
                .with_duration(20),
        ]);
        assert_eq!(
            ids,
            vec!["p1-a", "p1-c", "p1-b", "p2-soon", "p2-late", "p2-none", "p3"]
        );
    }

    #[test]
    fn ranking_ignores_input_order() {
        let tasks = vec![
            Task::new("b", "b").with_duration(30),
            Task::new("a", "a").with_duration(30),
            Task::new("c", "c").with_duration(10),
        ];
        let mut reversed = tasks.clone();
        reversed.reverse();
        assert_eq!(ranked_ids(tasks), ranked_ids(reversed));
    }
}
