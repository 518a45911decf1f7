//! CSV task exports.
//!
//! Header row required; columns are matched by name, order free:
//! id,title,priority,duration_minutes,deadline,status

use anyhow::{Context, Result};
use flowly_core::Task;
use std::io::Read;
use tracing::warn;

use crate::types::{RawTaskRecord, RecordNormalizer};

pub fn parse_tasks_csv(reader: impl Read, normalizer: &RecordNormalizer) -> Result<Vec<Task>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Column names are matched case-insensitively.
    let headers: csv::StringRecord = rdr
        .headers()
        .context("read CSV header")?
        .iter()
        .map(str::to_ascii_lowercase)
        .collect();
    if !headers.iter().any(|h| h == "id") {
        anyhow::bail!("CSV export has no 'id' column (headers: {:?})", headers);
    }
    rdr.set_headers(headers);

    let mut tasks = Vec::new();
    for (line, result) in rdr.deserialize::<RawTaskRecord>().enumerate() {
        let raw = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(row = line + 2, error = %e, "skipping unreadable CSV row");
                continue;
            }
        };
        if let Some(task) = normalizer.to_task(&raw) {
            tasks.push(task);
        }
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;
    use flowly_core::TaskStatus;

    #[test]
    fn parses_columns_by_name() {
        let csv = "\
title,id,status,priority,duration_minutes,deadline
Fix bug,1,todo,1,90,
Write docs,2,done,3,,2026-02-20
Plan sprint,3,in_progress,2,1h,2026-02-20 17:00
";
        let n = RecordNormalizer::new(Tz::UTC).unwrap();
        let tasks = parse_tasks_csv(csv.as_bytes(), &n).unwrap();

        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].id, "1");
        assert_eq!(tasks[0].duration_minutes, Some(90));
        assert_eq!(tasks[0].deadline, None);
        assert_eq!(tasks[1].status, TaskStatus::Completed);
        assert_eq!(tasks[1].duration_minutes, None);
        assert_eq!(tasks[2].duration_minutes, Some(60));
        assert_eq!(
            tasks[2].deadline.unwrap().to_rfc3339(),
            "2026-02-20T17:00:00+00:00"
        );
    }

    #[test]
    fn header_case_is_ignored() {
        let csv = "ID,Title,Duration_Minutes,STATUS\n9,Shout,15,TODO\n";
        let n = RecordNormalizer::new(Tz::UTC).unwrap();
        let tasks = parse_tasks_csv(csv.as_bytes(), &n).unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "9");
        assert_eq!(tasks[0].title, "Shout");
        assert_eq!(tasks[0].duration_minutes, Some(15));
        assert_eq!(tasks[0].status, TaskStatus::Pending);
    }

    #[test]
    fn missing_id_column_is_an_error() {
        let n = RecordNormalizer::new(Tz::UTC).unwrap();
        assert!(parse_tasks_csv("title,status\nx,todo\n".as_bytes(), &n).is_err());
    }
}
