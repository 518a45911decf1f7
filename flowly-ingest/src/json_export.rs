//! JSON task exports: either `[ {...}, ... ]` or `{ "tasks": [ ... ] }`.
//!
//! Numbers and strings are both accepted for id, priority, and duration.

use anyhow::{Context, Result};
use flowly_core::Task;
use serde::Deserialize;
use serde_json::Value;

use crate::types::{RawTaskRecord, RecordNormalizer};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonExport {
    List(Vec<JsonTaskRecord>),
    Wrapped { tasks: Vec<JsonTaskRecord> },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonTaskRecord {
    id: Value,
    title: Value,
    priority: Value,
    #[serde(alias = "duration")]
    duration_minutes: Value,
    deadline: Value,
    status: Value,
    #[serde(alias = "is_blocked")]
    blocked: Value,
    start_date: Value,
    tags: Value,
}

fn text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Tag lists flatten to the comma-separated form the CSV export uses.
        Value::Array(items) => {
            Some(items.iter().filter_map(text).collect::<Vec<_>>().join(","))
        }
        other => Some(other.to_string()),
    }
}

impl From<&JsonTaskRecord> for RawTaskRecord {
    fn from(r: &JsonTaskRecord) -> Self {
        RawTaskRecord {
            id: text(&r.id),
            title: text(&r.title),
            priority: text(&r.priority),
            duration_minutes: text(&r.duration_minutes),
            deadline: text(&r.deadline),
            status: text(&r.status),
            blocked: text(&r.blocked),
            start_date: text(&r.start_date),
            tags: text(&r.tags),
        }
    }
}

pub fn parse_tasks_json(json: &str, normalizer: &RecordNormalizer) -> Result<Vec<Task>> {
    let export: JsonExport = serde_json::from_str(json).context("parse task export JSON")?;
    let records = match export {
        JsonExport::List(r) | JsonExport::Wrapped { tasks: r } => r,
    };

    Ok(records
        .iter()
        .filter_map(|r| normalizer.to_task(&RawTaskRecord::from(r)))
        .collect())
}
