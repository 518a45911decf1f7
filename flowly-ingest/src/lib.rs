//! flowly-ingest: loads task snapshots exported by the external task store
//! (JSON or CSV) and normalizes them into `flowly_core::Task`.

pub mod csv_export;
pub mod duration;
pub mod json_export;
pub mod types;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use flowly_core::Task;
use std::fs;
use std::path::Path;

pub use csv_export::parse_tasks_csv;
pub use duration::DurationParser;
pub use json_export::parse_tasks_json;
pub use types::{RawTaskRecord, RecordNormalizer};

/// Load a task export, choosing the format by file extension (`.csv`, otherwise JSON).
///
/// Local-time deadlines are interpreted in `tz`.
pub fn load_tasks(path: impl AsRef<Path>, tz: Tz) -> Result<Vec<Task>> {
    let path = path.as_ref();
    let normalizer = RecordNormalizer::new(tz)?;

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
        parse_tasks_csv(file, &normalizer).with_context(|| format!("parsing {}", path.display()))
    } else {
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        parse_tasks_json(&s, &normalizer).with_context(|| format!("parsing {}", path.display()))
    }
}
