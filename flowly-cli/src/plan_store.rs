//! File-backed plan store: one JSON document per (user, day).
//!
//! Layout: `<root>/<user>/<YYYY-MM-DD>.json`. Writes go to a temp file that is
//! renamed over the target, so a reader sees the old document or the new one.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use flowly_core::{DayKey, KeyedLocks, Plan, PlanError, PlanStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Debug)]
pub struct FilePlanStore {
    root: PathBuf,
    writers: KeyedLocks,
}

fn store_error(e: anyhow::Error) -> PlanError {
    error!(error = %format!("{e:#}"), "plan store failure");
    PlanError::Store(format!("{e:#}"))
}

/// Injective mapping from a user id to a single path component.
///
/// Bytes outside `[A-Za-z0-9._-]` are written as `%XX` (and so is `%` itself);
/// the `u-` prefix keeps `.`, `..` and the empty id from naming a special entry.
fn user_dir_name(user_id: &str) -> String {
    let mut out = String::with_capacity(user_id.len() + 2);
    out.push_str("u-");
    for b in user_id.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.') {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

impl FilePlanStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            writers: KeyedLocks::new(),
        }
    }

    pub fn path_for(&self, key: &DayKey) -> PathBuf {
        self.root
            .join(user_dir_name(&key.user_id))
            .join(format!("{}.json", key.day))
    }

    fn write(&self, key: &DayKey, plan: &Plan) -> Result<()> {
        let path = self.path_for(key);
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

        let json = serde_json::to_string_pretty(plan).context("serialize plan")?;
        let tmp = path.with_extension(format!("json.tmp-{}", std::process::id()));
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;

        debug!(path = %path.display(), "plan written");
        Ok(())
    }

    fn read(path: &Path) -> Result<Option<Plan>> {
        if !path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let plan = serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(Some(plan))
    }

    fn store(&self, key: &DayKey, plan: Plan) -> Result<Arc<Plan>, PlanError> {
        self.write(key, &plan).map_err(store_error)?;
        Ok(Arc::new(plan))
    }
}

impl PlanStore for FilePlanStore {
    fn put(&self, key: &DayKey, plan: Plan) -> Result<Arc<Plan>, PlanError> {
        self.writers.with_lock(key, || self.store(key, plan))
    }

    fn get(&self, key: &DayKey) -> Result<Option<Arc<Plan>>, PlanError> {
        Ok(Self::read(&self.path_for(key)).map_err(store_error)?.map(Arc::new))
    }

    fn replace_with(
        &self,
        key: &DayKey,
        build: &mut dyn FnMut() -> Result<Plan, PlanError>,
    ) -> Result<Arc<Plan>, PlanError> {
        self.writers.with_lock(key, || {
            let plan = build()?;
            self.store(key, plan)
        })
    }

    /// Old plans stay on disk as history; only the lock table is trimmed.
    fn evict_before(&self, user_id: &str, day: NaiveDate) -> Result<usize, PlanError> {
        self.writers.forget_before(user_id, day)?;
        Ok(0)
    }
}
