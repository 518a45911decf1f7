//! Plan store: at most one current plan per (user, day).
//!
//! Writers for the same key are serialized by a per-key lock; writers for
//! different keys never contend. Readers only take the map lock long enough
//! to clone an `Arc`, so they see either the previous plan or the new one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use crate::error::PlanError;
use crate::plan::Plan;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DayKey {
    pub user_id: String,
    /// Calendar day in the plan's timezone.
    pub day: NaiveDate,
}

impl DayKey {
    pub fn new(user_id: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            day,
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user_id, self.day)
    }
}

pub trait PlanStore: Send + Sync {
    /// Unconditionally replace the plan for `key` (last writer wins).
    fn put(&self, key: &DayKey, plan: Plan) -> Result<Arc<Plan>, PlanError>;

    fn get(&self, key: &DayKey) -> Result<Option<Arc<Plan>>, PlanError>;

    /// Run `build` under the key's writer lock; store the result only if it succeeds.
    fn replace_with(
        &self,
        key: &DayKey,
        build: &mut dyn FnMut() -> Result<Plan, PlanError>,
    ) -> Result<Arc<Plan>, PlanError>;

    /// Drop `user_id`'s plans for days before `day`. Returns how many were dropped.
    ///
    /// "Today" is per user timezone, so other users' plans are never touched.
    fn evict_before(&self, _user_id: &str, _day: NaiveDate) -> Result<usize, PlanError> {
        Ok(0)
    }
}

fn poisoned<T>(_: T) -> PlanError {
    PlanError::Store("plan store lock poisoned".to_string())
}

/// One writer mutex per key, created on first use.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<DayKey, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, key: &DayKey) -> Result<Arc<Mutex<()>>, PlanError> {
        let mut locks = self.locks.lock().map_err(poisoned)?;
        Ok(locks.entry(key.clone()).or_default().clone())
    }

    /// Run `f` while holding the writer lock for `key`.
    pub fn with_lock<T>(
        &self,
        key: &DayKey,
        f: impl FnOnce() -> Result<T, PlanError>,
    ) -> Result<T, PlanError> {
        let lock = self.lock_for(key)?;
        let _guard = lock.lock().map_err(poisoned)?;
        f()
    }

    /// Drop `user_id`'s lock entries for days before `day`.
    ///
    /// An entry still referenced outside the table (a writer holding or waiting
    /// on it) is kept, so a key never has two live mutexes.
    pub fn forget_before(&self, user_id: &str, day: NaiveDate) -> Result<(), PlanError> {
        let mut locks = self.locks.lock().map_err(poisoned)?;
        locks.retain(|k, lock| {
            k.user_id != user_id || k.day >= day || Arc::strong_count(lock) > 1
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPlanStore {
    writers: KeyedLocks,
    plans: RwLock<HashMap<DayKey, Arc<Plan>>>,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.plans.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn swap(&self, key: &DayKey, plan: Plan) -> Result<Arc<Plan>, PlanError> {
        let plan = Arc::new(plan);
        self.plans
            .write()
            .map_err(poisoned)?
            .insert(key.clone(), Arc::clone(&plan));
        Ok(plan)
    }
}

impl PlanStore for InMemoryPlanStore {
    fn put(&self, key: &DayKey, plan: Plan) -> Result<Arc<Plan>, PlanError> {
        self.writers.with_lock(key, || self.swap(key, plan))
    }

    fn get(&self, key: &DayKey) -> Result<Option<Arc<Plan>>, PlanError> {
        Ok(self.plans.read().map_err(poisoned)?.get(key).cloned())
    }

    fn replace_with(
        &self,
        key: &DayKey,
        build: &mut dyn FnMut() -> Result<Plan, PlanError>,
    ) -> Result<Arc<Plan>, PlanError> {
        self.writers.with_lock(key, || {
            let plan = build()?;
            self.swap(key, plan)
        })
    }

    fn evict_before(&self, user_id: &str, day: NaiveDate) -> Result<usize, PlanError> {
        let mut plans = self.plans.write().map_err(poisoned)?;
        let before = plans.len();
        plans.retain(|k, _| k.user_id != user_id || k.day >= day);
        let evicted = before - plans.len();
        drop(plans);
        self.writers.forget_before(user_id, day)?;
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlanConfig;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn empty_plan(d: u32) -> Plan {
        let start = Tz::UTC.with_ymd_and_hms(2026, 2, d, 9, 0, 0).unwrap();
        Plan {
            generated_at: Utc.with_ymd_and_hms(2026, 2, d, 8, 0, 0).unwrap(),
            timezone: Tz::UTC,
            day: day(d),
            day_start: start.fixed_offset(),
            day_end: (start + chrono::Duration::hours(8)).fixed_offset(),
            config: PlanConfig::default(),
            entries: vec![],
            breaks: vec![],
            deferrals: vec![],
            deferred_task_ids: vec![],
        }
    }

    #[test]
    fn get_missing_is_none() {
        let store = InMemoryPlanStore::new();
        assert!(store.get(&DayKey::new("u1", day(3))).unwrap().is_none());
    }

    #[test]
    fn put_replaces_previous_plan() {
        let store = InMemoryPlanStore::new();
        let key = DayKey::new("u1", day(3));

        store.put(&key, empty_plan(3)).unwrap();
        let mut second = empty_plan(3);
        second.generated_at = Utc.with_ymd_and_hms(2026, 2, 3, 10, 0, 0).unwrap();
        store.put(&key, second.clone()).unwrap();

        assert_eq!(*store.get(&key).unwrap().unwrap(), second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn failed_build_leaves_previous_plan() {
        let store = InMemoryPlanStore::new();
        let key = DayKey::new("u1", day(3));
        let original = store.put(&key, empty_plan(3)).unwrap();

        let err = store
            .replace_with(&key, &mut || -> Result<Plan, PlanError> {
                Err(PlanError::TaskSource("offline".into()))
            })
            .unwrap_err();
        assert!(matches!(err, PlanError::TaskSource(_)));
        assert!(Arc::ptr_eq(&store.get(&key).unwrap().unwrap(), &original));
    }

    #[test]
    fn keys_are_per_user_and_day() {
        let store = InMemoryPlanStore::new();
        store.put(&DayKey::new("u1", day(3)), empty_plan(3)).unwrap();
        store.put(&DayKey::new("u2", day(3)), empty_plan(3)).unwrap();
        store.put(&DayKey::new("u1", day(4)), empty_plan(4)).unwrap();
        assert_eq!(store.len(), 3);

        assert_eq!(store.evict_before("u1", day(4)).unwrap(), 1);
        assert!(store.get(&DayKey::new("u1", day(3))).unwrap().is_none());
        assert!(store.get(&DayKey::new("u1", day(4))).unwrap().is_some());
        // u2 is still on day 3 in its own timezone.
        assert!(store.get(&DayKey::new("u2", day(3))).unwrap().is_some());
    }

    #[test]
    fn forget_keeps_locks_that_are_in_use() {
        let locks = KeyedLocks::new();
        let old = DayKey::new("u1", day(3));
        let held = locks.lock_for(&old).unwrap();
        locks.lock_for(&DayKey::new("u2", day(3))).unwrap();

        locks.forget_before("u1", day(4)).unwrap();
        assert_eq!(locks.len(), 2);
        assert!(Arc::ptr_eq(&held, &locks.lock_for(&old).unwrap()));

        drop(held);
        locks.forget_before("u1", day(4)).unwrap();
        assert_eq!(locks.len(), 1);
    }
}
