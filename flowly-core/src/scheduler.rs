//! Daily planner: wires the task source and the plan store around the pipeline.
//!
//! Pipeline: filter -> rank -> pack -> assemble -> verify -> store.
//! The pipeline itself is pure; the only shared state is the store.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{error, info, info_span, warn};

use crate::assembler::assemble_plan;
use crate::config::{PlanConfig, PlanRequest};
use crate::error::PlanError;
use crate::filter::filter_tasks;
use crate::packer::{pack_timeline, PackSettings};
use crate::plan::Plan;
use crate::ranker::rank_tasks;
use crate::store::{DayKey, PlanStore};
use crate::task::Task;
use crate::time::{local_day, parse_timezone, workday_start};

/// Read access to the external task store.
pub trait TaskSource {
    /// All tasks for the user, unpaginated.
    fn tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, PlanError>;
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Build a plan for the day containing `now` (in the configured timezone).
///
/// Deterministic: the same snapshot, config, and `now` always produce the same plan.
pub fn build_plan(
    tasks: &[Task],
    config: &PlanConfig,
    now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let day = local_day(now, config.timezone);
    let day_start = workday_start(day, config.day_start, config.timezone);

    let filtered = filter_tasks(tasks, config, now);
    let ranked = rank_tasks(filtered.eligible, now);
    let packed = pack_timeline(&ranked, day_start, &PackSettings::from(config));
    let plan = assemble_plan(&ranked, &packed, config, day, now);

    if let Err(e) = plan.verify() {
        error!(error = %e, "assembled plan failed verification");
        return Err(e);
    }

    info!(
        day = %day,
        placed = plan.entries.len(),
        deferred = plan.deferrals.len(),
        rejected = filtered.rejected.len(),
        repaired = filtered.repaired.len(),
        "plan built"
    );
    Ok(plan)
}

pub struct DailyPlanner<S, P, C = SystemClock> {
    source: S,
    store: P,
    clock: C,
    /// Defaults applied under every request.
    base: PlanRequest,
}

impl<S: TaskSource, P: PlanStore> DailyPlanner<S, P, SystemClock> {
    pub fn new(source: S, store: P) -> Self {
        Self::with_clock(source, store, SystemClock)
    }
}

impl<S: TaskSource, P: PlanStore, C: Clock> DailyPlanner<S, P, C> {
    pub fn with_clock(source: S, store: P, clock: C) -> Self {
        Self {
            source,
            store,
            clock,
            base: PlanRequest::default(),
        }
    }

    pub fn with_defaults(mut self, base: PlanRequest) -> Self {
        self.base = base;
        self
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    /// Recompute today's plan from current task state and replace the stored one.
    ///
    /// Config errors are raised before any task is read. Any failure leaves the
    /// previously stored plan untouched.
    pub fn generate_plan(
        &self,
        user_id: &str,
        request: &PlanRequest,
    ) -> Result<Arc<Plan>, PlanError> {
        let config = request.clone().or(&self.base).resolve()?;
        let now = self.clock.now();
        let key = DayKey::new(user_id, local_day(now, config.timezone));

        let span = info_span!("generate_plan", key = %key);
        let _enter = span.enter();

        // The snapshot is read under the writer lock so a slower request can
        // never overwrite a plan built from newer task state.
        let plan = self.store.replace_with(&key, &mut || -> Result<Plan, PlanError> {
            let tasks = self.source.tasks_for_user(user_id)?;
            build_plan(&tasks, &config, now)
        });

        match &plan {
            Ok(_) => {
                if let Err(e) = self.store.evict_before(&key.user_id, key.day) {
                    warn!(error = %e, "failed to evict stale plans");
                }
            }
            Err(e) => warn!(error = %e, "plan generation failed; previous plan kept"),
        }
        plan
    }

    /// Today's stored plan, without recomputation.
    pub fn current_plan(
        &self,
        user_id: &str,
        timezone: Option<&str>,
    ) -> Result<Arc<Plan>, PlanError> {
        let tz = self.resolve_timezone(timezone)?;
        let key = DayKey::new(user_id, local_day(self.clock.now(), tz));
        self.store.get(&key)?.ok_or(PlanError::NotFound(key))
    }

    fn resolve_timezone(&self, timezone: Option<&str>) -> Result<Tz, PlanError> {
        match timezone.or(self.base.timezone.as_deref()) {
            Some(tz) => parse_timezone(tz).map_err(|e| PlanError::validation(e.to_string())),
            None => Ok(PlanConfig::default().timezone),
        }
    }
}
