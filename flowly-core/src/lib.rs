//! flowly-core: the daily plan scheduler.
//!
//! Given a user's open tasks, produce one non-overlapping, time-boxed schedule
//! for today: filter -> rank -> pack (with breaks) -> assemble -> store.

pub mod assembler;
pub mod config;
pub mod error;
pub mod filter;
pub mod packer;
pub mod plan;
pub mod ranker;
pub mod scheduler;
pub mod store;
pub mod task;
pub mod time;

pub use assembler::assemble_plan;
pub use config::{PlanConfig, PlanRequest};
pub use error::PlanError;
pub use filter::{filter_tasks, EligibleTask, FilterNotice, FilterOutcome, FilterReason};
pub use packer::{pack_timeline, BreakKind, DeferReason, PackOutcome, PackSettings};
pub use plan::{Plan, PlanBreak, PlanDeferral, PlanEntry, PlanSummary};
pub use ranker::rank_tasks;
pub use scheduler::{build_plan, Clock, DailyPlanner, FixedClock, SystemClock, TaskSource};
pub use store::{DayKey, InMemoryPlanStore, KeyedLocks, PlanStore};
pub use task::{Priority, Task, TaskId, TaskStatus};
