//! Planning configuration: request-level overrides resolved into an effective config.

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::time::{parse_clock_time, parse_timezone};

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_WORKDAY_HOURS: i64 = 8;
pub const DEFAULT_LONG_BREAK_MINUTES: i64 = 60;
pub const DEFAULT_SHORT_BREAK_MINUTES: i64 = 15;
pub const DEFAULT_DAY_START: &str = "09:00";
pub const DEFAULT_DURATION_MINUTES: i64 = 30;
pub const DEFAULT_LONG_BREAK_EVERY: i64 = 4;

/// Caller-supplied planning options. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanRequest {
    pub timezone: Option<String>,
    pub workday_hours: Option<i64>,
    pub long_break_minutes: Option<i64>,
    pub short_break_minutes: Option<i64>,
    /// Local wall-clock start of the workday, "HH:MM".
    pub day_start: Option<String>,
    pub default_duration_minutes: Option<i64>,
    /// Number of consecutive placed tasks after which a long break replaces the short one.
    pub long_break_every: Option<i64>,
}

impl PlanRequest {
    /// Fill unset fields from `base`; fields set on `self` win.
    pub fn or(self, base: &PlanRequest) -> PlanRequest {
        PlanRequest {
            timezone: self.timezone.or_else(|| base.timezone.clone()),
            workday_hours: self.workday_hours.or(base.workday_hours),
            long_break_minutes: self.long_break_minutes.or(base.long_break_minutes),
            short_break_minutes: self.short_break_minutes.or(base.short_break_minutes),
            day_start: self.day_start.or_else(|| base.day_start.clone()),
            default_duration_minutes: self
                .default_duration_minutes
                .or(base.default_duration_minutes),
            long_break_every: self.long_break_every.or(base.long_break_every),
        }
    }

    pub fn resolve(&self) -> Result<PlanConfig, PlanError> {
        PlanConfig::resolve(self)
    }
}

/// Effective, validated configuration stamped onto every plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    pub timezone: Tz,
    pub workday_hours: u32,
    pub long_break_minutes: u32,
    pub short_break_minutes: u32,
    pub day_start: NaiveTime,
    pub default_duration_minutes: u32,
    pub long_break_every: u32,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            workday_hours: DEFAULT_WORKDAY_HOURS as u32,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES as u32,
            short_break_minutes: DEFAULT_SHORT_BREAK_MINUTES as u32,
            day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            default_duration_minutes: DEFAULT_DURATION_MINUTES as u32,
            long_break_every: DEFAULT_LONG_BREAK_EVERY as u32,
        }
    }
}

impl PlanConfig {
    /// Validate a request and apply documented defaults.
    pub fn resolve(req: &PlanRequest) -> Result<Self, PlanError> {
        let timezone = parse_timezone(req.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE))
            .map_err(|e| PlanError::validation(e.to_string()))?;
        let day_start = parse_clock_time(req.day_start.as_deref().unwrap_or(DEFAULT_DAY_START))
            .map_err(|e| PlanError::validation(e.to_string()))?;

        let workday_hours = req.workday_hours.unwrap_or(DEFAULT_WORKDAY_HOURS);
        if !(1..=24).contains(&workday_hours) {
            return Err(PlanError::validation(format!(
                "workday_hours must be 1..=24, got {workday_hours}"
            )));
        }

        Ok(Self {
            timezone,
            workday_hours: workday_hours as u32,
            long_break_minutes: non_negative(
                "long_break_minutes",
                req.long_break_minutes.unwrap_or(DEFAULT_LONG_BREAK_MINUTES),
            )?,
            short_break_minutes: non_negative(
                "short_break_minutes",
                req.short_break_minutes.unwrap_or(DEFAULT_SHORT_BREAK_MINUTES),
            )?,
            day_start,
            default_duration_minutes: positive(
                "default_duration_minutes",
                req.default_duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            )?,
            long_break_every: positive(
                "long_break_every",
                req.long_break_every.unwrap_or(DEFAULT_LONG_BREAK_EVERY),
            )?,
        })
    }

    pub fn workday_minutes(&self) -> i64 {
        i64::from(self.workday_hours) * 60
    }
}

fn non_negative(field: &str, value: i64) -> Result<u32, PlanError> {
    u32::try_from(value)
        .map_err(|_| PlanError::validation(format!("{field} must be >= 0, got {value}")))
}

fn positive(field: &str, value: i64) -> Result<u32, PlanError> {
    match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(PlanError::validation(format!("{field} must be > 0, got {value}"))),
    }
}
