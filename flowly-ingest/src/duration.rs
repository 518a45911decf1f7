//! Loose duration parsing for task exports.
//!
//! Accepted shapes:
//!   90, 90.0  -> 90
//!   45m, 45 min, 45 minutes
//!   2h, 1.5h, 1h 30m, 1hr30min

use anyhow::Result;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct DurationParser {
    plain_re: Regex,
    units_re: Regex,
}

impl DurationParser {
    pub fn new() -> Result<Self> {
        let plain_re = Regex::new(r"^-?\d+$")?;
        let units_re = Regex::new(concat!(
            r"(?i)^(?:(?P<h>\d+(?:\.\d+)?)\s*h(?:ours?|rs?)?)?\s*",
            r"(?:(?P<m>\d+)\s*m(?:in(?:ute)?s?)?)?$"
        ))?;
        Ok(Self { plain_re, units_re })
    }

    /// Minutes, or `None` when the text is not a recognizable duration.
    ///
    /// Non-positive values are returned as-is; the scheduler's filter replaces them.
    pub fn parse_minutes(&self, text: &str) -> Option<i64> {
        let s = text.trim();
        if s.is_empty() {
            return None;
        }
        if self.plain_re.is_match(s) {
            return s.parse().ok();
        }
        if let Ok(f) = s.parse::<f64>() {
            return whole_minutes(f);
        }

        let caps = self.units_re.captures(s)?;
        if caps.name("h").is_none() && caps.name("m").is_none() {
            return None;
        }
        let hours: f64 = caps
            .name("h")
            .map_or(Ok(0.0), |h| h.as_str().parse())
            .ok()?;
        let minutes: i64 = caps
            .name("m")
            .map_or(Ok(0), |m| m.as_str().parse())
            .ok()?;

        whole_minutes(hours * 60.0)?.checked_add(minutes)
    }
}

/// `None` for NaN, infinities and values outside the `i64` range.
fn whole_minutes(minutes: f64) -> Option<i64> {
    const LIMIT: f64 = i64::MAX as f64;
    let rounded = minutes.round();
    (rounded.is_finite() && rounded.abs() < LIMIT).then_some(rounded as i64)
}
