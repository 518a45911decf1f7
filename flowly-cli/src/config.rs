use anyhow::{Context, Result};
use flowly_core::config::{
    DEFAULT_DAY_START, DEFAULT_DURATION_MINUTES, DEFAULT_LONG_BREAK_EVERY,
    DEFAULT_LONG_BREAK_MINUTES, DEFAULT_SHORT_BREAK_MINUTES, DEFAULT_TIMEZONE,
    DEFAULT_WORKDAY_HOURS,
};
use flowly_core::PlanRequest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_flowly_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub user: UserSection,
    /// Planner defaults; command-line flags override these.
    #[serde(default)]
    pub planner: PlanRequest,
    #[serde(default)]
    pub tasks: TasksSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSection {
    pub id: String,
}

impl Default for UserSection {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksSection {
    /// Task export (JSON or CSV) read on every `plan generate`.
    pub path: Option<PathBuf>,
}

impl Config {
    /// What `config init` writes: every planner default spelled out.
    pub fn starter() -> Self {
        Self {
            user: UserSection::default(),
            planner: PlanRequest {
                timezone: Some(DEFAULT_TIMEZONE.to_string()),
                workday_hours: Some(DEFAULT_WORKDAY_HOURS),
                long_break_minutes: Some(DEFAULT_LONG_BREAK_MINUTES),
                short_break_minutes: Some(DEFAULT_SHORT_BREAK_MINUTES),
                day_start: Some(DEFAULT_DAY_START.to_string()),
                default_duration_minutes: Some(DEFAULT_DURATION_MINUTES),
                long_break_every: Some(DEFAULT_LONG_BREAK_EVERY),
            },
            tasks: TasksSection::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_flowly_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(p: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&p, &Config::starter())?;
    println!("Wrote {}", p.display());
    Ok(())
}
