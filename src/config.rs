//! Réglages du site (fichier TOML optionnel).
//!
//! ```toml
//! timezone = "Asia/Tehran"
//! calendar = "solar-hijri"
//! min_active_guards = 3
//!
//! [rotation]
//! strategy = "shuffled"
//! seed = 42
//!
//! [fixed_assignment]
//! derive = true
//! threshold = 0.7
//! lookback_days = 30
//! min_shifts = 5
//! ```

use crate::calendar::CalendarKind;
use crate::scheduler::{FixedPolicy, RotationStrategy, SchedError, ScheduleOptions};
use anyhow::Context;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "guard-roster.toml";
/// Fenêtre d'historique maximale (100 ans).
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timezone: String,
    pub calendar: CalendarKind,
    pub min_active_guards: usize,
    pub rotation: RotationStrategy,
    pub fixed_assignment: FixedAssignmentSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timezone: "Asia/Tehran".to_string(),
            calendar: CalendarKind::SolarHijri,
            min_active_guards: 3,
            rotation: RotationStrategy::default(),
            fixed_assignment: FixedAssignmentSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedAssignmentSettings {
    pub derive: bool,
    pub threshold: f64,
    pub lookback_days: i64,
    pub min_shifts: usize,
}

impl Default for FixedAssignmentSettings {
    fn default() -> Self {
        let policy = FixedPolicy::default();
        Self {
            derive: policy.derive,
            threshold: policy.threshold,
            lookback_days: policy.lookback_days,
            min_shifts: policy.min_shifts,
        }
    }
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let settings: Settings = toml::from_str(raw).context("parsing settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Charge `path` s'il est fourni, sinon `guard-roster.toml` s'il existe,
    /// sinon les valeurs par défaut.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };
        let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("loading {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.timezone()?;
        let threshold = self.fixed_assignment.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            anyhow::bail!("fixed_assignment.threshold must be in (0, 1], got {threshold}");
        }
        let lookback_days = self.fixed_assignment.lookback_days;
        if !(1..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
            anyhow::bail!(
                "fixed_assignment.lookback_days must be in 1..={MAX_LOOKBACK_DAYS}, got {lookback_days}"
            );
        }
        if self.fixed_assignment.min_shifts == 0 {
            anyhow::bail!("fixed_assignment.min_shifts must be > 0");
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz, SchedError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| SchedError::InvalidTimeZone(self.timezone.clone()))
    }

    pub fn schedule_options(&self) -> Result<ScheduleOptions, SchedError> {
        Ok(ScheduleOptions {
            calendar: self.calendar,
            timezone: self.timezone()?,
            rotation: self.rotation,
            min_active_guards: self.min_active_guards,
            fixed: FixedPolicy {
                derive: self.fixed_assignment.derive,
                threshold: self.fixed_assignment.threshold,
                lookback_days: self.fixed_assignment.lookback_days,
                min_shifts: self.fixed_assignment.min_shifts,
            },
        })
    }
}
