use crate::calendar::{CalendarKind, Week, DAYS_PER_WEEK};
use crate::model::{AreaId, FixedAssignment, Guard, GuardId, Leave, Shift, ShiftId, ShiftType};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Ordre de rotation des agents pour chaque type de créneau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum RotationStrategy {
    /// Mélange aléatoire indépendant par zone et par type de créneau.
    Shuffled {
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Round-robin déterministe décalé par le numéro de semaine.
    Staggered,
}

impl Default for RotationStrategy {
    fn default() -> Self {
        RotationStrategy::Shuffled { seed: None }
    }
}

/// Déduction des affectations fixes depuis l'historique des shifts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPolicy {
    pub derive: bool,
    pub threshold: f64,
    pub lookback_days: i64,
    /// Nombre minimal de shifts observés avant de conclure.
    pub min_shifts: usize,
}

impl Default for FixedPolicy {
    fn default() -> Self {
        Self {
            derive: false,
            threshold: 0.7,
            lookback_days: 30,
            min_shifts: 5,
        }
    }
}

/// Options de génération
#[derive(Debug, Clone, Copy)]
pub struct ScheduleOptions {
    pub calendar: CalendarKind,
    pub timezone: Tz,
    pub rotation: RotationStrategy,
    pub min_active_guards: usize,
    pub fixed: FixedPolicy,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            calendar: CalendarKind::SolarHijri,
            timezone: chrono_tz::Asia::Tehran,
            rotation: RotationStrategy::default(),
            min_active_guards: 3,
            fixed: FixedPolicy::default(),
        }
    }
}

/// Shift épinglé à la main, prioritaire sur la génération.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualShift {
    pub guard: GuardId,
    pub area: AreaId,
    /// 0 = samedi … 6 = vendredi
    pub day: u8,
    pub shift_type: ShiftType,
}

impl ManualShift {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.guard.as_str().trim().is_empty() {
            return Err("missing guard");
        }
        if self.area.as_str().trim().is_empty() {
            return Err("missing area");
        }
        if self.day >= DAYS_PER_WEEK {
            return Err("day index out of range 0..=6");
        }
        Ok(())
    }
}

/// Zones exclues de la rotation, par agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedAssignments(BTreeMap<GuardId, BTreeSet<AreaId>>);

impl FixedAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, guard: GuardId, area: AreaId) -> bool {
        self.0.entry(guard).or_default().insert(area)
    }

    pub fn excludes(&self, guard: &GuardId, area: &AreaId) -> bool {
        self.0.get(guard).is_some_and(|areas| areas.contains(area))
    }

    /// Nombre d'agents ayant au moins une affectation fixe.
    pub fn guard_count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn merge(&mut self, other: FixedAssignments) {
        for (guard, areas) in other.0 {
            self.0.entry(guard).or_default().extend(areas);
        }
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&GuardId, &AreaId)> {
        self.0
            .iter()
            .flat_map(|(guard, areas)| areas.iter().map(move |area| (guard, area)))
    }
}

impl<'a> FromIterator<&'a FixedAssignment> for FixedAssignments {
    fn from_iter<I: IntoIterator<Item = &'a FixedAssignment>>(iter: I) -> Self {
        let mut out = Self::new();
        for fa in iter {
            out.insert(fa.guard.clone(), fa.area.clone());
        }
        out
    }
}

/// Résultat d'une génération au niveau du roster.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub week: Week,
    pub generated: usize,
    pub manual: usize,
    pub skipped_areas: Vec<AreaId>,
    pub fixed_guards: usize,
}

impl GenerationReport {
    pub fn total(&self) -> usize {
        self.generated + self.manual
    }
}

/// Issue d'une approbation de congé.
#[derive(Debug, Clone)]
pub struct LeaveDecision {
    pub leave: Leave,
    pub reassigned: usize,
}

impl LeaveDecision {
    pub fn message(&self) -> String {
        if self.reassigned == 0 {
            "leave approved, nothing to reassign".to_string()
        } else {
            format!(
                "leave approved, {} shift(s) moved to the replacement guard",
                self.reassigned
            )
        }
    }
}

/// Shifts à couvrir pendant un congé et remplaçants possibles.
#[derive(Debug, Clone)]
pub struct ReplacementOptions {
    pub shifts: Vec<Shift>,
    pub candidates: Vec<Guard>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Overlap,
    SameDayDoubleBooking,
    InconsistentType,
}

#[derive(Debug, Clone)]
pub struct Conflict {
    pub guard: GuardId,
    pub shift_a: ShiftId,
    pub shift_b: Option<ShiftId>,
    pub kind: ConflictKind,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("insufficient resources: need at least {min_guards} guard(s) and 1 area, got {guards} guard(s) and {areas} area(s)")]
    InsufficientResources {
        guards: usize,
        areas: usize,
        min_guards: usize,
    },
    #[error("invalid week: {0}")]
    InvalidWeek(String),
    #[error("invalid time range: end must be after start")]
    InvalidTimeRange,
    #[error("invalid time zone: {0}")]
    InvalidTimeZone(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("unknown guard: {0}")]
    UnknownGuard(String),
    #[error("unknown area: {0}")]
    UnknownArea(String),
    #[error("unknown shift: {0}")]
    UnknownShift(String),
    #[error("unknown leave: {0}")]
    UnknownLeave(String),
    #[error("week {0} already has {1} shift(s); refusing to generate twice")]
    WeekAlreadyScheduled(Week, usize),
    #[error("delete blocked: {0}")]
    DeleteBlocked(&'static str),
    #[error("no replacement guard available for {0}")]
    NoReplacementAvailable(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_assignments_merge_and_exclude() {
        let (g1, g2) = (GuardId::new("g1"), GuardId::new("g2"));
        let (a1, a2) = (AreaId::new("a1"), AreaId::new("a2"));
        let mut fixed = FixedAssignments::new();
        fixed.insert(g1.clone(), a1.clone());

        let mut derived = FixedAssignments::new();
        derived.insert(g1.clone(), a2.clone());
        derived.insert(g2.clone(), a1.clone());
        fixed.merge(derived);

        assert!(fixed.excludes(&g1, &a1));
        assert!(fixed.excludes(&g1, &a2));
        assert!(fixed.excludes(&g2, &a1));
        assert!(!fixed.excludes(&g2, &a2));
        assert_eq!(fixed.guard_count(), 2);
        assert_eq!(fixed.pairs().count(), 3);
    }

    #[test]
    fn manual_shift_validation() {
        let ok = ManualShift {
            guard: GuardId::new("g"),
            area: AreaId::new("a"),
            day: 6,
            shift_type: ShiftType::Night,
        };
        assert!(ok.validate().is_ok());
        assert!(ManualShift { day: 7, ..ok.clone() }.validate().is_err());
        assert!(ManualShift {
            guard: GuardId::new(" "),
            ..ok
        }
        .validate()
        .is_err());
    }
}
