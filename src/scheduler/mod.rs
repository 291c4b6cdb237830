mod conflicts;
mod fixed;
mod generate;
mod leave;
mod mutate;
mod replacement;
mod rotation;
mod types;
mod util;

pub use fixed::{area_affinities, derive_fixed_assignments, AreaAffinity};
pub use generate::generate_weekly_shifts;
pub use replacement::{find_replacement_guard, FirstAvailable, LeastLoaded, ReplacementSelector};
pub use types::{
    Conflict, ConflictKind, FixedAssignments, FixedPolicy, GenerationReport, LeaveDecision,
    ManualShift, ReplacementOptions, RotationStrategy, SchedError, ScheduleOptions,
};

use crate::calendar::{self, Week};
use crate::model::{
    Area, AreaId, FixedAssignment, Guard, GuardId, GuardStatus, Leave, LeaveId, Roster, Shift,
    ShiftId, ShiftStatus, ShiftType,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use tracing::{info, warn};

/// Scheduler : encapsule le Roster et coordonne génération, congés et cycle de
/// vie des shifts.
#[derive(Debug, Default)]
pub struct Scheduler {
    roster: Roster,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            roster: Roster::default(),
        }
    }

    pub fn with_roster(roster: Roster) -> Self {
        Self { roster }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }
    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn add_guards(&mut self, guards: Vec<Guard>) {
        self.roster.guards.extend(guards);
    }

    pub fn add_areas(&mut self, areas: Vec<Area>) {
        self.roster.areas.extend(areas);
    }

    /// Transition explicite du statut d'un agent ; renvoie l'ancien statut.
    pub fn set_guard_status(
        &mut self,
        guard: &GuardId,
        status: GuardStatus,
    ) -> Result<GuardStatus, SchedError> {
        let record = self
            .roster
            .find_guard_mut(guard)
            .ok_or_else(|| SchedError::UnknownGuard(guard.to_string()))?;
        let previous = record.status;
        record.status = status;
        Ok(previous)
    }

    /// Enregistre une affectation fixe ; sans effet si elle existe déjà.
    pub fn add_fixed_assignment(&mut self, guard: &GuardId, area: &AreaId) -> Result<bool, SchedError> {
        if self.roster.find_guard(guard).is_none() {
            return Err(SchedError::UnknownGuard(guard.to_string()));
        }
        if self.roster.find_area(area).is_none() {
            return Err(SchedError::UnknownArea(area.to_string()));
        }
        let exists = self
            .roster
            .fixed_assignments
            .iter()
            .any(|fa| &fa.guard == guard && &fa.area == area);
        if exists {
            return Ok(false);
        }
        self.roster.fixed_assignments.push(FixedAssignment {
            guard: guard.clone(),
            area: area.clone(),
        });
        Ok(true)
    }

    pub fn remove_fixed_assignment(&mut self, guard: &GuardId, area: &AreaId) -> bool {
        let before = self.roster.fixed_assignments.len();
        self.roster
            .fixed_assignments
            .retain(|fa| !(&fa.guard == guard && &fa.area == area));
        before != self.roster.fixed_assignments.len()
    }

    /// Affectations configurées, plus celles déduites de l'historique si la
    /// politique le demande.
    ///
    /// Une paire déduite n'est retenue que si sa zone garde au moins un agent
    /// actif en rotation ; sinon les paires déduites de cette zone sont
    /// ignorées.
    pub fn resolve_fixed_assignments(
        &self,
        policy: FixedPolicy,
        now: DateTime<Utc>,
    ) -> FixedAssignments {
        let mut fixed: FixedAssignments = self.roster.fixed_assignments.iter().collect();
        if !policy.derive {
            return fixed;
        }
        let derived = derive_fixed_assignments(&self.roster.shifts, now, policy);
        let mut merged = fixed.clone();
        merged.merge(derived.clone());

        let guards = self.roster.active_guards();
        let staffed = |set: &FixedAssignments, area: &AreaId| {
            guards.iter().any(|g| !set.excludes(&g.id, area))
        };
        let drained: HashSet<&AreaId> = self
            .roster
            .areas
            .iter()
            .filter(|a| a.active && staffed(&fixed, &a.id) && !staffed(&merged, &a.id))
            .map(|a| &a.id)
            .collect();
        for area in &drained {
            warn!(%area, "derived fixed assignments would empty the area, keeping its rotation");
        }

        for (guard, area) in derived.pairs() {
            if !drained.contains(area) {
                fixed.insert(guard.clone(), area.clone());
            }
        }
        fixed
    }

    /// Génère la semaine pour les agents et zones actifs du roster.
    ///
    /// Refuse si la semaine contient déjà des shifts, sauf `force`.
    pub fn generate_week(
        &mut self,
        week: Week,
        manual: &[ManualShift],
        opts: &ScheduleOptions,
        force: bool,
    ) -> Result<GenerationReport, SchedError> {
        let guards = self.roster.active_guards();
        let areas = self.roster.active_areas();
        if guards.len() < opts.min_active_guards.max(1) || areas.is_empty() {
            return Err(SchedError::InsufficientResources {
                guards: guards.len(),
                areas: areas.len(),
                min_guards: opts.min_active_guards.max(1),
            });
        }

        let existing = self.shifts_in_week(week, opts)?.len();
        if existing > 0 {
            if !force {
                return Err(SchedError::WeekAlreadyScheduled(week, existing));
            }
            info!(%week, existing, "forcing generation over an already scheduled week");
        }

        let fixed = self.resolve_fixed_assignments(opts.fixed, Utc::now());
        let batch = generate_weekly_shifts(&guards, &areas, week, &fixed, manual, opts)?;

        let covered: HashSet<&AreaId> = batch
            .iter()
            .filter(|s| !s.is_manual)
            .map(|s| &s.area)
            .collect();
        let skipped_areas = areas
            .iter()
            .filter(|a| !covered.contains(&a.id))
            .map(|a| a.id.clone())
            .collect();
        let manual_count = batch.iter().filter(|s| s.is_manual).count();
        let report = GenerationReport {
            week,
            generated: batch.len() - manual_count,
            manual: manual_count,
            skipped_areas,
            fixed_guards: fixed.guard_count(),
        };

        self.roster.shifts.extend(batch);
        Ok(report)
    }

    /// Crée un shift isolé sur une date locale.
    pub fn create_shift(
        &mut self,
        guard: &GuardId,
        area: &AreaId,
        date: NaiveDate,
        shift_type: ShiftType,
        notes: Option<String>,
        opts: &ScheduleOptions,
    ) -> Result<ShiftId, SchedError> {
        mutate::create_shift(self, guard, area, date, shift_type, notes, opts.timezone)
    }

    pub fn start_shift(&mut self, shift: &ShiftId) -> Result<ShiftStatus, SchedError> {
        mutate::set_status(self, shift, ShiftStatus::InProgress)
    }

    pub fn complete_shift(&mut self, shift: &ShiftId) -> Result<ShiftStatus, SchedError> {
        mutate::set_status(self, shift, ShiftStatus::Completed)
    }

    pub fn cancel_shift(&mut self, shift: &ShiftId) -> Result<ShiftStatus, SchedError> {
        mutate::set_status(self, shift, ShiftStatus::Cancelled)
    }

    pub fn reschedule_shift(
        &mut self,
        shift: &ShiftId,
        date: NaiveDate,
        shift_type: ShiftType,
        opts: &ScheduleOptions,
    ) -> Result<(), SchedError> {
        mutate::reschedule(self, shift, date, shift_type, opts.timezone)
    }

    pub fn delete_shift(&mut self, shift: &ShiftId) -> Result<Shift, SchedError> {
        mutate::delete(self, shift)
    }

    pub fn request_leave(
        &mut self,
        guard: &GuardId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<LeaveId, SchedError> {
        leave::request(self, guard, start, end, reason)
    }

    /// Approuve un congé en attente. Sans remplaçant explicite, `selector`
    /// choisit parmi les agents actifs.
    pub fn approve_leave(
        &mut self,
        leave: &LeaveId,
        replacement: Option<&GuardId>,
        approver: &str,
        selector: &dyn ReplacementSelector,
    ) -> Result<LeaveDecision, SchedError> {
        leave::approve(self, leave, replacement, approver, selector)
    }

    pub fn reject_leave(
        &mut self,
        leave: &LeaveId,
        reason: Option<String>,
        handler: &str,
    ) -> Result<Leave, SchedError> {
        leave::reject(self, leave, reason, handler)
    }

    pub fn delete_leave(&mut self, leave: &LeaveId) -> Result<Leave, SchedError> {
        leave::delete(self, leave)
    }

    pub fn replacement_options(&self, leave: &LeaveId) -> Result<ReplacementOptions, SchedError> {
        leave::options(self, leave)
    }

    pub fn detect_conflicts(&self, opts: &ScheduleOptions) -> Vec<Conflict> {
        conflicts::detect_conflicts(self, opts.timezone)
    }

    pub fn shifts_for_guard(&self, guard: &GuardId) -> Vec<&Shift> {
        let mut out: Vec<&Shift> = self.roster.shifts.iter().filter(|s| &s.guard == guard).collect();
        out.sort_by_key(|s| s.start);
        out
    }

    pub fn shifts_for_area(&self, area: &AreaId) -> Vec<&Shift> {
        let mut out: Vec<&Shift> = self.roster.shifts.iter().filter(|s| &s.area == area).collect();
        out.sort_by_key(|s| s.start);
        out
    }

    /// Shifts dont le début tombe dans la semaine (samedi 00:00 local inclus).
    pub fn shifts_in_week(&self, week: Week, opts: &ScheduleOptions) -> Result<Vec<&Shift>, SchedError> {
        let (start, end) = calendar::week_bounds(opts.calendar, week, opts.timezone)?;
        let mut out: Vec<&Shift> = self
            .roster
            .shifts
            .iter()
            .filter(|s| s.start >= start && s.start < end)
            .collect();
        out.sort_by_key(|s| s.start);
        Ok(out)
    }

    pub fn leaves_for_guard(&self, guard: &GuardId) -> Vec<&Leave> {
        let mut out: Vec<&Leave> = self.roster.leaves.iter().filter(|l| &l.guard == guard).collect();
        out.sort_by_key(|l| std::cmp::Reverse(l.start));
        out
    }
}
