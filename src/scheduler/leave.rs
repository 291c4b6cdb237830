use super::{util, LeaveDecision, ReplacementOptions, ReplacementSelector, SchedError, Scheduler};
use crate::model::{GuardId, GuardStatus, Leave, LeaveId, LeaveStatus};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

const DEFAULT_REJECTION_REASON: &str = "no reason given";

pub(super) fn request(
    scheduler: &mut Scheduler,
    guard: &GuardId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    reason: Option<String>,
) -> Result<LeaveId, SchedError> {
    if scheduler.roster.find_guard(guard).is_none() {
        return Err(SchedError::UnknownGuard(guard.to_string()));
    }
    let leave = Leave::new(guard.clone(), start, end, reason).map_err(|_| SchedError::InvalidTimeRange)?;
    let id = leave.id.clone();
    scheduler.roster.leaves.push(leave);
    Ok(id)
}

fn pending_index(scheduler: &Scheduler, leave_id: &LeaveId) -> Result<usize, SchedError> {
    let pos = util::find_leave_index(&scheduler.roster.leaves, leave_id)
        .ok_or_else(|| SchedError::UnknownLeave(leave_id.to_string()))?;
    let status = scheduler.roster.leaves[pos].status;
    if status != LeaveStatus::Pending {
        return Err(SchedError::InvalidState(format!(
            "leave {leave_id} is {status}, only pending leaves can be handled"
        )));
    }
    Ok(pos)
}

/// Approuve un congé et transfère au remplaçant tous les shifts de l'agent
/// contenus dans la période. Tout est validé avant la première mutation.
pub(super) fn approve(
    scheduler: &mut Scheduler,
    leave_id: &LeaveId,
    replacement: Option<&GuardId>,
    approver: &str,
    selector: &dyn ReplacementSelector,
) -> Result<LeaveDecision, SchedError> {
    let pos = pending_index(scheduler, leave_id)?;
    let leave = scheduler.roster.leaves[pos].clone();

    let original_name = scheduler
        .roster
        .find_guard(&leave.guard)
        .map(|g| g.name.clone())
        .ok_or_else(|| SchedError::UnknownGuard(leave.guard.to_string()))?;

    let replacement = match replacement {
        Some(id) => {
            let candidate = scheduler
                .roster
                .find_guard(id)
                .ok_or_else(|| SchedError::UnknownGuard(id.to_string()))?;
            if id == &leave.guard {
                return Err(SchedError::InvalidState(
                    "replacement guard is the guard on leave".to_string(),
                ));
            }
            if !candidate.is_active() {
                return Err(SchedError::InvalidState(format!(
                    "replacement guard {} is not active",
                    candidate.name
                )));
            }
            id.clone()
        }
        None => {
            let candidates = scheduler.roster.active_guards();
            selector
                .select(&candidates, &leave, &scheduler.roster.shifts)
                .map(|g| g.id.clone())
                .ok_or_else(|| SchedError::NoReplacementAvailable(original_name.clone()))?
        }
    };

    let note = format!("replacing {original_name} on leave");
    let mut reassigned = 0usize;
    for shift in scheduler
        .roster
        .shifts
        .iter_mut()
        .filter(|s| s.guard == leave.guard && leave.covers(s))
    {
        shift.guard = replacement.clone();
        shift.replacement_for = Some(leave.guard.clone());
        util::append_note(&mut shift.notes, &note);
        reassigned += 1;
    }

    let stored = &mut scheduler.roster.leaves[pos];
    stored.status = LeaveStatus::Approved;
    stored.replacement_guard = Some(replacement.clone());
    stored.approved_by = Some(approver.to_string());
    let leave = stored.clone();

    scheduler.set_guard_status(&leave.guard, GuardStatus::OnLeave)?;

    if reassigned == 0 {
        warn!(leave = %leave_id, "leave approved, nothing to reassign");
    } else {
        info!(leave = %leave_id, replacement = %replacement, reassigned, "leave approved");
    }
    Ok(LeaveDecision { leave, reassigned })
}

pub(super) fn reject(
    scheduler: &mut Scheduler,
    leave_id: &LeaveId,
    reason: Option<String>,
    handler: &str,
) -> Result<Leave, SchedError> {
    let pos = pending_index(scheduler, leave_id)?;
    let leave = &mut scheduler.roster.leaves[pos];
    leave.status = LeaveStatus::Rejected;
    leave.rejection_reason = Some(
        reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string()),
    );
    leave.approved_by = Some(handler.to_string());
    info!(leave = %leave_id, "leave rejected");
    Ok(leave.clone())
}

pub(super) fn delete(scheduler: &mut Scheduler, leave_id: &LeaveId) -> Result<Leave, SchedError> {
    let pos = util::find_leave_index(&scheduler.roster.leaves, leave_id)
        .ok_or_else(|| SchedError::UnknownLeave(leave_id.to_string()))?;
    let leave = &scheduler.roster.leaves[pos];
    if leave.status == LeaveStatus::Approved {
        let replaced = scheduler.roster.shifts.iter().any(|s| {
            leave.replacement_guard.as_ref() == Some(&s.guard)
                && s.replacement_for.as_ref() == Some(&leave.guard)
                && leave.covers(s)
        });
        if replaced {
            return Err(SchedError::DeleteBlocked(
                "approved leave still has replacement shifts",
            ));
        }
    }
    Ok(scheduler.roster.leaves.remove(pos))
}

pub(super) fn options(scheduler: &Scheduler, leave_id: &LeaveId) -> Result<ReplacementOptions, SchedError> {
    let leave = scheduler
        .roster
        .find_leave(leave_id)
        .ok_or_else(|| SchedError::UnknownLeave(leave_id.to_string()))?;
    let shifts = scheduler
        .roster
        .shifts
        .iter()
        .filter(|s| s.guard == leave.guard && leave.covers(s))
        .cloned()
        .collect();
    let candidates = scheduler
        .roster
        .guards
        .iter()
        .filter(|g| g.is_active() && g.id != leave.guard)
        .cloned()
        .collect();
    Ok(ReplacementOptions { shifts, candidates })
}
