use super::{util, SchedError, Scheduler};
use crate::calendar;
use crate::model::{AreaId, GuardId, LeaveStatus, Shift, ShiftId, ShiftStatus, ShiftType};
use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::info;

pub(super) fn create_shift(
    scheduler: &mut Scheduler,
    guard: &GuardId,
    area: &AreaId,
    date: NaiveDate,
    shift_type: ShiftType,
    notes: Option<String>,
    tz: Tz,
) -> Result<ShiftId, SchedError> {
    if scheduler.roster.find_guard(guard).is_none() {
        return Err(SchedError::UnknownGuard(guard.to_string()));
    }
    if scheduler.roster.find_area(area).is_none() {
        return Err(SchedError::UnknownArea(area.to_string()));
    }
    let (start, end) = calendar::shift_window(date, shift_type, tz)?;
    let mut shift = Shift::new(guard.clone(), area.clone(), shift_type, start, end)
        .map_err(|_| SchedError::InvalidTimeRange)?;
    shift.is_manual = true;
    shift.notes = notes;
    let id = shift.id.clone();
    scheduler.roster.shifts.push(shift);
    Ok(id)
}

fn transition_allowed(from: ShiftStatus, to: ShiftStatus) -> bool {
    use ShiftStatus::*;
    !from.is_terminal()
        && matches!(
            (from, to),
            (Scheduled, InProgress) | (_, Completed) | (_, Cancelled)
        )
}

pub(super) fn set_status(
    scheduler: &mut Scheduler,
    shift_id: &ShiftId,
    to: ShiftStatus,
) -> Result<ShiftStatus, SchedError> {
    let shift = scheduler
        .roster
        .find_shift_mut(shift_id)
        .ok_or_else(|| SchedError::UnknownShift(shift_id.to_string()))?;
    let from = shift.status;
    if !transition_allowed(from, to) {
        return Err(SchedError::InvalidState(format!(
            "shift {shift_id} cannot go from {from} to {to}"
        )));
    }
    shift.status = to;
    info!(shift = %shift_id, %from, %to, "shift status updated");
    Ok(from)
}

pub(super) fn reschedule(
    scheduler: &mut Scheduler,
    shift_id: &ShiftId,
    date: NaiveDate,
    shift_type: ShiftType,
    tz: Tz,
) -> Result<(), SchedError> {
    let Some(pos) = util::find_shift_index(&scheduler.roster.shifts, shift_id) else {
        return Err(SchedError::UnknownShift(shift_id.to_string()));
    };
    let status = scheduler.roster.shifts[pos].status;
    if status != ShiftStatus::Scheduled {
        return Err(SchedError::InvalidState(format!(
            "only scheduled shifts can be rescheduled, shift {shift_id} is {status}"
        )));
    }
    let (start, end) = calendar::shift_window(date, shift_type, tz)?;
    let shift = &mut scheduler.roster.shifts[pos];
    shift.start = start;
    shift.end = end;
    shift.shift_type = shift_type;
    Ok(())
}

pub(super) fn delete(scheduler: &mut Scheduler, shift_id: &ShiftId) -> Result<Shift, SchedError> {
    let Some(pos) = util::find_shift_index(&scheduler.roster.shifts, shift_id) else {
        return Err(SchedError::UnknownShift(shift_id.to_string()));
    };
    let shift = &scheduler.roster.shifts[pos];
    if let Some(original) = &shift.replacement_for {
        let covered = scheduler.roster.leaves.iter().any(|leave| {
            leave.status == LeaveStatus::Approved
                && &leave.guard == original
                && leave.replacement_guard.as_ref() == Some(&shift.guard)
                && leave.covers(shift)
        });
        if covered {
            return Err(SchedError::DeleteBlocked(
                "shift is the replacement record of an approved leave",
            ));
        }
    }
    Ok(scheduler.roster.shifts.remove(pos))
}
