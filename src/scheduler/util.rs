use crate::model::{Leave, LeaveId, Shift, ShiftId};
use chrono::{DateTime, Utc};

pub(super) fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

pub(super) fn find_shift_index(shifts: &[Shift], shift_id: &ShiftId) -> Option<usize> {
    shifts.iter().position(|s| &s.id == shift_id)
}

pub(super) fn find_leave_index(leaves: &[Leave], leave_id: &LeaveId) -> Option<usize> {
    leaves.iter().position(|l| &l.id == leave_id)
}

/// Ajoute une annotation aux notes existantes.
pub(super) fn append_note(notes: &mut Option<String>, text: &str) {
    match notes {
        Some(existing) if !existing.trim().is_empty() => {
            existing.push_str("; ");
            existing.push_str(text);
        }
        _ => *notes = Some(text.to_string()),
    }
}
