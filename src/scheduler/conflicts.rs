use super::{util, Conflict, ConflictKind, Scheduler};
use crate::calendar;
use crate::model::{Shift, ShiftStatus, ShiftType};
use chrono::{Duration, Timelike};
use chrono_tz::Tz;

pub(super) fn detect_conflicts(scheduler: &Scheduler, tz: Tz) -> Vec<Conflict> {
    let mut out = Vec::new();

    for guard in scheduler.roster.guards.iter() {
        let mut shifts: Vec<&Shift> = scheduler
            .roster
            .shifts
            .iter()
            .filter(|s| s.guard == guard.id && s.status != ShiftStatus::Cancelled)
            .collect();
        shifts.sort_by_key(|s| s.start);

        for (idx, a) in shifts.iter().enumerate() {
            if !type_matches_window(a, tz) {
                out.push(Conflict {
                    guard: guard.id.clone(),
                    shift_a: a.id.clone(),
                    shift_b: None,
                    kind: ConflictKind::InconsistentType,
                });
            }

            for b in shifts.iter().skip(idx + 1) {
                let kind = if util::overlaps(a.start, a.end, b.start, b.end) {
                    ConflictKind::Overlap
                } else if calendar::local_date(a.start, tz) == calendar::local_date(b.start, tz) {
                    ConflictKind::SameDayDoubleBooking
                } else {
                    continue;
                };
                out.push(Conflict {
                    guard: guard.id.clone(),
                    shift_a: a.id.clone(),
                    shift_b: Some(b.id.clone()),
                    kind,
                });
            }
        }
    }

    out
}

/// L'heure locale de début et la durée doivent correspondre au type.
fn type_matches_window(shift: &Shift, tz: Tz) -> bool {
    let local_start = shift.start.with_timezone(&tz);
    ShiftType::from_start_hour(local_start.hour()) == Some(shift.shift_type)
        && local_start.minute() == 0
        && shift.end - shift.start == Duration::hours(i64::from(ShiftType::HOURS))
}
