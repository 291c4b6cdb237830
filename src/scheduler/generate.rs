use super::rotation::RotationBuilder;
use super::{FixedAssignments, ManualShift, SchedError, ScheduleOptions};
use crate::calendar::{self, Week, DAYS_PER_WEEK};
use crate::model::{Area, Guard, GuardId, Shift, ShiftType};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// En dessous de ce nombre d'agents la rotation se répète dans la journée.
const FAIR_ROTATION_GUARDS: usize = 3;

/// Génère les shifts d'une semaine : shifts manuels d'abord, puis pour chaque
/// zone 7 jours × 3 créneaux tirés des rotations.
///
/// Échoue seulement si `guards` ou `areas` est vide. Une zone sans agent
/// éligible est ignorée ; un shift manuel invalide est ignoré.
pub fn generate_weekly_shifts(
    guards: &[Guard],
    areas: &[Area],
    week: Week,
    fixed: &FixedAssignments,
    manual: &[ManualShift],
    opts: &ScheduleOptions,
) -> Result<Vec<Shift>, SchedError> {
    if guards.is_empty() || areas.is_empty() {
        return Err(SchedError::InsufficientResources {
            guards: guards.len(),
            areas: areas.len(),
            min_guards: 1,
        });
    }

    info!(
        week = %week,
        guards = guards.len(),
        areas = areas.len(),
        fixed_guards = fixed.guard_count(),
        manual = manual.len(),
        "generating weekly shifts"
    );

    let start_of_week = calendar::week_start(opts.calendar, week)?;
    debug!(%start_of_week, "week start resolved");

    let mut shifts = Vec::with_capacity(manual.len() + areas.len() * 21);
    let mut pinned: HashSet<(GuardId, u8)> = HashSet::new();

    for entry in manual {
        if let Err(reason) = entry.validate() {
            warn!(?entry, reason, "skipping invalid manual shift");
            continue;
        }
        let date = calendar::day_date(start_of_week, entry.day);
        let (start, end) = calendar::shift_window(date, entry.shift_type, opts.timezone)?;
        let mut shift = Shift::new(
            entry.guard.clone(),
            entry.area.clone(),
            entry.shift_type,
            start,
            end,
        )
        .map_err(|_| SchedError::InvalidTimeRange)?;
        shift.is_manual = true;
        pinned.insert((entry.guard.clone(), entry.day));
        shifts.push(shift);
    }

    let mut rotations = RotationBuilder::new(opts.rotation, week);

    for area in areas {
        let pool: Vec<&Guard> = guards
            .iter()
            .filter(|guard| {
                let excluded = fixed.excludes(&guard.id, &area.id);
                if excluded {
                    debug!(guard = %guard.name, area = %area.name, "fixed assignment, left out of rotation");
                }
                !excluded
            })
            .collect();

        if pool.is_empty() {
            info!(area = %area.name, "no available guards, skipping area");
            continue;
        }
        if pool.len() < FAIR_ROTATION_GUARDS {
            warn!(
                area = %area.name,
                available = pool.len(),
                "fewer than {FAIR_ROTATION_GUARDS} guards, rotation will repeat"
            );
        }

        let rotation = rotations.build(&pool);

        for day in 0..DAYS_PER_WEEK {
            let date = calendar::day_date(start_of_week, day);
            let friday = calendar::is_friday(date);

            for slot_type in ShiftType::ALL {
                let Some(guard) = rotation.pick(slot_type, day) else {
                    continue;
                };

                if pinned.contains(&(guard.id.clone(), day)) {
                    debug!(guard = %guard.name, %date, "manual shift wins over rotation");
                    continue;
                }

                let effective = if friday {
                    slot_type.friday_remap()
                } else {
                    slot_type
                };

                let (start, end) = calendar::shift_window(date, effective, opts.timezone)?;
                let shift = Shift::new(guard.id.clone(), area.id.clone(), effective, start, end)
                    .map_err(|_| SchedError::InvalidTimeRange)?;
                shifts.push(shift);
            }
        }
    }

    info!(count = shifts.len(), "weekly shifts generated");
    Ok(shifts)
}
