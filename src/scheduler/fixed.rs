use super::{FixedAssignments, FixedPolicy};
use crate::model::{AreaId, GuardId, Shift, ShiftStatus};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::debug;

/// Zone dominante d'un agent sur la période d'observation.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaAffinity {
    pub guard: GuardId,
    pub area: AreaId,
    pub shifts_in_area: usize,
    pub total_shifts: usize,
}

impl AreaAffinity {
    pub fn share(&self) -> f64 {
        if self.total_shifts == 0 {
            return 0.0;
        }
        self.shifts_in_area as f64 / self.total_shifts as f64
    }
}

/// Agents dont la part de shifts dans une seule zone atteint le seuil sur les
/// `lookback_days` derniers jours, avec au moins `min_shifts` shifts observés.
/// Les shifts annulés ne comptent pas.
pub fn area_affinities(shifts: &[Shift], now: DateTime<Utc>, policy: FixedPolicy) -> Vec<AreaAffinity> {
    let since = Duration::try_days(policy.lookback_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut counts: BTreeMap<&GuardId, BTreeMap<&AreaId, usize>> = BTreeMap::new();

    for shift in shifts
        .iter()
        .filter(|s| s.start >= since && s.start <= now && s.status != ShiftStatus::Cancelled)
    {
        *counts
            .entry(&shift.guard)
            .or_default()
            .entry(&shift.area)
            .or_default() += 1;
    }

    let mut out = Vec::new();
    for (guard, per_area) in counts {
        let total: usize = per_area.values().sum();
        if total < policy.min_shifts {
            continue;
        }
        // en cas d'égalité la première zone (ordre des ids) l'emporte
        let Some((area, top)) = per_area
            .iter()
            .fold(None, |best: Option<(&AreaId, usize)>, (area, n)| match best {
                Some((_, m)) if m >= *n => best,
                _ => Some((*area, *n)),
            })
        else {
            continue;
        };
        let affinity = AreaAffinity {
            guard: guard.clone(),
            area: area.clone(),
            shifts_in_area: top,
            total_shifts: total,
        };
        if affinity.share() >= policy.threshold {
            debug!(guard = %guard, area = %area, share = affinity.share(), "fixed area detected");
            out.push(affinity);
        }
    }
    out
}

pub fn derive_fixed_assignments(
    shifts: &[Shift],
    now: DateTime<Utc>,
    policy: FixedPolicy,
) -> FixedAssignments {
    let mut fixed = FixedAssignments::new();
    for affinity in area_affinities(shifts, now, policy) {
        fixed.insert(affinity.guard, affinity.area);
    }
    fixed
}
