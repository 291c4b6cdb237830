use crate::model::{Guard, GuardId, Leave, Shift};

/// Stratégie de choix d'un remplaçant pour un congé.
pub trait ReplacementSelector {
    /// `candidates` est la réserve proposée ; l'agent remplacé en est exclu
    /// par l'implémentation. `None` seulement si aucun autre candidat.
    fn select<'a>(
        &self,
        candidates: &'a [Guard],
        leave: &Leave,
        shifts: &[Shift],
    ) -> Option<&'a Guard>;
}

/// Premier candidat disponible, sans classement.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstAvailable;

impl ReplacementSelector for FirstAvailable {
    fn select<'a>(&self, candidates: &'a [Guard], leave: &Leave, _shifts: &[Shift]) -> Option<&'a Guard> {
        find_replacement_guard(candidates, &leave.guard)
    }
}

/// Candidat ayant le moins de shifts sur la période du congé ; à égalité,
/// l'ordre de la réserve est conservé.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastLoaded;

impl ReplacementSelector for LeastLoaded {
    fn select<'a>(&self, candidates: &'a [Guard], leave: &Leave, shifts: &[Shift]) -> Option<&'a Guard> {
        candidates
            .iter()
            .filter(|g| g.id != leave.guard)
            .enumerate()
            .min_by_key(|(idx, g)| {
                let load = shifts
                    .iter()
                    .filter(|s| s.guard == g.id && s.start < leave.end && leave.start < s.end)
                    .count();
                (load, *idx)
            })
            .map(|(_, g)| g)
    }
}

/// Exclut l'agent remplacé et renvoie le premier candidat restant.
pub fn find_replacement_guard<'a>(candidates: &'a [Guard], original: &GuardId) -> Option<&'a Guard> {
    candidates.iter().find(|g| &g.id != original)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AreaId, ShiftType};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn never_returns_the_original_guard() {
        let a = Guard::new("a");
        let b = Guard::new("b");
        let pool = vec![a.clone(), b.clone()];
        assert_eq!(find_replacement_guard(&pool, &a.id).map(|g| &g.id), Some(&b.id));
        assert!(find_replacement_guard(&[a.clone()], &a.id).is_none());
        assert!(find_replacement_guard(&[], &a.id).is_none());
    }

    #[test]
    fn least_loaded_prefers_idle_guard() {
        let a = Guard::new("a");
        let busy = Guard::new("busy");
        let idle = Guard::new("idle");
        let t0 = Utc.with_ymd_and_hms(2025, 4, 5, 0, 0, 0).unwrap();
        let leave = Leave::new(a.id.clone(), t0, t0 + Duration::days(3), None).unwrap();
        let shift = Shift::new(
            busy.id.clone(),
            AreaId::new("gate"),
            ShiftType::Morning,
            t0 + Duration::hours(7),
            t0 + Duration::hours(15),
        )
        .unwrap();

        let pool = vec![a.clone(), busy.clone(), idle.clone()];
        let picked = LeastLoaded.select(&pool, &leave, &[shift.clone()]).unwrap();
        assert_eq!(picked.id, idle.id);

        let picked = FirstAvailable.select(&pool, &leave, &[shift]).unwrap();
        assert_eq!(picked.id, busy.id);
    }
}
