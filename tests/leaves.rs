#![forbid(unsafe_code)]
use guard_roster::{
    calendar::{self, Week},
    io, Area, FirstAvailable, Guard, GuardId, GuardStatus, LeastLoaded, LeaveId, LeaveStatus,
    RotationStrategy, SchedError, ScheduleOptions, Scheduler, ShiftId,
};

fn opts() -> ScheduleOptions {
    ScheduleOptions {
        rotation: RotationStrategy::Staggered,
        ..ScheduleOptions::default()
    }
}

struct Site {
    s: Scheduler,
    c: GuardId,
    d: GuardId,
}

/// Trois agents (c, d, e), une zone, semaine 1403-W03 générée.
fn site() -> Site {
    let mut s = Scheduler::new();
    let c = Guard::new("Cyrus");
    let d = Guard::new("Dara");
    let e = Guard::new("Elham");
    let (c_id, d_id) = (c.id.clone(), d.id.clone());
    s.add_guards(vec![c, d, e]);
    s.add_areas(vec![Area::new("gate")]);
    s.generate_week(Week::new(1403, 3).unwrap(), &[], &opts(), false)
        .unwrap();
    Site { s, c: c_id, d: d_id }
}

/// Congé de `guard` du lundi au mercredi (jours 2 à 4) inclus.
fn request_midweek(s: &mut Scheduler, guard: &GuardId) -> LeaveId {
    let o = opts();
    let start = calendar::week_start(o.calendar, Week::new(1403, 3).unwrap()).unwrap();
    let from = calendar::day_date(start, 2).to_string();
    let to = calendar::day_date(start, 4).to_string();
    let (from, to) = io::parse_leave_range(&from, &to, o.timezone).unwrap();
    s.request_leave(guard, from, to, Some("family".into())).unwrap()
}

fn covered_shifts(s: &Scheduler, leave: &LeaveId, guard: &GuardId) -> Vec<ShiftId> {
    let leave = s.roster().find_leave(leave).unwrap();
    s.roster()
        .shifts
        .iter()
        .filter(|sh| &sh.guard == guard && leave.covers(sh))
        .map(|sh| sh.id.clone())
        .collect()
}

#[test]
fn approval_moves_covered_shifts_to_replacement() {
    let Site { mut s, c, d } = site();
    let leave = request_midweek(&mut s, &c);
    let before = covered_shifts(&s, &leave, &c);
    assert!(!before.is_empty());

    let decision = s
        .approve_leave(&leave, Some(&d), "supervisor", &FirstAvailable)
        .unwrap();
    assert_eq!(decision.reassigned, before.len());
    assert_eq!(decision.leave.status, LeaveStatus::Approved);
    assert_eq!(decision.leave.replacement_guard.as_ref(), Some(&d));
    assert_eq!(decision.leave.approved_by.as_deref(), Some("supervisor"));

    for id in &before {
        let shift = s.roster().find_shift(id).unwrap();
        assert_eq!(shift.guard, d);
        assert_eq!(shift.replacement_for.as_ref(), Some(&c));
        assert!(shift.notes.as_deref().unwrap().contains("Cyrus"));
    }
    assert!(covered_shifts(&s, &leave, &c).is_empty());
    assert_eq!(s.roster().find_guard(&c).unwrap().status, GuardStatus::OnLeave);
}

#[test]
fn shifts_outside_the_leave_stay_with_the_guard() {
    let Site { mut s, c, d } = site();
    let total_c = s.shifts_for_guard(&c).len();
    let leave = request_midweek(&mut s, &c);
    let decision = s
        .approve_leave(&leave, Some(&d), "supervisor", &FirstAvailable)
        .unwrap();
    assert_eq!(s.shifts_for_guard(&c).len(), total_c - decision.reassigned);
    assert!(s.shifts_for_guard(&c).iter().all(|sh| sh.replacement_for.is_none()));
}

#[test]
fn rejected_leave_cannot_be_approved() {
    let Site { mut s, c, d } = site();
    let leave = request_midweek(&mut s, &c);
    let rejected = s.reject_leave(&leave, None, "supervisor").unwrap();
    assert_eq!(rejected.status, LeaveStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("no reason given"));

    let snapshot = serde_json::to_string(s.roster()).unwrap();
    let err = s
        .approve_leave(&leave, Some(&d), "supervisor", &FirstAvailable)
        .unwrap_err();
    assert!(matches!(err, SchedError::InvalidState(_)));
    assert_eq!(serde_json::to_string(s.roster()).unwrap(), snapshot);
    assert_eq!(s.roster().find_guard(&c).unwrap().status, GuardStatus::Active);
}

#[test]
fn approved_leave_cannot_be_approved_twice() {
    let Site { mut s, c, d } = site();
    let leave = request_midweek(&mut s, &c);
    s.approve_leave(&leave, Some(&d), "supervisor", &FirstAvailable)
        .unwrap();
    let err = s
        .approve_leave(&leave, Some(&d), "supervisor", &FirstAvailable)
        .unwrap_err();
    assert!(matches!(err, SchedError::InvalidState(_)));
}

#[test]
fn handled_leave_cannot_be_rejected() {
    let Site { mut s, c, d } = site();
    let approved = request_midweek(&mut s, &c);
    s.approve_leave(&approved, Some(&d), "supervisor", &FirstAvailable)
        .unwrap();

    let snapshot = serde_json::to_string(s.roster()).unwrap();
    let err = s
        .reject_leave(&approved, Some("too late".into()), "supervisor")
        .unwrap_err();
    assert!(matches!(err, SchedError::InvalidState(_)));
    assert_eq!(serde_json::to_string(s.roster()).unwrap(), snapshot);
    assert_eq!(s.roster().find_guard(&c).unwrap().status, GuardStatus::OnLeave);
    let stored = s.roster().find_leave(&approved).unwrap();
    assert_eq!(stored.status, LeaveStatus::Approved);
    assert!(stored.rejection_reason.is_none());

    let rejected = request_midweek(&mut s, &d);
    s.reject_leave(&rejected, None, "supervisor").unwrap();
    let snapshot = serde_json::to_string(s.roster()).unwrap();
    let err = s
        .reject_leave(&rejected, Some("again".into()), "other")
        .unwrap_err();
    assert!(matches!(err, SchedError::InvalidState(_)));
    assert_eq!(serde_json::to_string(s.roster()).unwrap(), snapshot);
    assert_eq!(s.roster().find_guard(&d).unwrap().status, GuardStatus::Active);
}

#[test]
fn replacement_must_be_active() {
    let Site { mut s, c, d } = site();
    let leave = request_midweek(&mut s, &c);
    for status in [GuardStatus::Inactive, GuardStatus::OnLeave] {
        s.set_guard_status(&d, status).unwrap();
        let snapshot = serde_json::to_string(s.roster()).unwrap();
        let err = s
            .approve_leave(&leave, Some(&d), "supervisor", &FirstAvailable)
            .unwrap_err();
        assert!(matches!(err, SchedError::InvalidState(_)));
        assert_eq!(serde_json::to_string(s.roster()).unwrap(), snapshot);
    }

    s.set_guard_status(&d, GuardStatus::Active).unwrap();
    s.approve_leave(&leave, Some(&d), "supervisor", &FirstAvailable)
        .unwrap();
}

#[test]
fn replacement_must_differ_from_guard_on_leave() {
    let Site { mut s, c, .. } = site();
    let leave = request_midweek(&mut s, &c);
    let err = s
        .approve_leave(&leave, Some(&c), "supervisor", &FirstAvailable)
        .unwrap_err();
    assert!(matches!(err, SchedError::InvalidState(_)));

    let unknown = GuardId::new("nobody");
    let err = s
        .approve_leave(&leave, Some(&unknown), "supervisor", &FirstAvailable)
        .unwrap_err();
    assert!(matches!(err, SchedError::UnknownGuard(_)));
    assert_eq!(
        s.roster().find_leave(&leave).unwrap().status,
        LeaveStatus::Pending
    );
}

#[test]
fn selector_picks_replacement_when_none_given() {
    let Site { mut s, c, .. } = site();
    let leave = request_midweek(&mut s, &c);
    let decision = s
        .approve_leave(&leave, None, "supervisor", &LeastLoaded)
        .unwrap();
    let replacement = decision.leave.replacement_guard.unwrap();
    assert_ne!(replacement, c);
    assert!(s.roster().find_guard(&replacement).is_some());
}

#[test]
fn lone_guard_has_no_replacement() {
    let mut s = Scheduler::new();
    let solo = Guard::new("solo");
    let id = solo.id.clone();
    s.add_guards(vec![solo]);
    let (from, to) = io::parse_leave_range("2025-04-05", "2025-04-06", chrono_tz::UTC).unwrap();
    let leave = s.request_leave(&id, from, to, None).unwrap();

    let err = s
        .approve_leave(&leave, None, "supervisor", &FirstAvailable)
        .unwrap_err();
    assert!(matches!(err, SchedError::NoReplacementAvailable(_)));
    assert_eq!(
        s.roster().find_leave(&leave).unwrap().status,
        LeaveStatus::Pending
    );
}

#[test]
fn approval_without_shifts_still_marks_guard_on_leave() {
    let mut s = Scheduler::new();
    let a = Guard::new("a");
    let b = Guard::new("b");
    let (a_id, b_id) = (a.id.clone(), b.id.clone());
    s.add_guards(vec![a, b]);
    let (from, to) = io::parse_leave_range("2030-01-01", "2030-01-02", chrono_tz::UTC).unwrap();
    let leave = s.request_leave(&a_id, from, to, None).unwrap();

    let decision = s
        .approve_leave(&leave, Some(&b_id), "supervisor", &FirstAvailable)
        .unwrap();
    assert_eq!(decision.reassigned, 0);
    assert_eq!(decision.message(), "leave approved, nothing to reassign");
    assert_eq!(s.roster().find_guard(&a_id).unwrap().status, GuardStatus::OnLeave);
}

#[test]
fn replacement_records_are_protected() {
    let Site { mut s, c, d } = site();
    let leave = request_midweek(&mut s, &c);
    let moved = covered_shifts(&s, &leave, &c);
    s.approve_leave(&leave, Some(&d), "supervisor", &FirstAvailable)
        .unwrap();

    let err = s.delete_shift(&moved[0]).unwrap_err();
    assert!(matches!(err, SchedError::DeleteBlocked(_)));
    let err = s.delete_leave(&leave).unwrap_err();
    assert!(matches!(err, SchedError::DeleteBlocked(_)));

    let other = s
        .roster()
        .shifts
        .iter()
        .find(|sh| sh.replacement_for.is_none())
        .map(|sh| sh.id.clone())
        .unwrap();
    s.delete_shift(&other).unwrap();
}

#[test]
fn pending_and_rejected_leaves_can_be_deleted() {
    let Site { mut s, c, .. } = site();
    let pending = request_midweek(&mut s, &c);
    let removed = s.delete_leave(&pending).unwrap();
    assert_eq!(removed.id, pending);

    let rejected = request_midweek(&mut s, &c);
    assert_eq!(s.leaves_for_guard(&c).len(), 1);
    s.reject_leave(&rejected, Some("short staffed".into()), "supervisor")
        .unwrap();
    s.delete_leave(&rejected).unwrap();
    assert!(s.roster().leaves.is_empty());
}

#[test]
fn options_list_covered_shifts_and_other_active_guards() {
    let Site { mut s, c, d } = site();
    let leave = request_midweek(&mut s, &c);
    let options = s.replacement_options(&leave).unwrap();
    assert_eq!(options.shifts.len(), covered_shifts(&s, &leave, &c).len());
    assert_eq!(options.candidates.len(), 2);
    assert!(options.candidates.iter().all(|g| g.id != c));
    assert!(options.candidates.iter().any(|g| g.id == d));
}
