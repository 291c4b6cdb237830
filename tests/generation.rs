#![forbid(unsafe_code)]
use chrono::{Datelike, Duration, Weekday};
use guard_roster::{
    calendar::{self, Week},
    generate_weekly_shifts, Area, FixedAssignments, Guard, ManualShift, RotationStrategy,
    ScheduleOptions, Shift, ShiftType,
};
use std::collections::{HashMap, HashSet};

fn staggered() -> ScheduleOptions {
    ScheduleOptions {
        rotation: RotationStrategy::Staggered,
        ..ScheduleOptions::default()
    }
}

fn guards(names: &[&str]) -> Vec<Guard> {
    names.iter().map(|n| Guard::new(*n)).collect()
}

fn local_weekday(shift: &Shift, opts: &ScheduleOptions) -> Weekday {
    calendar::local_date(shift.start, opts.timezone).weekday()
}

#[test]
fn three_guards_one_area_cover_the_week() {
    let guards = guards(&["ali", "babak", "cyrus"]);
    let areas = vec![Area::new("main gate")];
    let opts = ScheduleOptions::default();

    let shifts = generate_weekly_shifts(
        &guards,
        &areas,
        Week::new(1403, 10).unwrap(),
        &FixedAssignments::new(),
        &[],
        &opts,
    )
    .unwrap();

    assert_eq!(shifts.len(), 21);
    let mut per_day: HashMap<Weekday, HashSet<ShiftType>> = HashMap::new();
    for s in &shifts {
        per_day
            .entry(local_weekday(s, &opts))
            .or_default()
            .insert(s.shift_type);
        assert!(!s.is_manual);
        assert_eq!(s.area, areas[0].id);
    }
    assert_eq!(per_day.len(), 7);
    assert!(per_day.values().all(|types| types.len() == 3));
    let seen: HashSet<_> = shifts.iter().map(|s| s.guard.clone()).collect();
    assert!(seen.iter().all(|id| guards.iter().any(|g| &g.id == id)));
}

#[test]
fn friday_uses_the_remapped_shift_types() {
    // semaine 3 : décalages de rotation 0, 1, 2 → vendredi, le matin va à g0
    let guards = guards(&["g0", "g1", "g2"]);
    let areas = vec![Area::new("lobby")];
    let opts = staggered();
    let shifts = generate_weekly_shifts(
        &guards,
        &areas,
        Week::new(1403, 3).unwrap(),
        &FixedAssignments::new(),
        &[],
        &opts,
    )
    .unwrap();

    let on = |weekday: Weekday, guard: &Guard| -> Vec<ShiftType> {
        shifts
            .iter()
            .filter(|s| s.guard == guard.id && local_weekday(s, &opts) == weekday)
            .map(|s| s.shift_type)
            .collect()
    };

    assert_eq!(on(Weekday::Sat, &guards[0]), vec![ShiftType::Morning]);
    assert_eq!(on(Weekday::Sat, &guards[1]), vec![ShiftType::Afternoon]);
    assert_eq!(on(Weekday::Sat, &guards[2]), vec![ShiftType::Night]);

    assert_eq!(on(Weekday::Fri, &guards[0]), vec![ShiftType::Night]);
    assert_eq!(on(Weekday::Fri, &guards[1]), vec![ShiftType::Morning]);
    assert_eq!(on(Weekday::Fri, &guards[2]), vec![ShiftType::Afternoon]);
}

#[test]
fn fixed_guard_never_rotates_into_its_area() {
    let guards = guards(&["a", "b", "c", "d"]);
    let areas = vec![Area::new("north"), Area::new("south")];
    let mut fixed = FixedAssignments::new();
    fixed.insert(guards[0].id.clone(), areas[0].id.clone());

    for _ in 0..20 {
        let shifts = generate_weekly_shifts(
            &guards,
            &areas,
            Week::new(1403, 20).unwrap(),
            &fixed,
            &[],
            &ScheduleOptions::default(),
        )
        .unwrap();
        assert_eq!(shifts.len(), 42);
        assert!(shifts
            .iter()
            .filter(|s| !s.is_manual)
            .all(|s| !fixed.excludes(&s.guard, &s.area)));
    }
}

#[test]
fn area_with_only_fixed_guards_is_skipped() {
    let guards = guards(&["solo"]);
    let areas = vec![Area::new("vault"), Area::new("yard")];
    let mut fixed = FixedAssignments::new();
    fixed.insert(guards[0].id.clone(), areas[0].id.clone());

    let shifts = generate_weekly_shifts(
        &guards,
        &areas,
        Week::new(1403, 20).unwrap(),
        &fixed,
        &[],
        &ScheduleOptions::default(),
    )
    .unwrap();
    assert!(shifts.iter().all(|s| s.area == areas[1].id));
    assert_eq!(shifts.len(), 21);
}

#[test]
fn manual_shift_wins_over_rotation() {
    let guards = guards(&["a", "b", "c"]);
    let areas = vec![Area::new("x")];
    let b = &guards[1];
    let manual = vec![ManualShift {
        guard: b.id.clone(),
        area: areas[0].id.clone(),
        day: 0,
        shift_type: ShiftType::Morning,
    }];
    let opts = staggered();

    let shifts = generate_weekly_shifts(
        &guards,
        &areas,
        Week::new(1403, 3).unwrap(),
        &FixedAssignments::new(),
        &manual,
        &opts,
    )
    .unwrap();

    let manual_out: Vec<_> = shifts.iter().filter(|s| s.is_manual).collect();
    assert_eq!(manual_out.len(), 1);
    assert_eq!(manual_out[0].guard, b.id);
    assert_eq!(manual_out[0].shift_type, ShiftType::Morning);
    assert_eq!(local_weekday(manual_out[0], &opts), Weekday::Sat);

    // b tenait l'après-midi du samedi dans la rotation : supprimé
    assert!(!shifts
        .iter()
        .any(|s| !s.is_manual && s.guard == b.id && local_weekday(s, &opts) == Weekday::Sat));
    assert_eq!(shifts.len(), 21);
}

#[test]
fn manual_shift_suppresses_guard_in_every_area() {
    let guards = guards(&["a", "b", "c"]);
    let areas = vec![Area::new("x"), Area::new("y")];
    let manual = vec![ManualShift {
        guard: guards[2].id.clone(),
        area: areas[0].id.clone(),
        day: 4,
        shift_type: ShiftType::Night,
    }];
    let opts = ScheduleOptions::default();

    for _ in 0..10 {
        let shifts = generate_weekly_shifts(
            &guards,
            &areas,
            Week::new(1403, 7).unwrap(),
            &FixedAssignments::new(),
            &manual,
            &opts,
        )
        .unwrap();
        let start = calendar::week_start(opts.calendar, Week::new(1403, 7).unwrap()).unwrap();
        let day4 = calendar::day_date(start, 4);
        assert!(!shifts.iter().any(|s| {
            !s.is_manual
                && s.guard == guards[2].id
                && calendar::local_date(s.start, opts.timezone) == day4
        }));
        let automatic = shifts.iter().filter(|s| !s.is_manual).count();
        assert!((36..=42).contains(&automatic));
    }
}

#[test]
fn every_shift_ends_after_it_starts() {
    let guards = guards(&["a", "b", "c", "d", "e"]);
    let areas = vec![Area::new("x"), Area::new("y"), Area::new("z")];
    let opts = ScheduleOptions::default();
    let shifts = generate_weekly_shifts(
        &guards,
        &areas,
        Week::new(1404, 1).unwrap(),
        &FixedAssignments::new(),
        &[],
        &opts,
    )
    .unwrap();

    assert_eq!(shifts.len(), 63);
    for s in &shifts {
        assert!(s.end > s.start);
        assert_eq!(s.end - s.start, Duration::hours(8));
        let start_day = calendar::local_date(s.start, opts.timezone);
        let end_day = calendar::local_date(s.end, opts.timezone);
        if s.shift_type == ShiftType::Night {
            assert_eq!(end_day, start_day + Duration::days(1));
        } else {
            assert_eq!(end_day, start_day);
        }
    }
}

#[test]
fn staggered_rotation_avoids_same_day_repeats() {
    let guards = guards(&["a", "b", "c", "d"]);
    let areas = vec![Area::new("x")];
    let opts = staggered();
    let shifts = generate_weekly_shifts(
        &guards,
        &areas,
        Week::new(1403, 40).unwrap(),
        &FixedAssignments::new(),
        &[],
        &opts,
    )
    .unwrap();

    let mut seen = HashSet::new();
    for s in &shifts {
        let day = calendar::local_date(s.start, opts.timezone);
        assert!(seen.insert((s.guard.clone(), day)), "guard booked twice on {day}");
    }
}

#[test]
fn seeded_shuffle_repeats_assignments() {
    let guards = guards(&["a", "b", "c", "d", "e"]);
    let areas = vec![Area::new("x"), Area::new("y")];
    let opts = ScheduleOptions {
        rotation: RotationStrategy::Shuffled { seed: Some(1234) },
        ..ScheduleOptions::default()
    };
    let run = || -> Vec<_> {
        generate_weekly_shifts(
            &guards,
            &areas,
            Week::new(1403, 15).unwrap(),
            &FixedAssignments::new(),
            &[],
            &opts,
        )
        .unwrap()
        .into_iter()
        .map(|s| (s.guard, s.area, s.start, s.shift_type))
        .collect()
    };
    assert_eq!(run(), run());
}
