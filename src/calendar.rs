//! Semaines et fenêtres horaires.
//!
//! Les semaines commencent le samedi (jour 0) et finissent le vendredi
//! (jour 6). L'année est par défaut une année du calendrier hégirien solaire ;
//! la semaine 1 est celle qui contient le 1er Farvardin (Nowruz).
//! Les dates sont calculées en heure locale du site puis stockées en UTC.

use crate::model::ShiftType;
use crate::scheduler::SchedError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DAYS_PER_WEEK: u8 = 7;
pub const MAX_WEEK: u32 = 53;

/// Calendrier utilisé pour numéroter années et semaines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalendarKind {
    #[default]
    SolarHijri,
    Gregorian,
}

/// Semaine cible : (année, numéro 1..=53).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWeek")]
pub struct Week {
    year: i32,
    number: u32,
}

#[derive(Deserialize)]
struct RawWeek {
    year: i32,
    number: u32,
}

impl TryFrom<RawWeek> for Week {
    type Error = SchedError;

    fn try_from(raw: RawWeek) -> Result<Self, Self::Error> {
        Week::new(raw.year, raw.number)
    }
}

impl Week {
    pub fn new(year: i32, number: u32) -> Result<Self, SchedError> {
        if number == 0 || number > MAX_WEEK {
            return Err(SchedError::InvalidWeek(format!(
                "week number {number} out of range 1..={MAX_WEEK}"
            )));
        }
        Ok(Self { year, number })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.number)
    }
}

/// Samedi qui ouvre la semaine donnée.
pub fn week_start(kind: CalendarKind, week: Week) -> Result<NaiveDate, SchedError> {
    let first_day = year_start(kind, week.year)?;
    let index = week
        .number
        .checked_sub(1)
        .ok_or_else(|| SchedError::InvalidWeek(format!("week {week} has no week zero")))?;
    let offset = i64::from(index) * i64::from(DAYS_PER_WEEK);
    saturday_on_or_before(first_day)
        .checked_add_signed(Duration::days(offset))
        .ok_or_else(|| SchedError::InvalidWeek(format!("week {week} overflows the calendar")))
}

/// Semaine contenant `date`.
pub fn week_of(kind: CalendarKind, date: NaiveDate) -> Result<Week, SchedError> {
    let gregorian_year = date.year();
    let mut year = match kind {
        CalendarKind::Gregorian => gregorian_year,
        CalendarKind::SolarHijri => gregorian_year - 621,
    };
    // la semaine 1 peut commencer quelques jours avant le début de l'année
    let next_first = saturday_on_or_before(year_start(kind, year + 1)?);
    if date >= next_first {
        year += 1;
    } else {
        let first = saturday_on_or_before(year_start(kind, year)?);
        if date < first {
            year -= 1;
        }
    }
    let first = saturday_on_or_before(year_start(kind, year)?);
    let days = (date - first).num_days();
    let number = u32::try_from(days / i64::from(DAYS_PER_WEEK) + 1)
        .map_err(|_| SchedError::InvalidWeek(format!("date {date} precedes year {year}")))?;
    Week::new(year, number)
}

fn year_start(kind: CalendarKind, year: i32) -> Result<NaiveDate, SchedError> {
    let date = match kind {
        CalendarKind::Gregorian => NaiveDate::from_ymd_opt(year, 1, 1),
        CalendarKind::SolarHijri => jalali::nowruz(year),
    };
    date.ok_or_else(|| SchedError::InvalidWeek(format!("year {year} is out of supported range")))
}

pub fn saturday_on_or_before(date: NaiveDate) -> NaiveDate {
    let back = (date.weekday().num_days_from_sunday() + 1) % 7;
    date - Duration::days(i64::from(back))
}

/// Date absolue du jour `day` (0 = samedi) de la semaine.
pub fn day_date(start_of_week: NaiveDate, day: u8) -> NaiveDate {
    start_of_week + Duration::days(i64::from(day))
}

pub fn is_friday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri
}

/// Fenêtre [start, end) d'un créneau pour une date locale.
/// Le créneau de nuit se termine le lendemain.
pub fn shift_window(
    date: NaiveDate,
    shift_type: ShiftType,
    tz: Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), SchedError> {
    let start_time = NaiveTime::from_hms_opt(shift_type.start_hour(), 0, 0)
        .ok_or(SchedError::InvalidTimeRange)?;
    let start = NaiveDateTime::new(date, start_time);
    let end = start + Duration::hours(i64::from(ShiftType::HOURS));
    let start = to_utc(start, tz)?;
    let end = to_utc(end, tz)?;
    if end <= start {
        return Err(SchedError::InvalidTimeRange);
    }
    Ok((start, end))
}

/// Bornes UTC d'une semaine : samedi 00:00 local jusqu'au samedi suivant.
pub fn week_bounds(
    kind: CalendarKind,
    week: Week,
    tz: Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), SchedError> {
    let first = week_start(kind, week)?;
    let start = to_utc(first.and_time(NaiveTime::MIN), tz)?;
    let end = to_utc(
        day_date(first, DAYS_PER_WEEK).and_time(NaiveTime::MIN),
        tz,
    )?;
    Ok((start, end))
}

pub fn local_date(at: DateTime<Utc>, tz: Tz) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

fn to_utc(local: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, SchedError> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(SchedError::InvalidTimeRange)
}

/// Conversion hégirien solaire → grégorien (algorithme de Borkowski,
/// années -61..3177).
mod jalali {
    use chrono::NaiveDate;

    const BREAKS: [i32; 20] = [
        -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
        2394, 2456, 3178,
    ];

    /// Date grégorienne du 1er Farvardin de l'année `jy`.
    pub(super) fn nowruz(jy: i32) -> Option<NaiveDate> {
        let last = BREAKS[BREAKS.len() - 1];
        if jy < BREAKS[0] || jy >= last {
            return None;
        }
        let gy = jy + 621;
        let mut leap_j = -14;
        let mut jp = BREAKS[0];
        let mut jump = 0;
        for &jm in &BREAKS[1..] {
            jump = jm - jp;
            if jy < jm {
                break;
            }
            leap_j += jump / 33 * 8 + (jump % 33) / 4;
            jp = jm;
        }
        let n = jy - jp;
        leap_j += n / 33 * 8 + (n % 33 + 3) / 4;
        if jump % 33 == 4 && jump - n == 4 {
            leap_j += 1;
        }
        let leap_g = gy / 4 - (gy / 100 + 1) * 3 / 4 - 150;
        let march = 20 + leap_j - leap_g;
        NaiveDate::from_ymd_opt(gy, 3, u32::try_from(march).ok()?)
    }
}
