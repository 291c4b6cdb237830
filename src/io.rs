use crate::model::{Area, Guard, Roster, ShiftType};
use crate::scheduler::ManualShift;
use anyhow::{bail, Context};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs;
use std::path::Path;
use tracing::warn;

fn field<'r>(rec: &'r StringRecord, idx: usize) -> Option<&'r str> {
    rec.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Import d'agents depuis CSV: header `name[,phone][,status]`
pub fn import_guards_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Guard>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = field(&rec, 0).context("invalid guard row (empty name)")?;
        let mut guard = Guard::new(name);
        guard.phone = field(&rec, 1).map(str::to_string);
        if let Some(status) = field(&rec, 2) {
            guard.status = status
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid status for guard {name}"))?;
        }
        out.push(guard);
    }
    Ok(out)
}

/// Import de zones depuis CSV: header `name[,location][,active]`
pub fn import_areas_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Area>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = field(&rec, 0).context("invalid area row (empty name)")?;
        let mut area = Area::new(name);
        area.location = field(&rec, 1).map(str::to_string);
        if let Some(flag) = field(&rec, 2) {
            area.active =
                parse_bool(flag).with_context(|| format!("invalid active value for area {name}"))?;
        }
        out.push(area);
    }
    Ok(out)
}

/// Import de shifts manuels: header `guard,area,day,shift_type`.
/// Agent et zone sont cherchés par id puis par nom ; une ligne incomplète ou
/// inconnue est ignorée avec un avertissement.
pub fn import_manual_shifts_csv<P: AsRef<Path>>(
    path: P,
    roster: &Roster,
) -> anyhow::Result<Vec<ManualShift>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        match manual_row(&rec, roster) {
            Ok(entry) => out.push(entry),
            Err(err) => warn!(row = line + 1, error = %err, "skipping manual shift row"),
        }
    }
    Ok(out)
}

fn manual_row(rec: &StringRecord, roster: &Roster) -> anyhow::Result<ManualShift> {
    let guard_key = field(rec, 0).context("missing guard")?;
    let area_key = field(rec, 1).context("missing area")?;
    let day: u8 = field(rec, 2)
        .context("missing day")?
        .parse()
        .context("day must be an integer 0..=6")?;
    let shift_type: ShiftType = field(rec, 3)
        .context("missing shift_type")?
        .parse()
        .map_err(anyhow::Error::msg)?;
    let guard = roster
        .lookup_guard(guard_key)
        .with_context(|| format!("unknown guard {guard_key}"))?;
    let area = roster
        .lookup_area(area_key)
        .with_context(|| format!("unknown area {area_key}"))?;
    Ok(ManualShift {
        guard: guard.id.clone(),
        area: area.id.clone(),
        day,
        shift_type,
    })
}

pub fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

pub fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date: {raw}"))
}

/// RFC3339, ou date seule interprétée à minuit local. Le booléen indique une
/// date seule.
pub fn parse_point(raw: &str, tz: Tz) -> anyhow::Result<(DateTime<Utc>, bool)> {
    if let Ok(dt) = raw.parse::<DateTime<Utc>>() {
        return Ok((dt, false));
    }
    let date = parse_date(raw)?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("invalid midnight conversion")?;
    let local = tz
        .from_local_datetime(&midnight)
        .earliest()
        .with_context(|| format!("{raw} does not exist in {tz}"))?;
    Ok((local.with_timezone(&Utc), true))
}

/// Période de congé : une date de fin seule couvre toute la journée.
pub fn parse_leave_range(
    start_raw: &str,
    end_raw: &str,
    tz: Tz,
) -> anyhow::Result<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, _) = parse_point(start_raw, tz)?;
    let (mut end, end_was_date) = parse_point(end_raw, tz)?;
    if end_was_date {
        end += Duration::days(1);
    }
    if end <= start {
        bail!("leave end must be after start");
    }
    Ok((start, end))
}

/// Export JSON du roster (jolie mise en forme)
pub fn export_roster_json<P: AsRef<Path>>(path: P, roster: &Roster) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(roster)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV des shifts:
/// header `id,guard,area,shift_type,start,end,status,manual,replacement_for`
pub fn export_shifts_csv<P: AsRef<Path>>(path: P, roster: &Roster) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "id",
        "guard",
        "area",
        "shift_type",
        "start",
        "end",
        "status",
        "manual",
        "replacement_for",
    ])?;
    let mut shifts: Vec<_> = roster.shifts.iter().collect();
    shifts.sort_by_key(|s| s.start);
    for s in shifts {
        let guard = roster
            .find_guard(&s.guard)
            .map(|g| g.name.as_str())
            .unwrap_or(s.guard.as_str());
        let area = roster
            .find_area(&s.area)
            .map(|a| a.name.as_str())
            .unwrap_or(s.area.as_str());
        let replacement_for = s
            .replacement_for
            .as_ref()
            .map(|id| roster.find_guard(id).map(|g| g.name.as_str()).unwrap_or(id.as_str()))
            .unwrap_or("");
        let start = s.start.to_rfc3339();
        let end = s.end.to_rfc3339();
        let status = s.status.to_string();
        w.write_record([
            s.id.as_str(),
            guard,
            area,
            s.shift_type.as_str(),
            start.as_str(),
            end.as_str(),
            status.as_str(),
            if s.is_manual { "true" } else { "false" },
            replacement_for,
        ])?;
    }
    w.flush()?;
    Ok(())
}
