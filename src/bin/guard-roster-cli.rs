#![forbid(unsafe_code)]
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use guard_roster::{
    calendar::{self, Week},
    config::Settings,
    io,
    model::{Area, AreaId, Guard, GuardId, GuardStatus, LeaveId, Roster, ShiftId, ShiftType},
    scheduler::{
        area_affinities, ConflictKind, FirstAvailable, LeastLoaded, ReplacementSelector,
        ScheduleOptions, Scheduler,
    },
    storage::{JsonStorage, Storage},
};
use chrono::Utc;
use std::path::PathBuf;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification des agents de sécurité (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de roster
    #[arg(long, global = true, default_value = "roster.json")]
    roster: String,

    /// Fichier de réglages TOML (défaut : guard-roster.toml s'il existe)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusChange {
    Start,
    Complete,
    Cancel,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ajouter un agent
    AddGuard {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Ajouter une zone
    AddArea {
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: Option<String>,
    },

    /// Importer des agents depuis un CSV
    ImportGuards {
        #[arg(long)]
        csv: String,
    },

    /// Importer des zones depuis un CSV
    ImportAreas {
        #[arg(long)]
        csv: String,
    },

    /// Changer le statut d'un agent (active, inactive, on-leave)
    SetStatus {
        #[arg(long)]
        guard: String,
        #[arg(long)]
        status: GuardStatus,
    },

    /// Exclure (ou réintégrer avec --remove) un agent de la rotation d'une zone
    Fix {
        #[arg(long)]
        guard: String,
        #[arg(long)]
        area: String,
        #[arg(long)]
        remove: bool,
    },

    /// Lister les affectations fixes configurées et déduites
    Fixed,

    /// Générer les shifts d'une semaine
    Generate {
        /// Numéro de semaine (défaut : semaine courante)
        #[arg(long)]
        week: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
        /// CSV de shifts manuels `guard,area,day,shift_type`
        #[arg(long)]
        manual: Option<String>,
        /// Régénérer même si la semaine contient déjà des shifts
        #[arg(long)]
        force: bool,
    },

    /// Créer un shift isolé
    CreateShift {
        #[arg(long)]
        guard: String,
        #[arg(long)]
        area: String,
        /// YYYY-MM-DD (date locale du site)
        #[arg(long)]
        date: String,
        #[arg(long)]
        shift_type: ShiftType,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Démarrer, terminer ou annuler un shift
    ShiftStatus {
        #[arg(long)]
        shift_id: String,
        #[arg(long, value_enum)]
        change: StatusChange,
    },

    /// Déplacer un shift planifié
    Reschedule {
        #[arg(long)]
        shift_id: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        shift_type: ShiftType,
    },

    /// Supprimer un shift
    DeleteShift {
        #[arg(long)]
        shift_id: String,
    },

    /// Déposer une demande de congé
    RequestLeave {
        #[arg(long)]
        guard: String,
        /// Date (YYYY-MM-DD) ou RFC3339
        #[arg(long)]
        start: String,
        /// Date incluse (YYYY-MM-DD) ou RFC3339
        #[arg(long)]
        end: String,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Approuver un congé et réaffecter ses shifts
    ApproveLeave {
        #[arg(long)]
        leave_id: String,
        /// Remplaçant ; choisi automatiquement si absent
        #[arg(long)]
        replacement: Option<String>,
        /// Choisir le remplaçant le moins chargé plutôt que le premier
        #[arg(long)]
        least_loaded: bool,
        #[arg(long, default_value = "admin")]
        by: String,
    },

    /// Refuser un congé
    RejectLeave {
        #[arg(long)]
        leave_id: String,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long, default_value = "admin")]
        by: String,
    },

    /// Supprimer un congé
    DeleteLeave {
        #[arg(long)]
        leave_id: String,
    },

    /// Shifts à couvrir et remplaçants possibles pour un congé
    Replacements {
        #[arg(long)]
        leave_id: String,
    },

    /// Lister et optionnellement exporter
    List {
        #[arg(long)]
        week: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        guard: Option<String>,
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Vérifier les conflits
    Check {
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },
}

fn guard_id(roster: &Roster, key: &str) -> Result<GuardId> {
    roster
        .lookup_guard(key)
        .map(|g| g.id.clone())
        .ok_or_else(|| anyhow!("unknown guard: {key}"))
}

fn area_id(roster: &Roster, key: &str) -> Result<AreaId> {
    roster
        .lookup_area(key)
        .map(|a| a.id.clone())
        .ok_or_else(|| anyhow!("unknown area: {key}"))
}

fn resolve_week(opts: &ScheduleOptions, week: Option<u32>, year: Option<i32>) -> Result<Week> {
    let today = calendar::local_date(Utc::now(), opts.timezone);
    let current = calendar::week_of(opts.calendar, today)?;
    Ok(Week::new(
        year.unwrap_or(current.year()),
        week.unwrap_or(current.number()),
    )?)
}

fn guard_name(roster: &Roster, id: &GuardId) -> String {
    roster
        .find_guard(id)
        .map(|g| g.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let opts = settings.schedule_options()?;

    let storage = JsonStorage::open(&cli.roster)?;
    let mut scheduler = Scheduler::with_roster(storage.load_or_default()?);

    let code = match cli.cmd {
        Commands::AddGuard { name, phone } => {
            let mut guard = Guard::new(name);
            guard.phone = phone;
            println!("{}", guard.id);
            scheduler.add_guards(vec![guard]);
            storage.save(scheduler.roster())?;
            0
        }
        Commands::AddArea { name, location } => {
            let mut area = Area::new(name);
            area.location = location;
            println!("{}", area.id);
            scheduler.add_areas(vec![area]);
            storage.save(scheduler.roster())?;
            0
        }
        Commands::ImportGuards { csv } => {
            let guards = io::import_guards_csv(csv)?;
            println!("imported {} guard(s)", guards.len());
            scheduler.add_guards(guards);
            storage.save(scheduler.roster())?;
            0
        }
        Commands::ImportAreas { csv } => {
            let areas = io::import_areas_csv(csv)?;
            println!("imported {} area(s)", areas.len());
            scheduler.add_areas(areas);
            storage.save(scheduler.roster())?;
            0
        }
        Commands::SetStatus { guard, status } => {
            let id = guard_id(scheduler.roster(), &guard)?;
            scheduler.set_guard_status(&id, status)?;
            storage.save(scheduler.roster())?;
            0
        }
        Commands::Fix {
            guard,
            area,
            remove,
        } => {
            let gid = guard_id(scheduler.roster(), &guard)?;
            let aid = area_id(scheduler.roster(), &area)?;
            if remove {
                scheduler.remove_fixed_assignment(&gid, &aid);
            } else {
                scheduler.add_fixed_assignment(&gid, &aid)?;
            }
            storage.save(scheduler.roster())?;
            0
        }
        Commands::Fixed => {
            let roster = scheduler.roster();
            let area_name = |id: &AreaId| {
                roster
                    .find_area(id)
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| id.to_string())
            };
            for fa in &roster.fixed_assignments {
                println!(
                    "configured | {} → {}",
                    guard_name(roster, &fa.guard),
                    area_name(&fa.area)
                );
            }
            for affinity in area_affinities(&roster.shifts, Utc::now(), opts.fixed) {
                println!(
                    "history    | {} → {} ({}/{} shifts, {:.0}%)",
                    guard_name(roster, &affinity.guard),
                    area_name(&affinity.area),
                    affinity.shifts_in_area,
                    affinity.total_shifts,
                    affinity.share() * 100.0
                );
            }
            0
        }
        Commands::Generate {
            week,
            year,
            manual,
            force,
        } => {
            let week = resolve_week(&opts, week, year)?;
            let manual = match manual {
                Some(path) => io::import_manual_shifts_csv(path, scheduler.roster())?,
                None => Vec::new(),
            };
            let report = scheduler.generate_week(week, &manual, &opts, force)?;
            storage.save(scheduler.roster())?;
            println!(
                "week {}: {} shift(s) ({} generated, {} manual)",
                report.week,
                report.total(),
                report.generated,
                report.manual
            );
            for id in &report.skipped_areas {
                let name = scheduler
                    .roster()
                    .find_area(id)
                    .map(|a| a.name.as_str())
                    .unwrap_or(id.as_str());
                eprintln!("warning: area {name} has no eligible guard, left uncovered");
            }
            if report.skipped_areas.is_empty() {
                0
            } else {
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::CreateShift {
            guard,
            area,
            date,
            shift_type,
            notes,
        } => {
            let gid = guard_id(scheduler.roster(), &guard)?;
            let aid = area_id(scheduler.roster(), &area)?;
            let date = io::parse_date(&date)?;
            let id = scheduler.create_shift(&gid, &aid, date, shift_type, notes, &opts)?;
            storage.save(scheduler.roster())?;
            println!("{id}");
            0
        }
        Commands::ShiftStatus { shift_id, change } => {
            let sid = ShiftId::new(shift_id);
            match change {
                StatusChange::Start => scheduler.start_shift(&sid)?,
                StatusChange::Complete => scheduler.complete_shift(&sid)?,
                StatusChange::Cancel => scheduler.cancel_shift(&sid)?,
            };
            storage.save(scheduler.roster())?;
            0
        }
        Commands::Reschedule {
            shift_id,
            date,
            shift_type,
        } => {
            let date = io::parse_date(&date)?;
            scheduler.reschedule_shift(&ShiftId::new(shift_id), date, shift_type, &opts)?;
            storage.save(scheduler.roster())?;
            0
        }
        Commands::DeleteShift { shift_id } => {
            scheduler.delete_shift(&ShiftId::new(shift_id))?;
            storage.save(scheduler.roster())?;
            0
        }
        Commands::RequestLeave {
            guard,
            start,
            end,
            reason,
        } => {
            let gid = guard_id(scheduler.roster(), &guard)?;
            let (start, end) = io::parse_leave_range(&start, &end, opts.timezone)?;
            let id = scheduler.request_leave(&gid, start, end, reason)?;
            storage.save(scheduler.roster())?;
            println!("{id}");
            0
        }
        Commands::ApproveLeave {
            leave_id,
            replacement,
            least_loaded,
            by,
        } => {
            let replacement = replacement
                .map(|key| guard_id(scheduler.roster(), &key))
                .transpose()?;
            let selector: &dyn ReplacementSelector = if least_loaded {
                &LeastLoaded
            } else {
                &FirstAvailable
            };
            let decision = scheduler.approve_leave(
                &LeaveId::new(leave_id),
                replacement.as_ref(),
                &by,
                selector,
            )?;
            storage.save(scheduler.roster())?;
            println!("{}", decision.message());
            0
        }
        Commands::RejectLeave {
            leave_id,
            reason,
            by,
        } => {
            scheduler.reject_leave(&LeaveId::new(leave_id), reason, &by)?;
            storage.save(scheduler.roster())?;
            println!("leave rejected");
            0
        }
        Commands::DeleteLeave { leave_id } => {
            scheduler.delete_leave(&LeaveId::new(leave_id))?;
            storage.save(scheduler.roster())?;
            0
        }
        Commands::Replacements { leave_id } => {
            let options = scheduler.replacement_options(&LeaveId::new(leave_id))?;
            println!("{} shift(s) to cover", options.shifts.len());
            for shift in &options.shifts {
                println!(
                    "  {} | {} | {}",
                    shift.id,
                    shift.start.with_timezone(&opts.timezone).to_rfc3339(),
                    shift.shift_type
                );
            }
            for guard in &options.candidates {
                println!("candidate {} | {}", guard.id, guard.name);
            }
            0
        }
        Commands::List {
            week,
            year,
            guard,
            area,
            out_json,
            out_csv,
        } => {
            if let Some(path) = out_json {
                io::export_roster_json(path, scheduler.roster())?;
            }
            if let Some(path) = out_csv {
                io::export_shifts_csv(path, scheduler.roster())?;
            }
            let roster = scheduler.roster();
            let mut shifts = if week.is_some() || year.is_some() {
                scheduler.shifts_in_week(resolve_week(&opts, week, year)?, &opts)?
            } else {
                let mut all: Vec<_> = roster.shifts.iter().collect();
                all.sort_by_key(|s| s.start);
                all
            };
            if let Some(key) = guard {
                let gid = guard_id(roster, &key)?;
                shifts.retain(|s| s.guard == gid);
            }
            if let Some(key) = area {
                let aid = area_id(roster, &key)?;
                shifts.retain(|s| s.area == aid);
            }
            // impression compacte
            for s in shifts {
                let area = roster
                    .find_area(&s.area)
                    .map(|a| a.name.as_str())
                    .unwrap_or("-");
                println!(
                    "{} | {} → {} | {} | {} | {} | {}{}",
                    s.id,
                    s.start.with_timezone(&opts.timezone).to_rfc3339(),
                    s.end.with_timezone(&opts.timezone).to_rfc3339(),
                    s.shift_type,
                    area,
                    guard_name(roster, &s.guard),
                    s.status,
                    if s.is_manual { " (manual)" } else { "" }
                );
            }
            0
        }
        Commands::Check { report } => {
            let conflicts = scheduler.detect_conflicts(&opts);
            if conflicts.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                if let Some(path) = report {
                    // CSV simple
                    let mut w = csv::Writer::from_path(path)?;
                    w.write_record(["guard_id", "shift_a", "shift_b", "kind"])?;
                    for c in &conflicts {
                        w.write_record([
                            c.guard.as_str(),
                            c.shift_a.as_str(),
                            c.shift_b.as_ref().map(|id| id.as_str()).unwrap_or(""),
                            match c.kind {
                                ConflictKind::Overlap => "overlap",
                                ConflictKind::SameDayDoubleBooking => "same-day",
                                ConflictKind::InconsistentType => "inconsistent-type",
                            },
                        ])?;
                    }
                    w.flush()?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
    };

    std::process::exit(code);
}
