#![forbid(unsafe_code)]
//! Guard roster : planification hebdomadaire d'agents de sécurité (sans BD).
//!
//! - Stockage fichiers (JSON/CSV).
//! - Rotation 3×8 par zone, règle du vendredi, shifts manuels prioritaires.
//! - Affectations fixes (configurées ou déduites de l'historique).
//! - Congés : approbation avec réaffectation des shifts au remplaçant.
//! - Stockage en UTC ; dates calculées dans le fuseau du site.

pub mod calendar;
pub mod config;
pub mod io;
pub mod model;
pub mod scheduler;
pub mod storage;

pub use calendar::{CalendarKind, Week};
pub use config::Settings;
pub use model::{
    Area, AreaId, FixedAssignment, Guard, GuardId, GuardStatus, Leave, LeaveId, LeaveStatus,
    Roster, Shift, ShiftId, ShiftStatus, ShiftType,
};
pub use scheduler::{
    find_replacement_guard, generate_weekly_shifts, Conflict, ConflictKind, FirstAvailable,
    FixedAssignments, FixedPolicy, GenerationReport, LeastLoaded, LeaveDecision, ManualShift,
    ReplacementSelector, RotationStrategy, SchedError, ScheduleOptions, Scheduler,
};
pub use storage::{JsonStorage, Storage};
