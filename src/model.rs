use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort pour Guard
    GuardId
);
string_id!(
    /// Identifiant fort pour Area
    AreaId
);
string_id!(
    /// Identifiant fort pour Shift
    ShiftId
);
string_id!(
    /// Identifiant fort pour Leave
    LeaveId
);

/// Statut opérationnel d'un agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuardStatus {
    #[default]
    Active,
    Inactive,
    OnLeave,
}

impl FromStr for GuardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "on-leave" | "on_leave" | "onleave" => Ok(Self::OnLeave),
            other => Err(format!("unknown guard status: {other}")),
        }
    }
}

/// Agent de sécurité
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guard {
    pub id: GuardId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: GuardStatus,
}

impl Guard {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            id: GuardId::random(),
            name: name.into(),
            phone: None,
            status: GuardStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == GuardStatus::Active
    }
}

/// Zone physique à couvrir en continu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Area {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            id: AreaId::random(),
            name: name.into(),
            description: None,
            location: None,
            active: true,
        }
    }
}

/// Les trois créneaux de 8 heures d'une journée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShiftType {
    Morning,
    Afternoon,
    Night,
}

impl ShiftType {
    /// Ordre de génération au sein d'une journée.
    pub const ALL: [ShiftType; 3] = [ShiftType::Morning, ShiftType::Afternoon, ShiftType::Night];

    pub const HOURS: u32 = 8;

    /// Heure locale de prise de poste.
    pub fn start_hour(self) -> u32 {
        match self {
            ShiftType::Morning => 7,
            ShiftType::Afternoon => 15,
            ShiftType::Night => 23,
        }
    }

    pub fn from_start_hour(hour: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.start_hour() == hour)
    }

    /// Rotation du vendredi : matin→nuit, après-midi→matin, nuit→après-midi.
    pub fn friday_remap(self) -> Self {
        match self {
            ShiftType::Morning => ShiftType::Night,
            ShiftType::Afternoon => ShiftType::Morning,
            ShiftType::Night => ShiftType::Afternoon,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftType::Morning => "morning",
            ShiftType::Afternoon => "afternoon",
            ShiftType::Night => "night",
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" | "m" => Ok(Self::Morning),
            "afternoon" | "a" => Ok(Self::Afternoon),
            "night" | "n" => Ok(Self::Night),
            other => Err(format!("unknown shift type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShiftStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl ShiftStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ShiftStatus::Completed | ShiftStatus::Cancelled)
    }
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShiftStatus::Scheduled => "scheduled",
            ShiftStatus::InProgress => "in-progress",
            ShiftStatus::Completed => "completed",
            ShiftStatus::Cancelled => "cancelled",
        })
    }
}

/// Créneau de garde (UTC) : un agent, une zone, une fenêtre de 8 heures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub guard: GuardId,
    pub area: AreaId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub shift_type: ShiftType,
    #[serde(default)]
    pub status: ShiftStatus,
    /// Agent remplacé lorsque ce shift a été réaffecté pour un congé.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_for: Option<GuardId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_manual: bool,
    pub created_at: DateTime<Utc>,
}

impl Shift {
    /// Crée un shift planifié en validant que `end > start`.
    pub fn new(
        guard: GuardId,
        area: AreaId,
        shift_type: ShiftType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, String> {
        if end <= start {
            return Err("end must be strictly after start".to_string());
        }
        Ok(Self {
            id: ShiftId::random(),
            guard,
            area,
            start,
            end,
            shift_type,
            status: ShiftStatus::Scheduled,
            replacement_for: None,
            notes: None,
            is_manual: false,
            created_at: Utc::now(),
        })
    }

    /// Durée en minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        })
    }
}

/// Demande de congé d'un agent (intervalle UTC fermé [start, end]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leave {
    pub id: LeaveId,
    pub guard: GuardId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub status: LeaveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_guard: Option<GuardId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Leave {
    pub fn new(
        guard: GuardId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<Self, String> {
        if end <= start {
            return Err("leave end must be after start".to_string());
        }
        Ok(Self {
            id: LeaveId::random(),
            guard,
            start,
            end,
            reason,
            status: LeaveStatus::Pending,
            replacement_guard: None,
            approved_by: None,
            rejection_reason: None,
            created_at: Utc::now(),
        })
    }

    /// Vrai si le shift tient entièrement dans la période de congé.
    pub fn covers(&self, shift: &Shift) -> bool {
        shift.start >= self.start && shift.end <= self.end
    }
}

/// Affectation fixe : l'agent n'entre jamais dans la rotation de cette zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedAssignment {
    pub guard: GuardId,
    pub area: AreaId,
}

/// Roster complet
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Roster {
    #[serde(default)]
    pub guards: Vec<Guard>,
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub shifts: Vec<Shift>,
    #[serde(default)]
    pub leaves: Vec<Leave>,
    #[serde(default)]
    pub fixed_assignments: Vec<FixedAssignment>,
}

impl Roster {
    pub fn find_guard<'a>(&'a self, id: &GuardId) -> Option<&'a Guard> {
        self.guards.iter().find(|g| &g.id == id)
    }
    pub fn find_guard_mut(&mut self, id: &GuardId) -> Option<&mut Guard> {
        self.guards.iter_mut().find(|g| &g.id == id)
    }
    /// Recherche par identifiant puis par nom (insensible à la casse).
    pub fn lookup_guard<'a>(&'a self, key: &str) -> Option<&'a Guard> {
        self.guards
            .iter()
            .find(|g| g.id.as_str() == key)
            .or_else(|| self.guards.iter().find(|g| g.name.eq_ignore_ascii_case(key)))
    }
    pub fn find_area<'a>(&'a self, id: &AreaId) -> Option<&'a Area> {
        self.areas.iter().find(|a| &a.id == id)
    }
    pub fn lookup_area<'a>(&'a self, key: &str) -> Option<&'a Area> {
        self.areas
            .iter()
            .find(|a| a.id.as_str() == key)
            .or_else(|| self.areas.iter().find(|a| a.name.eq_ignore_ascii_case(key)))
    }
    pub fn find_shift<'a>(&'a self, id: &ShiftId) -> Option<&'a Shift> {
        self.shifts.iter().find(|s| &s.id == id)
    }
    pub fn find_shift_mut(&mut self, id: &ShiftId) -> Option<&mut Shift> {
        self.shifts.iter_mut().find(|s| &s.id == id)
    }
    pub fn find_leave<'a>(&'a self, id: &LeaveId) -> Option<&'a Leave> {
        self.leaves.iter().find(|l| &l.id == id)
    }

    pub fn active_guards(&self) -> Vec<Guard> {
        self.guards.iter().filter(|g| g.is_active()).cloned().collect()
    }
    pub fn active_areas(&self) -> Vec<Area> {
        self.areas.iter().filter(|a| a.active).cloned().collect()
    }
}
