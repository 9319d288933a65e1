use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// Type aliases for clarity
pub type SessionId = u32;
pub type ExamId = u32;
pub type ProctorId = u32;

fn default_one() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// A single proctoring obligation: one subject, one time slot, one or more rooms.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: ExamId,
    pub session_id: SessionId,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub subject: String,
    /// Comma or semicolon separated list of physical rooms.
    pub room: String,
    /// Used only when no room constraints are loaded at all.
    #[serde(default = "default_one")]
    pub required_proctors: u32,
    #[serde(default)]
    pub required_faculty: Option<String>,
    /// Preferred proctor type for this exam.
    #[serde(default)]
    pub required_type: Option<String>,
    #[serde(default)]
    pub teaching_staff_present: u32,
    #[serde(default)]
    pub brought_helpers: u32,
    #[serde(default)]
    pub pre_assigned_count: u32,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Exam {
    pub fn time_range(&self) -> String {
        format!("{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Per-session settings of a proctor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Maximum number of assignments; falls back to the type default when unset.
    #[serde(default)]
    pub quota: Option<u32>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Informational only.
    #[serde(default)]
    pub imposed_sessions: u32,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            quota: None,
            active: true,
            imposed_sessions: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Proctor {
    pub id: ProctorId,
    pub last_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "type")]
    pub proctor_type: String,
    #[serde(default)]
    pub prohibited_faculty: Option<String>,
    /// Record for the session being run; the store fills it from `sessions`.
    #[serde(default)]
    pub session: SessionRecord,
    /// Per-session records, keyed by session.
    #[serde(default)]
    pub sessions: BTreeMap<SessionId, SessionRecord>,
}

impl Proctor {
    /// Copy of this proctor carrying its record for `session_id`, when one exists.
    pub fn for_session(&self, session_id: SessionId) -> Self {
        let mut proctor = self.clone();
        if let Some(record) = self.sessions.get(&session_id) {
            proctor.session = record.clone();
        }
        proctor
    }

    pub fn display_name(&self) -> String {
        if self.first_name.is_empty() {
            self.last_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

/// A declared availability for one exam slot.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub proctor_id: ProctorId,
    /// Unset rows apply to every session.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub available: bool,
    #[serde(default)]
    pub mandatory: bool,
    // display metadata, ignored by the engine
    #[serde(default)]
    pub exam_name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Admin-configured staffing requirement for one physical room.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConstraint {
    pub room: String,
    pub required_proctors: u32,
    #[serde(default)]
    pub min_non_casual: Option<u32>,
}

/// A proctor-to-exam assignment row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    pub session_id: SessionId,
    pub exam_id: ExamId,
    pub proctor_id: ProctorId,
    #[serde(default)]
    pub is_pre_assigned: bool,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub is_locked: bool,
}

impl Attribution {
    /// A fresh row produced by the engine.
    pub fn automatic(session_id: SessionId, exam_id: ExamId, proctor_id: ProctorId) -> Self {
        Self {
            session_id,
            exam_id,
            proctor_id,
            is_pre_assigned: false,
            is_mandatory: false,
            is_locked: false,
        }
    }
}

/// Everything the engine reads, in the shape external data access provides it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub active_session: Option<SessionId>,
    #[serde(default)]
    pub exams: Vec<Exam>,
    #[serde(default)]
    pub proctors: Vec<Proctor>,
    #[serde(default)]
    pub availabilities: Vec<Availability>,
    #[serde(default)]
    pub room_constraints: Vec<RoomConstraint>,
    #[serde(default)]
    pub attributions: Vec<Attribution>,
}

/// An exam that could not be fully staffed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderstaffedExam {
    pub exam_id: ExamId,
    pub subject: String,
    pub date: NaiveDate,
    pub time_range: String,
    pub room: String,
    pub shortfall: u32,
}

impl fmt::Display for UnderstaffedExam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} {} ({}): {} proctor(s) missing",
            self.subject,
            self.date.format("%d/%m/%Y"),
            self.time_range,
            self.room,
            self.shortfall
        )
    }
}

/// Summary returned to the caller of a run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub success: bool,
    pub total_exams: usize,
    pub assigned_exams: usize,
    pub unassigned_exams: Vec<String>,
    pub warnings: Vec<String>,
    pub created_assignments: usize,
    /// New assignments per proctor for this run.
    pub proctor_loads: BTreeMap<ProctorId, u32>,
}

impl RunResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            warnings: vec![message.into()],
            ..Self::default()
        }
    }
}
