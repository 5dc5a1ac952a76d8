//! Typed record collections.
//!
//! One JSON file per collection kind under the data directory. Every record
//! carries a generated uuid; child records reference their subject by id.

pub mod store;
pub mod validate;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RecordId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Subjects,
    Grades,
    Goals,
    Progress,
    Reminders,
    Notes,
}

impl Kind {
    pub const ALL: [Kind; 6] = [
        Kind::Subjects,
        Kind::Grades,
        Kind::Goals,
        Kind::Progress,
        Kind::Reminders,
        Kind::Notes,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Kind::Subjects => "subjects.json",
            Kind::Grades => "grades.json",
            Kind::Goals => "goals.json",
            Kind::Progress => "progress.json",
            Kind::Reminders => "reminders.json",
            Kind::Notes => "notes.json",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Kind::Subjects => "subject",
            Kind::Grades => "grade",
            Kind::Goals => "goal",
            Kind::Progress => "progress entry",
            Kind::Reminders => "reminder",
            Kind::Notes => "note",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: RecordId,
    pub name: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: RecordId,
    pub subject_id: RecordId,
    pub score: f64,
    pub max_score: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

impl Grade {
    /// Score normalized to 0..=100 regardless of the grading scale.
    pub fn percent(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Achieved,
    Missed,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Achieved => "achieved",
            GoalStatus::Missed => "missed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: RecordId,
    pub subject_id: RecordId,
    pub target_metric: String,
    pub target_value: f64,
    pub deadline: Option<NaiveDate>,
    pub status: GoalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub id: RecordId,
    pub subject_id: RecordId,
    pub date: NaiveDate,
    pub description: String,
    /// Study time in hours, 0..=24.
    pub duration_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: RecordId,
    pub subject_id: RecordId,
    pub date: NaiveDate,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: RecordId,
    /// Notes may be general (no subject) or attached to one.
    pub subject_id: Option<RecordId>,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Proposed fields for a grade create or update. The store generates the id.
#[derive(Debug, Clone)]
pub struct GradeFields {
    pub subject_id: RecordId,
    pub score: f64,
    pub max_score: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoalFields {
    pub subject_id: RecordId,
    pub target_metric: String,
    pub target_value: f64,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct ProgressFields {
    pub subject_id: RecordId,
    pub date: NaiveDate,
    pub description: String,
    pub duration_hours: f64,
}

#[derive(Debug, Clone)]
pub struct ReminderFields {
    pub subject_id: RecordId,
    pub date: NaiveDate,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct NoteFields {
    pub subject_id: Option<RecordId>,
    pub title: String,
    pub body: String,
}
