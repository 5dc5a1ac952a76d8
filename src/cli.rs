use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::analytics::PredictionMethod;
use crate::gateway::AnnotationMode;

#[derive(Parser)]
#[command(name = "sapi")]
#[command(about = "A personal learning tracker with grades, goals, and AI feedback")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage subjects
    Subject {
        #[command(subcommand)]
        action: SubjectAction,
    },

    /// Record and maintain grades
    Grade {
        #[command(subcommand)]
        action: GradeAction,
    },

    /// Track goals per subject
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },

    /// Log study sessions
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },

    /// Manage reminders
    Reminder {
        #[command(subcommand)]
        action: ReminderAction,
    },

    /// Keep free-form notes
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },

    /// Create, list, restore, and prune backup snapshots
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Show the grade trend for a subject
    Trend(TrendArgs),

    /// Predict the next score for a subject
    Predict(PredictArgs),

    /// Send records or text to the AI endpoint for annotation
    Annotate(AnnotateArgs),

    /// Export records as CSV
    Export {
        #[command(subcommand)]
        action: ExportAction,
    },
}

#[derive(Subcommand)]
pub enum SubjectAction {
    /// Add a subject
    Add {
        name: String,

        /// Free-form grouping label, e.g. "stem" or "language"
        #[arg(long)]
        category: Option<String>,
    },

    /// List subjects with their record counts
    List,

    /// Rename a subject or change its category
    Update {
        name: String,

        /// New name for the subject
        #[arg(long)]
        rename: Option<String>,

        #[arg(long)]
        category: Option<String>,
    },

    /// Remove a subject (fails while grades, goals, or other records reference it)
    Remove { name: String },
}

#[derive(Subcommand)]
pub enum GradeAction {
    /// Record a grade for a subject
    Add {
        subject: String,
        score: f64,
        max_score: f64,

        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List grades for a subject
    List { subject: String },

    /// Replace score and max score of an existing grade
    Update {
        id: String,
        score: f64,
        max_score: f64,

        #[arg(long)]
        date: Option<NaiveDate>,

        /// Replacement notes; pass an empty string to clear them
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a grade by id
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum GoalAction {
    /// Set a goal for a subject
    Add {
        subject: String,

        /// What is being targeted, e.g. "average" or "weekly hours"
        metric: String,
        target: f64,

        #[arg(long)]
        deadline: Option<NaiveDate>,
    },

    /// List all goals
    List,

    /// Change a goal's metric, target, or deadline
    Update {
        id: String,

        #[arg(long)]
        metric: Option<String>,

        #[arg(long)]
        target: Option<f64>,

        #[arg(long)]
        deadline: Option<NaiveDate>,
    },

    /// Mark a goal achieved (or missed with --missed)
    Complete {
        id: String,

        #[arg(long, default_value_t = false)]
        missed: bool,
    },

    /// Delete a goal by id
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Log a study session
    Add {
        subject: String,
        description: String,

        /// Study time in hours
        hours: f64,

        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List study sessions for a subject
    List { subject: String },

    /// Change a logged session's description, hours, or date
    Update {
        id: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        hours: Option<f64>,

        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Delete a progress entry by id
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Add a reminder for a subject
    Add {
        subject: String,
        date: NaiveDate,
        text: String,
    },

    /// List all reminders
    List,

    /// Change a reminder's date or text
    Update {
        id: String,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        text: Option<String>,
    },

    /// Delete a reminder by id
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum NoteAction {
    /// Add a note, optionally attached to a subject
    Add {
        title: String,
        body: String,

        #[arg(long)]
        subject: Option<String>,
    },

    /// List note titles
    List,

    /// Show a note body by id
    Show { id: String },

    /// Change a note's title or body
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        body: Option<String>,
    },

    /// Delete a note by id
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum BackupAction {
    /// Snapshot every collection now
    Create,

    /// List snapshots, newest first
    List,

    /// Replace all live collections with a snapshot's contents
    Restore { id: String },

    /// Remove snapshots older than the retention window
    Prune,

    /// Snapshot if the last one is older than a day, then prune
    Auto,
}

#[derive(Parser)]
pub struct TrendArgs {
    pub subject: String,

    /// Only the most recent N grades
    #[arg(long)]
    pub window: Option<usize>,
}

#[derive(Parser)]
pub struct PredictArgs {
    pub subject: String,

    #[arg(long, value_enum, default_value_t = PredictionMethod::LinearTrend)]
    pub method: PredictionMethod,

    /// Also show the score needed to reach this target mean
    #[arg(long)]
    pub target: Option<f64>,

    /// How many graded items remain (used with --target)
    #[arg(long, default_value_t = 1)]
    pub remaining: usize,
}

#[derive(Parser)]
pub struct AnnotateArgs {
    #[arg(long, value_enum)]
    pub mode: AnnotationMode,

    /// Annotate this text directly
    #[arg(long, conflicts_with = "subject")]
    pub text: Option<String>,

    /// Annotate the subject's grade and goal history
    #[arg(long)]
    pub subject: Option<String>,
}

#[derive(Subcommand)]
pub enum ExportAction {
    Grades(ExportArgs),
    Progress(ExportArgs),
    Goals(ExportArgs),
}

#[derive(Parser)]
pub struct ExportArgs {
    /// Limit to one subject
    #[arg(long)]
    pub subject: Option<String>,

    /// Inclusive start date
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Inclusive end date
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Write to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}
