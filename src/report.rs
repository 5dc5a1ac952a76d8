//! Terminal table rendering for list commands.
//!
//! Plain string building, one render function per listing: subjects with
//! their record counts, grade history for a subject, trend points, and the
//! snapshot inventory.

use chrono::NaiveDate;

use crate::analytics::SubjectStats;
use crate::backup::SnapshotInfo;
use crate::record::store::Store;
use crate::record::{Goal, Grade, ProgressEntry, Reminder};

pub fn subjects(store: &Store) -> String {
    if store.subjects().is_empty() {
        return String::from("No subjects yet. Run 'sapi subject add <name>' to create one.\n");
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<24} {:<14} {:>7} {:>9} {:>7}\n",
        "Subject", "Category", "Grades", "Progress", "Goals"
    ));
    output.push_str(&"-".repeat(66));
    output.push('\n');

    for subject in store.subjects() {
        output.push_str(&format!(
            "{:<24} {:<14} {:>7} {:>9} {:>7}\n",
            truncate(&subject.name, 24),
            truncate(subject.category.as_deref().unwrap_or("-"), 14),
            store.grades_for(subject.id).len(),
            store.progress_for(subject.id).len(),
            store.goals_for(subject.id).len(),
        ));
    }

    output
}

pub fn grades(subject_name: &str, grades: &[&Grade], stats: Option<SubjectStats>) -> String {
    if grades.is_empty() {
        return format!("No grades recorded for {subject_name}.\n");
    }

    let mut output = format!("Grades for {subject_name}:\n");
    output.push_str(&format!(
        "{:<12} {:>8} {:>10} {:>8}  {}\n",
        "Date", "Score", "Max", "Percent", "Notes"
    ));
    output.push_str(&"-".repeat(60));
    output.push('\n');

    let mut sorted: Vec<_> = grades.to_vec();
    sorted.sort_by_key(|g| g.date);

    for grade in sorted {
        output.push_str(&format!(
            "{:<12} {:>8} {:>10} {:>7.1}%  {}\n",
            grade.date,
            grade.score,
            grade.max_score,
            grade.percent(),
            truncate(grade.notes.as_deref().unwrap_or(""), 30),
        ));
    }

    if let Some(stats) = stats {
        output.push_str(&format!(
            "\n{} records, mean {:.1}%, min {:.1}%, max {:.1}%\n",
            stats.count, stats.mean, stats.min, stats.max
        ));
    }

    output
}

pub fn trend(subject_name: &str, points: &[(NaiveDate, f64)]) -> String {
    if points.is_empty() {
        return format!("No grade history for {subject_name}.\n");
    }

    let mut output = format!("Trend for {subject_name}:\n");
    for (date, percent) in points {
        // 50-column bar, 2% per cell
        let bar = "#".repeat((percent / 2.0).round() as usize);
        output.push_str(&format!("{date}  {percent:>5.1}%  {bar}\n"));
    }

    output
}

pub fn goals(store: &Store, goals: &[&Goal]) -> String {
    if goals.is_empty() {
        return String::from("No goals set.\n");
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<24} {:<20} {:>8} {:<12} {:<9} {}\n",
        "Subject", "Metric", "Target", "Deadline", "Status", "Id"
    ));
    output.push_str(&"-".repeat(100));
    output.push('\n');

    for goal in goals {
        let subject = store
            .subject(goal.subject_id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|_| "?".to_string());

        output.push_str(&format!(
            "{:<24} {:<20} {:>8} {:<12} {:<9} {}\n",
            truncate(&subject, 24),
            truncate(&goal.target_metric, 20),
            goal.target_value,
            goal.deadline
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            goal.status.as_str(),
            goal.id,
        ));
    }

    output
}

pub fn progress(subject_name: &str, entries: &[&ProgressEntry]) -> String {
    if entries.is_empty() {
        return format!("No progress recorded for {subject_name}.\n");
    }

    let mut output = format!("Progress for {subject_name}:\n");
    let mut sorted: Vec<_> = entries.to_vec();
    sorted.sort_by_key(|p| p.date);

    let mut total_hours = 0.0;
    for entry in sorted {
        total_hours += entry.duration_hours;
        output.push_str(&format!(
            "{:<12} {:>5.1}h  {}\n",
            entry.date,
            entry.duration_hours,
            truncate(&entry.description, 50),
        ));
    }

    output.push_str(&format!("\ntotal study time: {total_hours:.1}h\n"));
    output
}

pub fn reminders(store: &Store, reminders: &[&Reminder]) -> String {
    if reminders.is_empty() {
        return String::from("No reminders.\n");
    }

    let mut output = String::new();
    let mut sorted: Vec<_> = reminders.to_vec();
    sorted.sort_by_key(|r| r.date);

    for reminder in sorted {
        let subject = store
            .subject(reminder.subject_id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|_| "?".to_string());
        output.push_str(&format!(
            "{:<12} [{}] {}  ({})\n",
            reminder.date,
            truncate(&subject, 20),
            truncate(&reminder.text, 50),
            reminder.id,
        ));
    }

    output
}

pub fn snapshots(snapshots: &[SnapshotInfo]) -> String {
    if snapshots.is_empty() {
        return String::from("No snapshots found. Run 'sapi backup create' to make one.\n");
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<18} {:<22} {:>6} {:>10}\n",
        "Id", "Created", "Files", "Bytes"
    ));
    output.push_str(&"-".repeat(60));
    output.push('\n');

    for snapshot in snapshots {
        output.push_str(&format!(
            "{:<18} {:<22} {:>6} {:>10}\n",
            snapshot.id,
            snapshot.created_at.format("%Y-%m-%d %H:%M:%S"),
            snapshot.files.len(),
            snapshot.total_bytes,
        ));
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
