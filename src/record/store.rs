//! File-backed record store.
//!
//! Owns the in-memory collections and their on-disk JSON files. Every
//! mutation follows the same discipline: validate, apply to a candidate copy,
//! persist the whole collection atomically (write temp file in the same
//! directory, then rename), and only then commit the candidate to memory.
//! A failed persist leaves both disk and memory at the pre-operation state.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::validate;
use super::{
    Goal, GoalFields, GoalStatus, Grade, GradeFields, Kind, Note, NoteFields, ProgressEntry,
    ProgressFields, RecordId, Reminder, ReminderFields, Subject,
};
use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Store {
    data_dir: PathBuf,
    subjects: Vec<Subject>,
    grades: Vec<Grade>,
    goals: Vec<Goal>,
    progress: Vec<ProgressEntry>,
    reminders: Vec<Reminder>,
    notes: Vec<Note>,
}

impl Store {
    /// Open the store at `data_dir`, creating the directory if needed.
    /// Missing collection files are treated as empty collections.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;

        Ok(Store {
            subjects: load_collection(data_dir, Kind::Subjects)?,
            grades: load_collection(data_dir, Kind::Grades)?,
            goals: load_collection(data_dir, Kind::Goals)?,
            progress: load_collection(data_dir, Kind::Progress)?,
            reminders: load_collection(data_dir, Kind::Reminders)?,
            notes: load_collection(data_dir, Kind::Notes)?,
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Re-read every collection from disk. Used after a snapshot restore.
    pub fn reload(&mut self) -> Result<()> {
        self.subjects = load_collection(&self.data_dir, Kind::Subjects)?;
        self.grades = load_collection(&self.data_dir, Kind::Grades)?;
        self.goals = load_collection(&self.data_dir, Kind::Goals)?;
        self.progress = load_collection(&self.data_dir, Kind::Progress)?;
        self.reminders = load_collection(&self.data_dir, Kind::Reminders)?;
        self.notes = load_collection(&self.data_dir, Kind::Notes)?;
        Ok(())
    }

    // ---- subjects ----

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn subject(&self, id: RecordId) -> Result<&Subject> {
        self.subjects
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found(Kind::Subjects, id))
    }

    pub fn subject_by_name(&self, name: &str) -> Option<&Subject> {
        let trimmed = name.trim();
        self.subjects.iter().find(|s| s.name == trimmed)
    }

    pub fn create_subject(&mut self, name: &str, category: Option<String>) -> Result<Subject> {
        check(validate::subject_name(name, &self.subjects))?;

        let subject = Subject {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            category,
            created_at: Utc::now(),
        };

        let mut candidate = self.subjects.clone();
        candidate.push(subject.clone());
        self.persist_slice(Kind::Subjects, &candidate)?;
        self.subjects = candidate;

        Ok(subject)
    }

    /// Delete a subject. Fails with `Error::Referential` while any grade,
    /// goal, progress entry, reminder, or note still references it.
    pub fn delete_subject(&mut self, id: RecordId) -> Result<()> {
        let subject = self.subject(id)?;
        let dependents = self.dependent_count(id);

        if dependents > 0 {
            return Err(Error::Referential {
                subject: subject.name.clone(),
                dependents,
            });
        }

        let mut candidate = self.subjects.clone();
        candidate.retain(|s| s.id != id);
        self.persist_slice(Kind::Subjects, &candidate)?;
        self.subjects = candidate;

        Ok(())
    }

    /// Rename a subject or replace its category. The duplicate-name check
    /// ignores the subject being updated so a no-op rename passes.
    pub fn update_subject(
        &mut self,
        id: RecordId,
        name: &str,
        category: Option<String>,
    ) -> Result<Subject> {
        let position = self
            .subjects
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| not_found(Kind::Subjects, id))?;

        let others: Vec<Subject> = self
            .subjects
            .iter()
            .filter(|s| s.id != id)
            .cloned()
            .collect();
        check(validate::subject_name(name, &others))?;

        let mut candidate = self.subjects.clone();
        candidate[position].name = name.trim().to_string();
        candidate[position].category = category;
        let updated = candidate[position].clone();
        self.persist_slice(Kind::Subjects, &candidate)?;
        self.subjects = candidate;

        Ok(updated)
    }

    pub fn dependent_count(&self, subject_id: RecordId) -> usize {
        self.grades.iter().filter(|g| g.subject_id == subject_id).count()
            + self.goals.iter().filter(|g| g.subject_id == subject_id).count()
            + self.progress.iter().filter(|p| p.subject_id == subject_id).count()
            + self.reminders.iter().filter(|r| r.subject_id == subject_id).count()
            + self.notes.iter().filter(|n| n.subject_id == Some(subject_id)).count()
    }

    // ---- grades ----

    pub fn grades(&self) -> &[Grade] {
        &self.grades
    }

    pub fn grade(&self, id: RecordId) -> Result<&Grade> {
        self.grades
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| not_found(Kind::Grades, id))
    }

    pub fn grades_for(&self, subject_id: RecordId) -> Vec<&Grade> {
        self.grades.iter().filter(|g| g.subject_id == subject_id).collect()
    }

    pub fn create_grade(&mut self, fields: GradeFields) -> Result<Grade> {
        check(validate::grade(&fields, &self.subjects))?;

        let grade = Grade {
            id: Uuid::new_v4(),
            subject_id: fields.subject_id,
            score: fields.score,
            max_score: fields.max_score,
            date: fields.date,
            notes: fields.notes,
        };

        let mut candidate = self.grades.clone();
        candidate.push(grade.clone());
        self.persist_slice(Kind::Grades, &candidate)?;
        self.grades = candidate;

        Ok(grade)
    }

    /// Replace every field of an existing grade; the full invariant set is
    /// re-checked before anything is written.
    pub fn update_grade(&mut self, id: RecordId, fields: GradeFields) -> Result<Grade> {
        let position = self
            .grades
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| not_found(Kind::Grades, id))?;

        check(validate::grade(&fields, &self.subjects))?;

        let updated = Grade {
            id,
            subject_id: fields.subject_id,
            score: fields.score,
            max_score: fields.max_score,
            date: fields.date,
            notes: fields.notes,
        };

        let mut candidate = self.grades.clone();
        candidate[position] = updated.clone();
        self.persist_slice(Kind::Grades, &candidate)?;
        self.grades = candidate;

        Ok(updated)
    }

    pub fn delete_grade(&mut self, id: RecordId) -> Result<()> {
        if !self.grades.iter().any(|g| g.id == id) {
            return Err(not_found(Kind::Grades, id));
        }

        let mut candidate = self.grades.clone();
        candidate.retain(|g| g.id != id);
        self.persist_slice(Kind::Grades, &candidate)?;
        self.grades = candidate;

        Ok(())
    }

    // ---- goals ----

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn goal(&self, id: RecordId) -> Result<&Goal> {
        self.goals
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| not_found(Kind::Goals, id))
    }

    pub fn goals_for(&self, subject_id: RecordId) -> Vec<&Goal> {
        self.goals.iter().filter(|g| g.subject_id == subject_id).collect()
    }

    pub fn create_goal(&mut self, fields: GoalFields) -> Result<Goal> {
        check(validate::goal(&fields, &self.subjects))?;

        let goal = Goal {
            id: Uuid::new_v4(),
            subject_id: fields.subject_id,
            target_metric: fields.target_metric.trim().to_string(),
            target_value: fields.target_value,
            deadline: fields.deadline,
            status: GoalStatus::Active,
        };

        let mut candidate = self.goals.clone();
        candidate.push(goal.clone());
        self.persist_slice(Kind::Goals, &candidate)?;
        self.goals = candidate;

        Ok(goal)
    }

    /// Replace a goal's fields; status is preserved, the full invariant set
    /// is re-checked before anything is written.
    pub fn update_goal(&mut self, id: RecordId, fields: GoalFields) -> Result<Goal> {
        let position = self
            .goals
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| not_found(Kind::Goals, id))?;

        check(validate::goal(&fields, &self.subjects))?;

        let mut candidate = self.goals.clone();
        candidate[position].subject_id = fields.subject_id;
        candidate[position].target_metric = fields.target_metric.trim().to_string();
        candidate[position].target_value = fields.target_value;
        candidate[position].deadline = fields.deadline;
        let updated = candidate[position].clone();
        self.persist_slice(Kind::Goals, &candidate)?;
        self.goals = candidate;

        Ok(updated)
    }

    pub fn set_goal_status(&mut self, id: RecordId, status: GoalStatus) -> Result<Goal> {
        let position = self
            .goals
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| not_found(Kind::Goals, id))?;

        let mut candidate = self.goals.clone();
        candidate[position].status = status;
        let updated = candidate[position].clone();
        self.persist_slice(Kind::Goals, &candidate)?;
        self.goals = candidate;

        Ok(updated)
    }

    pub fn delete_goal(&mut self, id: RecordId) -> Result<()> {
        if !self.goals.iter().any(|g| g.id == id) {
            return Err(not_found(Kind::Goals, id));
        }

        let mut candidate = self.goals.clone();
        candidate.retain(|g| g.id != id);
        self.persist_slice(Kind::Goals, &candidate)?;
        self.goals = candidate;

        Ok(())
    }

    // ---- progress ----

    pub fn progress(&self) -> &[ProgressEntry] {
        &self.progress
    }

    pub fn progress_entry(&self, id: RecordId) -> Result<&ProgressEntry> {
        self.progress
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(Kind::Progress, id))
    }

    pub fn progress_for(&self, subject_id: RecordId) -> Vec<&ProgressEntry> {
        self.progress.iter().filter(|p| p.subject_id == subject_id).collect()
    }

    pub fn create_progress(&mut self, fields: ProgressFields) -> Result<ProgressEntry> {
        check(validate::progress(&fields, &self.subjects))?;

        let entry = ProgressEntry {
            id: Uuid::new_v4(),
            subject_id: fields.subject_id,
            date: fields.date,
            description: fields.description.trim().to_string(),
            duration_hours: fields.duration_hours,
        };

        let mut candidate = self.progress.clone();
        candidate.push(entry.clone());
        self.persist_slice(Kind::Progress, &candidate)?;
        self.progress = candidate;

        Ok(entry)
    }

    pub fn update_progress(&mut self, id: RecordId, fields: ProgressFields) -> Result<ProgressEntry> {
        let position = self
            .progress
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| not_found(Kind::Progress, id))?;

        check(validate::progress(&fields, &self.subjects))?;

        let mut candidate = self.progress.clone();
        candidate[position] = ProgressEntry {
            id,
            subject_id: fields.subject_id,
            date: fields.date,
            description: fields.description.trim().to_string(),
            duration_hours: fields.duration_hours,
        };
        let updated = candidate[position].clone();
        self.persist_slice(Kind::Progress, &candidate)?;
        self.progress = candidate;

        Ok(updated)
    }

    pub fn delete_progress(&mut self, id: RecordId) -> Result<()> {
        if !self.progress.iter().any(|p| p.id == id) {
            return Err(not_found(Kind::Progress, id));
        }

        let mut candidate = self.progress.clone();
        candidate.retain(|p| p.id != id);
        self.persist_slice(Kind::Progress, &candidate)?;
        self.progress = candidate;

        Ok(())
    }

    // ---- reminders ----

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn reminder(&self, id: RecordId) -> Result<&Reminder> {
        self.reminders
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found(Kind::Reminders, id))
    }

    pub fn create_reminder(&mut self, fields: ReminderFields) -> Result<Reminder> {
        check(validate::reminder(&fields, &self.subjects))?;

        let reminder = Reminder {
            id: Uuid::new_v4(),
            subject_id: fields.subject_id,
            date: fields.date,
            text: fields.text.trim().to_string(),
        };

        let mut candidate = self.reminders.clone();
        candidate.push(reminder.clone());
        self.persist_slice(Kind::Reminders, &candidate)?;
        self.reminders = candidate;

        Ok(reminder)
    }

    pub fn update_reminder(&mut self, id: RecordId, fields: ReminderFields) -> Result<Reminder> {
        let position = self
            .reminders
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| not_found(Kind::Reminders, id))?;

        check(validate::reminder(&fields, &self.subjects))?;

        let mut candidate = self.reminders.clone();
        candidate[position] = Reminder {
            id,
            subject_id: fields.subject_id,
            date: fields.date,
            text: fields.text.trim().to_string(),
        };
        let updated = candidate[position].clone();
        self.persist_slice(Kind::Reminders, &candidate)?;
        self.reminders = candidate;

        Ok(updated)
    }

    pub fn delete_reminder(&mut self, id: RecordId) -> Result<()> {
        if !self.reminders.iter().any(|r| r.id == id) {
            return Err(not_found(Kind::Reminders, id));
        }

        let mut candidate = self.reminders.clone();
        candidate.retain(|r| r.id != id);
        self.persist_slice(Kind::Reminders, &candidate)?;
        self.reminders = candidate;

        Ok(())
    }

    // ---- notes ----

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: RecordId) -> Result<&Note> {
        self.notes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| not_found(Kind::Notes, id))
    }

    pub fn create_note(&mut self, fields: NoteFields) -> Result<Note> {
        check(validate::note(&fields, &self.subjects))?;

        let note = Note {
            id: Uuid::new_v4(),
            subject_id: fields.subject_id,
            title: fields.title.trim().to_string(),
            body: fields.body,
            created_at: Utc::now(),
        };

        let mut candidate = self.notes.clone();
        candidate.push(note.clone());
        self.persist_slice(Kind::Notes, &candidate)?;
        self.notes = candidate;

        Ok(note)
    }

    /// Replace a note's fields; `created_at` is preserved.
    pub fn update_note(&mut self, id: RecordId, fields: NoteFields) -> Result<Note> {
        let position = self
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| not_found(Kind::Notes, id))?;

        check(validate::note(&fields, &self.subjects))?;

        let mut candidate = self.notes.clone();
        candidate[position].subject_id = fields.subject_id;
        candidate[position].title = fields.title.trim().to_string();
        candidate[position].body = fields.body;
        let updated = candidate[position].clone();
        self.persist_slice(Kind::Notes, &candidate)?;
        self.notes = candidate;

        Ok(updated)
    }

    pub fn delete_note(&mut self, id: RecordId) -> Result<()> {
        if !self.notes.iter().any(|n| n.id == id) {
            return Err(not_found(Kind::Notes, id));
        }

        let mut candidate = self.notes.clone();
        candidate.retain(|n| n.id != id);
        self.persist_slice(Kind::Notes, &candidate)?;
        self.notes = candidate;

        Ok(())
    }

    // ---- persistence ----

    /// The single choke point for collection writes. All mutations for a
    /// kind funnel through here so a later multi-session host only has to
    /// serialize calls to this function.
    fn persist_slice<T: Serialize>(&self, kind: Kind, records: &[T]) -> Result<()> {
        write_collection(&self.data_dir, kind, records)?;
        debug!(kind = kind.label(), count = records.len(), "persisted collection");
        Ok(())
    }

    /// Rewrite one collection file from the in-memory state. Used by restore
    /// to roll back collections it already replaced when a later step fails.
    pub(crate) fn rewrite(&self, kind: Kind) -> Result<()> {
        match kind {
            Kind::Subjects => write_collection(&self.data_dir, kind, &self.subjects),
            Kind::Grades => write_collection(&self.data_dir, kind, &self.grades),
            Kind::Goals => write_collection(&self.data_dir, kind, &self.goals),
            Kind::Progress => write_collection(&self.data_dir, kind, &self.progress),
            Kind::Reminders => write_collection(&self.data_dir, kind, &self.reminders),
            Kind::Notes => write_collection(&self.data_dir, kind, &self.notes),
        }
    }
}

/// Write one collection file atomically: serialize, write a temp file in the
/// same directory, then rename over the target. An interrupted write never
/// clobbers the previous file.
pub(crate) fn write_collection<T: Serialize>(
    data_dir: &Path,
    kind: Kind,
    records: &[T],
) -> Result<()> {
    let tmp = stage_collection(data_dir, kind, records)?;

    if let Err(e) = fs::rename(&tmp, data_dir.join(kind.file_name())) {
        // best effort; the temp file is junk either way
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    Ok(())
}

/// Serialize one collection into its sibling temp file without touching the
/// live file. The caller renames (or removes) the returned path.
pub(crate) fn stage_collection<T: Serialize>(
    data_dir: &Path,
    kind: Kind,
    records: &[T],
) -> Result<PathBuf> {
    let path = data_dir.join(kind.file_name());
    let tmp = data_dir.join(format!("{}.tmp", kind.file_name()));

    let json = serde_json::to_string_pretty(records).map_err(|source| Error::Corrupt {
        path: path.display().to_string(),
        source,
    })?;

    fs::write(&tmp, json)?;
    Ok(tmp)
}

pub(crate) fn load_collection<T: DeserializeOwned>(data_dir: &Path, kind: Kind) -> Result<Vec<T>> {
    let path = data_dir.join(kind.file_name());

    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&path)?;
    serde_json::from_str(&content).map_err(|source| Error::Corrupt {
        path: path.display().to_string(),
        source,
    })
}

fn not_found(kind: Kind, id: RecordId) -> Error {
    Error::NotFound {
        kind: kind.label(),
        id: id.to_string(),
    }
}

fn check(violations: Vec<crate::error::Violation>) -> Result<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn grade_fields(subject_id: RecordId, score: f64, max_score: f64) -> GradeFields {
        GradeFields {
            subject_id,
            score,
            max_score,
            date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            notes: None,
        }
    }

    #[test]
    fn created_records_survive_a_reopen() {
        let dir = tempdir().unwrap();

        let subject_id = {
            let mut store = Store::open(dir.path()).unwrap();
            let subject = store.create_subject("Math", Some("stem".into())).unwrap();
            store.create_grade(grade_fields(subject.id, 80.0, 100.0)).unwrap();
            subject.id
        };

        let store = Store::open(dir.path()).unwrap();
        assert_eq!(store.subjects().len(), 1);
        assert_eq!(store.grades_for(subject_id).len(), 1);
        assert_eq!(store.grades_for(subject_id)[0].score, 80.0);
    }

    #[test]
    fn rejected_update_leaves_old_value_on_reread() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();

        let subject = store.create_subject("Math", None).unwrap();
        let grade = store.create_grade(grade_fields(subject.id, 80.0, 100.0)).unwrap();

        let err = store
            .update_grade(grade.id, grade_fields(subject.id, 110.0, 100.0))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        assert_eq!(store.grade(grade.id).unwrap().score, 80.0);

        // and on disk
        let reopened = Store::open(dir.path()).unwrap();
        assert_eq!(reopened.grade(grade.id).unwrap().score, 80.0);
    }

    #[test]
    fn subject_delete_blocked_while_dependents_exist() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();

        let subject = store.create_subject("Math", None).unwrap();
        let grade = store.create_grade(grade_fields(subject.id, 90.0, 100.0)).unwrap();

        let err = store.delete_subject(subject.id).unwrap_err();
        assert!(matches!(err, Error::Referential { dependents: 1, .. }));
        assert!(store.subject(subject.id).is_ok());

        store.delete_grade(grade.id).unwrap();
        store.delete_subject(subject.id).unwrap();
        assert!(store.subjects().is_empty());
    }

    #[test]
    fn subject_update_renames_without_tripping_on_its_own_name() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();

        let subject = store.create_subject("Math", None).unwrap();
        store.create_subject("Physics", None).unwrap();

        // a no-op rename with a new category passes the duplicate check
        let updated = store
            .update_subject(subject.id, "Math", Some("stem".into()))
            .unwrap();
        assert_eq!(updated.name, "Math");
        assert_eq!(updated.category.as_deref(), Some("stem"));

        let updated = store.update_subject(subject.id, "Mathematics", None).unwrap();
        assert_eq!(updated.name, "Mathematics");

        // renaming onto another subject's name is rejected
        let err = store.update_subject(subject.id, "Physics", None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let reopened = Store::open(dir.path()).unwrap();
        assert!(reopened.subject_by_name("Mathematics").is_some());
        assert!(reopened.subject_by_name("Math").is_none());
    }

    #[test]
    fn goal_update_revalidates_and_preserves_status() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        let subject = store.create_subject("Math", None).unwrap();

        let goal = store
            .create_goal(GoalFields {
                subject_id: subject.id,
                target_metric: "average".into(),
                target_value: 80.0,
                deadline: None,
            })
            .unwrap();
        store.set_goal_status(goal.id, GoalStatus::Achieved).unwrap();

        let updated = store
            .update_goal(
                goal.id,
                GoalFields {
                    subject_id: subject.id,
                    target_metric: "average".into(),
                    target_value: 90.0,
                    deadline: None,
                },
            )
            .unwrap();
        assert_eq!(updated.target_value, 90.0);
        assert_eq!(updated.status, GoalStatus::Achieved);

        let err = store
            .update_goal(
                goal.id,
                GoalFields {
                    subject_id: subject.id,
                    target_metric: "".into(),
                    target_value: 90.0,
                    deadline: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.goal(goal.id).unwrap().target_metric, "average");
    }

    #[test]
    fn progress_reminder_and_note_updates_persist() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        let subject = store.create_subject("Math", None).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

        let entry = store
            .create_progress(ProgressFields {
                subject_id: subject.id,
                date,
                description: "reviewed limits".into(),
                duration_hours: 1.0,
            })
            .unwrap();
        let updated = store
            .update_progress(
                entry.id,
                ProgressFields {
                    subject_id: subject.id,
                    date,
                    description: "reviewed limits and series".into(),
                    duration_hours: 2.5,
                },
            )
            .unwrap();
        assert_eq!(updated.duration_hours, 2.5);

        // 25 h violates the daily bound and leaves the entry untouched
        let err = store
            .update_progress(
                entry.id,
                ProgressFields {
                    subject_id: subject.id,
                    date,
                    description: "marathon".into(),
                    duration_hours: 25.0,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.progress_entry(entry.id).unwrap().duration_hours, 2.5);

        let reminder = store
            .create_reminder(ReminderFields {
                subject_id: subject.id,
                date,
                text: "mock exam".into(),
            })
            .unwrap();
        store
            .update_reminder(
                reminder.id,
                ReminderFields {
                    subject_id: subject.id,
                    date,
                    text: "mock exam, bring calculator".into(),
                },
            )
            .unwrap();

        let note = store
            .create_note(NoteFields {
                subject_id: None,
                title: "scratch".into(),
                body: "first draft".into(),
            })
            .unwrap();
        let created_at = note.created_at;
        let updated = store
            .update_note(
                note.id,
                NoteFields {
                    subject_id: Some(subject.id),
                    title: "scratch".into(),
                    body: "second draft".into(),
                },
            )
            .unwrap();
        assert_eq!(updated.body, "second draft");
        assert_eq!(updated.created_at, created_at);

        let reopened = Store::open(dir.path()).unwrap();
        assert_eq!(reopened.reminder(reminder.id).unwrap().text, "mock exam, bring calculator");
        assert_eq!(reopened.note(note.id).unwrap().subject_id, Some(subject.id));
    }

    #[test]
    fn child_create_with_dangling_subject_fails() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();

        let err = store
            .create_grade(grade_fields(Uuid::new_v4(), 50.0, 100.0))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.grades().is_empty());
    }

    #[test]
    fn missing_ids_report_not_found() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();

        let id = Uuid::new_v4();
        assert!(matches!(store.grade(id), Err(Error::NotFound { .. })));
        assert!(matches!(store.delete_subject(id), Err(Error::NotFound { .. })));
        assert!(matches!(
            store.set_goal_status(id, GoalStatus::Achieved),
            Err(Error::NotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn failed_persist_leaves_disk_and_memory_unchanged() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        let subject = store.create_subject("Math", None).unwrap();
        store.create_grade(grade_fields(subject.id, 80.0, 100.0)).unwrap();

        let before = fs::read_to_string(dir.path().join(Kind::Grades.file_name())).unwrap();

        // make the data directory unwritable so the temp-file write fails
        let mut perms = fs::metadata(dir.path()).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(dir.path(), perms).unwrap();

        let err = store.create_grade(grade_fields(subject.id, 70.0, 100.0)).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));

        let mut perms = fs::metadata(dir.path()).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(dir.path(), perms).unwrap();

        let after = fs::read_to_string(dir.path().join(Kind::Grades.file_name())).unwrap();
        assert_eq!(before, after);
        assert_eq!(store.grades().len(), 1);
    }

    #[test]
    fn corrupt_collection_file_is_reported_not_swallowed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(Kind::Grades.file_name()), "not json").unwrap();

        let err = Store::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
    }
}
