//! Field-level validation.
//!
//! Pure functions: given proposed fields (and the current subject set for
//! foreign-key checks), return the list of violations. No side effects; the
//! store turns a non-empty list into `Error::Validation` before anything is
//! persisted.

use chrono::{Datelike, NaiveDate, Utc};

use super::{GoalFields, GradeFields, NoteFields, ProgressFields, ReminderFields, Subject};
use crate::error::Violation;

const MAX_NAME_LEN: usize = 50;
const MAX_TITLE_LEN: usize = 100;
const MAX_TEXT_LEN: usize = 500;
const MAX_FUTURE_YEARS: i32 = 10;
const FORBIDDEN_NAME_CHARS: [char; 5] = ['<', '>', '"', '\'', '\\'];

pub fn subject_name(name: &str, existing: &[Subject]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let trimmed = name.trim();

    if trimmed.is_empty() {
        violations.push(Violation::new("name", "must not be empty"));
        return violations;
    }

    if trimmed.chars().count() > MAX_NAME_LEN {
        violations.push(Violation::new(
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }

    if let Some(bad) = trimmed.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        violations.push(Violation::new(
            "name",
            format!("contains forbidden character '{bad}'"),
        ));
    }

    if existing.iter().any(|s| s.name == trimmed) {
        violations.push(Violation::new("name", "a subject with this name already exists"));
    }

    violations
}

pub fn grade(fields: &GradeFields, subjects: &[Subject]) -> Vec<Violation> {
    let mut violations = Vec::new();

    subject_ref(fields.subject_id, subjects, &mut violations);

    if !fields.max_score.is_finite() || fields.max_score <= 0.0 {
        violations.push(Violation::new("max_score", "must be a positive number"));
    }

    if !fields.score.is_finite() || fields.score < 0.0 {
        violations.push(Violation::new("score", "must be a non-negative number"));
    } else if fields.max_score.is_finite() && fields.score > fields.max_score {
        violations.push(Violation::new("score", "must be at most max_score"));
    }

    date_not_far_future(fields.date, "date", &mut violations);

    if let Some(notes) = &fields.notes {
        if notes.chars().count() > MAX_TEXT_LEN {
            violations.push(Violation::new(
                "notes",
                format!("must be at most {MAX_TEXT_LEN} characters"),
            ));
        }
    }

    violations
}

pub fn goal(fields: &GoalFields, subjects: &[Subject]) -> Vec<Violation> {
    let mut violations = Vec::new();

    subject_ref(fields.subject_id, subjects, &mut violations);

    if fields.target_metric.trim().is_empty() {
        violations.push(Violation::new("target_metric", "must not be empty"));
    }

    if !fields.target_value.is_finite() || fields.target_value < 0.0 {
        violations.push(Violation::new("target_value", "must be a non-negative number"));
    }

    if let Some(deadline) = fields.deadline {
        date_not_far_future(deadline, "deadline", &mut violations);
    }

    violations
}

pub fn progress(fields: &ProgressFields, subjects: &[Subject]) -> Vec<Violation> {
    let mut violations = Vec::new();

    subject_ref(fields.subject_id, subjects, &mut violations);

    if fields.description.trim().is_empty() {
        violations.push(Violation::new("description", "must not be empty"));
    } else if fields.description.chars().count() > MAX_TEXT_LEN {
        violations.push(Violation::new(
            "description",
            format!("must be at most {MAX_TEXT_LEN} characters"),
        ));
    }

    if !fields.duration_hours.is_finite() || fields.duration_hours < 0.0 {
        violations.push(Violation::new("duration_hours", "must be a non-negative number"));
    } else if fields.duration_hours > 24.0 {
        violations.push(Violation::new("duration_hours", "must be at most 24 hours"));
    }

    date_not_far_future(fields.date, "date", &mut violations);

    violations
}

pub fn reminder(fields: &ReminderFields, subjects: &[Subject]) -> Vec<Violation> {
    let mut violations = Vec::new();

    subject_ref(fields.subject_id, subjects, &mut violations);

    if fields.text.trim().is_empty() {
        violations.push(Violation::new("text", "must not be empty"));
    } else if fields.text.chars().count() > MAX_TEXT_LEN {
        violations.push(Violation::new(
            "text",
            format!("must be at most {MAX_TEXT_LEN} characters"),
        ));
    }

    date_not_far_future(fields.date, "date", &mut violations);

    violations
}

pub fn note(fields: &NoteFields, subjects: &[Subject]) -> Vec<Violation> {
    let mut violations = Vec::new();

    if let Some(subject_id) = fields.subject_id {
        subject_ref(subject_id, subjects, &mut violations);
    }

    if fields.title.trim().is_empty() {
        violations.push(Violation::new("title", "must not be empty"));
    } else if fields.title.chars().count() > MAX_TITLE_LEN {
        violations.push(Violation::new(
            "title",
            format!("must be at most {MAX_TITLE_LEN} characters"),
        ));
    }

    violations
}

fn subject_ref(subject_id: super::RecordId, subjects: &[Subject], out: &mut Vec<Violation>) {
    if !subjects.iter().any(|s| s.id == subject_id) {
        out.push(Violation::new("subject_id", "does not reference an existing subject"));
    }
}

fn date_not_far_future(date: NaiveDate, field: &'static str, out: &mut Vec<Violation>) {
    if date > future_cutoff(Utc::now().date_naive()) {
        out.push(Violation::new(
            field,
            format!("must not be more than {MAX_FUTURE_YEARS} years in the future"),
        ));
    }
}

/// `MAX_FUTURE_YEARS` ahead of `today`. When today is Feb 29 and the target
/// year has no leap day, the cutoff lands on Feb 28 of that year.
fn future_cutoff(today: NaiveDate) -> NaiveDate {
    today.with_year(today.year() + MAX_FUTURE_YEARS).unwrap_or_else(|| {
        NaiveDate::from_ymd_opt(today.year() + MAX_FUTURE_YEARS, 2, 28)
            .unwrap_or(NaiveDate::MAX)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn one_subject() -> Vec<Subject> {
        vec![Subject {
            id: Uuid::new_v4(),
            name: "Math".to_string(),
            category: None,
            created_at: Utc::now(),
        }]
    }

    fn valid_grade(subjects: &[Subject]) -> GradeFields {
        GradeFields {
            subject_id: subjects[0].id,
            score: 80.0,
            max_score: 100.0,
            date: Utc::now().date_naive(),
            notes: None,
        }
    }

    #[test]
    fn accepts_a_valid_grade() {
        let subjects = one_subject();
        assert!(grade(&valid_grade(&subjects), &subjects).is_empty());
    }

    #[test]
    fn rejects_score_above_max() {
        let subjects = one_subject();
        let mut fields = valid_grade(&subjects);
        fields.score = 110.0;

        let violations = grade(&fields, &subjects);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "score");
    }

    #[test]
    fn rejects_zero_max_score() {
        let subjects = one_subject();
        let mut fields = valid_grade(&subjects);
        fields.max_score = 0.0;

        assert!(grade(&fields, &subjects)
            .iter()
            .any(|v| v.field == "max_score"));
    }

    #[test]
    fn rejects_dangling_subject_reference() {
        let subjects = one_subject();
        let mut fields = valid_grade(&subjects);
        fields.subject_id = Uuid::new_v4();

        assert!(grade(&fields, &subjects)
            .iter()
            .any(|v| v.field == "subject_id"));
    }

    #[test]
    fn rejects_empty_and_forbidden_subject_names() {
        let subjects = one_subject();

        assert!(!subject_name("  ", &subjects).is_empty());
        assert!(!subject_name("a<b", &subjects).is_empty());
        assert!(!subject_name(&"x".repeat(51), &subjects).is_empty());
        assert!(!subject_name("Math", &subjects).is_empty());
        assert!(subject_name("Physics", &subjects).is_empty());
    }

    #[test]
    fn rejects_study_time_over_24_hours() {
        let subjects = one_subject();
        let fields = ProgressFields {
            subject_id: subjects[0].id,
            date: Utc::now().date_naive(),
            description: "reviewed integrals".to_string(),
            duration_hours: 25.0,
        };

        assert!(progress(&fields, &subjects)
            .iter()
            .any(|v| v.field == "duration_hours"));
    }

    #[test]
    fn rejects_far_future_dates() {
        let subjects = one_subject();
        let mut fields = valid_grade(&subjects);
        fields.date = Utc::now()
            .date_naive()
            .with_year(Utc::now().date_naive().year() + 11)
            .unwrap();

        assert!(grade(&fields, &subjects).iter().any(|v| v.field == "date"));
    }

    #[test]
    fn cutoff_from_a_leap_day_lands_on_feb_28() {
        let leap_day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            future_cutoff(leap_day),
            NaiveDate::from_ymd_opt(2034, 2, 28).unwrap()
        );

        let ordinary = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        assert_eq!(
            future_cutoff(ordinary),
            NaiveDate::from_ymd_opt(2036, 5, 1).unwrap()
        );
    }
}
