//! CSV export of grades, progress, and goals.
//!
//! Rows are joined with subject names and filtered by subject and inclusive
//! date range before writing.

use std::io::Write;

use chrono::NaiveDate;
use csv::Writer;

use crate::error::Result;
use crate::record::store::Store;
use crate::record::RecordId;

#[derive(Debug, Clone, Default)]
pub struct ExportFilter {
    pub subject_id: Option<RecordId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ExportFilter {
    fn keeps(&self, subject_id: RecordId, date: NaiveDate) -> bool {
        if self.subject_id.is_some_and(|id| id != subject_id) {
            return false;
        }
        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.to.is_some_and(|to| date > to) {
            return false;
        }
        true
    }
}

pub fn grades_csv<W: Write>(store: &Store, filter: &ExportFilter, out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["date", "subject", "score", "max_score", "percent", "notes"])?;

    let mut grades: Vec<_> = store
        .grades()
        .iter()
        .filter(|g| filter.keeps(g.subject_id, g.date))
        .collect();
    grades.sort_by_key(|g| g.date);

    for grade in grades {
        let subject = subject_name(store, grade.subject_id);
        writer.write_record([
            grade.date.to_string(),
            subject,
            format_number(grade.score),
            format_number(grade.max_score),
            format!("{:.1}", grade.percent()),
            grade.notes.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush().map_err(crate::error::Error::Persistence)?;
    Ok(())
}

pub fn progress_csv<W: Write>(store: &Store, filter: &ExportFilter, out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["date", "subject", "description", "duration_hours"])?;

    let mut entries: Vec<_> = store
        .progress()
        .iter()
        .filter(|p| filter.keeps(p.subject_id, p.date))
        .collect();
    entries.sort_by_key(|p| p.date);

    for entry in entries {
        writer.write_record([
            entry.date.to_string(),
            subject_name(store, entry.subject_id),
            entry.description.clone(),
            format_number(entry.duration_hours),
        ])?;
    }

    writer.flush().map_err(crate::error::Error::Persistence)?;
    Ok(())
}

pub fn goals_csv<W: Write>(store: &Store, filter: &ExportFilter, out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["subject", "target_metric", "target_value", "deadline", "status"])?;

    for goal in store.goals() {
        if filter.subject_id.is_some_and(|id| id != goal.subject_id) {
            continue;
        }
        // goals filter on deadline when a range is given; undated goals
        // only appear in unbounded exports
        match goal.deadline {
            Some(deadline) if !filter.keeps(goal.subject_id, deadline) => continue,
            None if filter.from.is_some() || filter.to.is_some() => continue,
            _ => {}
        }

        writer.write_record([
            subject_name(store, goal.subject_id),
            goal.target_metric.clone(),
            format_number(goal.target_value),
            goal.deadline.map(|d| d.to_string()).unwrap_or_default(),
            goal.status.as_str().to_string(),
        ])?;
    }

    writer.flush().map_err(crate::error::Error::Persistence)?;
    Ok(())
}

fn subject_name(store: &Store, id: RecordId) -> String {
    store
        .subject(id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|_| id.to_string())
}

/// Trim trailing `.0` so whole numbers export as integers.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{GoalFields, GradeFields, ProgressFields};
    use tempfile::tempdir;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn seeded() -> (tempfile::TempDir, Store, RecordId) {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        let math = store.create_subject("Math", None).unwrap();
        let physics = store.create_subject("Physics", None).unwrap();

        for (subject, m, d, score) in [
            (math.id, 3, 10, 80.0),
            (math.id, 4, 2, 90.0),
            (physics.id, 3, 15, 70.0),
        ] {
            store
                .create_grade(GradeFields {
                    subject_id: subject,
                    score,
                    max_score: 100.0,
                    date: day(m, d),
                    notes: None,
                })
                .unwrap();
        }

        store
            .create_progress(ProgressFields {
                subject_id: math.id,
                date: day(3, 11),
                description: "practice exam, sections 1-3".into(),
                duration_hours: 2.5,
            })
            .unwrap();

        store
            .create_goal(GoalFields {
                subject_id: math.id,
                target_metric: "average".into(),
                target_value: 85.0,
                deadline: Some(day(6, 30)),
            })
            .unwrap();

        (dir, store, math.id)
    }

    #[test]
    fn grades_export_is_sorted_with_header() {
        let (_dir, store, _) = seeded();

        let mut buffer = Vec::new();
        grades_csv(&store, &ExportFilter::default(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "date,subject,score,max_score,percent,notes");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("2026-03-10,Math,80,100,80.0"));
        assert!(lines[2].starts_with("2026-03-15,Physics"));
        assert!(lines[3].starts_with("2026-04-02,Math,90"));
    }

    #[test]
    fn subject_and_date_filters_apply() {
        let (_dir, store, math_id) = seeded();

        let filter = ExportFilter {
            subject_id: Some(math_id),
            from: Some(day(4, 1)),
            to: None,
        };

        let mut buffer = Vec::new();
        grades_csv(&store, &filter, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(text.lines().count(), 2); // header + one row
        assert!(text.contains("2026-04-02,Math,90"));
    }

    #[test]
    fn progress_and_goals_export() {
        let (_dir, store, _) = seeded();

        let mut buffer = Vec::new();
        progress_csv(&store, &ExportFilter::default(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("2026-03-11,Math,\"practice exam, sections 1-3\",2.5"));

        let mut buffer = Vec::new();
        goals_csv(&store, &ExportFilter::default(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Math,average,85,2026-06-30,active"));
    }
}
