use chrono::NaiveDate;
use tempfile::tempdir;

use sapi::analytics::{self, Prediction, PredictionMethod};
use sapi::backup::BackupManager;
use sapi::error::Error;
use sapi::export::{self, ExportFilter};
use sapi::record::store::Store;
use sapi::record::GradeFields;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
}

#[test]
fn invalid_update_is_rejected_and_old_value_survives() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();

    let subject = store.create_subject("Math", None).unwrap();
    let grade = store
        .create_grade(GradeFields {
            subject_id: subject.id,
            score: 80.0,
            max_score: 100.0,
            date: day(1),
            notes: None,
        })
        .unwrap();

    // 110/100 violates score <= max_score
    let err = store
        .update_grade(
            grade.id,
            GradeFields {
                subject_id: subject.id,
                score: 110.0,
                max_score: 100.0,
                date: day(1),
                notes: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    // re-read through a fresh store: disk still has 80/100
    let reopened = Store::open(dir.path()).unwrap();
    let grade = reopened.grade(grade.id).unwrap();
    assert_eq!(grade.score, 80.0);
    assert_eq!(grade.max_score, 100.0);
}

#[test]
fn full_cycle_with_backup_restore_and_prediction() {
    let root = tempdir().unwrap();
    let data_dir = root.path().join("data");
    let backup_dir = root.path().join("backups");

    let mut store = Store::open(&data_dir).unwrap();
    let subject = store.create_subject("Physics", Some("stem".into())).unwrap();

    for (d, score) in [(1, 60.0), (8, 70.0)] {
        store
            .create_grade(GradeFields {
                subject_id: subject.id,
                score,
                max_score: 100.0,
                date: day(d),
                notes: None,
            })
            .unwrap();
    }

    // two records is below the prediction threshold
    let prediction = analytics::predict(
        &store,
        subject.id,
        PredictionMethod::LinearTrend,
        analytics::MIN_RECORDS_FOR_PREDICTION,
    )
    .unwrap();
    assert_eq!(prediction, Prediction::InsufficientData);

    let backups = BackupManager::new(&data_dir, &backup_dir);
    let snapshot = backups.snapshot().unwrap();

    // a third record unlocks prediction
    store
        .create_grade(GradeFields {
            subject_id: subject.id,
            score: 80.0,
            max_score: 100.0,
            date: day(15),
            notes: None,
        })
        .unwrap();

    let prediction = analytics::predict(
        &store,
        subject.id,
        PredictionMethod::LinearTrend,
        analytics::MIN_RECORDS_FOR_PREDICTION,
    )
    .unwrap();
    match prediction {
        Prediction::Estimate(v) => assert!((v - 90.0).abs() < 1e-6),
        other => panic!("expected estimate, got {other:?}"),
    }

    // restoring the snapshot brings back the two-record state
    backups.restore(&snapshot.id, &mut store).unwrap();
    assert_eq!(store.grades().len(), 2);

    let trend = analytics::trend(&store, subject.id, None).unwrap();
    assert_eq!(trend, vec![(day(1), 60.0), (day(8), 70.0)]);
}

#[test]
fn subject_removal_respects_referential_integrity() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();

    let subject = store.create_subject("History", None).unwrap();
    let grade = store
        .create_grade(GradeFields {
            subject_id: subject.id,
            score: 75.0,
            max_score: 100.0,
            date: day(3),
            notes: None,
        })
        .unwrap();

    assert!(matches!(
        store.delete_subject(subject.id),
        Err(Error::Referential { dependents: 1, .. })
    ));

    store.delete_grade(grade.id).unwrap();
    store.delete_subject(subject.id).unwrap();

    let reopened = Store::open(dir.path()).unwrap();
    assert!(reopened.subjects().is_empty());
}

#[test]
fn csv_export_reflects_the_store() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();

    let subject = store.create_subject("Latin", None).unwrap();
    store
        .create_grade(GradeFields {
            subject_id: subject.id,
            score: 18.0,
            max_score: 20.0,
            date: day(20),
            notes: Some("vocab quiz".into()),
        })
        .unwrap();

    let mut buffer = Vec::new();
    export::grades_csv(&store, &ExportFilter::default(), &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();

    assert!(text.starts_with("date,subject,score,max_score,percent,notes"));
    assert!(text.contains("2026-05-20,Latin,18,20,90.0,vocab quiz"));
}
