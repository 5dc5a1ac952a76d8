//! Grade trend statistics and prediction.
//!
//! Pure read-only consumers of the record store. Scores are normalized to
//! percent so subjects graded out of 20 and out of 100 compare cleanly.
//! Prediction refuses to guess below a minimum record count and says so
//! explicitly instead of returning a number.

use chrono::NaiveDate;

use crate::error::Result;
use crate::record::store::Store;
use crate::record::{Grade, RecordId};

/// Below this many grade records, prediction returns `InsufficientData`.
pub const MIN_RECORDS_FOR_PREDICTION: usize = 3;

const RECENT_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    Estimate(f64),
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PredictionMethod {
    /// Assume the current mean holds.
    HoldAverage,
    /// Least-squares line over record index, evaluated at the next index.
    LinearTrend,
    /// Mean of the most recent three records.
    RecentAverage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubjectStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Historical (date, percent) points for one subject, sorted by date
/// ascending. `window` limits the result to the most recent N records.
pub fn trend(
    store: &Store,
    subject_id: RecordId,
    window: Option<usize>,
) -> Result<Vec<(NaiveDate, f64)>> {
    store.subject(subject_id)?;

    let mut points: Vec<(NaiveDate, f64)> = store
        .grades_for(subject_id)
        .iter()
        .map(|g| (g.date, g.percent()))
        .collect();
    points.sort_by_key(|(date, _)| *date);

    if let Some(window) = window {
        let skip = points.len().saturating_sub(window);
        points.drain(..skip);
    }

    Ok(points)
}

/// Estimate the next score for a subject, or `InsufficientData` when fewer
/// than `min_records` grades exist.
pub fn predict(
    store: &Store,
    subject_id: RecordId,
    method: PredictionMethod,
    min_records: usize,
) -> Result<Prediction> {
    let points = trend(store, subject_id, None)?;

    if points.len() < min_records {
        return Ok(Prediction::InsufficientData);
    }

    let scores: Vec<f64> = points.iter().map(|(_, score)| *score).collect();

    let estimate = match method {
        PredictionMethod::HoldAverage => mean(&scores),
        PredictionMethod::LinearTrend => {
            let (slope, intercept) = linear_fit(&scores);
            (slope * scores.len() as f64 + intercept).clamp(0.0, 100.0)
        }
        PredictionMethod::RecentAverage => {
            let start = scores.len().saturating_sub(RECENT_WINDOW);
            mean(&scores[start..])
        }
    };

    Ok(Prediction::Estimate(estimate))
}

/// Score needed on each of `remaining` future records to finish at `target`
/// mean. `None` when no records remain to influence the mean. Clamped at 0;
/// a value above 100 means the target is out of reach on the current scale.
pub fn required_score(
    store: &Store,
    subject_id: RecordId,
    target: f64,
    remaining: usize,
) -> Result<Option<f64>> {
    if remaining == 0 {
        return Ok(None);
    }

    let points = trend(store, subject_id, None)?;
    let current_sum: f64 = points.iter().map(|(_, score)| score).sum();
    let total = points.len() + remaining;

    let needed = (target * total as f64 - current_sum) / remaining as f64;
    Ok(Some(needed.max(0.0)))
}

pub fn stats(store: &Store, subject_id: RecordId) -> Result<Option<SubjectStats>> {
    store.subject(subject_id)?;
    let grades = store.grades_for(subject_id);
    Ok(stats_of(&grades))
}

fn stats_of(grades: &[&Grade]) -> Option<SubjectStats> {
    if grades.is_empty() {
        return None;
    }

    let scores: Vec<f64> = grades.iter().map(|g| g.percent()).collect();
    Some(SubjectStats {
        count: scores.len(),
        mean: mean(&scores),
        min: scores.iter().cloned().fold(f64::INFINITY, f64::min),
        max: scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Least-squares fit of y over x = 0..n. Returns (slope, intercept).
/// Callers guarantee at least two points.
fn linear_fit(ys: &[f64]) -> (f64, f64) {
    let n = ys.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(ys);

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }

    if den == 0.0 {
        return (0.0, y_mean);
    }

    let slope = num / den;
    (slope, y_mean - slope * x_mean)
}
