use crate::error::Result;
use crate::schema::{Field, HistoricalDataset, TrainingSession};
use crate::utils::trailing_window;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TRAILING_WINDOW_DAYS: u64 = 30;

/// Metrics summarised for the narrative insights.
pub const INSIGHT_METRICS: [Field; 14] = [
    Field::TopSpeed,
    Field::SprintDistance,
    Field::TotalDistance,
    Field::Duration,
    Field::BallTouches,
    Field::KickingPower,
    Field::WorkRate,
    Field::IntenseTurns,
    Field::TotalTurns,
    Field::AvgTurnEntry,
    Field::AvgTurnExit,
    Field::LeftFootPct,
    Field::NumSprints,
    Field::Accelerations,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    /// Sessions with a value for this metric.
    pub sessions: usize,
    pub mean: f64,
    pub best: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Inclusive bounds; `None` for the all-time window.
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub sessions: usize,
    pub total_minutes: f64,
    pub sessions_by_training_type: BTreeMap<String, usize>,
    /// Metrics with no value in the window are absent.
    pub metrics: BTreeMap<Field, MetricStats>,
}

impl WindowStats {
    pub fn metric(&self, field: Field) -> Option<&MetricStats> {
        self.metrics.get(&field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsSummary {
    pub reference_date: NaiveDate,
    pub all_time: WindowStats,
    pub trailing: WindowStats,
}

#[derive(Debug, Default)]
struct Accumulator {
    count: usize,
    sum: f64,
    best: Option<f64>,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.best = Some(self.best.map_or(value, |b| b.max(value)));
    }

    fn finish(&self) -> Option<MetricStats> {
        let best = self.best?;
        Some(MetricStats {
            sessions: self.count,
            mean: self.sum / self.count as f64,
            best,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InsightsAggregator {
    window_days: u64,
}

impl Default for InsightsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightsAggregator {
    pub fn new() -> Self {
        Self {
            window_days: TRAILING_WINDOW_DAYS,
        }
    }

    pub fn with_window_days(window_days: u64) -> Self {
        Self { window_days }
    }

    /// All-time and trailing-window statistics as of `reference`.
    ///
    /// The trailing window covers `reference` and the days before it; sessions without a
    /// date only count towards all-time.
    pub fn summarize(
        &self,
        dataset: &HistoricalDataset,
        reference: NaiveDate,
    ) -> Result<InsightsSummary> {
        let (start, end) = trailing_window(reference, self.window_days)?;

        let all_time = window_stats(dataset.iter(), None, None);
        let trailing = window_stats(
            dataset
                .iter()
                .filter(|s| s.date.is_some_and(|d| d >= start && d <= end)),
            Some(start),
            Some(end),
        );

        debug!(
            "Insights as of {}: {} sessions all-time, {} in the last {} days",
            reference, all_time.sessions, trailing.sessions, self.window_days
        );

        Ok(InsightsSummary {
            reference_date: reference,
            all_time,
            trailing,
        })
    }

    /// Summary as of the most recent session date; `None` when no session is dated.
    pub fn summarize_latest(&self, dataset: &HistoricalDataset) -> Result<Option<InsightsSummary>> {
        match dataset.latest_date() {
            Some(reference) => self.summarize(dataset, reference).map(Some),
            None => Ok(None),
        }
    }
}

fn window_stats<'a>(
    sessions: impl Iterator<Item = &'a TrainingSession>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> WindowStats {
    let mut stats = WindowStats {
        start,
        end,
        ..Default::default()
    };
    let mut accumulators: BTreeMap<Field, Accumulator> = BTreeMap::new();

    for session in sessions {
        stats.sessions += 1;
        stats.total_minutes += session.duration.unwrap_or(0.0);
        if let Some(training_type) = &session.training_type {
            *stats
                .sessions_by_training_type
                .entry(training_type.label().to_string())
                .or_default() += 1;
        }
        for field in INSIGHT_METRICS {
            if let Some(value) = session.metric(field) {
                accumulators.entry(field).or_default().push(value);
            }
        }
    }

    stats.metrics = accumulators
        .into_iter()
        .filter_map(|(field, acc)| acc.finish().map(|m| (field, m)))
        .collect();
    stats
}
