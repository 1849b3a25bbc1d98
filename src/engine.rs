use crate::schema::{HistoricalDataset, TrainingSession};
use crate::utils::round_to;
use log::debug;

pub const YARDS_PER_MILE: f64 = 1760.0;

/// Decimal places kept on work rate (yards per minute).
const WORK_RATE_DECIMALS: i32 = 2;

/// Derives every calculated field from its raw inputs.
///
/// Each formula runs as its own pass over the whole dataset and overwrites its output column,
/// whatever was stored there before. The engine holds no state, so recomputing is idempotent.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatedFieldEngine;

impl CalculatedFieldEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn recompute(&self, sessions: &mut [TrainingSession]) {
        debug!("Recomputing calculated fields for {} sessions", sessions.len());

        for s in sessions.iter_mut() {
            s.total_turns = total_turns(s.left_turns, s.right_turns, s.back_turns);
        }
        for s in sessions.iter_mut() {
            s.ball_touches = ball_touches(s.left_touches, s.right_touches);
        }
        for s in sessions.iter_mut() {
            s.left_foot_pct = foot_share(s.left_touches, s.ball_touches);
            s.right_foot_pct = foot_share(s.right_touches, s.ball_touches);
        }
        for s in sessions.iter_mut() {
            s.kicking_power = kicking_power(s.left_kicking_power, s.right_kicking_power);
        }
        for s in sessions.iter_mut() {
            s.work_rate = work_rate(s.total_distance, s.duration);
        }
    }

    pub fn recompute_dataset(&self, dataset: &mut HistoricalDataset) {
        self.recompute(&mut dataset.sessions);
    }

    pub fn recompute_session(&self, session: &mut TrainingSession) {
        self.recompute(std::slice::from_mut(session));
    }
}

/// Left + right + back. A missing component counts as zero once any component is recorded.
pub fn total_turns(left: Option<u32>, right: Option<u32>, back: Option<u32>) -> Option<u32> {
    if left.is_none() && right.is_none() && back.is_none() {
        return None;
    }
    Some(
        left.unwrap_or(0)
            .saturating_add(right.unwrap_or(0))
            .saturating_add(back.unwrap_or(0)),
    )
}

pub fn ball_touches(left: Option<u32>, right: Option<u32>) -> Option<u32> {
    match (left, right) {
        (None, None) => None,
        (l, r) => Some(l.unwrap_or(0).saturating_add(r.unwrap_or(0))),
    }
}

/// Percentage of all touches taken with one foot; undefined without touches.
pub fn foot_share(side: Option<u32>, ball_touches: Option<u32>) -> Option<f64> {
    match ball_touches {
        Some(total) if total > 0 => Some(100.0 * f64::from(side.unwrap_or(0)) / f64::from(total)),
        _ => None,
    }
}

pub fn kicking_power(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    match (left, right) {
        (Some(l), Some(r)) => Some(l.max(r)),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

/// Yards covered per minute.
pub fn work_rate(total_distance_mi: Option<f64>, duration_min: Option<f64>) -> Option<f64> {
    let distance = total_distance_mi?;
    let duration = duration_min.filter(|d| *d > 0.0)?;
    Some(round_to(
        distance * YARDS_PER_MILE / duration,
        WORK_RATE_DECIMALS,
    ))
}
