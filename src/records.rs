use crate::schema::{Field, HistoricalDataset};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics with a personal record. Kicking power also carries the foot that set it.
pub const TRACKED_METRICS: [Field; 7] = [
    Field::TopSpeed,
    Field::SprintDistance,
    Field::TotalDistance,
    Field::BallTouches,
    Field::KickingPower,
    Field::IntenseTurns,
    Field::WorkRate,
];

/// A perfectly balanced session has this left/right touch ratio.
const BALANCED_TOUCH_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FootSide {
    Left,
    Right,
}

impl FootSide {
    pub fn short_label(self) -> &'static str {
        match self {
            FootSide::Left => "L",
            FootSide::Right => "R",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
    pub field: Field,
    pub value: f64,
    /// `None` when the record-setting session has no date.
    pub date: Option<NaiveDate>,
    pub side: Option<FootSide>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchBalanceRecord {
    /// Left/right touch ratio of the session closest to a balanced split.
    pub ratio: f64,
    pub date: Option<NaiveDate>,
    /// Mean ratio over every session with touches on both feet.
    pub mean_ratio: f64,
    pub sessions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecords {
    pub records: BTreeMap<Field, PersonalRecord>,
    pub touch_balance: Option<TouchBalanceRecord>,
}

impl PersonalRecords {
    pub fn get(&self, field: Field) -> Option<&PersonalRecord> {
        self.records.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.touch_balance.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
struct Best {
    value: f64,
    date: Option<NaiveDate>,
}

impl Best {
    /// A new value takes over when it is better, or equal and achieved earlier.
    fn should_yield_to(&self, value: f64, date: Option<NaiveDate>, higher_is_better: bool) -> bool {
        let better = if higher_is_better {
            value > self.value
        } else {
            value < self.value
        };
        better || (value == self.value && earlier(date, self.date))
    }
}

/// Dated sessions precede undated ones; two undated sessions keep store order.
fn earlier(candidate: Option<NaiveDate>, current: Option<NaiveDate>) -> bool {
    match (candidate, current) {
        (Some(a), Some(b)) => a < b,
        (Some(_), None) => true,
        _ => false,
    }
}

fn offer(slot: &mut Option<Best>, value: f64, date: Option<NaiveDate>, higher_is_better: bool) {
    match slot {
        Some(best) if !best.should_yield_to(value, date, higher_is_better) => {}
        _ => *slot = Some(Best { value, date }),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PersonalRecordTracker;

impl PersonalRecordTracker {
    pub fn new() -> Self {
        Self
    }

    /// Best value per tracked metric, in one pass over the dataset.
    ///
    /// Missing values never compete. Equal values resolve to the earliest date.
    pub fn compute(&self, dataset: &HistoricalDataset) -> PersonalRecords {
        let mut bests: BTreeMap<Field, Option<Best>> = BTreeMap::new();
        let mut left_power: Option<Best> = None;
        let mut right_power: Option<Best> = None;
        let mut balance: Option<(Best, f64)> = None;
        let mut ratio_sum = 0.0;
        let mut ratio_count = 0usize;

        for session in dataset.iter() {
            for field in TRACKED_METRICS {
                if field == Field::KickingPower {
                    continue;
                }
                if let Some(value) = session.metric(field) {
                    offer(bests.entry(field).or_default(), value, session.date, true);
                }
            }

            if let Some(v) = session.left_kicking_power {
                offer(&mut left_power, v, session.date, true);
            }
            if let Some(v) = session.right_kicking_power {
                offer(&mut right_power, v, session.date, true);
            }

            if let (Some(left), Some(right)) = (session.left_touches, session.right_touches) {
                if left > 0 && right > 0 {
                    let ratio = f64::from(left) / f64::from(right);
                    ratio_sum += ratio;
                    ratio_count += 1;

                    let distance = (ratio - BALANCED_TOUCH_RATIO).abs();
                    let replace = match &balance {
                        None => true,
                        Some((best, _)) => best.should_yield_to(distance, session.date, false),
                    };
                    if replace {
                        balance = Some((
                            Best {
                                value: distance,
                                date: session.date,
                            },
                            ratio,
                        ));
                    }
                }
            }
        }

        let mut records: BTreeMap<Field, PersonalRecord> = bests
            .into_iter()
            .filter_map(|(field, best)| {
                best.map(|b| {
                    (
                        field,
                        PersonalRecord {
                            field,
                            value: b.value,
                            date: b.date,
                            side: None,
                        },
                    )
                })
            })
            .collect();

        if let Some(record) = kicking_power_record(left_power, right_power) {
            records.insert(Field::KickingPower, record);
        }

        let touch_balance = balance.map(|(best, ratio)| TouchBalanceRecord {
            ratio,
            date: best.date,
            mean_ratio: ratio_sum / ratio_count as f64,
            sessions: ratio_count,
        });

        PersonalRecords {
            records,
            touch_balance,
        }
    }
}

/// The stronger foot's best. Equal bests go to the earlier date, then to the left foot.
fn kicking_power_record(left: Option<Best>, right: Option<Best>) -> Option<PersonalRecord> {
    let (best, side) = match (left, right) {
        (None, None) => return None,
        (Some(l), None) => (l, FootSide::Left),
        (None, Some(r)) => (r, FootSide::Right),
        (Some(l), Some(r)) => {
            if r.value > l.value || (r.value == l.value && earlier(r.date, l.date)) {
                (r, FootSide::Right)
            } else {
                (l, FootSide::Left)
            }
        }
    };

    Some(PersonalRecord {
        field: Field::KickingPower,
        value: best.value,
        date: best.date,
        side: Some(side),
    })
}

pub fn compute_personal_records(dataset: &HistoricalDataset) -> PersonalRecords {
    PersonalRecordTracker::new().compute(dataset)
}
