use crate::utils::format_sheet_date;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Storage type of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Date,
    Text,
    Flag,
    Decimal,
    Count,
}

/// Which part of a session a field describes. Drives the "irrelevant fields stay null" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    SessionInfo,
    Movement,
    Agility,
    BallWork,
    Match,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    SessionName,
    Coach,
    Location,
    Surface,
    WithBall,
    TrainingType,
    Duration,
    Intensity,
    TotalDistance,
    SprintDistance,
    Accelerations,
    TopSpeed,
    NumSprints,
    LeftTurns,
    BackTurns,
    RightTurns,
    IntenseTurns,
    TotalTurns,
    AvgTurnEntry,
    AvgTurnExit,
    BallTouches,
    LeftTouches,
    RightTouches,
    LeftFootPct,
    RightFootPct,
    LeftReleases,
    RightReleases,
    KickingPower,
    LeftKickingPower,
    RightKickingPower,
    Position,
    Goals,
    Assists,
    WorkRate,
    BallPossessions,
}

impl Field {
    /// Every canonical field, in sheet column order.
    pub const ALL: [Field; 36] = [
        Field::Date,
        Field::SessionName,
        Field::Coach,
        Field::Location,
        Field::Surface,
        Field::WithBall,
        Field::TrainingType,
        Field::Duration,
        Field::Intensity,
        Field::TotalDistance,
        Field::SprintDistance,
        Field::Accelerations,
        Field::TopSpeed,
        Field::NumSprints,
        Field::LeftTurns,
        Field::BackTurns,
        Field::RightTurns,
        Field::IntenseTurns,
        Field::TotalTurns,
        Field::AvgTurnEntry,
        Field::AvgTurnExit,
        Field::BallTouches,
        Field::LeftTouches,
        Field::RightTouches,
        Field::LeftFootPct,
        Field::RightFootPct,
        Field::LeftReleases,
        Field::RightReleases,
        Field::KickingPower,
        Field::LeftKickingPower,
        Field::RightKickingPower,
        Field::Position,
        Field::Goals,
        Field::Assists,
        Field::WorkRate,
        Field::BallPossessions,
    ];

    pub const CALCULATED: [Field; 6] = [
        Field::TotalTurns,
        Field::BallTouches,
        Field::LeftFootPct,
        Field::RightFootPct,
        Field::KickingPower,
        Field::WorkRate,
    ];

    /// Internal canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::SessionName => "session_name",
            Field::Coach => "coach",
            Field::Location => "location",
            Field::Surface => "surface",
            Field::WithBall => "with_ball",
            Field::TrainingType => "training_type",
            Field::Duration => "duration",
            Field::Intensity => "intensity",
            Field::TotalDistance => "total_distance",
            Field::SprintDistance => "sprint_distance",
            Field::Accelerations => "accelerations",
            Field::TopSpeed => "top_speed",
            Field::NumSprints => "num_sprints",
            Field::LeftTurns => "left_turns",
            Field::BackTurns => "back_turns",
            Field::RightTurns => "right_turns",
            Field::IntenseTurns => "intense_turns",
            Field::TotalTurns => "total_turns",
            Field::AvgTurnEntry => "avg_turn_entry",
            Field::AvgTurnExit => "avg_turn_exit",
            Field::BallTouches => "ball_touches",
            Field::LeftTouches => "left_touches",
            Field::RightTouches => "right_touches",
            Field::LeftFootPct => "left_foot_pct",
            Field::RightFootPct => "right_foot_pct",
            Field::LeftReleases => "left_releases",
            Field::RightReleases => "right_releases",
            Field::KickingPower => "kicking_power",
            Field::LeftKickingPower => "left_kicking_power",
            Field::RightKickingPower => "right_kicking_power",
            Field::Position => "position",
            Field::Goals => "goals",
            Field::Assists => "assists",
            Field::WorkRate => "work_rate",
            Field::BallPossessions => "ball_possessions",
        }
    }

    /// Header text written to the external sheet. Units live in the header, values stay bare.
    pub fn sheet_header(self) -> &'static str {
        match self {
            Field::Duration => "duration_min",
            Field::TotalDistance => "total_distance_mi",
            Field::SprintDistance => "sprint_distance_yd",
            Field::Accelerations => "accl_decl",
            Field::TopSpeed => "top_speed_mph",
            Field::NumSprints => "sprints",
            Field::AvgTurnEntry => "avg_turn_entry_speed_mph",
            Field::AvgTurnExit => "avg_turn_exit_speed_mph",
            Field::LeftFootPct => "left_pct",
            Field::RightFootPct => "right_pct",
            Field::KickingPower => "kicking_power_mph",
            Field::LeftKickingPower => "left_kicking_power_mph",
            Field::RightKickingPower => "right_kicking_power_mph",
            other => other.name(),
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Date => FieldKind::Date,
            Field::SessionName
            | Field::Coach
            | Field::Location
            | Field::Surface
            | Field::TrainingType
            | Field::Intensity
            | Field::Position => FieldKind::Text,
            Field::WithBall => FieldKind::Flag,
            Field::Duration
            | Field::TotalDistance
            | Field::SprintDistance
            | Field::TopSpeed
            | Field::AvgTurnEntry
            | Field::AvgTurnExit
            | Field::LeftFootPct
            | Field::RightFootPct
            | Field::KickingPower
            | Field::LeftKickingPower
            | Field::RightKickingPower
            | Field::WorkRate => FieldKind::Decimal,
            Field::Accelerations
            | Field::NumSprints
            | Field::LeftTurns
            | Field::BackTurns
            | Field::RightTurns
            | Field::IntenseTurns
            | Field::TotalTurns
            | Field::BallTouches
            | Field::LeftTouches
            | Field::RightTouches
            | Field::LeftReleases
            | Field::RightReleases
            | Field::Goals
            | Field::Assists
            | Field::BallPossessions => FieldKind::Count,
        }
    }

    pub fn group(self) -> FieldGroup {
        match self {
            Field::Date
            | Field::SessionName
            | Field::Coach
            | Field::Location
            | Field::Surface
            | Field::WithBall
            | Field::TrainingType
            | Field::Duration
            | Field::Intensity
            | Field::WorkRate => FieldGroup::SessionInfo,
            Field::TotalDistance
            | Field::SprintDistance
            | Field::Accelerations
            | Field::TopSpeed
            | Field::NumSprints => FieldGroup::Movement,
            Field::LeftTurns
            | Field::BackTurns
            | Field::RightTurns
            | Field::IntenseTurns
            | Field::TotalTurns
            | Field::AvgTurnEntry
            | Field::AvgTurnExit => FieldGroup::Agility,
            Field::BallTouches
            | Field::LeftTouches
            | Field::RightTouches
            | Field::LeftFootPct
            | Field::RightFootPct
            | Field::LeftReleases
            | Field::RightReleases
            | Field::KickingPower
            | Field::LeftKickingPower
            | Field::RightKickingPower => FieldGroup::BallWork,
            Field::Position | Field::Goals | Field::Assists | Field::BallPossessions => {
                FieldGroup::Match
            }
        }
    }

    pub fn is_calculated(self) -> bool {
        Self::CALCULATED.contains(&self)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self.kind(), FieldKind::Decimal | FieldKind::Count)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Date(NaiveDate),
    Flag(bool),
    Count(u32),
    Decimal(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Decimal(v) => Some(*v),
            Value::Count(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Cell text as written to the sheet.
    pub fn to_cell(&self) -> String {
        match self {
            Value::Date(d) => format_sheet_date(*d),
            Value::Flag(true) => "Yes".to_string(),
            Value::Flag(false) => "No".to_string(),
            Value::Count(v) => v.to_string(),
            Value::Decimal(v) => v.to_string(),
            Value::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Surface {
    Grass,
    Turf,
    Hard,
    Other(String),
}

impl Surface {
    pub fn label(&self) -> &str {
        match self {
            Surface::Grass => "Grass",
            Surface::Turf => "Turf",
            Surface::Hard => "Hard",
            Surface::Other(label) => label,
        }
    }
}

impl From<String> for Surface {
    fn from(label: String) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "grass" => Surface::Grass,
            "turf" | "artificial turf" => Surface::Turf,
            "hard" | "hard court" => Surface::Hard,
            _ => Surface::Other(label.trim().to_string()),
        }
    }
}

impl From<Surface> for String {
    fn from(surface: Surface) -> Self {
        surface.label().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrainingType {
    SpeedAgility,
    BallWork,
    MatchGrass,
    MatchTurf,
    MatchHard,
    Other(String),
}

impl TrainingType {
    pub fn label(&self) -> &str {
        match self {
            TrainingType::SpeedAgility => "Speed and Agility",
            TrainingType::BallWork => "Ball Work",
            TrainingType::MatchGrass => "Match-Grass",
            TrainingType::MatchTurf => "Match-Turf",
            TrainingType::MatchHard => "Match-Hard",
            TrainingType::Other(label) => label,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(
            self,
            TrainingType::MatchGrass | TrainingType::MatchTurf | TrainingType::MatchHard
        )
    }

    /// Whether a field carries meaning for this kind of session.
    ///
    /// Unknown legacy types keep every field, since nothing is known about them.
    pub fn records(&self, field: Field) -> bool {
        match (self, field.group()) {
            (TrainingType::Other(_), _) => true,
            (_, FieldGroup::Match) => self.is_match(),
            (TrainingType::SpeedAgility, FieldGroup::BallWork) => false,
            _ => true,
        }
    }

    pub fn uses_ball(&self) -> Option<bool> {
        match self {
            TrainingType::SpeedAgility => Some(false),
            TrainingType::Other(_) => None,
            _ => Some(true),
        }
    }
}

impl From<String> for TrainingType {
    fn from(label: String) -> Self {
        let key: String = label
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
            .collect();
        let key = key.split_whitespace().collect::<Vec<_>>().join(" ");
        match key.as_str() {
            "speed and agility" | "speed agility" | "speed" | "agility" => {
                TrainingType::SpeedAgility
            }
            "ball work" | "ballwork" => TrainingType::BallWork,
            "match grass" => TrainingType::MatchGrass,
            "match turf" => TrainingType::MatchTurf,
            "match hard" => TrainingType::MatchHard,
            _ => TrainingType::Other(label.trim().to_string()),
        }
    }
}

impl From<TrainingType> for String {
    fn from(training_type: TrainingType) -> Self {
        training_type.label().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Intensity {
    Minimal,
    ExtremelyEasy,
    VeryEasy,
    Easy,
    Moderate,
    SomewhatHard,
    Hard,
    VeryHard,
    ExtremelyHard,
    Maximal,
    Other(String),
}

impl Intensity {
    pub const SCALE: [Intensity; 10] = [
        Intensity::Minimal,
        Intensity::ExtremelyEasy,
        Intensity::VeryEasy,
        Intensity::Easy,
        Intensity::Moderate,
        Intensity::SomewhatHard,
        Intensity::Hard,
        Intensity::VeryHard,
        Intensity::ExtremelyHard,
        Intensity::Maximal,
    ];

    pub fn label(&self) -> &str {
        match self {
            Intensity::Minimal => "Minimal",
            Intensity::ExtremelyEasy => "Extremely Easy",
            Intensity::VeryEasy => "Very Easy",
            Intensity::Easy => "Easy",
            Intensity::Moderate => "Moderate",
            Intensity::SomewhatHard => "Somewhat Hard",
            Intensity::Hard => "Hard",
            Intensity::VeryHard => "Very Hard",
            Intensity::ExtremelyHard => "Extremely Hard",
            Intensity::Maximal => "Maximal",
            Intensity::Other(label) => label,
        }
    }

    /// 1-based position on the ten-step scale; `None` for legacy labels.
    pub fn level(&self) -> Option<u8> {
        Self::SCALE
            .iter()
            .position(|step| step == self)
            .map(|idx| idx as u8 + 1)
    }
}

impl From<String> for Intensity {
    fn from(label: String) -> Self {
        let trimmed = label.trim();
        Self::SCALE
            .iter()
            .find(|step| step.label().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| Intensity::Other(trimmed.to_string()))
    }
}

impl From<Intensity> for String {
    fn from(intensity: Intensity) -> Self {
        intensity.label().to_string()
    }
}

/// One row of the training history.
///
/// Every field is optional: a missing value is "not recorded", never zero. The calculated
/// fields (`total_turns`, `ball_touches`, `left_foot_pct`, `right_foot_pct`, `kicking_power`,
/// `work_rate`) are owned by the calculated-field engine and overwritten on every recompute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrainingSession {
    pub date: Option<NaiveDate>,
    pub session_name: Option<String>,
    pub coach: Option<String>,
    pub location: Option<String>,
    #[schemars(with = "Option<String>")]
    pub surface: Option<Surface>,
    pub with_ball: Option<bool>,
    #[schemars(with = "Option<String>")]
    pub training_type: Option<TrainingType>,
    #[schemars(description = "Session length in minutes")]
    pub duration: Option<f64>,
    #[schemars(with = "Option<String>")]
    pub intensity: Option<Intensity>,

    #[schemars(description = "Miles")]
    pub total_distance: Option<f64>,
    #[schemars(description = "Yards")]
    pub sprint_distance: Option<f64>,
    pub accelerations: Option<u32>,
    #[schemars(description = "Miles per hour")]
    pub top_speed: Option<f64>,
    pub num_sprints: Option<u32>,

    pub left_turns: Option<u32>,
    pub back_turns: Option<u32>,
    pub right_turns: Option<u32>,
    pub intense_turns: Option<u32>,
    pub total_turns: Option<u32>,
    pub avg_turn_entry: Option<f64>,
    pub avg_turn_exit: Option<f64>,

    pub ball_touches: Option<u32>,
    pub left_touches: Option<u32>,
    pub right_touches: Option<u32>,
    pub left_foot_pct: Option<f64>,
    pub right_foot_pct: Option<f64>,
    pub left_releases: Option<u32>,
    pub right_releases: Option<u32>,
    pub kicking_power: Option<f64>,
    pub left_kicking_power: Option<f64>,
    pub right_kicking_power: Option<f64>,

    pub position: Option<String>,
    pub goals: Option<u32>,
    pub assists: Option<u32>,
    #[schemars(description = "Yards covered per minute")]
    pub work_rate: Option<f64>,
    pub ball_possessions: Option<u32>,
}

impl TrainingSession {
    pub fn get(&self, field: Field) -> Option<Value> {
        let text = |v: &Option<String>| v.clone().map(Value::Text);
        let decimal = |v: Option<f64>| v.map(Value::Decimal);
        let count = |v: Option<u32>| v.map(Value::Count);

        match field {
            Field::Date => self.date.map(Value::Date),
            Field::SessionName => text(&self.session_name),
            Field::Coach => text(&self.coach),
            Field::Location => text(&self.location),
            Field::Surface => self.surface.as_ref().map(|s| Value::Text(s.label().to_string())),
            Field::WithBall => self.with_ball.map(Value::Flag),
            Field::TrainingType => self
                .training_type
                .as_ref()
                .map(|t| Value::Text(t.label().to_string())),
            Field::Duration => decimal(self.duration),
            Field::Intensity => self
                .intensity
                .as_ref()
                .map(|i| Value::Text(i.label().to_string())),
            Field::TotalDistance => decimal(self.total_distance),
            Field::SprintDistance => decimal(self.sprint_distance),
            Field::Accelerations => count(self.accelerations),
            Field::TopSpeed => decimal(self.top_speed),
            Field::NumSprints => count(self.num_sprints),
            Field::LeftTurns => count(self.left_turns),
            Field::BackTurns => count(self.back_turns),
            Field::RightTurns => count(self.right_turns),
            Field::IntenseTurns => count(self.intense_turns),
            Field::TotalTurns => count(self.total_turns),
            Field::AvgTurnEntry => decimal(self.avg_turn_entry),
            Field::AvgTurnExit => decimal(self.avg_turn_exit),
            Field::BallTouches => count(self.ball_touches),
            Field::LeftTouches => count(self.left_touches),
            Field::RightTouches => count(self.right_touches),
            Field::LeftFootPct => decimal(self.left_foot_pct),
            Field::RightFootPct => decimal(self.right_foot_pct),
            Field::LeftReleases => count(self.left_releases),
            Field::RightReleases => count(self.right_releases),
            Field::KickingPower => decimal(self.kicking_power),
            Field::LeftKickingPower => decimal(self.left_kicking_power),
            Field::RightKickingPower => decimal(self.right_kicking_power),
            Field::Position => text(&self.position),
            Field::Goals => count(self.goals),
            Field::Assists => count(self.assists),
            Field::WorkRate => decimal(self.work_rate),
            Field::BallPossessions => count(self.ball_possessions),
        }
    }

    /// Stores a value into the field's typed slot.
    ///
    /// Returns `false` (and leaves the field untouched) when the value does not fit the field's
    /// kind, e.g. a fractional number for a count.
    pub fn set(&mut self, field: Field, value: Option<Value>) -> bool {
        let Some(value) = value else {
            self.clear(field);
            return true;
        };

        match field.kind() {
            FieldKind::Date => match value {
                Value::Date(d) => {
                    self.date = Some(d);
                    true
                }
                _ => false,
            },
            FieldKind::Flag => match value {
                Value::Flag(b) => {
                    self.with_ball = Some(b);
                    true
                }
                _ => false,
            },
            FieldKind::Text => match value {
                Value::Text(s) => {
                    self.set_text(field, s);
                    true
                }
                _ => false,
            },
            FieldKind::Decimal => match value.as_f64() {
                Some(v) => {
                    *self.decimal_slot(field) = Some(v);
                    true
                }
                None => false,
            },
            FieldKind::Count => {
                let count = match value {
                    Value::Count(v) => Some(v),
                    Value::Decimal(v) => crate::utils::decimal_to_count(v),
                    _ => None,
                };
                match count {
                    Some(v) => {
                        *self.count_slot(field) = Some(v);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    pub fn clear(&mut self, field: Field) {
        match field.kind() {
            FieldKind::Date => self.date = None,
            FieldKind::Flag => self.with_ball = None,
            FieldKind::Text => match field {
                Field::SessionName => self.session_name = None,
                Field::Coach => self.coach = None,
                Field::Location => self.location = None,
                Field::Surface => self.surface = None,
                Field::TrainingType => self.training_type = None,
                Field::Intensity => self.intensity = None,
                _ => self.position = None,
            },
            FieldKind::Decimal => *self.decimal_slot(field) = None,
            FieldKind::Count => *self.count_slot(field) = None,
        }
    }

    /// Numeric value of a field, for analytics.
    pub fn metric(&self, field: Field) -> Option<f64> {
        self.get(field).and_then(|v| v.as_f64())
    }

    fn set_text(&mut self, field: Field, text: String) {
        match field {
            Field::SessionName => self.session_name = Some(text),
            Field::Coach => self.coach = Some(text),
            Field::Location => self.location = Some(text),
            Field::Surface => self.surface = Some(Surface::from(text)),
            Field::TrainingType => self.training_type = Some(TrainingType::from(text)),
            Field::Intensity => self.intensity = Some(Intensity::from(text)),
            _ => self.position = Some(text),
        }
    }

    fn decimal_slot(&mut self, field: Field) -> &mut Option<f64> {
        match field {
            Field::Duration => &mut self.duration,
            Field::TotalDistance => &mut self.total_distance,
            Field::SprintDistance => &mut self.sprint_distance,
            Field::TopSpeed => &mut self.top_speed,
            Field::AvgTurnEntry => &mut self.avg_turn_entry,
            Field::AvgTurnExit => &mut self.avg_turn_exit,
            Field::LeftFootPct => &mut self.left_foot_pct,
            Field::RightFootPct => &mut self.right_foot_pct,
            Field::KickingPower => &mut self.kicking_power,
            Field::LeftKickingPower => &mut self.left_kicking_power,
            Field::RightKickingPower => &mut self.right_kicking_power,
            _ => &mut self.work_rate,
        }
    }

    fn count_slot(&mut self, field: Field) -> &mut Option<u32> {
        match field {
            Field::Accelerations => &mut self.accelerations,
            Field::NumSprints => &mut self.num_sprints,
            Field::LeftTurns => &mut self.left_turns,
            Field::BackTurns => &mut self.back_turns,
            Field::RightTurns => &mut self.right_turns,
            Field::IntenseTurns => &mut self.intense_turns,
            Field::TotalTurns => &mut self.total_turns,
            Field::BallTouches => &mut self.ball_touches,
            Field::LeftTouches => &mut self.left_touches,
            Field::RightTouches => &mut self.right_touches,
            Field::LeftReleases => &mut self.left_releases,
            Field::RightReleases => &mut self.right_releases,
            Field::Goals => &mut self.goals,
            Field::Assists => &mut self.assists,
            _ => &mut self.ball_possessions,
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(TrainingSession)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// The full session history in store order.
///
/// Store order is append order, which external edits can break; use [`sorted_by_date`]
/// whenever chronology matters.
///
/// [`sorted_by_date`]: HistoricalDataset::sorted_by_date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataset {
    pub sessions: Vec<TrainingSession>,
}

impl HistoricalDataset {
    pub fn new(sessions: Vec<TrainingSession>) -> Self {
        Self { sessions }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrainingSession> {
        self.sessions.iter()
    }

    /// Sessions ordered by date; undated sessions go last, ties keep store order.
    pub fn sorted_by_date(&self) -> Vec<&TrainingSession> {
        let mut sorted: Vec<&TrainingSession> = self.sessions.iter().collect();
        sorted.sort_by_key(|s| (s.date.is_none(), s.date));
        sorted
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.sessions.iter().filter_map(|s| s.date).max()
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.sessions.iter().filter_map(|s| s.date).min()
    }

    pub fn session_names(&self) -> Vec<String> {
        distinct(self.sessions.iter().filter_map(|s| s.session_name.as_deref()))
    }

    pub fn coaches(&self) -> Vec<String> {
        distinct(self.sessions.iter().filter_map(|s| s.coach.as_deref()))
    }

    pub fn locations(&self) -> Vec<String> {
        distinct(self.sessions.iter().filter_map(|s| s.location.as_deref()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_table_is_consistent() {
        assert_eq!(Field::ALL.len(), 36);
        for field in Field::CALCULATED {
            assert!(field.is_numeric(), "{} should be numeric", field);
        }
        let mut headers: Vec<&str> = Field::ALL.iter().map(|f| f.sheet_header()).collect();
        headers.sort();
        headers.dedup();
        assert_eq!(headers.len(), 36, "sheet headers must be unique");
    }

    #[test]
    fn test_get_set_round_trip_by_field() {
        let mut session = TrainingSession::default();
        assert!(session.set(Field::TopSpeed, Some(Value::Decimal(18.2))));
        assert!(session.set(Field::LeftTurns, Some(Value::Decimal(12.0))));
        assert!(!session.set(Field::RightTurns, Some(Value::Decimal(12.5))));
        assert!(session.set(Field::Surface, Some(Value::Text("turf".to_string()))));
        assert!(!session.set(Field::Date, Some(Value::Text("2024-01-01".to_string()))));

        assert_eq!(session.top_speed, Some(18.2));
        assert_eq!(session.left_turns, Some(12));
        assert_eq!(session.right_turns, None);
        assert_eq!(session.surface, Some(Surface::Turf));
        assert_eq!(session.metric(Field::LeftTurns), Some(12.0));

        session.set(Field::TopSpeed, None);
        assert_eq!(session.top_speed, None);
    }

    #[test]
    fn test_labels_keep_unknown_values() {
        assert_eq!(
            TrainingType::from("Speed/Agility".to_string()),
            TrainingType::SpeedAgility
        );
        assert_eq!(
            TrainingType::from("match - turf".to_string()),
            TrainingType::MatchTurf
        );
        assert_eq!(
            TrainingType::from("Technical".to_string()),
            TrainingType::Other("Technical".to_string())
        );
        assert_eq!(Intensity::from("somewhat hard".to_string()), Intensity::SomewhatHard);
        assert_eq!(Intensity::SomewhatHard.level(), Some(6));
        assert_eq!(Intensity::from("Brutal".to_string()).level(), None);
    }

    #[test]
    fn test_training_type_field_relevance() {
        assert!(!TrainingType::SpeedAgility.records(Field::LeftTouches));
        assert!(!TrainingType::BallWork.records(Field::Goals));
        assert!(TrainingType::MatchGrass.records(Field::Goals));
        assert!(TrainingType::BallWork.records(Field::LeftKickingPower));
        assert!(TrainingType::Other("Technical".to_string()).records(Field::Goals));
    }

    #[test]
    fn test_sorted_by_date_puts_undated_last() {
        let dated = |y, m, d| TrainingSession {
            date: NaiveDate::from_ymd_opt(y, m, d),
            ..Default::default()
        };
        let dataset = HistoricalDataset::new(vec![
            dated(2024, 2, 10),
            TrainingSession::default(),
            dated(2024, 1, 5),
        ]);
        let sorted = dataset.sorted_by_date();
        assert_eq!(sorted[0].date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(sorted[1].date, NaiveDate::from_ymd_opt(2024, 2, 10));
        assert_eq!(sorted[2].date, None);
        assert_eq!(dataset.latest_date(), NaiveDate::from_ymd_opt(2024, 2, 10));
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = TrainingSession::schema_as_json().unwrap();
        assert!(schema_json.contains("top_speed"));
        assert!(schema_json.contains("work_rate"));
        assert!(schema_json.contains("training_type"));
    }
}
