use crate::schema::{Field, FieldKind, HistoricalDataset, TrainingSession, Value};
use crate::table::SheetTable;
use crate::utils::{decimal_to_count, is_blank_cell, parse_decimal, parse_sheet_date};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Header variants seen in the spreadsheet over time, already in normalized form.
///
/// Canonical names and sheet headers of every field are added on top of this table.
const LEGACY_ALIASES: &[(&str, Field)] = &[
    ("session", Field::SessionName),
    ("session_type", Field::TrainingType),
    ("type", Field::TrainingType),
    ("ball", Field::WithBall),
    ("duration_minutes", Field::Duration),
    ("duration_mins", Field::Duration),
    ("minutes", Field::Duration),
    ("distance", Field::TotalDistance),
    ("distance_mi", Field::TotalDistance),
    ("total_distance_miles", Field::TotalDistance),
    ("sprint_distance_yards", Field::SprintDistance),
    ("sprint_yards", Field::SprintDistance),
    ("accl", Field::Accelerations),
    ("accl_decel", Field::Accelerations),
    ("accel_decel", Field::Accelerations),
    ("accelerations_decelerations", Field::Accelerations),
    ("top_speed_mi_h", Field::TopSpeed),
    ("max_speed", Field::TopSpeed),
    ("max_speed_mph", Field::TopSpeed),
    ("num_sprint", Field::NumSprints),
    ("sprint_count", Field::NumSprints),
    ("number_of_sprints", Field::NumSprints),
    ("avg_turn_entry_speed", Field::AvgTurnEntry),
    ("average_turn_entry_speed", Field::AvgTurnEntry),
    ("avg_turn_exit_speed", Field::AvgTurnExit),
    ("average_turn_exit_speed", Field::AvgTurnExit),
    ("touches", Field::BallTouches),
    ("left_foot_touches", Field::LeftTouches),
    ("right_foot_touches", Field::RightTouches),
    ("left_foot_percentage", Field::LeftFootPct),
    ("right_foot_percentage", Field::RightFootPct),
    ("left_foot_releases", Field::LeftReleases),
    ("right_foot_releases", Field::RightReleases),
    ("kicking_power", Field::KickingPower),
    ("max_kicking_power", Field::KickingPower),
    ("left_kicking_power", Field::LeftKickingPower),
    ("right_kicking_power", Field::RightKickingPower),
    ("left_foot_kicking_power", Field::LeftKickingPower),
    ("right_foot_kicking_power", Field::RightKickingPower),
    ("possessions", Field::BallPossessions),
    ("work_rate_yd_min", Field::WorkRate),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NormalizationWarning {
    /// Header with no canonical field; the column is dropped.
    UnmappedColumn { column: usize, header: String },
    /// A second header resolving to an already-mapped field; the later column is dropped.
    DuplicateColumn {
        column: usize,
        header: String,
        field: Field,
    },
    /// A non-blank cell that could not be coerced to the field's type; stored as null.
    CoercionFailed {
        row: usize,
        field: Field,
        value: String,
    },
    InvalidDate { row: usize, value: String },
}

impl fmt::Display for NormalizationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationWarning::UnmappedColumn { column, header } => {
                write!(f, "Dropping unmapped column {} ('{}')", column, header)
            }
            NormalizationWarning::DuplicateColumn {
                column,
                header,
                field,
            } => write!(
                f,
                "Dropping column {} ('{}'): {} is already mapped",
                column, header, field
            ),
            NormalizationWarning::CoercionFailed { row, field, value } => write!(
                f,
                "Row {}: '{}' is not a valid {}, stored as null",
                row, value, field
            ),
            NormalizationWarning::InvalidDate { row, value } => {
                write!(f, "Row {}: unrecognised date '{}', stored as null", row, value)
            }
        }
    }
}

/// Outcome of normalizing a raw table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub dataset: HistoricalDataset,
    pub warnings: Vec<NormalizationWarning>,
}

/// Maps arbitrary spreadsheet headers onto canonical fields and coerces cells into typed values.
#[derive(Debug, Clone)]
pub struct SchemaNormalizer {
    aliases: HashMap<String, Field>,
}

impl Default for SchemaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaNormalizer {
    pub fn new() -> Self {
        let mut aliases: HashMap<String, Field> = LEGACY_ALIASES
            .iter()
            .map(|(alias, field)| (alias.to_string(), *field))
            .collect();

        for field in Field::ALL {
            aliases.insert(field.name().to_string(), field);
            aliases.insert(field.sheet_header().to_string(), field);
        }

        Self { aliases }
    }

    /// Lower-cases the header, spells `%` as `pct` and collapses every run of other
    /// non-alphanumerics into a single underscore.
    pub fn normalize_header(header: &str) -> String {
        let mut key = String::with_capacity(header.len());
        let mut pending_separator = false;

        for c in header.trim().chars() {
            if c == '%' {
                // "%" is a word of its own: "Left%" and "Left %" both become left_pct
                if !key.is_empty() {
                    key.push('_');
                }
                key.push_str("pct");
                pending_separator = true;
            } else if c.is_alphanumeric() {
                if pending_separator && !key.is_empty() {
                    key.push('_');
                }
                pending_separator = false;
                key.extend(c.to_lowercase());
            } else {
                pending_separator = true;
            }
        }

        key
    }

    pub fn resolve(&self, header: &str) -> Option<Field> {
        self.aliases.get(&Self::normalize_header(header)).copied()
    }

    /// Column index → field. Unmapped and duplicate columns resolve to `None`.
    pub fn header_map(&self, header: &[String]) -> (Vec<Option<Field>>, Vec<NormalizationWarning>) {
        let mut mapping = Vec::with_capacity(header.len());
        let mut warnings = Vec::new();
        let mut seen: Vec<Field> = Vec::new();

        for (column, text) in header.iter().enumerate() {
            if text.trim().is_empty() {
                mapping.push(None);
                continue;
            }

            match self.resolve(text) {
                Some(field) if seen.contains(&field) => {
                    warnings.push(NormalizationWarning::DuplicateColumn {
                        column,
                        header: text.clone(),
                        field,
                    });
                    mapping.push(None);
                }
                Some(field) => {
                    seen.push(field);
                    mapping.push(Some(field));
                }
                None => {
                    warnings.push(NormalizationWarning::UnmappedColumn {
                        column,
                        header: text.clone(),
                    });
                    mapping.push(None);
                }
            }
        }

        (mapping, warnings)
    }

    /// Builds the canonical dataset from a raw table.
    ///
    /// Never fails: drift and bad cells degrade to nulls, each reported as a warning.
    /// Fields whose column is absent are simply null on every session.
    pub fn normalize(&self, table: &SheetTable) -> Normalized {
        let (mapping, mut warnings) = self.header_map(&table.header);
        let mut sessions = Vec::with_capacity(table.rows.len());

        for (row_idx, row) in table.rows.iter().enumerate() {
            if row.iter().all(|cell| is_blank_cell(cell)) {
                continue;
            }

            let mut session = TrainingSession::default();
            for (column, field) in mapping.iter().enumerate() {
                let Some(field) = field else { continue };
                let cell = row.get(column).map(String::as_str).unwrap_or("");

                match coerce_cell(*field, cell) {
                    Ok(value) => {
                        session.set(*field, value);
                    }
                    Err(warning) => {
                        warnings.push(warning.at_row(row_idx));
                    }
                }
            }
            sessions.push(session);
        }

        for warning in &warnings {
            warn!("{}", warning);
        }

        Normalized {
            dataset: HistoricalDataset::new(sessions),
            warnings,
        }
    }

    /// Writes a dataset back out with the canonical sheet header and canonical cell text.
    pub fn to_table(dataset: &HistoricalDataset) -> SheetTable {
        let rows = dataset
            .iter()
            .map(|session| {
                Field::ALL
                    .iter()
                    .map(|f| session.get(*f).map(|v| v.to_cell()).unwrap_or_default())
                    .collect()
            })
            .collect();
        SheetTable::new(canonical_header(), rows)
    }

    /// Lays a session out under an existing header row. Columns this crate does not own stay blank.
    pub fn row_for_header(&self, session: &TrainingSession, header: &[String]) -> Vec<String> {
        let (mapping, _) = self.header_map(header);
        mapping
            .into_iter()
            .map(|field| {
                field
                    .and_then(|f| session.get(f))
                    .map(|value| value.to_cell())
                    .unwrap_or_default()
            })
            .collect()
    }
}

pub fn canonical_header() -> Vec<String> {
    Field::ALL
        .iter()
        .map(|f| f.sheet_header().to_string())
        .collect()
}

impl NormalizationWarning {
    fn at_row(self, row: usize) -> Self {
        match self {
            NormalizationWarning::CoercionFailed { field, value, .. } => {
                NormalizationWarning::CoercionFailed { row, field, value }
            }
            NormalizationWarning::InvalidDate { value, .. } => {
                NormalizationWarning::InvalidDate { row, value }
            }
            other => other,
        }
    }
}

/// Coerces one cell into the field's type. Blank-like cells are null without complaint.
fn coerce_cell(field: Field, cell: &str) -> Result<Option<Value>, NormalizationWarning> {
    if is_blank_cell(cell) {
        return Ok(None);
    }
    let trimmed = cell.trim();
    let failed = || NormalizationWarning::CoercionFailed {
        row: 0,
        field,
        value: trimmed.to_string(),
    };

    match field.kind() {
        FieldKind::Date => parse_sheet_date(trimmed)
            .map(|d| Some(Value::Date(d)))
            .ok_or_else(|| NormalizationWarning::InvalidDate {
                row: 0,
                value: trimmed.to_string(),
            }),
        FieldKind::Text => Ok(Some(Value::Text(trimmed.to_string()))),
        FieldKind::Flag => parse_flag(trimmed)
            .map(|b| Some(Value::Flag(b)))
            .ok_or_else(failed),
        FieldKind::Decimal => parse_decimal(trimmed)
            .map(|v| Some(Value::Decimal(v)))
            .ok_or_else(failed),
        FieldKind::Count => parse_decimal(trimmed)
            .and_then(decimal_to_count)
            .map(|v| Some(Value::Count(v)))
            .ok_or_else(failed),
    }
}

fn parse_flag(cell: &str) -> Option<bool> {
    match cell.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(header: &[&str], rows: &[&[&str]]) -> SheetTable {
        SheetTable::new(
            header.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(SchemaNormalizer::normalize_header("Top Speed (mph)"), "top_speed_mph");
        assert_eq!(SchemaNormalizer::normalize_header("  Left %  "), "left_pct");
        assert_eq!(SchemaNormalizer::normalize_header("Accl/Decl"), "accl_decl");
        assert_eq!(SchemaNormalizer::normalize_header("duration_min"), "duration_min");
    }

    #[test]
    fn test_resolves_sheet_and_legacy_headers() {
        let normalizer = SchemaNormalizer::new();
        assert_eq!(normalizer.resolve("duration_min"), Some(Field::Duration));
        assert_eq!(normalizer.resolve("Duration"), Some(Field::Duration));
        assert_eq!(normalizer.resolve("sprints"), Some(Field::NumSprints));
        assert_eq!(normalizer.resolve("left_pct"), Some(Field::LeftFootPct));
        assert_eq!(normalizer.resolve("Left Foot %"), Some(Field::LeftFootPct));
        assert_eq!(normalizer.resolve("kicking_power_mph"), Some(Field::KickingPower));
        assert_eq!(normalizer.resolve("favourite_boots"), None);
    }

    #[test]
    fn test_unmapped_and_duplicate_columns_are_dropped() {
        let raw = table(
            &["date", "Top Speed (mph)", "top_speed", "mood"],
            &[&["2024-01-05", "18.2", "99", "great"]],
        );
        let normalized = SchemaNormalizer::new().normalize(&raw);

        assert_eq!(normalized.dataset.len(), 1);
        assert_eq!(normalized.dataset.sessions[0].top_speed, Some(18.2));
        assert!(normalized.warnings.iter().any(|w| matches!(
            w,
            NormalizationWarning::DuplicateColumn { field: Field::TopSpeed, .. }
        )));
        assert!(normalized.warnings.iter().any(|w| matches!(
            w,
            NormalizationWarning::UnmappedColumn { header, .. } if header == "mood"
        )));
    }

    #[test]
    fn test_coercion_failures_become_null() {
        let raw = table(
            &["date", "left_turns", "top_speed_mph", "coach"],
            &[
                &["2024-01-05", "12.5", "fast", "Sam"],
                &["sometime", "nan", "None", ""],
            ],
        );
        let normalized = SchemaNormalizer::new().normalize(&raw);
        let first = &normalized.dataset.sessions[0];
        let second = &normalized.dataset.sessions[1];

        assert_eq!(first.left_turns, None);
        assert_eq!(first.top_speed, None);
        assert_eq!(first.coach.as_deref(), Some("Sam"));
        assert_eq!(second.date, None);
        assert_eq!(second.left_turns, None);

        // blank markers do not produce warnings, bad values do
        assert_eq!(normalized.warnings.len(), 3);
        assert!(normalized.warnings.contains(&NormalizationWarning::InvalidDate {
            row: 1,
            value: "sometime".to_string()
        }));
    }

    #[test]
    fn test_missing_columns_and_ragged_rows() {
        let raw = table(
            &["date", "top_speed_mph", "sprints"],
            &[&["2024-01-05"], &["", "", ""], &["2024-01-06", "17", "4"]],
        );
        let normalized = SchemaNormalizer::new().normalize(&raw);

        assert_eq!(normalized.dataset.len(), 2, "blank row is skipped");
        assert_eq!(normalized.dataset.sessions[0].top_speed, None);
        assert_eq!(normalized.dataset.sessions[1].num_sprints, Some(4));
        assert_eq!(normalized.dataset.sessions[1].goals, None);
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn test_to_table_round_trip_is_stable() {
        let raw = table(
            &["Date", "Session Name", "With Ball", "Duration", "Left %", "Surface"],
            &[&["01/05/2024", "Tuesday skills", "yes", "60", "60", "turf"]],
        );
        let normalizer = SchemaNormalizer::new();
        let once = normalizer.normalize(&raw).dataset;
        let written = SchemaNormalizer::to_table(&once);
        let twice = normalizer.normalize(&written).dataset;

        assert_eq!(once, twice);
        assert_eq!(written.header.len(), Field::ALL.len());
        assert_eq!(written.rows[0][0], "2024-01-05");
        assert_eq!(written.rows[0][5], "Yes");
        assert_eq!(
            twice.sessions[0].date,
            Some(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
        );
    }

    #[test]
    fn test_row_for_header_follows_store_order() {
        let session = TrainingSession {
            coach: Some("Sam".to_string()),
            top_speed: Some(18.2),
            ..Default::default()
        };
        let header: Vec<String> = ["top_speed_mph", "notes", "coach"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let row = SchemaNormalizer::new().row_for_header(&session, &header);
        assert_eq!(row, vec!["18.2", "", "Sam"]);
    }
}
