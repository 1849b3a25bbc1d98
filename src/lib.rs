//! # Training Tracker
//!
//! A library for turning soccer training-session screenshots and spreadsheet rows into a
//! consistent, analysable session history.
//!
//! ## Core Concepts
//!
//! - **Canonical Schema**: 36 typed fields per session; every other header spelling is an alias
//! - **Extraction**: an ordered rule table pulls metrics out of OCR text from tracker screenshots
//! - **Calculated Fields**: total turns, ball touches, foot split, kicking power and work rate are
//!   always derived from their inputs, never typed in
//! - **Record Store**: a header-row table (CSV file or Google Sheet) behind a short-lived cache
//! - **Analytics**: personal records with tie-breaks, and all-time vs trailing-window insights
//!
//! ## Example
//!
//! ```rust,ignore
//! use training_tracker::*;
//! use chrono::NaiveDate;
//!
//! let mut store = RecordStore::new(MemoryStore::new(), DEFAULT_TTL);
//!
//! let mut draft = SessionDraft::new()
//!     .with(Field::Date, Value::Date(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()))
//!     .with(Field::TrainingType, Value::Text("Ball Work".to_string()));
//! draft.merge_extraction(&extract_fields("Left Touches: 30\nRight Touches: 20"));
//!
//! store.append(&draft.build()).unwrap();
//!
//! let dataset = store.load().unwrap();
//! let records = compute_personal_records(&dataset);
//! let insights = InsightsAggregator::new().summarize_latest(&dataset).unwrap();
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod ingestion;
pub mod insights;
pub mod normalizer;
pub mod records;
pub mod schema;
pub mod store;
pub mod table;
pub mod utils;

#[cfg(feature = "sheets")]
pub mod sheets;

pub use cache::{TtlCache, DEFAULT_TTL};
pub use config::{open_store, StoreLocator, TrackerConfig};
pub use engine::{CalculatedFieldEngine, YARDS_PER_MILE};
pub use error::{Result, TrackerError};
pub use extractor::{extract_fields, Extraction, TextExtractor, TextRecognizer};
pub use ingestion::SessionDraft;
pub use insights::{InsightsAggregator, InsightsSummary, MetricStats, WindowStats};
pub use normalizer::{canonical_header, NormalizationWarning, Normalized, SchemaNormalizer};
pub use records::{
    compute_personal_records, FootSide, PersonalRecord, PersonalRecordTracker, PersonalRecords,
    TouchBalanceRecord,
};
pub use schema::*;
pub use store::{CsvStore, DatasetView, LoadStatus, MemoryStore, RecordStore, TabularStore};
pub use table::SheetTable;
pub use utils::*;

use log::{debug, info};

/// Runs a raw table through the normalizer and the calculated-field engine.
pub struct DatasetProcessor;

impl DatasetProcessor {
    pub fn process(table: &SheetTable) -> Normalized {
        info!(
            "Processing table with {} columns and {} rows",
            table.header.len(),
            table.rows.len()
        );

        let mut normalized = SchemaNormalizer::new().normalize(table);
        CalculatedFieldEngine::new().recompute_dataset(&mut normalized.dataset);

        if !normalized.warnings.is_empty() {
            debug!(
                "Normalization produced {} warnings",
                normalized.warnings.len()
            );
        }

        normalized
    }

    /// Processes raw rows whose first row is the header.
    pub fn process_rows(rows: Vec<Vec<String>>) -> Normalized {
        Self::process(&SheetTable::from_rows(rows))
    }
}

pub fn process_table(table: &SheetTable) -> Normalized {
    DatasetProcessor::process(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_end_to_end_processing() {
        let normalized = DatasetProcessor::process_rows(vec![
            row(&[
                "Date",
                "Training Type",
                "Duration",
                "Total Distance",
                "Left Touches",
                "Right Touches",
                "Ball Touches",
            ]),
            row(&["2024-03-01", "Ball Work", "60", "2.0", "30", "20", "999"]),
            row(&["03/02/24", "Ball Work", "45", "1.0", "0", "0", ""]),
        ]);

        assert!(normalized.warnings.is_empty());
        let sessions = &normalized.dataset.sessions;
        assert_eq!(sessions.len(), 2);

        assert_eq!(sessions[0].ball_touches, Some(50));
        assert_eq!(sessions[0].left_foot_pct, Some(60.0));
        assert_eq!(sessions[0].work_rate, Some(58.67));

        assert_eq!(sessions[1].date, chrono::NaiveDate::from_ymd_opt(2024, 3, 2));
        assert_eq!(sessions[1].ball_touches, Some(0));
        assert_eq!(sessions[1].left_foot_pct, None);
        assert_eq!(sessions[1].work_rate, Some(39.11));
    }

    #[test]
    fn test_unknown_columns_are_reported_not_fatal() {
        let normalized = process_table(&SheetTable::new(
            row(&["date", "heart_rate"]),
            vec![row(&["2024-03-01", "150"])],
        ));

        assert_eq!(normalized.dataset.len(), 1);
        assert!(matches!(
            normalized.warnings.as_slice(),
            [NormalizationWarning::UnmappedColumn { .. }]
        ));
    }

    #[test]
    fn test_empty_table() {
        let normalized = DatasetProcessor::process_rows(Vec::new());
        assert!(normalized.dataset.is_empty());
        assert!(normalized.warnings.is_empty());
    }
}
