use chrono::NaiveDate;
use std::time::Duration;
use training_tracker::*;

fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn legacy_sheet() -> Vec<Vec<String>> {
    grid(&[
        &[
            "Date",
            "Session Name",
            "Training Type",
            "Duration",
            "Total Distance",
            "Top Speed",
            "Left Touches",
            "Right Touches",
            "Left Foot %",
            "Work Rate",
        ],
        &["2024-03-01", "A", "Ball Work", "60", "2.0", "17.4", "30", "20", "12", "1"],
        &["2024-03-02", "B", "Ball Work", "45", "1.0", "16.9", "0", "0", "", ""],
    ])
}

#[test]
fn test_two_session_pipeline() {
    let mut store = RecordStore::new(MemoryStore::with_rows(legacy_sheet()), DEFAULT_TTL);
    let dataset = store.load().unwrap();
    assert_eq!(dataset.len(), 2);

    let a = &dataset.sessions[0];
    assert_eq!(a.ball_touches, Some(50));
    assert_eq!(a.left_foot_pct, Some(60.0));
    assert_eq!(a.right_foot_pct, Some(40.0));
    assert_eq!(a.work_rate, Some(58.67));

    let b = &dataset.sessions[1];
    assert_eq!(b.ball_touches, Some(0));
    assert_eq!(b.left_foot_pct, None);
    assert_eq!(b.work_rate, Some(39.11));
}

#[test]
fn test_engine_is_idempotent_on_loaded_data() {
    let mut dataset = DatasetProcessor::process_rows(legacy_sheet()).dataset;
    let once = dataset.clone();
    CalculatedFieldEngine::new().recompute_dataset(&mut dataset);
    assert_eq!(dataset, once);
}

#[test]
fn test_normalizing_a_normalized_table_changes_nothing() {
    let first = DatasetProcessor::process_rows(legacy_sheet()).dataset;
    let canonical = SchemaNormalizer::to_table(&first);
    assert_eq!(canonical.header, canonical_header());

    let second = DatasetProcessor::process(&canonical);
    assert!(second.warnings.is_empty());
    assert_eq!(second.dataset, first);
}

#[test]
fn test_top_speed_record_tie_break() {
    let session = |d: NaiveDate| TrainingSession {
        date: Some(d),
        top_speed: Some(18.2),
        ..Default::default()
    };
    let dataset = HistoricalDataset::new(vec![
        session(date(2024, 2, 10)),
        session(date(2024, 1, 5)),
    ]);

    let record = compute_personal_records(&dataset);
    let top_speed = record.get(Field::TopSpeed).unwrap();
    assert_eq!(top_speed.value, 18.2);
    assert_eq!(top_speed.date, Some(date(2024, 1, 5)));
}

#[test]
fn test_append_invalidates_cache() {
    let memory = MemoryStore::with_rows(legacy_sheet());
    let mut store = RecordStore::new(memory.clone(), Duration::from_secs(3600));

    assert_eq!(store.load().unwrap().len(), 2);
    assert_eq!(store.load().unwrap().len(), 2);
    assert_eq!(memory.read_count(), 1, "second load is served from cache");

    let session = SessionDraft::new()
        .with(Field::Date, Value::Date(date(2024, 3, 3)))
        .with(Field::SessionName, Value::Text("C".to_string()))
        .with(Field::TopSpeed, Value::Decimal(18.0))
        .build();
    store.append(&session).unwrap();

    let dataset = store.load().unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.latest_date(), Some(date(2024, 3, 3)));
    assert_eq!(dataset.sessions[2].top_speed, Some(18.0));
}

#[test]
fn test_unreachable_store_is_an_explicit_empty_view() {
    let memory = MemoryStore::with_rows(legacy_sheet());
    memory.set_reachable(false);
    let mut store = RecordStore::new(memory, DEFAULT_TTL);

    let err = store.load().unwrap_err();
    assert!(err.is_connectivity());

    let view = store.load_for_view();
    assert!(view.dataset.is_empty());
    assert!(matches!(view.status, LoadStatus::Unreachable(_)));
}

#[test]
fn test_read_only_store_rejects_writes() {
    let mut store = RecordStore::new(MemoryStore::new(), DEFAULT_TTL).read_only(true);
    let result = store.append(&TrainingSession::default());
    assert!(matches!(result, Err(TrackerError::ReadOnly)));
}

#[test]
fn test_extraction_robustness() {
    assert!(extract_fields("").is_empty());

    let extraction = extract_fields("Top Speed: 18.2 mph\nSprint Distance: 0.5 mi");
    assert_eq!(
        extraction.get(Field::TopSpeed).and_then(Value::as_f64),
        Some(18.2)
    );
    assert_eq!(
        extraction.get(Field::SprintDistance).and_then(Value::as_f64),
        Some(880.0)
    );
}

#[test]
fn test_screenshot_to_csv_store_to_analytics() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sessions.csv");
    let config = TrackerConfig::from_json(&format!(
        r#"{{"store": {{"kind": "csv", "path": {}}}}}"#,
        serde_json::to_string(&path)?
    ))?;
    let mut store = open_store(&config)?;
    assert!(store.load()?.is_empty());

    let screenshots = [
        "Duration: 60 min\nTotal Distance: 2.0 mi\nTop Speed: 17.9 mph\nLeft Touches: 30\nRight Touches: 20",
        "Duration: 50 min\nTotal Distance: 1.8 mi\nTop Speed: 18.4 mph\nLeft Touches: 44\nRight Touches: 40\nGoals: 3",
    ];
    for (day, text) in [1u32, 20].into_iter().zip(screenshots) {
        let mut draft = SessionDraft::new()
            .with(Field::Date, Value::Date(date(2024, 4, day)))
            .with(Field::TrainingType, Value::Text("Ball Work".to_string()));
        draft.merge_extraction(&extract_fields(text));
        store.append(&draft.build())?;
    }

    let written = std::fs::read_to_string(&path)?;
    assert!(written.starts_with("date,session_name,coach"));

    let dataset = store.load()?;
    assert_eq!(dataset.len(), 2);
    let second = &dataset.sessions[1];
    assert_eq!(second.goals, None, "match-only field cleared for ball work");
    assert_eq!(second.with_ball, Some(true));
    assert_eq!(second.ball_touches, Some(84));
    assert_eq!(second.work_rate, Some(63.36));

    let records = compute_personal_records(&dataset);
    assert_eq!(
        records.get(Field::TopSpeed).map(|r| r.date),
        Some(Some(date(2024, 4, 20)))
    );
    let balance = records.touch_balance.unwrap();
    assert_eq!(balance.date, Some(date(2024, 4, 20)));
    assert!((balance.ratio - 1.1).abs() < 1e-9);
    assert_eq!(balance.sessions, 2);

    let insights = InsightsAggregator::new()
        .summarize_latest(&dataset)?
        .expect("dataset has dated sessions");
    assert_eq!(insights.reference_date, date(2024, 4, 20));
    assert_eq!(insights.trailing.sessions, 2);
    assert_eq!(insights.trailing.total_minutes, 110.0);
    assert_eq!(
        insights.trailing.sessions_by_training_type.get("Ball Work"),
        Some(&2)
    );
    assert_eq!(
        insights.all_time.metric(Field::TopSpeed).map(|m| m.best),
        Some(18.4)
    );

    Ok(())
}

#[test]
fn test_schema_generation() {
    let schema_json = TrainingSession::schema_as_json().unwrap();

    assert!(schema_json.contains("top_speed"));
    assert!(schema_json.contains("left_kicking_power"));
    assert!(schema_json.contains("training_type"));
    assert!(schema_json.contains("work_rate"));
}
