use chrono::NaiveDate;
use dotenv::dotenv;
use std::error::Error;
use training_tracker::*;

const SCREENSHOT_TEXT: &str = "Training Type: Ball Work
Intensity: Hard
Duration: 62 min
Total Distance: 2.3 mi
Sprint Distance: 140 yd
Top Speed: 17.8 mph
Sprints: 9
Accl/Decl: 41
AGILITY
Left Turns: 14
Right Turns: 11
Intense Turns: 7
31 (62%) --- Touches --- 19 (38%)
Kicking Power
Left 38.5 mph
Right 41 mph";

fn main() -> std::result::Result<(), Box<dyn Error>> {
    dotenv().ok();

    println!("Training Session Ingestion Demo");
    println!("═══════════════════════════════════════\n");

    let config = TrackerConfig::from_env()?;
    let mut store = open_store(&config)?;

    let view = store.load_for_view();
    match &view.status {
        LoadStatus::Unreachable(reason) => println!("⚠️  Store unreachable: {}", reason),
        LoadStatus::Empty => println!("Store is empty, starting a new history"),
        LoadStatus::Loaded => println!("Loaded {} sessions", view.dataset.len()),
    }

    let extraction = extract_fields(SCREENSHOT_TEXT);
    println!("\nExtracted {} fields from the screenshot:", extraction.len());
    for (field, value) in extraction.iter() {
        println!("  {:<24} {}", field.name(), value.to_cell());
    }

    let mut draft = SessionDraft::new()
        .with(
            Field::Date,
            Value::Date(NaiveDate::from_ymd_opt(2024, 5, 4).ok_or("invalid date")?),
        )
        .with(Field::SessionName, Value::Text("Saturday touches".to_string()))
        .with(Field::Surface, Value::Text("Turf".to_string()))
        .with(Field::TopSpeed, Value::Decimal(18.1));
    let filled = draft.merge_extraction(&extraction);
    println!("\nFilled {} fields the form left blank", filled);

    let session = draft.build();
    store.append(&session)?;
    println!("✓ Saved session");

    let dataset = store.load()?;
    let records = compute_personal_records(&dataset);
    println!("\nPersonal records:");
    for record in records.records.values() {
        let side = record
            .side
            .map(|s| format!(" ({})", s.short_label()))
            .unwrap_or_default();
        let date = record
            .date
            .map(format_sheet_date)
            .unwrap_or_else(|| "undated".to_string());
        println!("  {:<20} {:>8.2}{} on {}", record.field.name(), record.value, side, date);
    }

    if let Some(summary) = InsightsAggregator::new().summarize_latest(&dataset)? {
        println!(
            "\nLast 30 days: {} sessions, {:.0} minutes",
            summary.trailing.sessions, summary.trailing.total_minutes
        );
        if let Some(work_rate) = summary.trailing.metric(Field::WorkRate) {
            println!(
                "  Work rate: mean {:.2} yd/min, best {:.2} yd/min",
                work_rate.mean, work_rate.best
            );
        }
    }

    Ok(())
}
