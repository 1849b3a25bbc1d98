use crate::engine::YARDS_PER_MILE;
use crate::error::Result;
use crate::schema::{Field, FieldKind, Intensity, TrainingType, Value};
use crate::utils::{decimal_to_count, parse_decimal, round_to};
use log::{debug, warn};
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

const MILES_PER_KM: f64 = 0.621371;
const YARDS_PER_METER: f64 = 1.09361;
const KM_PER_MILE: f64 = 1.609344;

/// Decimal places kept after a unit conversion.
const CONVERTED_DECIMALS: i32 = 2;

/// Lines either side of a "kicking power" heading searched for per-foot speeds.
const KICKING_POWER_WINDOW: usize = 3;

/// Characters after the "agility" heading scanned by the back-turn fallback.
const AGILITY_SECTION_CHARS: usize = 500;

// Pattern fragments. `{n}` is the numeric token, the others are optional unit tokens.
const NUM: &str = r"(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";
const DIST: &str = r"(?P<unit>miles?|mi|yards?|yds?|kilomet(?:er|re)s?|km|met(?:er|re)s?|m)\b";
const SPEED: &str = r"(?P<unit>mph|mi/h|km\s*/\s*h|kmh|kph)";
const DUR: &str = r"(?P<unit>min(?:ute)?s?|hours?|hrs?|h)\b";
const PCT_GROUP: &str = r"\(\s*\d+(?:\.\d+)?\s*%\s*\)";

/// Canonical unit a rule's value is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Miles,
    Yards,
    Mph,
    Minutes,
    Plain,
    Label,
}

impl Unit {
    /// Converts a raw reading with its (optional) unit token into the canonical unit.
    fn convert(self, value: f64, token: Option<&str>) -> Option<f64> {
        let token: String = token
            .unwrap_or("")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        let factor = match self {
            Unit::Miles => match token.as_str() {
                "" | "mi" | "mile" | "miles" => 1.0,
                "yd" | "yds" | "yard" | "yards" => 1.0 / YARDS_PER_MILE,
                "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => MILES_PER_KM,
                "m" | "meter" | "meters" | "metre" | "metres" => YARDS_PER_METER / YARDS_PER_MILE,
                _ => return None,
            },
            Unit::Yards => match token.as_str() {
                "" | "yd" | "yds" | "yard" | "yards" => 1.0,
                "mi" | "mile" | "miles" => YARDS_PER_MILE,
                "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => {
                    MILES_PER_KM * YARDS_PER_MILE
                }
                "m" | "meter" | "meters" | "metre" | "metres" => YARDS_PER_METER,
                _ => return None,
            },
            Unit::Mph => match token.as_str() {
                "" | "mph" | "mi/h" => 1.0,
                "km/h" | "kmh" | "kph" => 1.0 / KM_PER_MILE,
                _ => return None,
            },
            Unit::Minutes => match token.as_str() {
                "" | "min" | "mins" | "minute" | "minutes" => 1.0,
                "h" | "hr" | "hrs" | "hour" | "hours" => 60.0,
                _ => return None,
            },
            Unit::Plain => 1.0,
            Unit::Label => return None,
        };

        if (factor - 1.0).abs() < f64::EPSILON {
            Some(value)
        } else {
            Some(round_to(value * factor, CONVERTED_DECIMALS))
        }
    }
}

#[derive(Debug)]
enum Matcher {
    /// A compiled pattern; `None` when the pattern failed to compile and is skipped.
    Pattern(Option<Regex>),
    /// The `nth` speed in mph found within a few lines of `label`.
    SpeedNearLabel { label: &'static str, nth: usize },
}

#[derive(Debug)]
struct ExtractionRule {
    field: Field,
    unit: Unit,
    matchers: Vec<Matcher>,
}

impl ExtractionRule {
    fn new(field: Field, unit: Unit, templates: &[&str]) -> Self {
        Self {
            field,
            unit,
            matchers: templates.iter().map(|t| pattern(t)).collect(),
        }
    }

    fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    /// First matcher producing a usable value wins.
    fn apply(&self, text: &str) -> Option<Value> {
        for (idx, matcher) in self.matchers.iter().enumerate() {
            let value = match matcher {
                Matcher::Pattern(Some(re)) => re.captures(text).and_then(|caps| self.value_from(&caps)),
                Matcher::Pattern(None) => None,
                Matcher::SpeedNearLabel { label, nth } => speed_near_label(text, label, *nth)
                    .and_then(|v| self.typed(v)),
            };
            if let Some(value) = value {
                debug!("Extracted {} via matcher {}", self.field, idx);
                return Some(value);
            }
        }
        None
    }

    fn value_from(&self, caps: &Captures<'_>) -> Option<Value> {
        if self.unit == Unit::Label {
            let label = caps.name("label")?.as_str().trim();
            if label.is_empty() {
                return None;
            }
            let label = match self.field {
                Field::TrainingType => TrainingType::from(label.to_string()).label().to_string(),
                Field::Intensity => Intensity::from(label.to_string()).label().to_string(),
                _ => label.to_string(),
            };
            return Some(Value::Text(label));
        }

        let raw = parse_decimal(caps.name("num")?.as_str())?;
        let converted = self
            .unit
            .convert(raw, caps.name("unit").map(|m| m.as_str()))?;
        self.typed(converted)
    }

    fn typed(&self, value: f64) -> Option<Value> {
        match self.field.kind() {
            FieldKind::Count => decimal_to_count(value).map(Value::Count),
            FieldKind::Decimal => Some(Value::Decimal(value)),
            _ => None,
        }
    }
}

fn pattern(template: &str) -> Matcher {
    let source = template
        .replace("{n}", NUM)
        .replace("{dist}", DIST)
        .replace("{speed}", SPEED)
        .replace("{dur}", DUR)
        .replace("{pct}", PCT_GROUP);
    Matcher::Pattern(
        RegexBuilder::new(&source)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .ok(),
    )
}

/// Label-then-value rules, highest priority first within each field.
static EXTRACTION_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new(
            Field::TrainingType,
            Unit::Label,
            &[r"^[ \t]*(?:(?:training|session)\s+)?type\s*[:\-]\s*(?P<label>[^\n]+?)[ \t]*$"],
        ),
        ExtractionRule::new(
            Field::Intensity,
            Unit::Label,
            &[r"^[ \t]*intensity\s*[:\-]\s*(?P<label>[^\n]+?)[ \t]*$"],
        ),
        ExtractionRule::new(
            Field::Position,
            Unit::Label,
            &[r"^[ \t]*position\s*[:\-]\s*(?P<label>[^\n]+?)[ \t]*$"],
        ),
        ExtractionRule::new(
            Field::Duration,
            Unit::Minutes,
            &[
                r"duration\s*[:\-]?\s*{n}\s*{dur}",
                r"duration\s*[:\-]?\s*{n}\b",
                r"\b{n}\s*(?P<unit>min(?:ute)?s?)\b",
            ],
        ),
        ExtractionRule::new(
            Field::TotalDistance,
            Unit::Miles,
            &[
                r"total\s+distance\s*[:\-]?\s*{n}\s*{dist}",
                r"^[ \t]*distance\s*[:\-]?\s*{n}\s*{dist}",
                r"total\s+distance\s*[:\-]?\s*{n}\b",
            ],
        ),
        ExtractionRule::new(
            Field::SprintDistance,
            Unit::Yards,
            &[
                r"sprint\s+distance\s*[:\-]?\s*{n}\s*{dist}",
                r"sprint\s+distance\s*[:\-]?\s*{n}\b",
            ],
        ),
        ExtractionRule::new(
            Field::TopSpeed,
            Unit::Mph,
            &[
                r"(?:top|max(?:imum)?)\s+speed\s*[:\-]?\s*{n}\s*{speed}",
                r"(?:top|max(?:imum)?)\s+speed\s*[:\-]?\s*{n}\b",
            ],
        ),
        ExtractionRule::new(
            Field::NumSprints,
            Unit::Plain,
            &[
                r"\b(?:num(?:ber)?\s+of\s+)?sprints?(?:\s+count)?\s*[:#\-]?\s*{n}\b",
                r"^[ \t]*{n}[ \t]+sprints\b",
            ],
        ),
        ExtractionRule::new(
            Field::Accelerations,
            Unit::Plain,
            &[
                r"\b(?:accl?|accel(?:eration)?s?)\s*(?:/\s*(?:decl?|decel(?:eration)?s?))?\s*[:#\-]?\s*{n}\b",
            ],
        ),
        ExtractionRule::new(
            Field::LeftTurns,
            Unit::Plain,
            &[
                r"left\s+turns?\s*[:#\-]?\s*{n}\b",
                r"\b{n}\s*[^\w]*left\s+turns?",
                r"left\s+turns?\W*{n}\b",
            ],
        ),
        ExtractionRule::new(
            Field::RightTurns,
            Unit::Plain,
            &[
                r"right\s+turns?\s*[:#\-]?\s*{n}\b",
                r"\b{n}\s*[^\w]*right\s+turns?",
                r"right\s+turns?\W*{n}\b",
            ],
        ),
        ExtractionRule::new(
            Field::BackTurns,
            Unit::Plain,
            &[
                r"back\s+turns?\s*[:#\-]?\s*{n}\b",
                r"\b{n}\s*[^\w]*back\s+turns?",
                r"back\s+turns?\W*{n}\b",
            ],
        ),
        ExtractionRule::new(
            Field::IntenseTurns,
            Unit::Plain,
            &[
                r"intense\s+turns?\s*[:#\-]?\s*{n}\b",
                r"\b{n}\s*[^\w]*intense\s+turns?",
            ],
        ),
        ExtractionRule::new(
            Field::AvgTurnEntry,
            Unit::Mph,
            &[r"(?:(?:average|avg\.?)\s+)?turn\s+entry(?:\s+speed)?\s*[:\-]?\s*{n}(?:\s*{speed})?"],
        ),
        ExtractionRule::new(
            Field::AvgTurnExit,
            Unit::Mph,
            &[r"(?:(?:average|avg\.?)\s+)?turn\s+exit(?:\s+speed)?\s*[:\-]?\s*{n}(?:\s*{speed})?"],
        ),
        ExtractionRule::new(
            Field::BallTouches,
            Unit::Plain,
            &[
                r"ball\s+touches\s*[:#\-]?\s*{n}\b",
                r"^[ \t]*(?:total\s+)?touches\s*[:#\-]?\s*{n}\b",
            ],
        ),
        ExtractionRule::new(
            Field::LeftTouches,
            Unit::Plain,
            &[
                r"left\s+(?:foot\s+)?touches\s*[:#\-]?\s*{n}\b",
                r"left\s+foot\s*[:\-]?\s*{n}\s*{pct}",
                r"\b{n}\s*{pct}[^\d]*touch[^\d]*\d+\s*{pct}",
            ],
        ),
        ExtractionRule::new(
            Field::RightTouches,
            Unit::Plain,
            &[
                r"right\s+(?:foot\s+)?touches\s*[:#\-]?\s*{n}\b",
                r"right\s+foot\s*[:\-]?\s*{n}\s*{pct}",
                r"\d+\s*{pct}[^\d]*touch[^\d]*\b{n}\s*{pct}",
            ],
        ),
        ExtractionRule::new(
            Field::LeftFootPct,
            Unit::Plain,
            &[
                r"left\s+(?:foot\s+)?(?:%|pct|percent(?:age)?)\s*[:\-]?\s*{n}",
                r"left\s+foot\s*[:\-]?\s*\d+\s*\(\s*{n}\s*%\s*\)",
                r"\d+\s*\(\s*{n}\s*%\s*\)[^\d]*touch[^\d]*\d+\s*{pct}",
            ],
        ),
        ExtractionRule::new(
            Field::RightFootPct,
            Unit::Plain,
            &[
                r"right\s+(?:foot\s+)?(?:%|pct|percent(?:age)?)\s*[:\-]?\s*{n}",
                r"right\s+foot\s*[:\-]?\s*\d+\s*\(\s*{n}\s*%\s*\)",
                r"\d+\s*{pct}[^\d]*touch[^\d]*\d+\s*\(\s*{n}\s*%\s*\)",
            ],
        ),
        ExtractionRule::new(
            Field::LeftReleases,
            Unit::Plain,
            &[r"left\s+(?:foot\s+)?releases?\s*[:#\-]?\s*{n}\b"],
        ),
        ExtractionRule::new(
            Field::RightReleases,
            Unit::Plain,
            &[r"right\s+(?:foot\s+)?releases?\s*[:#\-]?\s*{n}\b"],
        ),
        ExtractionRule::new(
            Field::KickingPower,
            Unit::Mph,
            &[r"(?:max(?:imum)?\s+)?kicking\s+power\s*[:\-]?\s*{n}\s*{speed}"],
        ),
        ExtractionRule::new(
            Field::LeftKickingPower,
            Unit::Mph,
            &[r"left\s+(?:foot\s+)?(?:kicking\s+)?power\s*[:\-]?\s*{n}(?:\s*{speed})?"],
        )
        .with_matcher(Matcher::SpeedNearLabel {
            label: "kicking power",
            nth: 0,
        }),
        ExtractionRule::new(
            Field::RightKickingPower,
            Unit::Mph,
            &[r"right\s+(?:foot\s+)?(?:kicking\s+)?power\s*[:\-]?\s*{n}(?:\s*{speed})?"],
        )
        .with_matcher(Matcher::SpeedNearLabel {
            label: "kicking power",
            nth: 1,
        }),
        ExtractionRule::new(Field::Goals, Unit::Plain, &[r"\bgoals?\s*[:#\-]?\s*{n}\b"]),
        ExtractionRule::new(Field::Assists, Unit::Plain, &[r"\bassists?\s*[:#\-]?\s*{n}\b"]),
        ExtractionRule::new(
            Field::BallPossessions,
            Unit::Plain,
            &[r"\b(?:ball\s+)?possessions?\s*[:#\-]?\s*{n}\b"],
        ),
    ]
});

/// A digit run possibly containing letters OCR commonly confuses with digits.
static DIGIT_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b[0-9OoIl.,]*[0-9][0-9OoIl.,]*\b").ok());

static MPH_READING: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*mph").ok());

static TWO_OR_THREE_DIGITS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b\d{2,3}\b").ok());

static AGILITY_HEADING: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?i)agility").ok());

/// Field values read from one or more screenshots.
///
/// Only recognised fields are present; nothing is ever defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    values: BTreeMap<Field, Value>,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    pub fn insert(&mut self, field: Field, value: Value) {
        self.values.insert(field, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &Value)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }

    /// Merges another screenshot's extraction; its values replace ours for shared fields.
    pub fn extend(&mut self, later: Extraction) {
        self.values.extend(later.values);
    }

    fn metric(&self, field: Field) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }
}

/// Source of recognised text for a screenshot.
pub trait TextRecognizer {
    fn recognize(&self, image: &[u8]) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Reads every recognisable field out of raw OCR text. Never fails.
    pub fn extract(&self, text: &str) -> Extraction {
        let mut extraction = Extraction::new();
        if text.trim().is_empty() {
            return extraction;
        }

        let text = repair_ocr_digits(&text.replace("\r\n", "\n").replace('\r', "\n"));

        for rule in EXTRACTION_RULES.iter() {
            if let Some(value) = rule.apply(&text) {
                extraction.insert(rule.field, value);
            }
        }

        if let Some(back_turns) = back_turns_by_elimination(&text, &extraction) {
            debug!("Back turns {} taken from agility section", back_turns);
            extraction.insert(Field::BackTurns, Value::Count(back_turns));
        }

        extraction
    }

    /// Recognises and extracts one screenshot. A recogniser failure yields an empty extraction.
    pub fn extract_from_image(&self, recognizer: &dyn TextRecognizer, image: &[u8]) -> Extraction {
        match recognizer.recognize(image) {
            Ok(text) => self.extract(&text),
            Err(e) => {
                warn!("Text recognition failed, continuing without extraction: {}", e);
                Extraction::new()
            }
        }
    }

    /// Extracts several screenshots of the same session, later images winning on conflicts.
    pub fn extract_from_images<'a>(
        &self,
        recognizer: &dyn TextRecognizer,
        images: impl IntoIterator<Item = &'a [u8]>,
    ) -> Extraction {
        let mut merged = Extraction::new();
        for image in images {
            merged.extend(self.extract_from_image(recognizer, image));
        }
        merged
    }
}

pub fn extract_fields(text: &str) -> Extraction {
    TextExtractor::new().extract(text)
}

/// Fixes O/o → 0 and I/l → 1, but only inside tokens that already contain a digit.
fn repair_ocr_digits(text: &str) -> String {
    let Some(re) = DIGIT_TOKEN.as_ref() else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures<'_>| {
        caps[0]
            .chars()
            .map(|c| match c {
                'O' | 'o' => '0',
                'I' | 'l' => '1',
                other => other,
            })
            .collect::<String>()
    })
    .into_owned()
}

fn speed_near_label(text: &str, label: &str, nth: usize) -> Option<f64> {
    let re = MPH_READING.as_ref()?;
    let lines: Vec<&str> = text.lines().collect();

    for (idx, line) in lines.iter().enumerate() {
        if !line.to_lowercase().contains(label) {
            continue;
        }
        let start = idx.saturating_sub(KICKING_POWER_WINDOW);
        let end = (idx + KICKING_POWER_WINDOW + 1).min(lines.len());
        let window = lines[start..end].join("\n");
        let speeds: Vec<f64> = re
            .captures_iter(&window)
            .filter_map(|caps| caps.get(1).and_then(|m| parse_decimal(m.as_str())))
            .collect();
        if speeds.len() >= 2 {
            return speeds.get(nth).copied();
        }
    }
    None
}

/// When left and right turns were read but back turns were not, the agility panel usually
/// still shows the back-turn count as a bare number.
fn back_turns_by_elimination(text: &str, extraction: &Extraction) -> Option<u32> {
    if extraction.contains(Field::BackTurns) {
        return None;
    }
    let left = extraction.metric(Field::LeftTurns)?;
    let right = extraction.metric(Field::RightTurns)?;

    let heading = AGILITY_HEADING.as_ref()?.find(text)?;
    let section: String = text[heading.end()..]
        .chars()
        .take(AGILITY_SECTION_CHARS)
        .collect();

    let numbers: Vec<u32> = TWO_OR_THREE_DIGITS
        .as_ref()?
        .find_iter(&section)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    if numbers.len() < 3 {
        return None;
    }

    numbers.into_iter().find(|n| {
        let v = f64::from(*n);
        v != left && v != right && (20..=150).contains(n)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal(extraction: &Extraction, field: Field) -> Option<f64> {
        extraction.get(field).and_then(Value::as_f64)
    }

    #[test]
    fn test_empty_text_extracts_nothing() {
        assert!(extract_fields("").is_empty());
        assert!(extract_fields("   \n\n").is_empty());
        assert!(extract_fields("nothing useful here").is_empty());
    }

    #[test]
    fn test_top_speed() {
        let extraction = extract_fields("Top Speed: 18.2 mph");
        assert_eq!(decimal(&extraction, Field::TopSpeed), Some(18.2));
        assert_eq!(extraction.len(), 1);
    }

    #[test]
    fn test_sprint_distance_in_miles_converts_to_yards() {
        let extraction = extract_fields("Sprint Distance: 0.5 mi");
        assert_eq!(decimal(&extraction, Field::SprintDistance), Some(880.0));
        assert!(!extraction.contains(Field::TotalDistance));
        assert!(!extraction.contains(Field::NumSprints));
    }

    #[test]
    fn test_session_panel() {
        let text = "Training Type: Ball Work\n\
                    Intensity: somewhat hard\n\
                    Duration: 1.5 hours\n\
                    Total Distance: 2,640 yd\n\
                    Top Speed: 25 km/h\n\
                    Sprints: 12\n\
                    Accl/Decl: 34";
        let extraction = extract_fields(text);

        assert_eq!(
            extraction.get(Field::TrainingType),
            Some(&Value::Text("Ball Work".to_string()))
        );
        assert_eq!(
            extraction.get(Field::Intensity),
            Some(&Value::Text("Somewhat Hard".to_string()))
        );
        assert_eq!(decimal(&extraction, Field::Duration), Some(90.0));
        assert_eq!(decimal(&extraction, Field::TotalDistance), Some(1.5));
        assert_eq!(decimal(&extraction, Field::TopSpeed), Some(15.53));
        assert_eq!(extraction.get(Field::NumSprints), Some(&Value::Count(12)));
        assert_eq!(extraction.get(Field::Accelerations), Some(&Value::Count(34)));
    }

    #[test]
    fn test_duration_without_label() {
        let extraction = extract_fields("Session complete 45min");
        assert_eq!(decimal(&extraction, Field::Duration), Some(45.0));
    }

    #[test]
    fn test_split_touch_layout() {
        let extraction = extract_fields("120 (40%) --- Touches --- 180 (60%)");
        assert_eq!(extraction.get(Field::LeftTouches), Some(&Value::Count(120)));
        assert_eq!(extraction.get(Field::RightTouches), Some(&Value::Count(180)));
        assert_eq!(decimal(&extraction, Field::LeftFootPct), Some(40.0));
        assert_eq!(decimal(&extraction, Field::RightFootPct), Some(60.0));
        assert!(!extraction.contains(Field::BallTouches));
    }

    #[test]
    fn test_kicking_power_sides_from_nearby_lines() {
        let text = "Kicking Power\nLeft 38.5 mph\nRight 41 mph";
        let extraction = extract_fields(text);
        assert_eq!(decimal(&extraction, Field::LeftKickingPower), Some(38.5));
        assert_eq!(decimal(&extraction, Field::RightKickingPower), Some(41.0));
        assert!(!extraction.contains(Field::KickingPower));
    }

    #[test]
    fn test_turn_labels() {
        let text = "Left Turns: 14\nRight Turns: 12\nBack Turns: 9\nIntense Turns: 6";
        let extraction = extract_fields(text);
        assert_eq!(extraction.get(Field::LeftTurns), Some(&Value::Count(14)));
        assert_eq!(extraction.get(Field::RightTurns), Some(&Value::Count(12)));
        assert_eq!(extraction.get(Field::BackTurns), Some(&Value::Count(9)));
        assert_eq!(extraction.get(Field::IntenseTurns), Some(&Value::Count(6)));
    }

    #[test]
    fn test_back_turns_by_elimination() {
        let text = "AGILITY\nLeft Turns: 14\nRight Turns: 12\n45";
        let extraction = extract_fields(text);
        assert_eq!(extraction.get(Field::BackTurns), Some(&Value::Count(45)));
    }

    #[test]
    fn test_ocr_letter_repair_needs_adjacent_digit() {
        let extraction = extract_fields("Left Turns: 1O\nGoals: O");
        assert_eq!(extraction.get(Field::LeftTurns), Some(&Value::Count(10)));
        assert!(!extraction.contains(Field::Goals));
    }

    #[test]
    fn test_fractional_count_is_not_extracted() {
        let extraction = extract_fields("Sprints: 4.5");
        assert!(!extraction.contains(Field::NumSprints));
    }

    #[test]
    fn test_later_extraction_wins() {
        let mut first = extract_fields("Top Speed: 17.0 mph\nSprints: 8");
        first.extend(extract_fields("Top Speed: 18.2 mph"));
        assert_eq!(decimal(&first, Field::TopSpeed), Some(18.2));
        assert_eq!(first.get(Field::NumSprints), Some(&Value::Count(8)));
    }

    struct FailingRecognizer;

    impl TextRecognizer for FailingRecognizer {
        fn recognize(&self, _image: &[u8]) -> Result<String> {
            Err(crate::error::TrackerError::Recognition(
                "engine not installed".to_string(),
            ))
        }
    }

    #[test]
    fn test_recognizer_failure_yields_empty_extraction() {
        let extraction = TextExtractor::new().extract_from_image(&FailingRecognizer, b"png");
        assert!(extraction.is_empty());
    }

    /// Treats the image bytes as the recognised text; `b"corrupt"` fails.
    struct EchoRecognizer;

    impl TextRecognizer for EchoRecognizer {
        fn recognize(&self, image: &[u8]) -> Result<String> {
            if image == b"corrupt" {
                return Err(crate::error::TrackerError::Recognition(
                    "unreadable image".to_string(),
                ));
            }
            Ok(String::from_utf8_lossy(image).into_owned())
        }
    }

    #[test]
    fn test_multiple_screenshots_merge() {
        let speed_panel: &[u8] = b"Top Speed: 17.1 mph\nSprints: 9";
        let touch_panel: &[u8] = b"Left Touches: 30\nRight Touches: 20\nTop Speed: 18.2 mph";
        let corrupt: &[u8] = b"corrupt";

        let extraction = TextExtractor::new()
            .extract_from_images(&EchoRecognizer, [speed_panel, corrupt, touch_panel]);

        assert_eq!(extraction.get(Field::NumSprints), Some(&Value::Count(9)));
        assert_eq!(extraction.get(Field::LeftTouches), Some(&Value::Count(30)));
        assert_eq!(extraction.get(Field::RightTouches), Some(&Value::Count(20)));
        assert_eq!(decimal(&extraction, Field::TopSpeed), Some(18.2));
    }
}
