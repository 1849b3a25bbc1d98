use crate::engine::CalculatedFieldEngine;
use crate::extractor::Extraction;
use crate::schema::{Field, TrainingSession, Value};
use log::{debug, warn};
use std::collections::BTreeSet;

/// A session being assembled from manual entry and screenshot extraction.
///
/// Values the user typed always win over extracted ones, and calculated fields can only
/// ever come from the engine.
#[derive(Debug, Clone, Default)]
pub struct SessionDraft {
    session: TrainingSession,
    entered: BTreeSet<Field>,
}

impl SessionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a user-entered value. Returns `false` if the field is calculated or the value
    /// does not fit the field.
    pub fn set(&mut self, field: Field, value: Value) -> bool {
        if field.is_calculated() {
            warn!("Ignoring manual value for calculated field {}", field);
            return false;
        }
        if !self.session.set(field, Some(value)) {
            warn!("Value for {} has the wrong type, ignoring it", field);
            return false;
        }
        self.entered.insert(field);
        true
    }

    pub fn with(mut self, field: Field, value: Value) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: Field) -> Option<Value> {
        self.session.get(field)
    }

    pub fn is_entered(&self, field: Field) -> bool {
        self.entered.contains(&field)
    }

    /// Fills fields the user has not entered from a screenshot extraction.
    ///
    /// Extracted calculated fields are dropped. Returns the number of fields filled.
    pub fn merge_extraction(&mut self, extraction: &Extraction) -> usize {
        let mut filled = 0;
        for (field, value) in extraction.iter() {
            if field.is_calculated() || self.entered.contains(&field) {
                continue;
            }
            if self.session.set(field, Some(value.clone())) {
                filled += 1;
            }
        }
        debug!("Filled {} fields from extraction", filled);
        filled
    }

    /// Produces the canonical record: fields irrelevant to the training type are cleared,
    /// `with_ball` is derived when not given, and calculated fields are computed.
    pub fn build(self) -> TrainingSession {
        let mut session = self.session;

        if let Some(training_type) = session.training_type.clone() {
            for field in Field::ALL {
                if !training_type.records(field) && session.get(field).is_some() {
                    debug!("Clearing {} for a {} session", field, training_type.label());
                    session.clear(field);
                }
            }
            if session.with_ball.is_none() {
                session.with_ball = training_type.uses_ball();
            }
        }

        CalculatedFieldEngine::new().recompute_session(&mut session);
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract_fields;
    use crate::schema::TrainingType;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_calculated_fields_cannot_be_entered() {
        let mut draft = SessionDraft::new();
        assert!(!draft.set(Field::BallTouches, Value::Count(500)));
        assert!(!draft.set(Field::WorkRate, Value::Decimal(80.0)));
        assert!(draft.set(Field::LeftTouches, Value::Count(30)));

        let session = draft.build();
        assert_eq!(session.ball_touches, Some(30));
        assert_eq!(session.work_rate, None);
    }

    #[test]
    fn test_extraction_does_not_override_user_values() {
        let mut draft = SessionDraft::new().with(Field::TopSpeed, Value::Decimal(17.5));
        let extraction = extract_fields("Top Speed: 18.2 mph\nSprints: 9\nBall Touches: 400");

        assert_eq!(draft.merge_extraction(&extraction), 1);
        let session = draft.build();
        assert_eq!(session.top_speed, Some(17.5));
        assert_eq!(session.num_sprints, Some(9));
        assert_eq!(session.ball_touches, None, "extracted calculated field is dropped");
    }

    #[test]
    fn test_build_clears_fields_irrelevant_to_training_type() {
        let session = SessionDraft::new()
            .with(Field::TrainingType, text("Speed and Agility"))
            .with(Field::LeftTouches, Value::Count(40))
            .with(Field::Goals, Value::Count(2))
            .with(Field::TopSpeed, Value::Decimal(18.0))
            .build();

        assert_eq!(session.training_type, Some(TrainingType::SpeedAgility));
        assert_eq!(session.left_touches, None);
        assert_eq!(session.ball_touches, None);
        assert_eq!(session.goals, None);
        assert_eq!(session.top_speed, Some(18.0));
        assert_eq!(session.with_ball, Some(false));
    }

    #[test]
    fn test_match_session_keeps_match_fields() {
        let session = SessionDraft::new()
            .with(Field::TrainingType, text("Match-Grass"))
            .with(Field::Goals, Value::Count(2))
            .with(Field::WithBall, Value::Flag(true))
            .with(Field::LeftTouches, Value::Count(30))
            .with(Field::RightTouches, Value::Count(20))
            .build();

        assert_eq!(session.goals, Some(2));
        assert_eq!(session.with_ball, Some(true));
        assert_eq!(session.left_foot_pct, Some(60.0));
    }
}
