//! Hide condition form

use super::fields;
use super::FieldErrors;
use crate::config::{CONDITION_TYPE_MAX_LENGTH, CONDITION_VALUE_MAX_LENGTH};
use crate::database::NewCondition;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ConditionForm {
    pub kind: String,
    pub value: String,
    /// Index of the target question in the creation batch, if it is an integer
    target: Option<i64>,
}

impl ConditionForm {
    pub fn validate(data: &Value) -> Result<ConditionForm, FieldErrors> {
        let mut errors = FieldErrors::default();

        let kind = fields::text(
            data,
            "type",
            true,
            Some(CONDITION_TYPE_MAX_LENGTH),
            &mut errors,
        );
        let value = fields::text(
            data,
            "value",
            true,
            Some(CONDITION_VALUE_MAX_LENGTH),
            &mut errors,
        );

        // An absent target points at the first question.
        let target = match data.get("target") {
            None | Some(Value::Null) => Some(0),
            Some(raw) => raw.as_i64(),
        };

        errors.into_result(ConditionForm {
            kind,
            value,
            target,
        })
    }

    /// The target index when it falls inside a batch of `question_count` questions
    pub fn target_index(&self, question_count: usize) -> Option<usize> {
        self.target
            .and_then(|t| usize::try_from(t).ok())
            .filter(|&t| t < question_count)
    }

    pub fn bind(self, related_id: i64, target_id: i64) -> NewCondition {
        NewCondition {
            related_id,
            target_id,
            kind: self.kind,
            value: self.value,
        }
    }
}
