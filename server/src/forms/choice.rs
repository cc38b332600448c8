//! Choice form for the options of a `choice` question

use super::fields;
use super::FieldErrors;
use crate::config::{CHOICE_KEY_MAX_LENGTH, CHOICE_VALUE_MAX_LENGTH};
use crate::database::NewChoice;
use serde_json::Value;

pub const DUPLICATE_KEY: &str = "Choice with this Question and Key already exists.";

#[derive(Debug, Clone)]
pub struct ChoiceForm {
    pub key: String,
    pub value: String,
}

impl ChoiceForm {
    pub fn validate(data: &Value) -> Result<ChoiceForm, FieldErrors> {
        let mut errors = FieldErrors::default();

        let key = fields::text(data, "key", true, Some(CHOICE_KEY_MAX_LENGTH), &mut errors);
        let value = fields::text(
            data,
            "value",
            true,
            Some(CHOICE_VALUE_MAX_LENGTH),
            &mut errors,
        );

        errors.into_result(ChoiceForm { key, value })
    }

    pub fn bind(self, question_id: i64, position: i64) -> NewChoice {
        NewChoice {
            question_id,
            position,
            key: self.key,
            value: self.value,
        }
    }
}
