//! Answer forms
//!
//! The form used for an answer depends on the type of the question being
//! answered. Choice answers only accept the keys of the answered question's
//! own choices.

use super::fields;
use super::FieldErrors;
use crate::config::SHORT_TEXT_ANSWER_MAX_LENGTH;
use crate::database::{AnswerValue, Choice, Question, QuestionType};
use serde_json::Value;

#[derive(Debug, Clone)]
pub enum AnswerForm<'a> {
    Text { max_length: Option<usize> },
    Choice { choices: Vec<&'a Choice> },
}

impl<'a> AnswerForm<'a> {
    /// Pick the form for `question`, restricting choices to the ones it owns
    pub fn for_question(question: &Question, choices: &'a [Choice]) -> AnswerForm<'a> {
        match question.kind {
            QuestionType::ShortText => AnswerForm::Text {
                max_length: Some(SHORT_TEXT_ANSWER_MAX_LENGTH),
            },
            QuestionType::LongText => AnswerForm::Text { max_length: None },
            QuestionType::Choice => AnswerForm::Choice {
                choices: choices
                    .iter()
                    .filter(|c| c.question_id == question.id)
                    .collect(),
            },
        }
    }

    pub fn validate(&self, data: &Value) -> Result<AnswerValue, FieldErrors> {
        let mut errors = FieldErrors::default();

        match self {
            AnswerForm::Text { max_length } => {
                let value = fields::text(data, "value", true, *max_length, &mut errors);
                errors.into_result(AnswerValue::Text(value))
            }
            AnswerForm::Choice { choices } => {
                let key = fields::text(data, "value", true, None, &mut errors);
                if !errors.is_empty() {
                    return Err(errors);
                }

                match choices.iter().find(|c| c.key == key) {
                    Some(choice) => Ok(AnswerValue::Choice(choice.id)),
                    None => {
                        errors.add("value", fields::INVALID_CHOICE);
                        Err(errors)
                    }
                }
            }
        }
    }
}
