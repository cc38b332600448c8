//! Question form

use super::fields;
use super::FieldErrors;
use crate::config::QUESTION_NAME_MAX_LENGTH;
use crate::database::{NewQuestion, QuestionType};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct QuestionForm {
    pub name: String,
    pub description: String,
    pub kind: QuestionType,
    pub count: i64,
}

impl QuestionForm {
    pub fn validate(data: &Value) -> Result<QuestionForm, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = fields::text(
            data,
            "name",
            true,
            Some(QUESTION_NAME_MAX_LENGTH),
            &mut errors,
        );
        let description = fields::text(data, "description", false, None, &mut errors);
        let kind = fields::choice(data, "type", &QuestionType::ALL, &mut errors)
            .and_then(|tag| QuestionType::parse(&tag));
        let count = fields::integer(data, "count", false, Some(0), &mut errors);

        match kind {
            Some(kind) if errors.is_empty() => Ok(QuestionForm {
                name,
                description,
                kind,
                count: count.unwrap_or(0),
            }),
            _ => Err(errors),
        }
    }

    /// Attach the owning monitoring, the creator and the position in the batch
    pub fn bind(self, monitoring_id: i64, created_by: i64, position: i64) -> NewQuestion {
        NewQuestion {
            monitoring_id,
            created_by,
            position,
            name: self.name,
            description: self.description,
            kind: self.kind,
            count: self.count,
        }
    }
}
