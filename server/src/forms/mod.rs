//! Validation forms
//!
//! Each form reads the raw JSON object submitted by a client, checks field
//! constraints and produces a typed value. Related rows (owning monitoring,
//! creator, ordering) are attached afterwards through the form's `bind`
//! method, so validation never touches the database.

pub mod answer;
pub mod choice;
pub mod condition;
pub mod fields;
pub mod institution;
pub mod monitoring;
pub mod question;

pub use answer::AnswerForm;
pub use choice::ChoiceForm;
pub use condition::ConditionForm;
pub use institution::InstitutionForm;
pub use monitoring::MonitoringForm;
pub use question::QuestionForm;

use serde::Serialize;

/// Per-field error messages, serialized as `[[field, message], ...]`.
///
/// Only the first message for a field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<(String, String)>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        if !self.contains(field) {
            self.0.push((field.to_string(), message.into()));
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|(f, _)| f == field)
    }

    pub fn message(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, m)| m.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(value)` when no error was recorded
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Validate every item, keeping one error entry per item.
///
/// Fails when any item failed; the error vector then has one entry per input
/// (empty for valid items), matching the order of submission.
pub fn validate_all<T, I>(results: I) -> Result<Vec<T>, Vec<FieldErrors>>
where
    I: IntoIterator<Item = Result<T, FieldErrors>>,
{
    let mut forms = Vec::new();
    let mut errors = Vec::new();
    let mut failed = false;

    for result in results {
        match result {
            Ok(form) => {
                forms.push(form);
                errors.push(FieldErrors::default());
            }
            Err(e) => {
                failed = true;
                errors.push(e);
            }
        }
    }

    if failed {
        Err(errors)
    } else {
        Ok(forms)
    }
}
