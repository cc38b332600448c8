//! Answers service
//!
//! Accepts one respondent's answers for a monitoring assigned to an
//! institution. A sheet and all of its answers are stored together or not at
//! all, and each user answers a monitoring at most once.

use crate::database::{Assignment, Repository, User};
use crate::error::{AppError, Result};
use crate::forms::{validate_all, AnswerForm};
use serde_json::Value;

/// `question_id` of an answer entry, given as a number or numeric string
fn entry_question_id(entry: &Value) -> Option<i64> {
    match entry.get("question_id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Service for submitting answers
#[derive(Clone)]
pub struct AnswerService {
    repo: Repository,
}

impl AnswerService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Store the answers in `data` as a new sheet of `user`.
    ///
    /// Returns the resolved assignment, which the caller uses to point back at
    /// the institution's progress page.
    pub async fn submit(
        &self,
        user: &User,
        monitoring_slug: &str,
        institution_slug: &str,
        data: &Value,
    ) -> Result<Assignment> {
        let assignment = self
            .repo
            .get_assignment(monitoring_slug, institution_slug)
            .await?;

        let entries = data
            .as_array()
            .ok_or_else(|| AppError::InvalidJson("expected a list of answers".to_string()))?;

        let mut uow = self.repo.begin().await?;

        let sheet = uow
            .create_sheet(&assignment, user.id)
            .await?
            .ok_or(AppError::DuplicateSubmission)?;

        let questions = uow.questions_for_monitoring(assignment.monitoring.id).await?;
        let choices = uow.choices_for_monitoring(assignment.monitoring.id).await?;

        let mut answered = Vec::with_capacity(questions.len());
        for question in &questions {
            let entry = entries
                .iter()
                .find(|entry| entry_question_id(entry) == Some(question.id))
                .ok_or(AppError::MissingAnswer(question.id))?;
            answered.push((question, entry));
        }

        let values = validate_all(
            answered
                .iter()
                .map(|(question, entry)| {
                    AnswerForm::for_question(question, &choices).validate(entry)
                }),
        )
        .map_err(AppError::per_item)?;

        for ((question, _), value) in answered.iter().zip(&values) {
            uow.insert_answer(sheet.id, question.id, value).await?;
        }

        uow.commit().await?;

        tracing::info!(
            "Sheet {} submitted by {} for {} / {} ({} answers)",
            sheet.id,
            user.username,
            assignment.monitoring.slug,
            assignment.institution.slug,
            values.len()
        );

        Ok(assignment)
    }
}
