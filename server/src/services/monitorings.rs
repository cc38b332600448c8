//! Monitorings service
//!
//! Creation of a monitoring together with its questions, hide conditions and
//! choices, plus the listing, editing and progress views built on top.

use crate::config::AUTOCOMPLETE_LIMIT;
use crate::database::{
    Assignment, Institution, InstitutionProgress, Monitoring, MonitoringDetail, MonitoringSummary,
    QuestionDetail, QuestionType, Repository, SheetSummary, User,
};
use crate::error::{AppError, Result};
use crate::forms::{
    choice, fields, validate_all, ChoiceForm, ConditionForm, FieldErrors, MonitoringForm,
    QuestionForm,
};
use serde_json::Value;
use std::collections::HashSet;

/// Nested list of a question definition; missing or malformed lists are empty
fn nested<'a>(item: &'a Value, field: &str) -> &'a [Value] {
    item.get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// A validated question with the nested rows to create alongside it
struct QuestionDraft {
    form: QuestionForm,
    conditions: Vec<ConditionForm>,
    choices: Vec<ChoiceForm>,
}

/// Service for managing monitorings
#[derive(Clone)]
pub struct MonitoringService {
    repo: Repository,
    page_size: u32,
}

impl MonitoringService {
    pub fn new(repo: Repository, page_size: u32) -> Self {
        Self { repo, page_size }
    }

    /// Validate a full monitoring definition and persist it in one transaction.
    ///
    /// Validation stops at the first failing stage: monitoring fields,
    /// question list, questions, hide conditions, condition targets, choices.
    pub async fn create_monitoring(&self, user: &User, data: &Value) -> Result<Monitoring> {
        tracing::info!("Creating monitoring for user {}", user.username);

        let form = MonitoringForm::validate(data).map_err(AppError::fields)?;
        let institutions = self.resolve_institutions(&form.institutions).await?;

        let items = match data.get("questions") {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => return Err(AppError::NoQuestions),
        };

        let questions =
            validate_all(items.iter().map(QuestionForm::validate)).map_err(AppError::per_item)?;

        // Conditions of all questions are validated as one batch
        let raw_conditions: Vec<(usize, &Value)> = items
            .iter()
            .enumerate()
            .flat_map(|(owner, item)| {
                nested(item, "hideConditions").iter().map(move |c| (owner, c))
            })
            .collect();
        let conditions =
            validate_all(raw_conditions.iter().map(|(_, c)| ConditionForm::validate(c)))
                .map_err(AppError::per_item)?;

        if conditions
            .iter()
            .any(|c| c.target_index(questions.len()).is_none())
        {
            return Err(AppError::UnknownTarget);
        }

        // Options only matter for choice questions
        let raw_choices: Vec<(usize, &Value)> = items
            .iter()
            .zip(&questions)
            .enumerate()
            .filter(|(_, (_, q))| q.kind == QuestionType::Choice)
            .flat_map(|(owner, (item, _))| nested(item, "options").iter().map(move |c| (owner, c)))
            .collect();
        // Keys are unique within their question
        let mut seen_keys = HashSet::new();
        let choices = validate_all(raw_choices.iter().map(|(owner, c)| {
            let option = ChoiceForm::validate(c)?;
            if seen_keys.insert((*owner, option.key.clone())) {
                Ok(option)
            } else {
                let mut errors = FieldErrors::default();
                errors.add("key", choice::DUPLICATE_KEY);
                Err(errors)
            }
        }))
        .map_err(AppError::per_item)?;

        let mut drafts: Vec<QuestionDraft> = questions
            .into_iter()
            .map(|form| QuestionDraft {
                form,
                conditions: Vec::new(),
                choices: Vec::new(),
            })
            .collect();
        for ((owner, _), condition) in raw_conditions.iter().zip(conditions) {
            drafts[*owner].conditions.push(condition);
        }
        for ((owner, _), choice) in raw_choices.iter().zip(choices) {
            drafts[*owner].choices.push(choice);
        }

        let mut uow = self.repo.begin().await?;

        let monitoring = uow.insert_monitoring(&form.bind(user.id)).await?;

        for institution in &institutions {
            uow.assign_institution(monitoring.id, institution.id).await?;
        }

        let mut question_ids = Vec::with_capacity(drafts.len());
        let mut nested_rows = Vec::with_capacity(drafts.len());
        for (position, draft) in drafts.into_iter().enumerate() {
            let new = draft.form.bind(monitoring.id, user.id, position as i64);
            let question = uow.insert_question(&new).await?;
            question_ids.push(question.id);
            nested_rows.push((question.id, draft.conditions, draft.choices));
        }

        let (conditions, choices): (Vec<_>, Vec<_>) = nested_rows
            .into_iter()
            .map(|(id, conditions, choices)| ((id, conditions), (id, choices)))
            .unzip();

        for (question_id, conditions) in conditions {
            for condition in conditions {
                let target_id = condition
                    .target_index(question_ids.len())
                    .map(|index| question_ids[index])
                    .ok_or(AppError::UnknownTarget)?;
                uow.insert_condition(&condition.bind(question_id, target_id))
                    .await?;
            }
        }

        for (question_id, choices) in choices {
            for (position, choice) in choices.into_iter().enumerate() {
                uow.insert_choice(&choice.bind(question_id, position as i64))
                    .await?;
            }
        }

        uow.commit().await?;

        tracing::info!(
            "Monitoring created successfully: {} ({} questions)",
            monitoring.slug,
            question_ids.len()
        );

        Ok(monitoring)
    }

    /// Every slug must name an existing institution
    async fn resolve_institutions(&self, slugs: &[String]) -> Result<Vec<Institution>> {
        let (found, missing) = self.repo.find_institutions(slugs).await?;

        if let Some(slug) = missing.first() {
            let mut errors = FieldErrors::default();
            errors.add("institutions", fields::unknown_choice_message(slug));
            return Err(AppError::fields(errors));
        }

        Ok(found)
    }

    /// One page of monitorings, counting pages from 1
    pub async fn list_monitorings(&self, page: u32) -> Result<Vec<MonitoringSummary>> {
        let limit = i64::from(self.page_size);
        let offset = i64::from(page.max(1) - 1) * limit;
        self.repo.list_monitorings(limit, offset).await
    }

    pub async fn get_monitoring(&self, slug: &str) -> Result<Monitoring> {
        self.repo.get_monitoring_by_slug(slug).await
    }

    pub async fn monitoring_detail(&self, slug: &str) -> Result<MonitoringDetail> {
        let monitoring = self.repo.get_monitoring_by_slug(slug).await?;
        let owner = self.repo.get_username(monitoring.user_id).await?;
        let questions = self.repo.list_questions(monitoring.id).await?;
        let choices = self.repo.list_choices(monitoring.id).await?;
        let conditions = self.repo.list_conditions(monitoring.id).await?;
        let institutions = self.repo.list_assigned_institutions(monitoring.id).await?;

        let questions = questions
            .into_iter()
            .map(|question| QuestionDetail {
                options: choices
                    .iter()
                    .filter(|c| c.question_id == question.id)
                    .cloned()
                    .collect(),
                hide_conditions: conditions
                    .iter()
                    .filter(|c| c.related_id == question.id)
                    .cloned()
                    .collect(),
                question,
            })
            .collect();

        Ok(MonitoringDetail {
            url: monitoring.absolute_url(),
            monitoring,
            owner,
            questions,
            institutions,
        })
    }

    /// Replace the monitoring fields; institutions are managed through [`Self::assign`]
    pub async fn update_monitoring(&self, slug: &str, data: &Value) -> Result<Monitoring> {
        let monitoring = self.repo.get_monitoring_by_slug(slug).await?;
        let form = MonitoringForm::validate(data).map_err(AppError::fields)?;

        let mut uow = self.repo.begin().await?;
        let updated = uow.update_monitoring(monitoring.id, &form.fields).await?;
        uow.commit().await?;

        tracing::info!("Monitoring updated: {}", updated.slug);
        Ok(updated)
    }

    pub async fn delete_monitoring(&self, slug: &str) -> Result<()> {
        let monitoring = self.repo.get_monitoring_by_slug(slug).await?;
        self.repo.delete_monitoring(monitoring.id).await?;

        tracing::info!("Monitoring deleted: {}", slug);
        Ok(())
    }

    /// Assign the listed institutions, returning the ones that were not assigned yet
    pub async fn assign(&self, slug: &str, data: &Value) -> Result<Vec<Institution>> {
        let monitoring = self.repo.get_monitoring_by_slug(slug).await?;

        let mut errors = FieldErrors::default();
        let slugs = fields::string_list(data, "institutions", &mut errors);
        if slugs.is_empty() && errors.is_empty() {
            errors.add("institutions", fields::REQUIRED);
        }
        if !errors.is_empty() {
            return Err(AppError::fields(errors));
        }

        let institutions = self.resolve_institutions(&slugs).await?;

        let mut uow = self.repo.begin().await?;
        let mut added = Vec::new();
        for institution in institutions {
            if uow.assign_institution(monitoring.id, institution.id).await? {
                added.push(institution);
            }
        }
        uow.commit().await?;

        tracing::info!(
            "Assigned {} institution(s) to monitoring {}",
            added.len(),
            monitoring.slug
        );
        Ok(added)
    }

    pub async fn autocomplete(&self, prefix: &str) -> Result<Vec<Monitoring>> {
        self.repo
            .search_monitorings(prefix.trim(), AUTOCOMPLETE_LIMIT)
            .await
    }

    pub async fn institution_progress(
        &self,
        slug: &str,
    ) -> Result<(Monitoring, Vec<InstitutionProgress>)> {
        let monitoring = self.repo.get_monitoring_by_slug(slug).await?;
        let progress = self.repo.institution_progress(monitoring.id).await?;
        Ok((monitoring, progress))
    }

    pub async fn sheets(
        &self,
        monitoring_slug: &str,
        institution_slug: &str,
    ) -> Result<(Assignment, Vec<SheetSummary>)> {
        let assignment = self
            .repo
            .get_assignment(monitoring_slug, institution_slug)
            .await?;
        let sheets = self.repo.list_sheets(assignment.link.id).await?;
        Ok((assignment, sheets))
    }
}
