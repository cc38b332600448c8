//! Transactional writes
//!
//! A [`UnitOfWork`] owns one SQLite transaction. All writes of a workflow go
//! through it and become visible together on [`UnitOfWork::commit`]; dropping
//! it early rolls everything back.

use super::models::*;
use crate::error::Result;
use crate::slug;
use chrono::Utc;
use sqlx::{Sqlite, Transaction};

/// Tables carrying a unique slug column
#[derive(Debug, Clone, Copy)]
enum SlugTable {
    Monitorings,
    Institutions,
}

impl SlugTable {
    /// Path segments routed next to `/<table>/:slug` that a slug must not shadow
    fn reserved(self) -> &'static [&'static str] {
        match self {
            SlugTable::Monitorings => &["autocomplete"],
            SlugTable::Institutions => &[],
        }
    }

    fn exists_query(self) -> &'static str {
        match self {
            SlugTable::Monitorings => "SELECT EXISTS (SELECT 1 FROM monitorings WHERE slug = ?)",
            SlugTable::Institutions => "SELECT EXISTS (SELECT 1 FROM institutions WHERE slug = ?)",
        }
    }
}

pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn slug_exists(&mut self, table: SlugTable, candidate: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(table.exists_query())
            .bind(candidate)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(exists)
    }

    /// First free slug derived from `name`, suffixed `-2`, `-3`, ... on collision
    async fn unique_slug(&mut self, table: SlugTable, name: &str) -> Result<String> {
        let base = slug::slugify(name);
        let mut attempt = 1;

        loop {
            let candidate = slug::with_suffix(&base, attempt);
            if !table.reserved().contains(&candidate.as_str())
                && !self.slug_exists(table, &candidate).await?
            {
                return Ok(candidate);
            }
            attempt += 1;
        }
    }

    // ===== Monitorings =====

    pub async fn insert_monitoring(&mut self, new: &NewMonitoring) -> Result<Monitoring> {
        let slug = self
            .unique_slug(SlugTable::Monitorings, &new.fields.name)
            .await?;
        let now = Utc::now();

        let monitoring = sqlx::query_as::<_, Monitoring>(
            r#"
            INSERT INTO monitorings
                (name, name_folded, slug, user_id, description, instruction, active, max_point,
                 logo, created_at, modified_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new.fields.name)
        .bind(slug::fold_case(&new.fields.name))
        .bind(&slug)
        .bind(new.user_id)
        .bind(&new.fields.description)
        .bind(&new.fields.instruction)
        .bind(new.fields.active)
        .bind(new.fields.max_point)
        .bind(&new.fields.logo)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await?;

        tracing::debug!("Inserted monitoring: {} ({})", monitoring.slug, monitoring.id);
        Ok(monitoring)
    }

    /// Replace the editable fields; the slug is left untouched
    pub async fn update_monitoring(
        &mut self,
        id: i64,
        fields: &MonitoringFields,
    ) -> Result<Monitoring> {
        let monitoring = sqlx::query_as::<_, Monitoring>(
            r#"
            UPDATE monitorings
            SET name = ?, name_folded = ?, description = ?, instruction = ?, active = ?,
                max_point = ?, logo = ?, modified_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&fields.name)
        .bind(slug::fold_case(&fields.name))
        .bind(&fields.description)
        .bind(&fields.instruction)
        .bind(fields.active)
        .bind(fields.max_point)
        .bind(&fields.logo)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(monitoring)
    }

    /// Returns false when the pair was already assigned
    pub async fn assign_institution(
        &mut self,
        monitoring_id: i64,
        institution_id: i64,
    ) -> Result<bool> {
        let rows = sqlx::query(
            r#"
            INSERT INTO monitoring_institutions (monitoring_id, institution_id)
            VALUES (?, ?)
            ON CONFLICT (monitoring_id, institution_id) DO NOTHING
            "#,
        )
        .bind(monitoring_id)
        .bind(institution_id)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    pub async fn insert_question(&mut self, new: &NewQuestion) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions
                (monitoring_id, name, description, type, count, position, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(new.monitoring_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.kind)
        .bind(new.count)
        .bind(new.position)
        .bind(new.created_by)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(question)
    }

    pub async fn insert_condition(&mut self, new: &NewCondition) -> Result<Condition> {
        let condition = sqlx::query_as::<_, Condition>(
            r#"
            INSERT INTO conditions (related_id, target_id, type, value)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(new.related_id)
        .bind(new.target_id)
        .bind(&new.kind)
        .bind(&new.value)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(condition)
    }

    pub async fn insert_choice(&mut self, new: &NewChoice) -> Result<Choice> {
        let choice = sqlx::query_as::<_, Choice>(
            r#"
            INSERT INTO choices (question_id, key, value, position)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(new.question_id)
        .bind(&new.key)
        .bind(&new.value)
        .bind(new.position)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(choice)
    }

    pub async fn questions_for_monitoring(&mut self, monitoring_id: i64) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE monitoring_id = ? ORDER BY position, id",
        )
        .bind(monitoring_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(questions)
    }

    pub async fn choices_for_monitoring(&mut self, monitoring_id: i64) -> Result<Vec<Choice>> {
        let choices = sqlx::query_as::<_, Choice>(
            r#"
            SELECT c.* FROM choices c
            JOIN questions q ON q.id = c.question_id
            WHERE q.monitoring_id = ?
            ORDER BY c.question_id, c.position, c.id
            "#,
        )
        .bind(monitoring_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(choices)
    }

    // ===== Institutions =====

    pub async fn insert_institution(&mut self, fields: &InstitutionFields) -> Result<Institution> {
        let slug = self
            .unique_slug(SlugTable::Institutions, &fields.name)
            .await?;

        let institution = sqlx::query_as::<_, Institution>(
            r#"
            INSERT INTO institutions (name, slug, region, email, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&fields.name)
        .bind(&slug)
        .bind(&fields.region)
        .bind(&fields.email)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;

        tracing::debug!("Inserted institution: {} ({})", institution.slug, institution.id);
        Ok(institution)
    }

    pub async fn update_institution(
        &mut self,
        id: i64,
        fields: &InstitutionFields,
    ) -> Result<Institution> {
        let institution = sqlx::query_as::<_, Institution>(
            r#"
            UPDATE institutions SET name = ?, region = ?, email = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.region)
        .bind(&fields.email)
        .bind(id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(institution)
    }

    // ===== Sheets and answers =====

    /// Open a sheet for `user_id`, or `None` if the user already has one for this monitoring
    pub async fn create_sheet(
        &mut self,
        assignment: &Assignment,
        user_id: i64,
    ) -> Result<Option<Sheet>> {
        let sheet = sqlx::query_as::<_, Sheet>(
            r#"
            INSERT INTO sheets (monitoring_id, monitoring_institution_id, user_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (monitoring_id, user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(assignment.monitoring.id)
        .bind(assignment.link.id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(sheet)
    }

    pub async fn insert_answer(
        &mut self,
        sheet_id: i64,
        question_id: i64,
        value: &AnswerValue,
    ) -> Result<Answer> {
        let answer = sqlx::query_as::<_, Answer>(
            "INSERT INTO answers (sheet_id, question_id) VALUES (?, ?) RETURNING *",
        )
        .bind(sheet_id)
        .bind(question_id)
        .fetch_one(&mut *self.tx)
        .await?;

        match value {
            AnswerValue::Text(text) => {
                sqlx::query("INSERT INTO answer_texts (answer_id, value) VALUES (?, ?)")
                    .bind(answer.id)
                    .bind(text)
                    .execute(&mut *self.tx)
                    .await?;
            }
            AnswerValue::Choice(choice_id) => {
                sqlx::query("INSERT INTO answer_choices (answer_id, choice_id) VALUES (?, ?)")
                    .bind(answer.id)
                    .bind(choice_id)
                    .execute(&mut *self.tx)
                    .await?;
            }
        }

        Ok(answer)
    }
}
