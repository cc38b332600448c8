//! Repository layer for database operations
//!
//! Reads and single-statement writes go straight to the pool. Anything that
//! touches several rows at once goes through a [`UnitOfWork`] obtained from
//! [`Repository::begin`].

use super::models::*;
use super::unit_of_work::UnitOfWork;
use crate::error::{AppError, Result};
use crate::slug;
use chrono::Utc;
use sqlx::SqlitePool;

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start a transaction; dropping the unit of work without committing rolls it back
    pub async fn begin(&self) -> Result<UnitOfWork> {
        let tx = self.pool.begin().await?;
        Ok(UnitOfWork::new(tx))
    }

    // ===== Users =====

    pub async fn create_user(&self, username: &str, is_superuser: bool) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, is_superuser, created_at)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(is_superuser)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created user: {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", username)))
    }

    pub async fn grant_permission(&self, user_id: i64, permission: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, permission) VALUES (?, ?)
            ON CONFLICT (user_id, permission) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(permission)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Granted {} to user {}", permission, user_id);
        Ok(())
    }

    pub async fn list_permissions(&self, user_id: i64) -> Result<Vec<String>> {
        let permissions = sqlx::query_scalar(
            "SELECT permission FROM user_permissions WHERE user_id = ? ORDER BY permission",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    // ===== Monitorings =====

    /// Inactive monitorings first, then by creation time
    pub async fn list_monitorings(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MonitoringSummary>> {
        let monitorings = sqlx::query_as::<_, MonitoringSummary>(
            r#"
            SELECT m.*,
                   u.username AS owner,
                   EXISTS (SELECT 1 FROM sheets s WHERE s.monitoring_id = m.id) AS started
            FROM monitorings m
            JOIN users u ON u.id = m.user_id
            ORDER BY m.active ASC, m.created_at ASC, m.id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(monitorings)
    }

    pub async fn get_monitoring_by_slug(&self, slug: &str) -> Result<Monitoring> {
        sqlx::query_as::<_, Monitoring>("SELECT * FROM monitorings WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Monitoring".to_string()))
    }

    async fn get_monitoring(&self, id: i64) -> Result<Monitoring> {
        sqlx::query_as::<_, Monitoring>("SELECT * FROM monitorings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Monitoring".to_string()))
    }

    pub async fn get_username(&self, user_id: i64) -> Result<String> {
        sqlx::query_scalar("SELECT username FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// Case-insensitive prefix match on the monitoring name.
    ///
    /// SQLite only folds ASCII, so the match runs against `name_folded`.
    pub async fn search_monitorings(&self, prefix: &str, limit: i64) -> Result<Vec<Monitoring>> {
        let monitorings = sqlx::query_as::<_, Monitoring>(
            r#"
            SELECT * FROM monitorings
            WHERE name_folded LIKE ? ESCAPE '\'
            ORDER BY name_folded, id
            LIMIT ?
            "#,
        )
        .bind(format!("{}%", escape_like(&slug::fold_case(prefix))))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(monitorings)
    }

    /// Delete a monitoring with its questions, assignments and sheets
    pub async fn delete_monitoring(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM monitorings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NotFound("Monitoring".to_string()));
        }

        tracing::debug!("Deleted monitoring: {}", id);
        Ok(())
    }

    pub async fn list_questions(&self, monitoring_id: i64) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE monitoring_id = ? ORDER BY position, id",
        )
        .bind(monitoring_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    pub async fn list_choices(&self, monitoring_id: i64) -> Result<Vec<Choice>> {
        let choices = sqlx::query_as::<_, Choice>(
            r#"
            SELECT c.* FROM choices c
            JOIN questions q ON q.id = c.question_id
            WHERE q.monitoring_id = ?
            ORDER BY c.question_id, c.position, c.id
            "#,
        )
        .bind(monitoring_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(choices)
    }

    pub async fn list_conditions(&self, monitoring_id: i64) -> Result<Vec<Condition>> {
        let conditions = sqlx::query_as::<_, Condition>(
            r#"
            SELECT c.* FROM conditions c
            JOIN questions q ON q.id = c.related_id
            WHERE q.monitoring_id = ?
            ORDER BY c.related_id, c.id
            "#,
        )
        .bind(monitoring_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(conditions)
    }

    pub async fn list_assigned_institutions(&self, monitoring_id: i64) -> Result<Vec<Institution>> {
        let institutions = sqlx::query_as::<_, Institution>(
            r#"
            SELECT i.* FROM institutions i
            JOIN monitoring_institutions mi ON mi.institution_id = i.id
            WHERE mi.monitoring_id = ?
            ORDER BY i.name, i.id
            "#,
        )
        .bind(monitoring_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(institutions)
    }

    /// Assigned institutions with the number of sheets submitted for each
    pub async fn institution_progress(
        &self,
        monitoring_id: i64,
    ) -> Result<Vec<InstitutionProgress>> {
        let progress = sqlx::query_as::<_, InstitutionProgress>(
            r#"
            SELECT i.*,
                   (SELECT COUNT(*) FROM sheets s
                    WHERE s.monitoring_institution_id = mi.id) AS sheet_count
            FROM institutions i
            JOIN monitoring_institutions mi ON mi.institution_id = i.id
            WHERE mi.monitoring_id = ?
            ORDER BY i.name, i.id
            "#,
        )
        .bind(monitoring_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(progress)
    }

    /// Resolve the pairing of a monitoring and an institution by their slugs
    pub async fn get_assignment(
        &self,
        monitoring_slug: &str,
        institution_slug: &str,
    ) -> Result<Assignment> {
        let link = sqlx::query_as::<_, MonitoringInstitution>(
            r#"
            SELECT mi.* FROM monitoring_institutions mi
            JOIN monitorings m ON m.id = mi.monitoring_id
            JOIN institutions i ON i.id = mi.institution_id
            WHERE m.slug = ? AND i.slug = ?
            "#,
        )
        .bind(monitoring_slug)
        .bind(institution_slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Monitoring of institution".to_string()))?;

        let monitoring = self.get_monitoring(link.monitoring_id).await?;
        let institution = self.get_institution(link.institution_id).await?;

        Ok(Assignment {
            link,
            monitoring,
            institution,
        })
    }

    pub async fn list_sheets(&self, monitoring_institution_id: i64) -> Result<Vec<SheetSummary>> {
        let sheets = sqlx::query_as::<_, SheetSummary>(
            r#"
            SELECT s.id,
                   u.username,
                   (SELECT COUNT(*) FROM answers a WHERE a.sheet_id = s.id) AS answer_count,
                   s.created_at
            FROM sheets s
            JOIN users u ON u.id = s.user_id
            WHERE s.monitoring_institution_id = ?
            ORDER BY s.created_at, s.id
            "#,
        )
        .bind(monitoring_institution_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sheets)
    }

    pub async fn count_answers(&self, sheet_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE sheet_id = ?")
            .bind(sheet_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn find_sheet(&self, monitoring_id: i64, user_id: i64) -> Result<Option<Sheet>> {
        let sheet = sqlx::query_as::<_, Sheet>(
            "SELECT * FROM sheets WHERE monitoring_id = ? AND user_id = ?",
        )
        .bind(monitoring_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sheet)
    }

    // ===== Institutions =====

    pub async fn list_institutions(
        &self,
        name_filter: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Institution>> {
        let pattern = format!("%{}%", escape_like(name_filter.unwrap_or_default()));

        let institutions = sqlx::query_as::<_, Institution>(
            r#"
            SELECT * FROM institutions
            WHERE name LIKE ? ESCAPE '\'
            ORDER BY name, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(institutions)
    }

    pub async fn get_institution_by_slug(&self, slug: &str) -> Result<Institution> {
        sqlx::query_as::<_, Institution>("SELECT * FROM institutions WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Institution".to_string()))
    }

    async fn get_institution(&self, id: i64) -> Result<Institution> {
        sqlx::query_as::<_, Institution>("SELECT * FROM institutions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Institution".to_string()))
    }

    /// Look up institutions by slug, returning the found rows and the unknown slugs
    pub async fn find_institutions(
        &self,
        slugs: &[String],
    ) -> Result<(Vec<Institution>, Vec<String>)> {
        let mut found = Vec::with_capacity(slugs.len());
        let mut missing = Vec::new();

        for slug in slugs {
            let institution =
                sqlx::query_as::<_, Institution>("SELECT * FROM institutions WHERE slug = ?")
                    .bind(slug)
                    .fetch_optional(&self.pool)
                    .await?;

            match institution {
                Some(institution) => found.push(institution),
                None => missing.push(slug.clone()),
            }
        }

        Ok((found, missing))
    }

    pub async fn delete_institution(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM institutions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NotFound("Institution".to_string()));
        }

        tracing::debug!("Deleted institution: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_repository;

    async fn seed_institution(repo: &Repository, name: &str) -> Institution {
        let mut uow = repo.begin().await.unwrap();
        let institution = uow
            .insert_institution(&InstitutionFields {
                name: name.to_string(),
                region: None,
                email: None,
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();
        institution
    }

    async fn seed_monitoring(repo: &Repository, user: &User, name: &str) -> Monitoring {
        let mut uow = repo.begin().await.unwrap();
        let monitoring = uow
            .insert_monitoring(&NewMonitoring {
                user_id: user.id,
                fields: MonitoringFields {
                    name: name.to_string(),
                    description: "<p>d</p>".to_string(),
                    instruction: String::new(),
                    active: true,
                    max_point: 10,
                    logo: None,
                },
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();
        monitoring
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
    }

    #[tokio::test]
    async fn test_users_and_permissions() {
        let repo = test_repository().await;

        let user = repo.create_user("anna", false).await.unwrap();
        assert!(!user.is_superuser);

        repo.grant_permission(user.id, "monitorings.add_monitoring")
            .await
            .unwrap();
        // Granting twice is harmless
        repo.grant_permission(user.id, "monitorings.add_monitoring")
            .await
            .unwrap();

        let permissions = repo.list_permissions(user.id).await.unwrap();
        assert_eq!(permissions, vec!["monitorings.add_monitoring".to_string()]);

        let fetched = repo.get_user_by_username("anna").await.unwrap();
        assert_eq!(fetched.id, user.id);
        assert!(repo.get_user(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_monitorings_by_prefix() {
        let repo = test_repository().await;
        let user = repo.create_user("anna", false).await.unwrap();

        seed_monitoring(&repo, &user, "Budget 2016").await;
        seed_monitoring(&repo, &user, "budget 2017").await;
        seed_monitoring(&repo, &user, "Open data").await;

        let found = repo.search_monitorings("BUDGET", 10).await.unwrap();
        assert_eq!(found.len(), 2);

        let none = repo.search_monitorings("%", 10).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_search_monitorings_folds_polish_letters() {
        let repo = test_repository().await;
        let user = repo.create_user("anna", false).await.unwrap();

        seed_monitoring(&repo, &user, "Łódź 2016").await;
        seed_monitoring(&repo, &user, "Żory").await;
        seed_monitoring(&repo, &user, "Lublin").await;

        let found = repo.search_monitorings("łó", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Łódź 2016");

        let found = repo.search_monitorings("ż", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Żory");

        let found = repo.search_monitorings("ŁÓDŹ", 10).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_search_follows_renames() {
        let repo = test_repository().await;
        let user = repo.create_user("anna", false).await.unwrap();
        let monitoring = seed_monitoring(&repo, &user, "Budget").await;

        let mut uow = repo.begin().await.unwrap();
        uow.update_monitoring(
            monitoring.id,
            &MonitoringFields {
                name: "Świadczenia".to_string(),
                description: "<p>d</p>".to_string(),
                instruction: String::new(),
                active: true,
                max_point: 10,
                logo: None,
            },
        )
        .await
        .unwrap();
        uow.commit().await.unwrap();

        assert!(repo.search_monitorings("bud", 10).await.unwrap().is_empty());
        assert_eq!(repo.search_monitorings("św", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_assignment_resolution() {
        let repo = test_repository().await;
        let user = repo.create_user("anna", false).await.unwrap();
        let monitoring = seed_monitoring(&repo, &user, "Budget").await;
        let institution = seed_institution(&repo, "City Hall").await;
        let other = seed_institution(&repo, "Library").await;

        let mut uow = repo.begin().await.unwrap();
        assert!(uow
            .assign_institution(monitoring.id, institution.id)
            .await
            .unwrap());
        assert!(!uow
            .assign_institution(monitoring.id, institution.id)
            .await
            .unwrap());
        uow.commit().await.unwrap();

        let assignment = repo
            .get_assignment(&monitoring.slug, &institution.slug)
            .await
            .unwrap();
        assert_eq!(assignment.monitoring.id, monitoring.id);
        assert_eq!(assignment.institution.id, institution.id);

        let missing = repo.get_assignment(&monitoring.slug, &other.slug).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let progress = repo.institution_progress(monitoring.id).await.unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].sheet_count, 0);
    }

    #[tokio::test]
    async fn test_list_monitorings_with_owner() {
        let repo = test_repository().await;
        let user = repo.create_user("anna", false).await.unwrap();
        seed_monitoring(&repo, &user, "Budget").await;

        let listed = repo.list_monitorings(25, 0).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].owner, "anna");
        assert!(!listed[0].started);
    }

    #[tokio::test]
    async fn test_find_institutions_reports_missing() {
        let repo = test_repository().await;
        let institution = seed_institution(&repo, "City Hall").await;

        let (found, missing) = repo
            .find_institutions(&[institution.slug.clone(), "nowhere".to_string()])
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(missing, vec!["nowhere".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_monitoring_cascades() {
        let repo = test_repository().await;
        let user = repo.create_user("anna", false).await.unwrap();
        let monitoring = seed_monitoring(&repo, &user, "Budget").await;

        let mut uow = repo.begin().await.unwrap();
        uow.insert_question(&NewQuestion {
            monitoring_id: monitoring.id,
            created_by: user.id,
            position: 0,
            name: "Q".to_string(),
            description: String::new(),
            kind: QuestionType::ShortText,
            count: 0,
        })
        .await
        .unwrap();
        uow.commit().await.unwrap();

        repo.delete_monitoring(monitoring.id).await.unwrap();

        assert!(repo.list_questions(monitoring.id).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_monitoring(monitoring.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
