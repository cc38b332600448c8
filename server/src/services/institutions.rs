//! Institutions service

use crate::database::{Institution, Repository};
use crate::error::{AppError, Result};
use crate::forms::InstitutionForm;
use serde_json::Value;

/// Service for managing institutions
#[derive(Clone)]
pub struct InstitutionService {
    repo: Repository,
    page_size: u32,
}

impl InstitutionService {
    pub fn new(repo: Repository, page_size: u32) -> Self {
        Self { repo, page_size }
    }

    /// One page of institutions whose name contains `name`
    pub async fn list_institutions(
        &self,
        name: Option<&str>,
        page: u32,
    ) -> Result<Vec<Institution>> {
        let limit = i64::from(self.page_size);
        let offset = i64::from(page.max(1) - 1) * limit;
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        self.repo.list_institutions(name, limit, offset).await
    }

    pub async fn get_institution(&self, slug: &str) -> Result<Institution> {
        self.repo.get_institution_by_slug(slug).await
    }

    pub async fn create_institution(&self, data: &Value) -> Result<Institution> {
        let fields = InstitutionForm::validate(data).map_err(AppError::fields)?;

        let mut uow = self.repo.begin().await?;
        let institution = uow.insert_institution(&fields).await?;
        uow.commit().await?;

        tracing::info!("Institution created: {}", institution.slug);
        Ok(institution)
    }

    pub async fn update_institution(&self, slug: &str, data: &Value) -> Result<Institution> {
        let institution = self.repo.get_institution_by_slug(slug).await?;
        let fields = InstitutionForm::validate(data).map_err(AppError::fields)?;

        let mut uow = self.repo.begin().await?;
        let updated = uow.update_institution(institution.id, &fields).await?;
        uow.commit().await?;

        tracing::info!("Institution updated: {}", updated.slug);
        Ok(updated)
    }

    pub async fn delete_institution(&self, slug: &str) -> Result<()> {
        let institution = self.repo.get_institution_by_slug(slug).await?;
        self.repo.delete_institution(institution.id).await?;

        tracing::info!("Institution deleted: {}", slug);
        Ok(())
    }
}
