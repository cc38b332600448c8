//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::Settings;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{AnswerService, InstitutionService, MonitoringService};
use sqlx::SqlitePool;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub monitorings_service: MonitoringService,
    pub answers_service: AnswerService,
    pub institutions_service: InstitutionService,
}

impl AppState {
    pub fn new(pool: SqlitePool, settings: &Settings) -> Self {
        let repo = Repository::new(pool);

        Self {
            monitorings_service: MonitoringService::new(repo.clone(), settings.page_size),
            answers_service: AnswerService::new(repo.clone()),
            institutions_service: InstitutionService::new(repo.clone(), settings.page_size),
            repo,
        }
    }
}

/// Application setup - called once on startup
pub async fn setup(settings: &Settings) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Database path: {:?}", settings.database);

    let pool = create_pool(&settings.database).await?;
    let state = AppState::new(pool, settings);

    tracing::info!("Application initialized successfully");

    Ok(state)
}
