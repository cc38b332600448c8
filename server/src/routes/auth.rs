//! Request authentication
//!
//! The caller is identified by the `X-User-Id` header, which an upstream
//! proxy sets after logging the user in.

use crate::app::AppState;
use crate::database::User;
use crate::error::{AppError, Result};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const USER_HEADER: &str = "x-user-id";

/// The authenticated user of a request with their granted permissions
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    permissions: Vec<String>,
}

impl CurrentUser {
    /// Superusers hold every permission
    pub fn has_perm(&self, permission: &str) -> bool {
        self.user.is_superuser || self.permissions.iter().any(|p| p == permission)
    }

    pub fn require(&self, permission: &str) -> Result<()> {
        if self.has_perm(permission) {
            Ok(())
        } else {
            tracing::debug!("User {} lacks {}", self.user.username, permission);
            Err(AppError::Forbidden(permission.to_string()))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user_id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .ok_or(AppError::Unauthenticated)?;

        let user = state
            .repo
            .get_user(user_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;
        let permissions = state.repo.list_permissions(user.id).await?;

        Ok(CurrentUser { user, permissions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn current_user(is_superuser: bool, permissions: &[&str]) -> CurrentUser {
        CurrentUser {
            user: User {
                id: 1,
                username: "anna".to_string(),
                is_superuser,
                created_at: Utc::now(),
            },
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_permission_checks() {
        let user = current_user(false, &["monitorings.add_monitoring"]);
        assert!(user.require("monitorings.add_monitoring").is_ok());
        assert!(matches!(
            user.require("monitorings.delete_monitoring"),
            Err(AppError::Forbidden(_))
        ));

        let admin = current_user(true, &[]);
        assert!(admin.has_perm("institutions.delete_institution"));
    }
}
