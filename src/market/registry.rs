use tracing::{info, warn};

use crate::db::models::User;
use crate::db::repo::Database;
use crate::error::{AppError, AppResult};

pub async fn register(db: &Database, username: &str, password: &str) -> AppResult<()> {
    if username.is_empty() || password.is_empty() {
        return Err(AppError::InvalidInput("Username and password required".to_string()));
    }

    db.update(|doc| {
        if doc.find_user(username).is_some() {
            warn!("Registration refused, {} already exists", username);
            return Err(AppError::AlreadyExists);
        }
        doc.users.push(User {
            username: username.to_string(),
            password: password.to_string(),
        });
        Ok(())
    })
    .await?;

    info!("Registered user {}", username);
    Ok(())
}

/// Succeeds when a stored user matches both fields exactly. No session is
/// issued; callers stay unauthenticated.
pub async fn login(db: &Database, username: &str, password: &str) -> AppResult<()> {
    let matched = db
        .read(|doc| {
            doc.users
                .iter()
                .any(|u| u.username == username && u.password == password)
        })
        .await;

    if matched {
        info!("User {} logged in", username);
        Ok(())
    } else {
        Err(AppError::InvalidCredentials)
    }
}
