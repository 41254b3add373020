use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use tracing::error;

use chirp_db::Database;
use chirp_types::api::{LoginRequest, RegisterRequest};
use chirp_types::models::Account;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
}

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 4;

// -- Rules --

/// Registration succeeds only for a non-blank username, a password of at
/// least [`MIN_PASSWORD_LEN`] characters, and a username no existing
/// account holds. Uniqueness is a scan over stored accounts; the schema
/// carries no constraint for it.
pub fn register_account(db: &Database, req: &RegisterRequest) -> Result<Account, ApiError> {
    if req.username.is_empty() {
        return Err(ApiError::Rejected("username must not be blank"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Rejected("password shorter than 4 characters"));
    }

    let accounts = match db.all_accounts() {
        Ok(accounts) => accounts,
        Err(e) => {
            error!("account scan failed: {}", e);
            return Err(ApiError::Rejected("account scan failed"));
        }
    };
    if accounts.iter().any(|a| a.username == req.username) {
        return Err(ApiError::Rejected("username already taken"));
    }

    match db.insert_account(&req.username, &req.password) {
        Ok(row) => Ok(row.into()),
        Err(e) => {
            error!("account insert failed: {}", e);
            Err(ApiError::Rejected("account insert failed"))
        }
    }
}

/// Direct lookup of an account matching username AND password exactly.
pub fn login_account(db: &Database, req: &LoginRequest) -> Result<Account, ApiError> {
    match db.account_by_credentials(&req.username, &req.password) {
        Ok(Some(row)) => Ok(row.into()),
        Ok(None) => Err(ApiError::Unauthorized),
        Err(e) => {
            error!("credential lookup failed: {}", e);
            Err(ApiError::Unauthorized)
        }
    }
}

/// Existence check used by the message rules to validate `posted_by`.
pub fn account_exists(db: &Database, account_id: i64) -> bool {
    match db.account_by_id(account_id) {
        Ok(found) => found.is_some(),
        Err(e) => {
            error!("account lookup failed: {}", e);
            false
        }
    }
}

// -- Handlers --

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = register_account(&state.db, &req)?;
    Ok(Json(account))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = login_account(&state.db, &req)?;
    Ok(Json(account))
}
