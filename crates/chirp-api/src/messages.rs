use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use chirp_db::Database;
use chirp_types::api::{CreateMessageRequest, UpdateMessageRequest};
use chirp_types::models::Message;

use crate::accounts::{AppState, account_exists};
use crate::error::ApiError;

/// Longest message text accepted, counted in characters.
pub const MAX_MESSAGE_LEN: usize = 255;

// -- Rules --

/// A new message needs non-blank text of at most [`MAX_MESSAGE_LEN`]
/// characters and a `posted_by` naming an existing account.
pub fn create_message(db: &Database, req: &CreateMessageRequest) -> Result<Message, ApiError> {
    validate_text(&req.message_text)?;
    if !account_exists(db, req.posted_by) {
        return Err(ApiError::Rejected("posted_by does not name an account"));
    }

    match db.insert_message(req.posted_by, &req.message_text, req.time_posted_epoch) {
        Ok(row) => Ok(row.into()),
        Err(e) => {
            error!("message insert failed: {}", e);
            Err(ApiError::Rejected("message insert failed"))
        }
    }
}

pub fn all_messages(db: &Database) -> Vec<Message> {
    match db.all_messages() {
        Ok(rows) => rows.into_iter().map(Into::into).collect(),
        Err(e) => {
            error!("message scan failed: {}", e);
            Vec::new()
        }
    }
}

pub fn message_by_id(db: &Database, message_id: i64) -> Option<Message> {
    match db.message_by_id(message_id) {
        Ok(row) => row.map(Into::into),
        Err(e) => {
            error!("message lookup failed: {}", e);
            None
        }
    }
}

pub fn messages_by_account(db: &Database, account_id: i64) -> Vec<Message> {
    match db.messages_by_account(account_id) {
        Ok(rows) => rows.into_iter().map(Into::into).collect(),
        Err(e) => {
            error!("message scan failed: {}", e);
            Vec::new()
        }
    }
}

/// Updates only the text column. The id, poster, and timestamp of the
/// stored message are untouched and echoed back in the result.
pub fn update_message(
    db: &Database,
    message_id: i64,
    req: &UpdateMessageRequest,
) -> Result<Message, ApiError> {
    let existing =
        message_by_id(db, message_id).ok_or(ApiError::Rejected("no message with that id"))?;
    validate_text(&req.message_text)?;

    match db.update_message_text(message_id, &req.message_text) {
        Ok(_) => Ok(Message {
            message_text: req.message_text.clone(),
            ..existing
        }),
        Err(e) => {
            error!("message update failed: {}", e);
            Err(ApiError::Rejected("message update failed"))
        }
    }
}

/// Idempotent delete. The record is fetched first so the response can
/// echo what was removed; a missing id is not an error.
pub fn delete_message(db: &Database, message_id: i64) -> Option<Message> {
    let existing = message_by_id(db, message_id)?;
    match db.delete_message(message_id) {
        Ok(_) => Some(existing),
        Err(e) => {
            error!("message delete failed: {}", e);
            None
        }
    }
}

fn validate_text(text: &str) -> Result<(), ApiError> {
    if text.is_empty() {
        return Err(ApiError::Rejected("message text must not be blank"));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(ApiError::Rejected("message text over 255 characters"));
    }
    Ok(())
}

// -- Handlers --

/// Absent rows answer 200 with an empty body, never 404.
fn json_or_empty<T: Serialize>(value: Option<T>) -> Response {
    match value {
        Some(v) => Json(v).into_response(),
        None => ().into_response(),
    }
}

pub async fn post_message(
    State(state): State<AppState>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Run blocking DB work off the async runtime
    let db = state.clone();
    let message = tokio::task::spawn_blocking(move || create_message(&db.db, &req))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })??;

    Ok(Json(message))
}

pub async fn list_messages(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let messages = tokio::task::spawn_blocking(move || all_messages(&db.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(messages))
}

pub async fn get_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
) -> Result<Response, ApiError> {
    let db = state.clone();
    let found = tokio::task::spawn_blocking(move || message_by_id(&db.db, message_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?;

    Ok(json_or_empty(found))
}

pub async fn remove_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
) -> Result<Response, ApiError> {
    let db = state.clone();
    let removed = tokio::task::spawn_blocking(move || delete_message(&db.db, message_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?;

    Ok(json_or_empty(removed))
}

pub async fn patch_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Json(req): Json<UpdateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let updated = tokio::task::spawn_blocking(move || update_message(&db.db, message_id, &req))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })??;

    Ok(Json(updated))
}

pub async fn list_account_messages(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let messages = tokio::task::spawn_blocking(move || messages_by_account(&db.db, account_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(messages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::register_account;
    use chirp_types::api::RegisterRequest;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn db_with_account() -> (Database, i64) {
        let db = test_db();
        let account = register_account(
            &db,
            &RegisterRequest {
                username: "alice".into(),
                password: "pw12".into(),
            },
        )
        .unwrap();
        (db, account.account_id)
    }

    fn create_req(posted_by: i64, text: &str) -> CreateMessageRequest {
        CreateMessageRequest {
            posted_by,
            message_text: text.into(),
            time_posted_epoch: 1,
        }
    }

    fn update_req(text: &str) -> UpdateMessageRequest {
        UpdateMessageRequest {
            message_text: text.into(),
        }
    }

    #[test]
    fn create_rejects_blank_text() {
        let (db, poster) = db_with_account();
        let result = create_message(&db, &create_req(poster, ""));
        assert!(matches!(result, Err(ApiError::Rejected(_))));
    }

    #[test]
    fn create_rejects_text_over_255_chars() {
        let (db, poster) = db_with_account();
        let result = create_message(&db, &create_req(poster, &"x".repeat(256)));
        assert!(matches!(result, Err(ApiError::Rejected(_))));
    }

    #[test]
    fn create_accepts_text_of_exactly_255_chars() {
        let (db, poster) = db_with_account();
        let message = create_message(&db, &create_req(poster, &"x".repeat(255))).unwrap();
        assert_eq!(message.message_text.len(), 255);
    }

    #[test]
    fn create_rejects_unknown_poster() {
        let db = test_db();
        let result = create_message(&db, &create_req(999, "hi"));
        assert!(matches!(result, Err(ApiError::Rejected(_))));
    }

    #[test]
    fn create_returns_stored_record_with_id() {
        let (db, poster) = db_with_account();
        let message = create_message(&db, &create_req(poster, "hello")).unwrap();

        assert_eq!(message.message_id, 1);
        assert_eq!(message.posted_by, poster);
        assert_eq!(message.message_text, "hello");
        assert_eq!(message.time_posted_epoch, 1);
    }

    #[test]
    fn lookup_by_id_and_by_account() {
        let (db, poster) = db_with_account();
        let message = create_message(&db, &create_req(poster, "hello")).unwrap();

        let found = message_by_id(&db, message.message_id).unwrap();
        assert_eq!(found.message_text, "hello");
        assert!(message_by_id(&db, 999).is_none());

        assert_eq!(messages_by_account(&db, poster).len(), 1);
        assert!(messages_by_account(&db, 999).is_empty());
        assert_eq!(all_messages(&db).len(), 1);
    }

    #[test]
    fn update_preserves_identity_and_replaces_text() {
        let (db, poster) = db_with_account();
        let message = create_message(&db, &create_req(poster, "hello")).unwrap();

        let updated = update_message(&db, message.message_id, &update_req("edited")).unwrap();
        assert_eq!(updated.message_id, message.message_id);
        assert_eq!(updated.posted_by, poster);
        assert_eq!(updated.time_posted_epoch, message.time_posted_epoch);
        assert_eq!(updated.message_text, "edited");

        let stored = message_by_id(&db, message.message_id).unwrap();
        assert_eq!(stored.message_text, "edited");
    }

    #[test]
    fn update_rejects_missing_id() {
        let db = test_db();
        let result = update_message(&db, 999, &update_req("edited"));
        assert!(matches!(result, Err(ApiError::Rejected(_))));
    }

    #[test]
    fn update_rejects_invalid_text() {
        let (db, poster) = db_with_account();
        let message = create_message(&db, &create_req(poster, "hello")).unwrap();

        let blank = update_message(&db, message.message_id, &update_req(""));
        assert!(matches!(blank, Err(ApiError::Rejected(_))));

        let long = update_message(&db, message.message_id, &update_req(&"x".repeat(256)));
        assert!(matches!(long, Err(ApiError::Rejected(_))));

        let stored = message_by_id(&db, message.message_id).unwrap();
        assert_eq!(stored.message_text, "hello");
    }

    #[test]
    fn delete_is_idempotent() {
        let (db, poster) = db_with_account();
        let message = create_message(&db, &create_req(poster, "hello")).unwrap();

        let removed = delete_message(&db, message.message_id).unwrap();
        assert_eq!(removed.message_text, "hello");

        assert!(delete_message(&db, message.message_id).is_none());
        assert!(delete_message(&db, message.message_id).is_none());
    }
}
