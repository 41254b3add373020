use serde::{Deserialize, Serialize};

/// A registered user. Accounts are immutable once created and are never
/// deleted, so `account_id` stays a valid message foreign key forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: i64,
    pub username: String,
    pub password: String,
}

/// A short text post owned by one account. `time_posted_epoch` is
/// caller-supplied and stored opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub posted_by: i64,
    pub message_text: String,
    pub time_posted_epoch: i64,
}
