//! Database row types that map directly to SQLite rows.
//! Distinct from the chirp-types API models to keep the DB layer independent.

use chirp_types::models::{Account, Message};

pub struct AccountRow {
    pub account_id: i64,
    pub username: String,
    pub password: String,
}

pub struct MessageRow {
    pub message_id: i64,
    pub posted_by: i64,
    pub message_text: String,
    pub time_posted_epoch: i64,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            account_id: row.account_id,
            username: row.username,
            password: row.password,
        }
    }
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            message_id: row.message_id,
            posted_by: row.posted_by,
            message_text: row.message_text,
            time_posted_epoch: row.time_posted_epoch,
        }
    }
}
