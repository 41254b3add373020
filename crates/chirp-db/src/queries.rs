use crate::Database;
use crate::models::{AccountRow, MessageRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

impl Database {
    // -- Accounts --

    pub fn all_accounts(&self) -> Result<Vec<AccountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT account_id, username, password FROM account")?;
            let rows = stmt
                .query_map([], map_account)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn insert_account(&self, username: &str, password: &str) -> Result<AccountRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO account (username, password) VALUES (?1, ?2)",
                params![username, password],
            )?;
            Ok(AccountRow {
                account_id: conn.last_insert_rowid(),
                username: username.to_string(),
                password: password.to_string(),
            })
        })
    }

    pub fn account_by_id(&self, account_id: i64) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account_by_id(conn, account_id))
    }

    pub fn account_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT account_id, username, password FROM account
                 WHERE username = ?1 AND password = ?2",
            )?;
            let row = stmt
                .query_row(params![username, password], map_account)
                .optional()?;
            Ok(row)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        posted_by: i64,
        message_text: &str,
        time_posted_epoch: i64,
    ) -> Result<MessageRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO message (posted_by, message_text, time_posted_epoch)
                 VALUES (?1, ?2, ?3)",
                params![posted_by, message_text, time_posted_epoch],
            )?;
            Ok(MessageRow {
                message_id: conn.last_insert_rowid(),
                posted_by,
                message_text: message_text.to_string(),
                time_posted_epoch,
            })
        })
    }

    pub fn all_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, posted_by, message_text, time_posted_epoch FROM message",
            )?;
            let rows = stmt
                .query_map([], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn message_by_id(&self, message_id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message_by_id(conn, message_id))
    }

    pub fn messages_by_account(&self, account_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, posted_by, message_text, time_posted_epoch FROM message
                 WHERE posted_by = ?1",
            )?;
            let rows = stmt
                .query_map([account_id], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns the number of rows changed (0 when no such message).
    pub fn update_message_text(&self, message_id: i64, message_text: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE message SET message_text = ?1 WHERE message_id = ?2",
                params![message_text, message_id],
            )?;
            Ok(changed)
        })
    }

    /// Returns the number of rows changed (0 when no such message).
    pub fn delete_message(&self, message_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM message WHERE message_id = ?1", [message_id])?;
            Ok(changed)
        })
    }
}

fn query_account_by_id(conn: &Connection, account_id: i64) -> Result<Option<AccountRow>> {
    let mut stmt = conn
        .prepare("SELECT account_id, username, password FROM account WHERE account_id = ?1")?;

    let row = stmt.query_row([account_id], map_account).optional()?;

    Ok(row)
}

fn query_message_by_id(conn: &Connection, message_id: i64) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT message_id, posted_by, message_text, time_posted_epoch FROM message
         WHERE message_id = ?1",
    )?;

    let row = stmt.query_row([message_id], map_message).optional()?;

    Ok(row)
}

fn map_account(row: &Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        account_id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
    })
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        message_id: row.get(0)?,
        posted_by: row.get(1)?,
        message_text: row.get(2)?,
        time_posted_epoch: row.get(3)?,
    })
}
