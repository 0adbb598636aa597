// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop message store — SQLite file shaped like the Android `sms` table.
//
// Schema (created if absent):
//   sms(
//     _id     INTEGER PRIMARY KEY AUTOINCREMENT,
//     address TEXT,
//     body    TEXT,
//     type    INTEGER NOT NULL DEFAULT 1,   -- MessageBox::type_code
//     sub_id  INTEGER DEFAULT -1,          -- absent on legacy exports
//     date    INTEGER NOT NULL DEFAULT 0   -- epoch millis
//   )
//
// Databases exported from older devices lack `sub_id`; projections silently
// drop columns the table does not have, like `Cursor.getColumnIndex` == -1.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode, params_from_iter};
use tracing::{debug, instrument};
use xinmei_core::{AccessFault, CellValue, Collection, MessageBox, Row, Selection};

use crate::traits::MessageStore;

const CREATE_SMS_TABLE: &str = "CREATE TABLE IF NOT EXISTS sms (
    _id     INTEGER PRIMARY KEY AUTOINCREMENT,
    address TEXT,
    body    TEXT,
    type    INTEGER NOT NULL DEFAULT 1,
    sub_id  INTEGER DEFAULT -1,
    date    INTEGER NOT NULL DEFAULT 0
);";

/// Convert a `rusqlite::Error` into an [`AccessFault`].
fn db_err(e: rusqlite::Error) -> AccessFault {
    match e.sqlite_error_code() {
        Some(
            ErrorCode::PermissionDenied
            | ErrorCode::ReadOnly
            | ErrorCode::AuthorizationForStatementDenied,
        ) => AccessFault::PermissionDenied(e.to_string()),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen) => {
            AccessFault::Unavailable(e.to_string())
        }
        _ => AccessFault::Database(e.to_string()),
    }
}

/// [`MessageStore`] over a local SQLite database.
pub struct SqliteMessageStore {
    conn: Mutex<Connection>,
}

impl SqliteMessageStore {
    /// Open (or create) the message database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AccessFault> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch(CREATE_SMS_TABLE).map_err(db_err)?;
        debug!("message database opened");
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory message database (useful for tests).
    pub fn open_in_memory() -> Result<Self, AccessFault> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_SMS_TABLE).map_err(db_err)?;
        debug!("in-memory message database opened");
        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection whose `sms` table already exists, whatever its
    /// exact column set.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a message and return its `_id`.
    pub fn insert(
        &self,
        message_box: MessageBox,
        address: &str,
        body: &str,
        subscription_id: Option<i32>,
        date_millis: i64,
    ) -> Result<i64, AccessFault> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO sms (address, body, type, sub_id, date) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![address, body, message_box.type_code(), subscription_id, date_millis],
        )
        .map_err(db_err)?;
        Ok(conn.last_insert_rowid())
    }

    /// Total number of stored messages.
    pub fn count(&self) -> Result<u64, AccessFault> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM sms", [], |row| row.get(0))
            .map_err(db_err)
    }
}

/// Columns of the `sms` table, read from the live schema.
fn table_columns(conn: &Connection) -> Result<Vec<String>, AccessFault> {
    let mut stmt = conn.prepare("PRAGMA table_info(sms)").map_err(db_err)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(db_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(db_err)?;
    if names.is_empty() {
        return Err(AccessFault::Unavailable("no sms table in message database".into()));
    }
    Ok(names)
}

/// Where clause restricting a statement to `collection` and `selection`.
fn where_clause(collection: Collection, selection: &Selection) -> String {
    match collection {
        Collection::AllMessages => selection.clause().to_owned(),
        Collection::Inbox => format!(
            "type = {} AND ({})",
            MessageBox::Inbox.type_code(),
            selection.clause()
        ),
    }
}

fn cell(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(v) => CellValue::Integer(v),
        ValueRef::Real(v) => CellValue::Real(v),
        ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => CellValue::Blob(b.to_vec()),
    }
}

impl MessageStore for SqliteMessageStore {
    #[instrument(skip(self), fields(uri = collection.uri()))]
    fn delete(&self, collection: Collection, selection: &Selection) -> Result<u64, AccessFault> {
        let sql = format!("DELETE FROM sms WHERE {}", where_clause(collection, selection));
        let removed = self
            .conn()
            .execute(&sql, params_from_iter(selection.args()))
            .map_err(db_err)?;
        debug!(removed, "sms rows deleted");
        Ok(removed as u64)
    }

    #[instrument(skip(self), fields(uri = collection.uri()))]
    fn query_first(
        &self,
        collection: Collection,
        projection: &[&str],
        selection: &Selection,
    ) -> Result<Option<Row>, AccessFault> {
        let conn = self.conn();
        let available = table_columns(&conn)?;
        // Only columns that exist in the schema reach the SQL text.
        let projected: Vec<&str> = projection
            .iter()
            .copied()
            .filter(|c| available.iter().any(|a| a == c))
            .collect();
        if projected.is_empty() {
            return Err(AccessFault::Database(format!(
                "none of {projection:?} exist in the sms table"
            )));
        }

        let sql = format!(
            "SELECT {} FROM sms WHERE {} LIMIT 1",
            projected.join(", "),
            where_clause(collection, selection)
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let mut rows = stmt.query(params_from_iter(selection.args())).map_err(db_err)?;

        let Some(found) = rows.next().map_err(db_err)? else {
            return Ok(None);
        };
        let mut row = Row::new();
        for (i, column) in projected.iter().enumerate() {
            row.push(*column, cell(found.get_ref(i).map_err(db_err)?));
        }
        Ok(Some(row))
    }
}
