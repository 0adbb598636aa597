// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Xinmei bridge.

use serde::{Deserialize, Serialize};

/// Returned by the subscription lookup when the message or its `sub_id`
/// cannot be determined.
pub const UNKNOWN_SUBSCRIPTION: i32 = -1;

/// Identifier of a row in the system message store.
///
/// Android exposes `_id` as an integer column, but callers hand it over as a
/// string token, so it is kept as text and bound as a selection argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which box a message lives in. Values match the `type` column of the
/// Android `sms` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageBox {
    Inbox,
    Sent,
    Draft,
    Outbox,
    Failed,
    Queued,
}

impl MessageBox {
    /// `Telephony.TextBasedSmsColumns.MESSAGE_TYPE_*` value.
    pub fn type_code(&self) -> i32 {
        match self {
            Self::Inbox => 1,
            Self::Sent => 2,
            Self::Draft => 3,
            Self::Outbox => 4,
            Self::Failed => 5,
            Self::Queued => 6,
        }
    }
}

/// A collection exposed by the message provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Every SMS regardless of box (`content://sms`).
    AllMessages,
    /// Only received messages (`content://sms/inbox`).
    Inbox,
}

impl Collection {
    /// Content URI of this collection.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::AllMessages => "content://sms",
            Self::Inbox => "content://sms/inbox",
        }
    }

    /// Whether a record in `message_box` belongs to this collection.
    pub fn contains(&self, message_box: MessageBox) -> bool {
        match self {
            Self::AllMessages => true,
            Self::Inbox => message_box == MessageBox::Inbox,
        }
    }
}

/// Row filter handed to the message provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// `_id = ?`
    IdEquals(MessageId),
}

impl Selection {
    /// SQL-style where clause with `?` placeholders.
    pub fn clause(&self) -> &'static str {
        match self {
            Self::IdEquals(_) => "_id = ?",
        }
    }

    /// Positional arguments bound to the placeholders of [`Self::clause`].
    pub fn args(&self) -> Vec<&str> {
        match self {
            Self::IdEquals(id) => vec![id.as_str()],
        }
    }
}

/// Well-known column names of the `sms` provider.
pub mod columns {
    pub const ID: &str = "_id";
    pub const SUBSCRIPTION_ID: &str = "sub_id";
    pub const ADDRESS: &str = "address";
    pub const BODY: &str = "body";
    pub const TYPE: &str = "type";
}

/// One cell read back from a provider cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    /// Integer view of the cell, following SQLite's loose typing for text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Real(v) => Some(*v as i64),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null | Self::Blob(_) => None,
        }
    }
}

/// A single projected row. Columns requested but missing from the provider
/// schema are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.push((column.into(), value));
    }

    pub fn with(mut self, column: impl Into<String>, value: CellValue) -> Self {
        self.push(column, value);
        self
    }

    /// Position of `column` in the row, like `Cursor.getColumnIndex`.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.cells.iter().position(|(name, _)| name == column)
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.column_index(column).map(|i| &self.cells[i].1)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Raw subscription entry as reported by the telephony registry, before
/// placeholders are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub slot_index: i32,
    pub subscription_id: i32,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// One active SIM slot, as returned to the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    pub slot_index: i32,
    pub subscription_id: i32,
    pub number: String,
    pub display_name: String,
}

impl SubscriptionInfo {
    /// Build from a registry record, filling in the unknown-number
    /// placeholder and the `SIM{slot+1}` label where the registry is silent.
    pub fn from_record(record: SubscriptionRecord, unknown_number: &str) -> Self {
        let display_name = record
            .display_name
            .unwrap_or_else(|| default_display_name(record.slot_index));
        Self {
            slot_index: record.slot_index,
            subscription_id: record.subscription_id,
            number: record.number.unwrap_or_else(|| unknown_number.to_owned()),
            display_name,
        }
    }
}

/// Label used for a SIM slot without a carrier-provided display name.
pub fn default_display_name(slot_index: i32) -> String {
    format!("SIM{}", slot_index + 1)
}
