// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory bridge used by tests and benches.
//
// Holds a fixed message table, subscription list and settings map, and can
// be told to fail every call with a given fault.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use xinmei_core::{
    AccessFault, CellValue, Collection, MessageBox, Row, Selection, SubscriptionRecord, columns,
};

use crate::traits::*;

/// A message held by [`MemoryBridge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub message_box: MessageBox,
    pub subscription_id: Option<i32>,
    pub address: String,
    pub body: String,
}

impl StoredMessage {
    pub fn inbox(subscription_id: Option<i32>) -> Self {
        Self {
            message_box: MessageBox::Inbox,
            subscription_id,
            address: "10086".into(),
            body: String::new(),
        }
    }

    pub fn sent(subscription_id: Option<i32>) -> Self {
        Self {
            message_box: MessageBox::Sent,
            ..Self::inbox(subscription_id)
        }
    }
}

#[derive(Default)]
struct State {
    messages: BTreeMap<i64, StoredMessage>,
    subscriptions: Option<Vec<SubscriptionRecord>>,
    settings: HashMap<String, String>,
    fault: Option<AccessFault>,
    /// Whether the message table carries a `sub_id` column.
    has_subscription_column: bool,
}

/// In-memory [`PlatformBridge`].
pub struct MemoryBridge {
    state: Mutex<State>,
}

impl Default for MemoryBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                has_subscription_column: true,
                ..State::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panicking test thread must not poison the fake for the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert_message(&self, id: i64, message: StoredMessage) {
        self.lock().messages.insert(id, message);
    }

    pub fn set_subscriptions(&self, subscriptions: Option<Vec<SubscriptionRecord>>) {
        self.lock().subscriptions = subscriptions;
    }

    pub fn set_setting(&self, key: &str, value: &str) {
        self.lock().settings.insert(key.to_owned(), value.to_owned());
    }

    /// Make every subsequent call fail with `fault` (or succeed again with `None`).
    pub fn fail_with(&self, fault: Option<AccessFault>) {
        self.lock().fault = fault;
    }

    /// Drop the `sub_id` column, as on providers that predate multi-SIM.
    pub fn without_subscription_column(self) -> Self {
        self.lock().has_subscription_column = false;
        self
    }

    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn contains_message(&self, id: i64) -> bool {
        self.lock().messages.contains_key(&id)
    }
}

/// Provider-style id matching: the bound argument is compared numerically.
fn selects(selection: &Selection, id: i64) -> bool {
    match selection {
        Selection::IdEquals(wanted) => wanted.as_str().trim().parse::<i64>() == Ok(id),
    }
}

impl PlatformBridge for MemoryBridge {
    fn platform_name(&self) -> &str {
        "In-memory"
    }
}

impl MessageStore for MemoryBridge {
    fn delete(&self, collection: Collection, selection: &Selection) -> Result<u64, AccessFault> {
        let mut state = self.lock();
        if let Some(fault) = &state.fault {
            return Err(fault.clone());
        }
        let before = state.messages.len();
        state
            .messages
            .retain(|id, msg| !(collection.contains(msg.message_box) && selects(selection, *id)));
        Ok((before - state.messages.len()) as u64)
    }

    fn query_first(
        &self,
        collection: Collection,
        projection: &[&str],
        selection: &Selection,
    ) -> Result<Option<Row>, AccessFault> {
        let state = self.lock();
        if let Some(fault) = &state.fault {
            return Err(fault.clone());
        }
        let Some((id, msg)) = state
            .messages
            .iter()
            .find(|(id, msg)| collection.contains(msg.message_box) && selects(selection, **id))
        else {
            return Ok(None);
        };

        let mut row = Row::new();
        for column in projection {
            let value = match *column {
                columns::ID => CellValue::Integer(*id),
                columns::SUBSCRIPTION_ID if state.has_subscription_column => msg
                    .subscription_id
                    .map_or(CellValue::Null, |v| CellValue::Integer(v.into())),
                columns::ADDRESS => CellValue::Text(msg.address.clone()),
                columns::BODY => CellValue::Text(msg.body.clone()),
                columns::TYPE => CellValue::Integer(msg.message_box.type_code().into()),
                _ => continue,
            };
            row.push(*column, value);
        }
        Ok(Some(row))
    }
}

impl SubscriptionRegistry for MemoryBridge {
    fn active_subscriptions(&self) -> Result<Option<Vec<SubscriptionRecord>>, AccessFault> {
        let state = self.lock();
        match &state.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(state.subscriptions.clone()),
        }
    }
}

impl DeviceSettings for MemoryBridge {
    fn secure_string(&self, key: &str) -> Result<Option<String>, AccessFault> {
        let state = self.lock();
        match &state.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(state.settings.get(key).cloned()),
        }
    }
}
