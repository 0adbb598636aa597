// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Message store accessor — delete by id and sub_id lookup by id.
//
// The `try_*` methods surface every fault. The plain methods are what the
// channel serves: faults and misses collapse to `false` / `-1`.

use xinmei_core::{
    AccessFault, CellValue, Collection, MessageId, Selection, UNKNOWN_SUBSCRIPTION, columns,
};

use crate::traits::MessageStore;

/// Stateless view over a [`MessageStore`].
pub struct MessageStoreAccessor<'a, S: MessageStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: MessageStore + ?Sized> MessageStoreAccessor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Delete every message with this `_id`, in any box.
    /// Returns the number of rows removed.
    pub fn try_delete(&self, id: &MessageId) -> Result<u64, AccessFault> {
        self.store
            .delete(Collection::AllMessages, &Selection::IdEquals(id.clone()))
    }

    /// `true` iff at least one message was removed.
    pub fn delete_message(&self, id: Option<&MessageId>) -> bool {
        let Some(id) = id else {
            tracing::debug!("delete requested without a message id");
            return false;
        };
        match self.try_delete(id) {
            Ok(removed) => {
                tracing::info!(%id, removed, "sms delete finished");
                removed > 0
            }
            Err(fault) => {
                tracing::warn!(%id, error = %fault, "sms delete failed");
                false
            }
        }
    }

    /// Look up the `sub_id` of an inbox message.
    ///
    /// `Ok(None)` when there is no such message, the provider has no `sub_id`
    /// column, or the stored value is null or not an integer.
    pub fn try_subscription_for_message(&self, id: &MessageId) -> Result<Option<i32>, AccessFault> {
        let row = self.store.query_first(
            Collection::Inbox,
            &[columns::ID, columns::SUBSCRIPTION_ID],
            &Selection::IdEquals(id.clone()),
        )?;
        Ok(row
            .as_ref()
            .and_then(|r| r.get(columns::SUBSCRIPTION_ID))
            .and_then(CellValue::as_i64)
            .and_then(|v| i32::try_from(v).ok()))
    }

    /// Subscription id of an inbox message, or [`UNKNOWN_SUBSCRIPTION`].
    pub fn subscription_for_message(&self, id: Option<&MessageId>) -> i32 {
        let Some(id) = id else {
            tracing::debug!("subscription lookup without a message id");
            return UNKNOWN_SUBSCRIPTION;
        };
        match self.try_subscription_for_message(id) {
            Ok(Some(sub_id)) => {
                tracing::debug!(%id, sub_id, "sub_id found");
                sub_id
            }
            Ok(None) => {
                tracing::debug!(%id, "no sub_id found for message");
                UNKNOWN_SUBSCRIPTION
            }
            Err(fault) => {
                tracing::warn!(%id, error = %fault, "sub_id lookup failed");
                UNKNOWN_SUBSCRIPTION
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBridge, StoredMessage};
    use crate::sqlite::SqliteMessageStore;
    use xinmei_core::MessageBox;

    fn id(raw: &str) -> MessageId {
        MessageId::new(raw)
    }

    #[test]
    fn deleting_unknown_id_leaves_store_unchanged() {
        let bridge = MemoryBridge::new();
        bridge.insert_message(1, StoredMessage::inbox(Some(1)));
        let accessor = MessageStoreAccessor::new(&bridge);

        assert!(!accessor.delete_message(Some(&id("2"))));
        assert_eq!(bridge.message_count(), 1);
    }

    #[test]
    fn delete_then_lookup_is_unknown() {
        let bridge = MemoryBridge::new();
        bridge.insert_message(7, StoredMessage::inbox(Some(2)));
        let accessor = MessageStoreAccessor::new(&bridge);

        assert_eq!(accessor.subscription_for_message(Some(&id("7"))), 2);
        assert!(accessor.delete_message(Some(&id("7"))));
        assert_eq!(accessor.subscription_for_message(Some(&id("7"))), UNKNOWN_SUBSCRIPTION);
    }

    #[test]
    fn second_delete_reports_false() {
        let bridge = MemoryBridge::new();
        bridge.insert_message(3, StoredMessage::sent(None));
        let accessor = MessageStoreAccessor::new(&bridge);

        assert!(accessor.delete_message(Some(&id("3"))));
        assert!(!accessor.delete_message(Some(&id("3"))));
    }

    #[test]
    fn missing_id_is_benign() {
        let bridge = MemoryBridge::new();
        bridge.insert_message(1, StoredMessage::inbox(Some(1)));
        let accessor = MessageStoreAccessor::new(&bridge);

        assert!(!accessor.delete_message(None));
        assert_eq!(accessor.subscription_for_message(None), UNKNOWN_SUBSCRIPTION);
        assert_eq!(bridge.message_count(), 1);
    }

    #[test]
    fn faults_collapse_to_defaults_but_stay_visible_in_try() {
        let bridge = MemoryBridge::new();
        bridge.insert_message(1, StoredMessage::inbox(Some(1)));
        bridge.fail_with(Some(AccessFault::PermissionDenied("READ_SMS".into())));
        let accessor = MessageStoreAccessor::new(&bridge);

        assert!(!accessor.delete_message(Some(&id("1"))));
        assert_eq!(accessor.subscription_for_message(Some(&id("1"))), UNKNOWN_SUBSCRIPTION);
        assert!(matches!(
            accessor.try_delete(&id("1")),
            Err(AccessFault::PermissionDenied(_))
        ));

        bridge.fail_with(None);
        assert!(bridge.contains_message(1));
    }

    #[test]
    fn sent_messages_have_no_inbox_subscription() {
        let bridge = MemoryBridge::new();
        bridge.insert_message(4, StoredMessage::sent(Some(1)));
        let accessor = MessageStoreAccessor::new(&bridge);

        assert_eq!(accessor.subscription_for_message(Some(&id("4"))), UNKNOWN_SUBSCRIPTION);
    }

    #[test]
    fn missing_subscription_column_is_unknown() {
        let bridge = MemoryBridge::new().without_subscription_column();
        bridge.insert_message(1, StoredMessage::inbox(Some(1)));
        let accessor = MessageStoreAccessor::new(&bridge);

        assert_eq!(accessor.try_subscription_for_message(&id("1")), Ok(None));
        assert_eq!(accessor.subscription_for_message(Some(&id("1"))), UNKNOWN_SUBSCRIPTION);
    }

    #[test]
    fn provider_sentinel_is_passed_through() {
        let store = SqliteMessageStore::open_in_memory().unwrap();
        let msg = store.insert(MessageBox::Inbox, "10086", "hi", Some(-1), 0).unwrap();
        let other = store.insert(MessageBox::Inbox, "10010", "hi", Some(5), 0).unwrap();
        let accessor = MessageStoreAccessor::new(&store);

        assert_eq!(accessor.try_subscription_for_message(&MessageId::from(msg)), Ok(Some(-1)));
        assert_eq!(accessor.subscription_for_message(Some(&MessageId::from(other))), 5);
    }

    #[test]
    fn null_subscription_is_unknown_not_zero() {
        let store = SqliteMessageStore::open_in_memory().unwrap();
        let msg = store.insert(MessageBox::Inbox, "10086", "hi", None, 0).unwrap();
        let accessor = MessageStoreAccessor::new(&store);

        assert_eq!(accessor.try_subscription_for_message(&MessageId::from(msg)), Ok(None));
        assert_eq!(
            accessor.subscription_for_message(Some(&MessageId::from(msg))),
            UNKNOWN_SUBSCRIPTION
        );
    }

    #[test]
    fn non_numeric_id_is_not_found() {
        let store = SqliteMessageStore::open_in_memory().unwrap();
        store.insert(MessageBox::Inbox, "10086", "hi", Some(1), 0).unwrap();
        let accessor = MessageStoreAccessor::new(&store);

        assert!(!accessor.delete_message(Some(&id("abc"))));
        assert_eq!(accessor.subscription_for_message(Some(&id("abc"))), UNKNOWN_SUBSCRIPTION);
        assert_eq!(store.count().unwrap(), 1);
    }
}
