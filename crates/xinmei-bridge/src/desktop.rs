// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop bridge — SQLite message store plus SIM/device values from config.

use xinmei_core::{AccessFault, Collection, DesktopConfig, Row, Selection, SubscriptionRecord};

use crate::sqlite::SqliteMessageStore;
use crate::traits::*;

/// Off-device bridge driven by [`DesktopConfig`].
///
/// Without a `message_db` the message capabilities report
/// `PlatformUnavailable`, exactly like the stub.
pub struct DesktopBridge {
    messages: Option<SqliteMessageStore>,
    subscriptions: Vec<SubscriptionRecord>,
    device_id: Option<String>,
}

impl DesktopBridge {
    pub fn open(config: &DesktopConfig) -> Result<Self, AccessFault> {
        let messages = config
            .message_db
            .as_ref()
            .map(|path| SqliteMessageStore::open(path))
            .transpose()?;
        tracing::info!(
            message_db = ?config.message_db,
            subscriptions = config.subscriptions.len(),
            "desktop bridge ready"
        );
        Ok(Self {
            messages,
            subscriptions: config.subscriptions.clone(),
            device_id: config.device_id.clone(),
        })
    }

    fn store(&self) -> Result<&SqliteMessageStore, AccessFault> {
        self.messages.as_ref().ok_or(AccessFault::PlatformUnavailable)
    }
}

impl PlatformBridge for DesktopBridge {
    fn platform_name(&self) -> &str {
        "Desktop (SQLite)"
    }
}

impl MessageStore for DesktopBridge {
    fn delete(&self, collection: Collection, selection: &Selection) -> Result<u64, AccessFault> {
        self.store()?.delete(collection, selection)
    }

    fn query_first(
        &self,
        collection: Collection,
        projection: &[&str],
        selection: &Selection,
    ) -> Result<Option<Row>, AccessFault> {
        self.store()?.query_first(collection, projection, selection)
    }
}

impl SubscriptionRegistry for DesktopBridge {
    fn active_subscriptions(&self) -> Result<Option<Vec<SubscriptionRecord>>, AccessFault> {
        Ok(Some(self.subscriptions.clone()))
    }
}

impl DeviceSettings for DesktopBridge {
    fn secure_string(&self, key: &str) -> Result<Option<String>, AccessFault> {
        Ok(match key {
            ANDROID_ID => self.device_id.clone(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xinmei_core::MessageId;

    #[test]
    fn no_database_means_unavailable_store() {
        let bridge = DesktopBridge::open(&DesktopConfig::default()).unwrap();
        let sel = Selection::IdEquals(MessageId::from(1));
        assert_eq!(
            bridge.delete(Collection::AllMessages, &sel),
            Err(AccessFault::PlatformUnavailable)
        );
        assert_eq!(bridge.active_subscriptions(), Ok(Some(Vec::new())));
    }

    #[test]
    fn device_id_only_answers_android_id() {
        let bridge = DesktopBridge::open(&DesktopConfig {
            device_id: Some("9774d56d682e549c".into()),
            ..DesktopConfig::default()
        })
        .unwrap();
        assert_eq!(
            bridge.secure_string(ANDROID_ID).unwrap().as_deref(),
            Some("9774d56d682e549c")
        );
        assert_eq!(bridge.secure_string("bluetooth_name").unwrap(), None);
    }

    #[test]
    fn opens_configured_database() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = DesktopBridge::open(&DesktopConfig {
            message_db: Some(dir.path().join("sms.db")),
            ..DesktopConfig::default()
        })
        .unwrap();
        assert_eq!(bridge.platform_name(), "Desktop (SQLite)");
        let sel = Selection::IdEquals(MessageId::from(1));
        assert_eq!(bridge.delete(Collection::AllMessages, &sel), Ok(0));
    }
}
