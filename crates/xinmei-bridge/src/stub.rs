// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where no device providers exist.
//
// Every capability returns `PlatformUnavailable`; the accessors turn that
// into their safe defaults, so the channels still answer.

use xinmei_core::{AccessFault, Collection, Row, Selection, SubscriptionRecord};

use crate::traits::*;

/// No-op bridge returned off-device when no desktop backend is configured.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl MessageStore for StubBridge {
    fn delete(&self, _collection: Collection, _selection: &Selection) -> Result<u64, AccessFault> {
        tracing::warn!("MessageStore::delete called on stub bridge");
        Err(AccessFault::PlatformUnavailable)
    }

    fn query_first(
        &self,
        _collection: Collection,
        _projection: &[&str],
        _selection: &Selection,
    ) -> Result<Option<Row>, AccessFault> {
        tracing::warn!("MessageStore::query_first called on stub bridge");
        Err(AccessFault::PlatformUnavailable)
    }
}

impl SubscriptionRegistry for StubBridge {
    fn active_subscriptions(&self) -> Result<Option<Vec<SubscriptionRecord>>, AccessFault> {
        tracing::warn!("SubscriptionRegistry::active_subscriptions called on stub bridge");
        Err(AccessFault::PlatformUnavailable)
    }
}

impl DeviceSettings for StubBridge {
    fn secure_string(&self, _key: &str) -> Result<Option<String>, AccessFault> {
        Err(AccessFault::PlatformUnavailable)
    }
}
