// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic capability traits for the device's providers.
//
// The accessors depend only on these traits. Every method reports failures
// as `AccessFault`; deciding what the caller sees is the accessor's job.

use xinmei_core::{AccessFault, Collection, Row, Selection, SubscriptionRecord};

/// Unified bridge that groups every native capability the channels need.
pub trait PlatformBridge: MessageStore + SubscriptionRegistry + DeviceSettings {
    /// Human-readable platform name (e.g. "Android", "Desktop (SQLite)").
    fn platform_name(&self) -> &str;
}

/// The system-managed SMS provider.
pub trait MessageStore {
    /// Delete every row of `collection` matching `selection`.
    /// Returns the number of rows the provider reports as removed.
    fn delete(&self, collection: Collection, selection: &Selection) -> Result<u64, AccessFault>;

    /// Read the first row of `collection` matching `selection`, restricted to
    /// `projection`. Columns the provider does not have are left out of the
    /// returned row. Any cursor is closed before this returns.
    fn query_first(
        &self,
        collection: Collection,
        projection: &[&str],
        selection: &Selection,
    ) -> Result<Option<Row>, AccessFault>;
}

/// The telephony subscription registry.
pub trait SubscriptionRegistry {
    /// Currently active SIM subscriptions. `Ok(None)` when the registry has
    /// no list to give (Android returns `null` with no SIM inserted).
    fn active_subscriptions(&self) -> Result<Option<Vec<SubscriptionRecord>>, AccessFault>;
}

/// Key used by `Settings.Secure` for the per-device identifier.
pub const ANDROID_ID: &str = "android_id";

/// Device-level persistent settings.
pub trait DeviceSettings {
    /// Read a secure setting. `Ok(None)` if it is unset.
    fn secure_string(&self, key: &str) -> Result<Option<String>, AccessFault>;
}
