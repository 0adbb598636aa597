// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subscription registry accessor — active SIM slots and the device id.

use xinmei_core::{AccessFault, SubscriptionInfo};

use crate::traits::{ANDROID_ID, DeviceSettings, SubscriptionRegistry};

/// Stateless view over the telephony registry and secure settings.
pub struct SubscriptionRegistryAccessor<'a, B: SubscriptionRegistry + DeviceSettings + ?Sized> {
    device: &'a B,
    unknown_number: &'a str,
}

impl<'a, B: SubscriptionRegistry + DeviceSettings + ?Sized> SubscriptionRegistryAccessor<'a, B> {
    /// `unknown_number` replaces phone numbers the registry does not know.
    pub fn new(device: &'a B, unknown_number: &'a str) -> Self {
        Self {
            device,
            unknown_number,
        }
    }

    /// Active subscriptions in registry order. A registry with no list
    /// yields an empty vector.
    pub fn try_list_sim_subscriptions(&self) -> Result<Vec<SubscriptionInfo>, AccessFault> {
        let records = self.device.active_subscriptions()?.unwrap_or_default();
        Ok(records
            .into_iter()
            .map(|r| SubscriptionInfo::from_record(r, self.unknown_number))
            .collect())
    }

    /// Active subscriptions; empty when the registry cannot be read.
    pub fn list_sim_subscriptions(&self) -> Vec<SubscriptionInfo> {
        match self.try_list_sim_subscriptions() {
            Ok(list) => {
                tracing::debug!(active = list.len(), "active SIM cards");
                for sim in &list {
                    tracing::debug!(
                        slot = sim.slot_index,
                        sub_id = sim.subscription_id,
                        name = %sim.display_name,
                        "SIM details"
                    );
                }
                list
            }
            Err(fault) => {
                tracing::warn!(error = %fault, "reading SIM info failed");
                Vec::new()
            }
        }
    }

    /// The secure `android_id` setting, `None` when unset or unreadable.
    pub fn device_identifier(&self) -> Option<String> {
        match self.device.secure_string(ANDROID_ID) {
            Ok(id) => id,
            Err(fault) => {
                tracing::warn!(error = %fault, "reading device id failed");
                None
            }
        }
    }
}
