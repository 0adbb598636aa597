// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::types::SubscriptionRecord;

/// Settings shared by every bridge backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Channel serving message-store methods.
    pub sms_channel: String,
    /// Channel serving SIM and device metadata methods.
    pub device_channel: String,
    /// Shown in place of a phone number the carrier did not provision.
    pub unknown_number_placeholder: String,
    /// Backend settings used off-device.
    pub desktop: Option<DesktopConfig>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sms_channel: "com.nmg.xinmeisms/sms".into(),
            device_channel: "com.nmg.xinmeisms/device".into(),
            unknown_number_placeholder: "未知".into(),
            desktop: None,
        }
    }
}

/// Desktop stand-ins for the device's providers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    /// SQLite file laid out like the Android `sms` table.
    pub message_db: Option<PathBuf>,
    /// Value reported as the secure `android_id` setting.
    pub device_id: Option<String>,
    /// Subscriptions reported as active.
    pub subscriptions: Vec<SubscriptionRecord>,
}

impl BridgeConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| BridgeError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "bridge config loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.sms_channel.is_empty() || self.device_channel.is_empty() {
            return Err(BridgeError::Config("channel names must not be empty".into()));
        }
        if self.sms_channel == self.device_channel {
            return Err(BridgeError::Config(format!(
                "sms and device channels must differ (both `{}`)",
                self.sms_channel
            )));
        }
        Ok(())
    }
}
