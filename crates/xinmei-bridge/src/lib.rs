// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Xinmei — native platform bridge.
//!
//! The application shell sends named method calls over two channels. The
//! [`dispatch::Dispatcher`] routes them to the message-store and
//! subscription-registry accessors, which talk to the device through the
//! capability traits in [`traits`]. On Android those traits are backed by
//! JNI calls into the ART runtime; elsewhere by SQLite, static config or a
//! stub that reports every capability as unavailable.

pub mod desktop;
pub mod dispatch;
pub mod memory;
pub mod messages;
pub mod sqlite;
pub mod subscriptions;
pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod stub;

pub use dispatch::{Channel, Dispatcher, MethodCall, MethodResult, Operation, Outcome};

use xinmei_core::BridgeConfig;
use xinmei_core::error::Result;

/// Build the bridge for the target operating system.
///
/// On Android this is the JNI bridge. Off-device a `desktop` section in the
/// config selects the SQLite/static backend; without one every capability
/// reports `PlatformUnavailable`.
pub fn platform_bridge(config: &BridgeConfig) -> Result<Box<dyn traits::PlatformBridge>> {
    #[cfg(target_os = "android")]
    {
        let _ = config;
        Ok(Box::new(android::AndroidBridge::new()))
    }
    #[cfg(not(target_os = "android"))]
    {
        match &config.desktop {
            Some(desktop) => Ok(Box::new(desktop::DesktopBridge::open(desktop)?)),
            None => Ok(Box::new(stub::StubBridge)),
        }
    }
}
