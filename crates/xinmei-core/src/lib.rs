// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Xinmei — Core types, errors and configuration shared across all crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{BridgeConfig, DesktopConfig};
pub use error::{AccessFault, BridgeError};
pub use types::*;
