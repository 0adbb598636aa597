// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the Xinmei bridge.

use thiserror::Error;

/// A failure reaching the device's message store, telephony registry or
/// settings provider.
///
/// Accessors never let these escape to the caller: they are logged and
/// downgraded to the documented default (`false`, `-1`, empty list).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessFault {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("malformed message identifier: {0}")]
    MalformedIdentifier(String),

    #[error("message database error: {0}")]
    Database(String),

    #[error("platform call failed: {0}")]
    Platform(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Top-level error type for everything outside the accessor boundary.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("method `{method}` not implemented on channel `{channel}`")]
    NotImplemented { channel: String, method: String },

    #[error("invalid method call envelope: {0}")]
    InvalidEnvelope(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Access(#[from] AccessFault),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;
