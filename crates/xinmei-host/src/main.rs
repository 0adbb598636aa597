// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Xinmei — channel host.
//
// Entry point. Initialises logging, loads the bridge config, builds the
// platform bridge and serves newline-delimited JSON method calls:
//
//   stdin:  {"channel": "com.nmg.xinmeisms/sms", "method": "deleteSms", "arguments": {"id": "12"}}
//   stdout: {"status": "success", "value": true}
//
// Logs go to stderr so stdout carries nothing but replies.

use std::io::{BufRead, Write};
use std::process::ExitCode;

use serde::Serialize;
use xinmei_bridge::dispatch::Envelope;
use xinmei_bridge::{Dispatcher, platform_bridge};
use xinmei_core::BridgeConfig;
use xinmei_core::error::{BridgeError, Result};

/// Reply for a line that is not a valid envelope.
#[derive(Debug, Serialize)]
struct ErrorReply {
    status: &'static str,
    message: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Xinmei bridge host starting");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "host stopped");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => BridgeConfig::from_json_file(path)?,
        None => BridgeConfig::default(),
    };
    let dispatcher = Dispatcher::new(platform_bridge(&config)?, config);

    let stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    serve(&dispatcher, stdin, &mut stdout)
}

/// Answer every non-blank line of `input` with one line on `output`.
///
/// Lines are read as raw bytes so one bad line cannot end the session.
fn serve(dispatcher: &Dispatcher, mut input: impl BufRead, output: &mut impl Write) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let reply = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle_line(dispatcher, line.trim_end_matches(['\n', '\r']))?,
            Err(e) => {
                tracing::warn!(error = %e, "rejected input line");
                error_reply(format!("input line is not valid UTF-8: {e}"))?
            }
        };
        writeln!(output, "{reply}")?;
        output.flush()?;
    }
}

fn handle_line(dispatcher: &Dispatcher, line: &str) -> Result<String> {
    match serde_json::from_str::<Envelope>(line) {
        Ok(envelope) => Ok(serde_json::to_string(&dispatcher.handle_envelope(&envelope))?),
        Err(e) => {
            let err = BridgeError::InvalidEnvelope(e);
            tracing::warn!(error = %err, "rejected input line");
            error_reply(err.to_string())
        }
    }
}

fn error_reply(message: String) -> Result<String> {
    Ok(serde_json::to_string(&ErrorReply {
        status: "error",
        message,
    })?)
}
