// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use anyhow::{Context, Result};
use clap::Parser;
use gpioblink_uapi::Client;
use std::path::PathBuf;
use std::time::Duration;

// long enough for the device to finish an in-flight toggle
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
pub struct DeviceOpts {
    /// The socket of the device to control.
    #[arg(
        short,
        long,
        global = true,
        value_name = "path",
        env = "GPIOBLINK_DEVICE",
        default_value = gpioblink_uapi::DEFAULT_PATH
    )]
    pub device: PathBuf,
}

impl DeviceOpts {
    pub fn connect(&self) -> Result<Client> {
        Client::connect(&self.device)
            .and_then(|c| c.with_timeout(REPLY_TIMEOUT))
            .with_context(|| format!("unable to connect to {}", self.device.display()))
    }
}

pub fn emit_error(verbose: bool, e: &anyhow::Error) {
    eprintln!("{}", format_error(verbose, e));
}

pub fn format_error(verbose: bool, e: &anyhow::Error) -> String {
    if verbose {
        format!("{e:#}")
    } else {
        format!("{e}")
    }
}

/// Parse a period in milliseconds.
///
/// Negative periods are accepted here so the device can reject them.
pub fn parse_period(s: &str) -> std::result::Result<i32, ParsePeriodError> {
    let t = s.trim();
    let t = t.strip_suffix("ms").unwrap_or(t);
    t.parse::<i32>()
        .map_err(|_| ParsePeriodError(s.to_string()))
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid period '{0}', expected milliseconds")]
pub struct ParsePeriodError(String);
