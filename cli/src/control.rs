// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{self, DeviceOpts};
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Debug, Parser)]
pub struct PeriodOpts {
    /// The time between toggles of the LED, in milliseconds.
    ///
    /// A zero period toggles the LED as quickly as the device can.
    #[arg(
        name = "ms",
        value_parser = common::parse_period,
        allow_negative_numbers = true
    )]
    period: i32,
}

pub fn stop(opts: &DeviceOpts) -> Result<()> {
    opts.connect()?.stop().context("unable to stop")
}

pub fn start(opts: &DeviceOpts) -> Result<()> {
    opts.connect()?.start().context("unable to start")
}

pub fn period(opts: &DeviceOpts, period_opts: &PeriodOpts) -> Result<()> {
    opts.connect()?
        .set_period(period_opts.period)
        .with_context(|| format!("unable to set period to {}ms", period_opts.period))
}
