// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A command line tool for controlling a gpioblink LED.

use clap::Parser;
use std::process::ExitCode;

mod common;
mod control;
mod interactive;

fn main() -> ExitCode {
    match Opts::try_parse() {
        Ok(opt) => {
            let res = match &opt.cmd {
                Command::Stop => control::stop(&opt.device_opts),
                Command::Start => control::start(&opt.device_opts),
                Command::Period(cfg) => control::period(&opt.device_opts, cfg),
                Command::Interactive => interactive::cmd(&opt.device_opts),
            };
            match res {
                Ok(()) => return ExitCode::SUCCESS,
                Err(e) => common::emit_error(opt.verbose, &e),
            }
        }
        Err(e) => eprintln!("{e}"),
    }
    ExitCode::FAILURE
}

#[derive(Parser)]
#[command(
    name = "gpioblink",
    about = "A utility to control an LED blinking on a Linux GPIO line.",
    version,
    propagate_version = true
)]
struct Opts {
    /// Provide more detailed error messages.
    #[arg(short = 'v', long, global = true, display_order = 800)]
    pub verbose: bool,

    #[command(flatten)]
    device_opts: common::DeviceOpts,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
enum Command {
    /// Stop blinking, leaving the LED in its current state.
    Stop,

    /// Resume blinking at the current period.
    Start,

    /// Set the blink period and resume blinking.
    Period(control::PeriodOpts),

    /// Send commands entered at a prompt.
    #[command(alias("i"))]
    Interactive,
}
