// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A daemon blinking an LED on a GPIO line, under the control of clients
//! connected to its socket.

use anyhow::{Context, Result};
use daemonize::Daemonize;
use gpioblink::Device;
use std::fs::File;
use std::process::ExitCode;

mod config;
use config::{Opts, Parsed};

fn main() -> ExitCode {
    let opts = match config::parse_args(std::env::args_os().skip(1)) {
        Ok(Parsed::Run(opts)) => opts,
        Ok(Parsed::Help(usage)) => {
            print!("{usage}");
            return ExitCode::SUCCESS;
        }
        Ok(Parsed::Version) => {
            println!("gpioblinkd {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = detach(&opts) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }
    let level = if opts.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

// must precede spawning any threads
fn detach(opts: &Opts) -> Result<()> {
    if !opts.daemonize {
        return Ok(());
    }
    let mut d = Daemonize::new();
    if let Some(pid_file) = &opts.pid_file {
        d = d.pid_file(pid_file);
    }
    if let Some(log_file) = &opts.log_file {
        let f = File::create(log_file)
            .with_context(|| format!("unable to create {}", log_file.display()))?;
        d = d.stderr(f);
    }
    d.start().context("unable to daemonize")?;
    Ok(())
}

fn run(opts: &Opts) -> Result<()> {
    let mut dev = Device::open(&opts.config)
        .with_context(|| format!("unable to open LED on line {}", opts.config.line))?;
    let handle = dev.shutdown_handle();
    ctrlc::set_handler(move || {
        log::info!("shutdown requested");
        if let Err(e) = handle.shutdown() {
            log::error!("unable to stop serving: {}", e);
        }
    })
    .context("unable to install signal handler")?;
    let res = dev.serve().context("unable to serve clients");
    dev.close().context("unable to turn off LED")?;
    res
}
