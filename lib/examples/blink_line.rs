// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

// Basic example of blinking a line, speeding up each second, with no
// command socket.

use anyhow::Context;
use gpioblink::{LedPin, ToggleEngine};
use std::result::Result;
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let offset = 22;

    let pin = LedPin::new("/dev/gpiochip0", offset, false, "blink-line")
        .context("Failed to request line")?;
    let engine = ToggleEngine::new(pin, 500)?;
    engine.start()?;

    for period in [250, 100, 50, 20] {
        thread::sleep(Duration::from_secs(1));
        println!("{}: period={}ms", offset, period);
        engine.set_period(period)?;
    }
    thread::sleep(Duration::from_secs(1));
    engine.shutdown().context("Failed to turn off line")?;
    Ok(())
}
