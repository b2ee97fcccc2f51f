// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::device::Config;
use crate::{Error, Result};
use embedded_hal::digital::PinState;
use gpiocdev::line::{Offset, Value};
use gpiocdev::Request;
use std::path::PathBuf;

/// Provides [`embedded_hal::digital::OutputPin`] for the GPIO line driving
/// the LED.
///
/// The pin works in logical levels, so high is LED on, irrespective of the
/// polarity of the line.  Active-low LEDs are handled by requesting the
/// line as active-low.
///
/// The line is requested as an output at the low (off) level, and is held
/// for the lifetime of the [`LedPin`].  Dropping the [`LedPin`] releases the
/// line, after which its level is indeterminate, so set it low first.
#[derive(Debug)]
pub struct LedPin {
    req: Request,
    offset: Offset,
    value: Value,
}

impl LedPin {
    /// Request the line for the given `offset` on the given `chip`.
    pub fn new<P: Into<PathBuf>>(
        chip: P,
        offset: Offset,
        active_low: bool,
        consumer: &str,
    ) -> Result<LedPin> {
        let chip = chip.into();
        let mut builder = Request::builder();
        builder
            .on_chip(chip.as_path())
            .with_consumer(consumer)
            .with_line(offset)
            .as_output(Value::Inactive);
        if active_low {
            builder.as_active_low();
        }
        let req = builder.request()?;
        log::debug!("requested line {} on {}", offset, chip.display());
        Ok(LedPin {
            req,
            offset,
            value: Value::Inactive,
        })
    }

    /// Request the line with the given name.
    ///
    /// If `chip` is provided then the line must be on that chip.
    pub fn from_name(
        name: &str,
        chip: Option<&str>,
        active_low: bool,
        consumer: &str,
    ) -> Result<LedPin> {
        let line =
            gpiocdev::find_named_line(name).ok_or_else(|| Error::UnfoundLine(name.into()))?;
        if let Some(id) = chip {
            if line.chip != chip_path_from_id(id) {
                return Err(Error::UnfoundLine(name.into()));
            }
        }
        LedPin::new(line.chip, line.info.offset, active_low, consumer)
    }

    /// Request the line identified by the configuration.
    ///
    /// If a chip is configured and the line parses as a number then the
    /// line is taken as an offset on that chip, else it is taken as a name.
    pub fn from_config(config: &Config) -> Result<LedPin> {
        if let Some(chip) = &config.chip {
            if let Ok(offset) = config.line.parse::<Offset>() {
                return LedPin::new(
                    chip_path_from_id(chip),
                    offset,
                    config.active_low,
                    &config.consumer,
                );
            }
        }
        LedPin::from_name(
            &config.line,
            config.chip.as_deref(),
            config.active_low,
            &config.consumer,
        )
    }

    /// The offset of the line on its chip.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// The path of the chip containing the line.
    pub fn chip_path(&self) -> PathBuf {
        self.req.chip_path()
    }
}

impl embedded_hal::digital::OutputPin for LedPin {
    #[inline]
    fn set_low(&mut self) -> Result<()> {
        self.set_state(PinState::Low)
    }

    #[inline]
    fn set_high(&mut self) -> Result<()> {
        self.set_state(PinState::High)
    }

    fn set_state(&mut self, state: PinState) -> Result<()> {
        let value = state_to_value(state);
        if self.value != value {
            self.req.set_value(self.offset, value)?;
            self.value = value;
        }
        Ok(())
    }
}

impl embedded_hal::digital::StatefulOutputPin for LedPin {
    fn is_set_high(&mut self) -> Result<bool> {
        Ok(self.value == Value::Active)
    }

    fn is_set_low(&mut self) -> Result<bool> {
        Ok(self.value == Value::Inactive)
    }

    fn toggle(&mut self) -> Result<()> {
        let value = self.value.not();
        self.req.set_value(self.offset, value)?;
        self.value = value;
        Ok(())
    }
}

impl embedded_hal::digital::ErrorType for LedPin {
    /// Errors returned by [`LedPin`].
    type Error = Error;
}

/// Converts a [`PinState`] to the gpiocdev logical line [`Value`].
fn state_to_value(state: PinState) -> Value {
    match state {
        PinState::High => Value::Active,
        PinState::Low => Value::Inactive,
    }
}

/// Expand a chip identifier, being a number, name or path, to a path.
fn chip_path_from_id(id: &str) -> PathBuf {
    if id.chars().all(char::is_numeric) {
        // from number
        return format!("/dev/gpiochip{id}").into();
    }
    if !id.chars().any(|x| x == '/') {
        // from name
        let mut p: PathBuf = "/dev".into();
        p.push(id);
        return p;
    }
    // from raw path
    id.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chip_path() {
        assert_eq!(chip_path_from_id("0"), PathBuf::from("/dev/gpiochip0"));
        assert_eq!(chip_path_from_id("gpiochip3"), PathBuf::from("/dev/gpiochip3"));
        assert_eq!(
            chip_path_from_id("/dev/gpiochip1"),
            PathBuf::from("/dev/gpiochip1")
        );
    }

    #[test]
    fn state_value() {
        assert_eq!(state_to_value(PinState::High), Value::Active);
        assert_eq!(state_to_value(PinState::Low), Value::Inactive);
    }
}
