// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use anyhow::{anyhow, bail, Context, Result};
use getopts::{Matches, Options};
use gpioblink::Config;
use saphyr::{Yaml, YamlLoader};
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;

/// The daemon configuration after all sources have been applied.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct Opts {
    pub config: Config,
    pub verbose: bool,
    pub daemonize: bool,
    pub pid_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Eq, PartialEq)]
pub enum Parsed {
    Run(Opts),
    Help(String),
    Version,
}

const YAML_KEYS: [&str; 7] = [
    "device",
    "mode",
    "chip",
    "line",
    "active_low",
    "consumer",
    "period",
];

fn options() -> Options {
    let mut opts = Options::new();
    opts.optopt("c", "config", "read the configuration from FILE", "FILE")
        .optopt("d", "device", "the socket clients connect to", "PATH")
        .optopt("m", "mode", "the file mode of the socket, in octal", "MODE")
        .optopt("", "chip", "the chip containing the line", "CHIP")
        .optopt("l", "line", "the name, or offset on --chip, of the line", "LINE")
        .optflag("", "active-low", "the LED is lit when the line is low")
        .optopt("", "consumer", "the consumer label for the line", "NAME")
        .optopt("p", "period", "the initial toggle period", "MS")
        .optflag("z", "daemonize", "detach from the controlling terminal")
        .optopt("", "pid-file", "write the daemon pid to FILE", "FILE")
        .optopt("", "log-file", "log to FILE when detached", "FILE")
        .optflag("v", "verbose", "log each command")
        .optflag("h", "help", "print this help")
        .optflag("V", "version", "print the version");
    opts
}

/// Build the configuration from the command line arguments.
///
/// Settings are taken from the defaults, then the config file, if any,
/// then the command line options, with later sources taking priority.
pub fn parse_args<C>(args: C) -> Result<Parsed>
where
    C: IntoIterator,
    C::Item: AsRef<OsStr>,
{
    let options = options();
    let m = options.parse(args)?;
    if m.opt_present("h") {
        let brief = "Usage: gpioblinkd [options]";
        return Ok(Parsed::Help(options.usage(brief)));
    }
    if m.opt_present("V") {
        return Ok(Parsed::Version);
    }
    if let Some(arg) = m.free.first() {
        bail!("unexpected argument: '{}'", arg);
    }
    let mut config = Config::default();
    if let Some(file) = m.opt_str("c") {
        let yaml =
            fs::read_to_string(&file).with_context(|| format!("unable to read {}", file))?;
        apply_yaml(&yaml, &mut config).with_context(|| format!("invalid config in {}", file))?;
    }
    apply_matches(&m, &mut config)?;
    Ok(Parsed::Run(Opts {
        config,
        verbose: m.opt_present("v"),
        daemonize: m.opt_present("z"),
        pid_file: m.opt_str("pid-file").map(PathBuf::from),
        log_file: m.opt_str("log-file").map(PathBuf::from),
    }))
}

fn apply_matches(m: &Matches, config: &mut Config) -> Result<()> {
    if let Some(path) = m.opt_str("d") {
        config.path = path.into();
    }
    if let Some(mode) = m.opt_str("m") {
        config.mode = parse_mode(&mode)?;
    }
    if let Some(chip) = m.opt_str("chip") {
        config.chip = Some(chip);
    }
    if let Some(line) = m.opt_str("l") {
        config.line = line;
    }
    if m.opt_present("active-low") {
        config.active_low = true;
    }
    if let Some(consumer) = m.opt_str("consumer") {
        config.consumer = consumer;
    }
    if let Some(period) = m.opt_str("p") {
        config.period_ms = period
            .parse()
            .map_err(|_| anyhow!("invalid period: '{}'", period))?;
    }
    Ok(())
}

/// Apply the settings in a YAML config to the `config`.
///
/// An empty document leaves the config unchanged.
pub fn apply_yaml(yaml: &str, config: &mut Config) -> Result<()> {
    let docs = YamlLoader::load_from_str(yaml).map_err(|e| anyhow!("{}", e))?;
    let Some(doc) = docs.first() else {
        return Ok(());
    };
    if doc.is_null() {
        return Ok(());
    }
    let Some(hash) = doc.as_hash() else {
        bail!("expected a mapping of settings");
    };
    for key in hash.keys() {
        match key.as_str() {
            Some(k) if YAML_KEYS.contains(&k) => {}
            Some(k) => bail!("unknown setting '{}'", k),
            None => bail!("settings must be named"),
        }
    }
    if let Some(path) = str_field(doc, "device")? {
        config.path = path.into();
    }
    let mode = &doc["mode"];
    if let Some(mode) = mode.as_i64() {
        config.mode = u32::try_from(mode)
            .ok()
            .filter(|m| *m <= 0o7777)
            .ok_or_else(|| anyhow!("invalid mode: {:#o}", mode))?;
    } else if let Some(mode) = mode.as_str() {
        config.mode = parse_mode(mode)?;
    } else if !mode.is_badvalue() {
        bail!("'mode' must be an octal string or an integer");
    }
    if let Some(chip) = str_field(doc, "chip")? {
        config.chip = Some(chip.into());
    }
    let line = &doc["line"];
    if let Some(offset) = line.as_i64() {
        config.line = offset.to_string();
    } else if let Some(line) = str_field(doc, "line")? {
        config.line = line.into();
    }
    if let Some(active_low) = bool_field(doc, "active_low")? {
        config.active_low = active_low;
    }
    if let Some(consumer) = str_field(doc, "consumer")? {
        config.consumer = consumer.into();
    }
    let period = &doc["period"];
    if !period.is_badvalue() {
        config.period_ms = period
            .as_i64()
            .and_then(|p| u32::try_from(p).ok())
            .ok_or_else(|| anyhow!("'period' must be a non-negative integer"))?;
    }
    Ok(())
}

fn str_field<'a>(doc: &'a Yaml, key: &str) -> Result<Option<&'a str>> {
    let v = &doc[key];
    if v.is_badvalue() {
        return Ok(None);
    }
    v.as_str()
        .map(Some)
        .ok_or_else(|| anyhow!("'{}' must be a string", key))
}

fn bool_field(doc: &Yaml, key: &str) -> Result<Option<bool>> {
    let v = &doc[key];
    if v.is_badvalue() {
        return Ok(None);
    }
    v.as_bool()
        .map(Some)
        .ok_or_else(|| anyhow!("'{}' must be true or false", key))
}

fn parse_mode(s: &str) -> Result<u32> {
    let digits = s.strip_prefix("0o").unwrap_or(s);
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|m| *m <= 0o7777)
        .ok_or_else(|| anyhow!("invalid mode: '{}'", s))
}
