// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{self, DeviceOpts};
use anyhow::{anyhow, Context, Result};
use gpioblink_uapi::Client;

mod editor;
use editor::Editor;

pub fn cmd(opts: &DeviceOpts) -> Result<()> {
    let client = opts.connect()?;
    let mut rl = Editor::new("gpioblink> ")?;
    loop {
        let line = match rl.next_line()? {
            Some(line) => line,
            None => return Ok(()),
        };
        let res = match parse_action(&line) {
            Ok(Action::SetPeriod(None)) => rl
                .prompt_period()
                .and_then(|p| match p {
                    Some(p) => apply(&client, Action::SetPeriod(Some(p))),
                    None => Ok(true),
                }),
            Ok(action) => apply(&client, action),
            Err(e) => Err(e),
        };
        match res {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(e) => println!("{}", common::format_error(false, &e)),
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
enum Action {
    Stop,
    Start,
    // prompted for if not provided
    SetPeriod(Option<i32>),
    Help,
    Exit,
    Nothing,
}

// menu numbers are accepted as aliases
fn parse_action(line: &str) -> Result<Action> {
    let mut words = line.split_ascii_whitespace();
    let action = match words.next() {
        None => return Ok(Action::Nothing),
        Some("1" | "stop") => Action::Stop,
        Some("2" | "start") => Action::Start,
        Some("3" | "period") => match words.next() {
            Some(p) => Action::SetPeriod(Some(common::parse_period(p)?)),
            None => Action::SetPeriod(None),
        },
        Some("help" | "?") => Action::Help,
        Some("exit" | "quit") => Action::Exit,
        Some(x) => return Err(anyhow!("unknown command: '{}'", x)),
    };
    if let Some(x) = words.next() {
        return Err(anyhow!("unexpected argument: '{}'", x));
    }
    Ok(action)
}

// returns false once the user is done
fn apply(client: &Client, action: Action) -> Result<bool> {
    match action {
        Action::Stop => client.stop().context("unable to stop")?,
        Action::Start => client.start().context("unable to start")?,
        Action::SetPeriod(Some(p)) => client
            .set_period(p)
            .with_context(|| format!("unable to set period to {}ms", p))?,
        Action::SetPeriod(None) | Action::Nothing => {}
        Action::Help => print_interactive_help(),
        Action::Exit => return Ok(false),
    }
    Ok(true)
}

fn print_interactive_help() {
    let cmds = [
        ("stop", "1", "Stop blinking"),
        ("start", "2", "Resume blinking at the current period"),
        (
            "period <ms>",
            "3 <ms>",
            "Set the blink period and resume blinking\n\
            The period is prompted for if not provided.",
        ),
        ("help", "?", "Print this help"),
        ("exit", "quit", "Exit the program"),
    ];
    println!("COMMANDS:");
    for (cmd, alias, help) in cmds {
        print!("\n    {}, {}", cmd, alias);
        for line in help.split('\n') {
            println!("\n            {}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_numbers() {
        assert_eq!(parse_action("1").unwrap(), Action::Stop);
        assert_eq!(parse_action("2").unwrap(), Action::Start);
        assert_eq!(parse_action("3").unwrap(), Action::SetPeriod(None));
        assert_eq!(parse_action(" 3 250").unwrap(), Action::SetPeriod(Some(250)));
        assert!(parse_action("4").is_err());
    }

    #[test]
    fn words() {
        assert_eq!(parse_action("").unwrap(), Action::Nothing);
        assert_eq!(parse_action("   ").unwrap(), Action::Nothing);
        assert_eq!(parse_action("stop").unwrap(), Action::Stop);
        assert_eq!(parse_action("start").unwrap(), Action::Start);
        assert_eq!(
            parse_action("period 100ms").unwrap(),
            Action::SetPeriod(Some(100))
        );
        assert_eq!(
            parse_action("period -5").unwrap(),
            Action::SetPeriod(Some(-5))
        );
        assert_eq!(parse_action("help").unwrap(), Action::Help);
        assert_eq!(parse_action("?").unwrap(), Action::Help);
        assert_eq!(parse_action("exit").unwrap(), Action::Exit);
        assert_eq!(parse_action("quit").unwrap(), Action::Exit);
    }

    #[test]
    fn errors() {
        assert_eq!(
            parse_action("blink").unwrap_err().to_string(),
            "unknown command: 'blink'"
        );
        assert_eq!(
            parse_action("stop now").unwrap_err().to_string(),
            "unexpected argument: 'now'"
        );
        assert_eq!(
            parse_action("period fast").unwrap_err().to_string(),
            "invalid period 'fast', expected milliseconds"
        );
    }
}
