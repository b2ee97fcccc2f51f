// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::common;
use anyhow::{anyhow, Result};
use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline_derive::{Helper, Highlighter, Hinter, Validator};

const COMMANDS: [&str; 5] = ["exit", "help", "period", "start", "stop"];

pub(super) struct Editor {
    rl: rustyline::Editor<InteractiveHelper, FileHistory>,
    prompt: String,
}

impl Editor {
    pub(super) fn new(prompt: &str) -> Result<Editor> {
        let config = rustyline::Config::builder()
            .completion_type(CompletionType::List)
            .auto_add_history(true)
            .max_history_size(20)?
            .history_ignore_space(true)
            .build();
        let mut rl = rustyline::Editor::with_config(config)?;
        rl.set_helper(Some(InteractiveHelper {}));
        Ok(Editor {
            rl,
            prompt: prompt.to_string(),
        })
    }

    /// The next line entered, or None if the user is done.
    pub(super) fn next_line(&mut self) -> Result<Option<String>> {
        let prompt = self.prompt.clone();
        self.read(&prompt)
    }

    /// Prompt for a period that was omitted from a command.
    pub(super) fn prompt_period(&mut self) -> Result<Option<i32>> {
        match self.read("period (ms): ")? {
            Some(line) => Ok(Some(common::parse_period(&line)?)),
            None => Ok(None),
        }
    }

    fn read(&mut self, prompt: &str) -> Result<Option<String>> {
        use std::io::Write;
        let mut stdout = std::io::stdout();
        /*
         * manually print the prompt, as rustyline doesn't if stdout
         * is not a tty, and flush any output from the previous command.
         */
        _ = stdout.write(prompt.as_bytes());
        _ = stdout.flush();
        match self.rl.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(anyhow!(e)),
        }
    }
}

#[derive(Helper, Validator, Hinter, Highlighter)]
pub(super) struct InteractiveHelper {}

impl Completer for InteractiveHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        Ok(complete_command(line, pos))
    }
}

// only the command word is completed
fn complete_command(line: &str, pos: usize) -> (usize, Vec<Pair>) {
    let cmd_pos = line.len() - line.trim_start().len();
    if pos < cmd_pos {
        return (pos, vec![]);
    }
    let word = &line[cmd_pos..pos];
    if word.contains(' ') {
        return (pos, vec![]);
    }
    let candidates = COMMANDS
        .iter()
        .filter(|c| c.starts_with(word))
        .map(|c| base_pair(c))
        .collect();
    (cmd_pos, candidates)
}

// a pair that ends a command word
fn base_pair(candidate: &str) -> Pair {
    let display = String::from(candidate);
    let mut replacement = display.clone();
    replacement.push(' ');
    Pair {
        display,
        replacement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn displays(c: &(usize, Vec<Pair>)) -> Vec<&str> {
        c.1.iter().map(|p| p.display.as_str()).collect()
    }

    #[test]
    fn complete_empty() {
        let c = complete_command("", 0);
        assert_eq!(c.0, 0);
        assert_eq!(displays(&c), COMMANDS);
    }

    #[test]
    fn complete_partial() {
        let c = complete_command("  st", 4);
        assert_eq!(c.0, 2);
        assert_eq!(displays(&c), ["start", "stop"]);
        assert_eq!(c.1[0].replacement, "start ");

        let c = complete_command("pe", 2);
        assert_eq!(displays(&c), ["period"]);
    }

    #[test]
    fn complete_argument() {
        let c = complete_command("period 1", 8);
        assert!(c.1.is_empty());
    }
}
