//! Terminal prompter: numbered choices on stdout, answer read from stdin

use colored::*;
use gilt_resolve::{Prompter, ResolveError, ResolveResult};
use std::io::{self, BufRead, Write};

pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str, choices: &[String]) -> io::Result<Option<String>> {
        writeln!(self.output, "{} {}", "?".cyan().bold(), question.bold())?;
        for (index, choice) in choices.iter().enumerate() {
            writeln!(self.output, "  {}) {}", index + 1, choice)?;
        }

        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if let Some(choice) = pick(line.trim(), choices) {
                return Ok(Some(choice.to_string()));
            }
            writeln!(
                self.output,
                "{} enter a number between 1 and {} or one of the names above",
                "!".yellow(),
                choices.len()
            )?;
        }
    }
}

/// Match input against choices by 1-based index or case-insensitive name
fn pick<'c>(input: &str, choices: &'c [String]) -> Option<&'c str> {
    if let Ok(index) = input.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| choices.get(i))
            .map(String::as_str);
    }
    choices
        .iter()
        .find(|choice| choice.eq_ignore_ascii_case(input))
        .map(String::as_str)
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn select(&mut self, question: &str, choices: &[String]) -> ResolveResult<String> {
        let prompt_error = |reason: String| ResolveError::Prompt {
            question: question.to_string(),
            reason,
        };
        match self.ask(question, choices) {
            Ok(Some(choice)) => Ok(choice),
            Ok(None) => Err(prompt_error("input closed".to_string())),
            Err(e) => Err(prompt_error(e.to_string())),
        }
    }
}
