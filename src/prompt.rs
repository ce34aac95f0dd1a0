//! Confirmation prompts.

use std::io::{BufRead, IsTerminal, Write};

use console::Term;

use crate::error::GuestctlError;

/// Yes/no question capability, so destructive steps can ask before
/// proceeding and tests can script the answer.
pub trait Confirmer {
    fn confirm(&mut self, prompt: &str) -> Result<bool, GuestctlError>;
}

/// Default confirmer: a single keypress on a terminal (`y`/`Y` to
/// proceed, anything else cancels), or the first character of a line
/// when stdin is piped.
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&mut self, prompt: &str) -> Result<bool, GuestctlError> {
        if std::io::stdin().is_terminal() {
            let term = Term::stdout();
            term.write_str(&format!("{prompt} [y/N] "))
                .map_err(prompt_io)?;
            let key = term.read_char().map_err(prompt_io)?;
            term.write_line("").map_err(prompt_io)?;
            Ok(key.eq_ignore_ascii_case(&'y'))
        } else {
            print!("{prompt} [y/N] ");
            std::io::stdout().flush().map_err(prompt_io)?;
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map_err(prompt_io)?;
            Ok(line
                .trim_start()
                .chars()
                .next()
                .is_some_and(|c| c.eq_ignore_ascii_case(&'y')))
        }
    }
}

fn prompt_io(source: std::io::Error) -> GuestctlError {
    GuestctlError::Io {
        context: "reading confirmation".into(),
        source,
    }
}

/// Scripted confirmer for tests: answers from a fixed list, in order.
#[cfg(test)]
pub struct ScriptedConfirmer {
    answers: std::vec::IntoIter<bool>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedConfirmer {
    pub fn new(answers: Vec<bool>) -> Self {
        Self {
            answers: answers.into_iter(),
            asked: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Confirmer for ScriptedConfirmer {
    fn confirm(&mut self, prompt: &str) -> Result<bool, GuestctlError> {
        self.asked.push(prompt.to_string());
        Ok(self.answers.next().expect("unexpected confirmation prompt"))
    }
}
