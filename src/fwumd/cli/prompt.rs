use console::Term;
use fwumd::error::{FwumdError, Result};
use fwumd::shell::builder::Prompter;
use std::io::BufRead;

pub(super) const SHELL_PROMPT: &str = "fwupd> ";
pub(super) const SHELL_INTRO: &str = "Welcome ! Type help to list the commands";

/// Line input from the terminal, or from piped stdin when there is none.
pub(super) struct TerminalInput {
    term: Term,
}

impl TerminalInput {
    pub(super) fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Shows `prompt` and reads one line; `None` at end of input.
    pub(super) fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        self.term.write_str(prompt)?;
        if self.term.is_term() {
            return Ok(Some(self.term.read_line()?));
        }
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl Prompter for TerminalInput {
    fn ask(&mut self, prompt: &str, default: Option<&str>) -> Result<String> {
        let question = match default {
            Some(default) => format!("{} [default {}]: ", prompt, default),
            None => format!("{}: ", prompt),
        };
        self.read_line(&question)?
            .ok_or_else(|| FwumdError::Usage("input closed before all answers were given".to_string()))
    }

    fn tell(&mut self, message: &str) {
        let _ = self.term.write_line(message);
    }
}
