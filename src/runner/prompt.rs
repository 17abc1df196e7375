//! Interactive input
//!
//! The engine asks for values through a [`Prompter`]; it never talks to the
//! terminal directly.

use crate::error::InputError;
use colored::Colorize;
use std::io::{self, BufRead, Write};

/// Collaborator that obtains values from an operator
pub trait Prompter {
    /// Ask for free text; an empty answer selects `default`
    fn input(&mut self, message: &str, default: &str) -> Result<String, InputError>;

    /// Ask a yes/no question; an empty answer selects `default`
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, InputError>;
}

/// Line-based prompter over any reader/writer pair
pub struct TerminalPrompter<R, W> {
    reader: R,
    writer: W,
}

impl TerminalPrompter<io::BufReader<io::Stdin>, io::Stderr> {
    /// Prompter reading stdin and writing questions to stderr
    pub fn stdio() -> Self {
        TerminalPrompter::new(io::BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        TerminalPrompter { reader, writer }
    }

    fn ask(&mut self, question: &str) -> Result<String, InputError> {
        write!(self.writer, "{} {} ", "?".green().bold(), question)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(InputError::Aborted);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn input(&mut self, message: &str, default: &str) -> Result<String, InputError> {
        let question = if default.is_empty() {
            message.bold().to_string()
        } else {
            format!("{} {}", message.bold(), format!("({})", default).dimmed())
        };

        let answer = self.ask(&question)?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, InputError> {
        let hint = if default { "(Y/n)" } else { "(y/N)" };
        let question = format!("{} {}", message.bold(), hint.dimmed());

        let answer = self.ask(&question)?;
        match answer.trim().to_lowercase().as_str() {
            "" => Ok(default),
            "y" | "yes" => Ok(true),
            "n" | "no" => Ok(false),
            _ => Err(InputError::InvalidAnswer(answer)),
        }
    }
}

/// Non-interactive prompter that accepts every default
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsPrompter;

impl Prompter for DefaultsPrompter {
    fn input(&mut self, _message: &str, default: &str) -> Result<String, InputError> {
        Ok(default.to_string())
    }

    fn confirm(&mut self, _message: &str, default: bool) -> Result<bool, InputError> {
        Ok(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> TerminalPrompter<Cursor<Vec<u8>>, Vec<u8>> {
        colored::control::set_override(false);
        TerminalPrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_input_answer() {
        let mut p = prompter("my-app\n");
        assert_eq!(p.input("Name?", "default").unwrap(), "my-app");
        let shown = String::from_utf8(p.writer.clone()).unwrap();
        assert!(shown.contains("Name?"));
        assert!(shown.contains("(default)"));
    }

    #[test]
    fn test_input_empty_takes_default() {
        let mut p = prompter("\n");
        assert_eq!(p.input("Name?", "prod-app").unwrap(), "prod-app");
    }

    #[test]
    fn test_input_eof_aborts() {
        let mut p = prompter("");
        assert!(matches!(p.input("Name?", ""), Err(InputError::Aborted)));
    }

    #[test]
    fn test_confirm_answers() {
        let mut p = prompter("y\nNO\n\nmaybe\n");
        assert!(p.confirm("Docker?", false).unwrap());
        assert!(!p.confirm("Docker?", true).unwrap());
        assert!(p.confirm("Docker?", true).unwrap());
        assert!(matches!(
            p.confirm("Docker?", true),
            Err(InputError::InvalidAnswer(_))
        ));
    }

    #[test]
    fn test_defaults_prompter() {
        let mut p = DefaultsPrompter;
        assert_eq!(p.input("Name?", "x").unwrap(), "x");
        assert!(p.confirm("Ok?", true).unwrap());
    }
}
