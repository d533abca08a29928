//! Line-based prompting over any reader/writer pair.

use anyhow::{bail, Result};
use std::io::{BufRead, Write};

/// A line containing only this ends multi-line input.
pub const BLOCK_TERMINATOR: &str = ".";

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Prints `prompt` and reads one line, without its line ending.
    ///
    /// Fails once the input is closed.
    pub fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{} ", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("input closed");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Reads lines until a lone `.`; returns them joined with newlines.
    ///
    /// Fails if the input closes before the terminator.
    pub fn read_block(&mut self, prompt: &str) -> Result<String> {
        self.say(&format!("{} (finish with a line containing only '{}')", prompt, BLOCK_TERMINATOR))?;
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                bail!("input closed before '{}'", BLOCK_TERMINATOR);
            }
            let line = line.trim_end_matches(['\r', '\n']);
            if line == BLOCK_TERMINATOR {
                break;
            }
            lines.push(line.to_string());
        }
        Ok(lines.join("\n"))
    }

    /// Asks until the answer is an option number or an option's exact text.
    pub fn choose(&mut self, prompt: &str, options: &[&'static str]) -> Result<&'static str> {
        self.say(prompt)?;
        for (i, option) in options.iter().enumerate() {
            self.say(&format!("  {}) {}", i + 1, option))?;
        }
        loop {
            let answer = self.ask(">")?;
            let answer = answer.trim();
            let picked = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i))
                .or_else(|| options.iter().find(|o| o.eq_ignore_ascii_case(answer)));
            match picked {
                Some(option) => return Ok(*option),
                None => self.say(&format!("Please enter a number from 1 to {}.", options.len()))?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_ask_strips_line_ending() {
        let mut p = prompter("hello\r\nworld\n");
        assert_eq!(p.ask("?").unwrap(), "hello");
        assert_eq!(p.ask("?").unwrap(), "world");
        assert!(p.ask("?").is_err());
    }

    #[test]
    fn test_read_block_until_terminator() {
        let mut p = prompter("line one\n\nline three\n.\nafter\n");
        assert_eq!(p.read_block("Text").unwrap(), "line one\n\nline three");
        assert_eq!(p.ask("?").unwrap(), "after");
    }

    #[test]
    fn test_read_block_empty_block_is_valid() {
        let mut p = prompter(".\n");
        assert_eq!(p.read_block("Text").unwrap(), "");
    }

    #[test]
    fn test_read_block_fails_on_closed_input() {
        let mut p = prompter("half a prompt\n");
        assert!(p.read_block("Text").is_err());
        assert!(prompter("").read_block("Text").is_err());
    }

    #[test]
    fn test_choose_by_number_or_text() {
        let options = ["Never", "Daily"];
        let mut p = prompter("7\nnonsense\n2\ndaily\n");
        assert_eq!(p.choose("How often?", &options).unwrap(), "Daily");
        assert_eq!(p.choose("How often?", &options).unwrap(), "Daily");

        let output = String::from_utf8(p.into_output()).unwrap();
        assert!(output.contains("1) Never"));
        assert!(output.contains("Please enter a number from 1 to 2."));
    }
}
