//! Interactive prompts.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// Prompts the user for a yes/no confirmation.
///
/// Accepts 'y', 'yes', 'n', 'no' (case insensitive). Empty input is 'no'.
pub fn prompt_confirmation(prompt: &str) -> Result<bool> {
    let stdin = io::stdin();
    confirm_from(&mut stdin.lock(), &mut io::stdout(), prompt)
}

fn confirm_from(input: &mut impl BufRead, out: &mut impl Write, prompt: &str) -> Result<bool> {
    loop {
        write!(out, "{prompt} (y/N): ")?;
        out.flush()?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .context("Failed to read user input")?;
        if read == 0 {
            return Ok(false);
        }
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" | "" => return Ok(false),
            _ => writeln!(out, "Please enter 'y' for yes or 'n' for no.")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(text: &str) -> bool {
        let mut out = Vec::new();
        confirm_from(&mut text.as_bytes(), &mut out, "Remove?").unwrap()
    }

    #[test]
    fn test_yes_variants_confirm() {
        assert!(answer("y\n"));
        assert!(answer("YES\n"));
    }

    #[test]
    fn test_empty_and_eof_decline() {
        assert!(!answer("\n"));
        assert!(!answer(""));
    }

    #[test]
    fn test_reprompts_on_garbage() {
        assert!(answer("maybe\ny\n"));
    }
}
