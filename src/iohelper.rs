/**
 * Helper functions for input and output.
 */
use colored::*;
use std::io::Write;

use rustyline::error::ReadlineError;

use mastery::common::{EngineError, Result};

#[macro_export]
macro_rules! my_println {
    ($($arg:tt)*) => (
        writeln!(std::io::stdout(), $($arg)*).map_err(EngineError::Io)
    );
}

#[macro_export]
macro_rules! my_print {
    ($($arg:tt)*) => (
        write!(std::io::stdout(), $($arg)*).map_err(EngineError::Io)
    );
}

/// Read a non-blank line from standard input, showing `message` as the prompt.
///
/// End of input (Ctrl+D) gives `Ok(None)`; Ctrl+C gives
/// `Err(EngineError::ReadlineInterrupted)`. The returned line is trimmed.
pub fn prompt(message: &str) -> Result<Option<String>> {
    let mut rl = rustyline::Editor::<()>::new();
    loop {
        let result = rl.readline(message);
        match result {
            Ok(response) => {
                let response = response.trim();
                if !response.is_empty() {
                    return Ok(Some(response.to_string()));
                }
            }
            Err(ReadlineError::Interrupted) => {
                return Err(EngineError::ReadlineInterrupted);
            }
            Err(ReadlineError::Eof) => {
                return Ok(None);
            }
            Err(ReadlineError::Io(e)) => {
                return Err(EngineError::Io(e));
            }
            _ => {}
        }
    }
}

/// Print `message` wrapped to the terminal width, with `prefix` before the first line
/// and continuation lines indented to match.
pub fn prettyprint(message: &str, prefix: &str) -> Result<()> {
    prettyprint_colored(message, prefix, None, None)
}

pub fn prettyprint_colored(
    message: &str,
    prefix: &str,
    message_color: Option<Color>,
    prefix_color: Option<Color>,
) -> Result<()> {
    let width = textwrap::termwidth().saturating_sub(prefix.len()).max(20);
    let indent = " ".repeat(prefix.len());
    let paint = |text: &str, color: Option<Color>| match color {
        Some(color) => text.color(color),
        None => text.normal(),
    };

    for (i, line) in textwrap::wrap_iter(message, width).enumerate() {
        let lead = if i == 0 { paint(prefix, prefix_color) } else { indent.as_str().normal() };
        my_println!("{}{}", lead, paint(&*line, message_color))?;
    }
    Ok(())
}


/// Map an answer letter to an option index: "a" is 0, "b" is 1 and so on. Returns `None`
/// if `response` is not a single letter within the first `count` letters.
pub fn letter_to_index(response: &str, count: usize) -> Option<usize> {
    let mut chars = response.chars();
    let letter = chars.next()?.to_ascii_lowercase();
    if chars.next().is_some() || !letter.is_ascii_lowercase() {
        return None;
    }
    let index = (letter as u8 - b'a') as usize;
    if index < count {
        Some(index)
    } else {
        None
    }
}

/// The letter shown next to the option at `index`.
pub fn index_to_letter(index: usize) -> char {
    (b'a' + (index % 26) as u8) as char
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_to_options() {
        assert_eq!(letter_to_index("a", 4), Some(0));
        assert_eq!(letter_to_index("D", 4), Some(3));
        assert_eq!(letter_to_index("e", 4), None);
        assert_eq!(letter_to_index("ab", 4), None);
        assert_eq!(letter_to_index("1", 4), None);
        assert_eq!(index_to_letter(2), 'c');
    }
}
