use std::io::{stdin, stdout, BufRead, Write};

use crossterm::{
    event::{read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use log::{debug, error};

use crate::{device::Operator, Error};

/// Type that ensures that raw mode is disabled when dropped.
struct RawModeGuard;

impl RawModeGuard {
    pub fn new() -> Result<Self, Error> {
        enable_raw_mode()?;
        Ok(RawModeGuard)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            error!("Failed to disable raw_mode: {:#}", e)
        }
    }
}

/// Asks for key presses on the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalOperator;

impl Operator for TerminalOperator {
    fn wait_for_key(&mut self, prompt: &str) -> Result<(), Error> {
        print!("{prompt}");
        stdout().flush()?;

        let result = match RawModeGuard::new() {
            Ok(_raw_mode) => read_key(),
            Err(e) => {
                // Not a terminal, fall back to line buffered input.
                debug!("Raw mode unavailable: {e}");
                read_line(&mut stdin().lock())
            }
        };
        println!();

        result
    }
}

/// Consume one whole line so the rest of it does not answer the next prompt
fn read_line(input: &mut impl BufRead) -> Result<(), Error> {
    let mut line = String::new();
    match input.read_line(&mut line)? {
        0 => Err(Error::Cancelled),
        _ => Ok(()),
    }
}

/// Block until a key is pressed; Ctrl-C in raw mode arrives as a key event
fn read_key() -> Result<(), Error> {
    loop {
        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = read()?
        {
            return match code {
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    Err(Error::Interrupted)
                }
                _ => Ok(()),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn each_line_answers_one_prompt() {
        let mut input = Cursor::new("a\n\n");

        read_line(&mut input).unwrap();
        read_line(&mut input).unwrap();
        assert!(matches!(read_line(&mut input), Err(Error::Cancelled)));
    }
}
