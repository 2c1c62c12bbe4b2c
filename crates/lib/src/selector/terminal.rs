//! Terminal control and the raw-mode guard.

use std::io::{self, IsTerminal, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{execute, queue};

use super::menu::Frame;

/// The terminal operations the selector needs.
pub trait TerminalControl {
    /// True when input comes from an interactive terminal.
    fn is_interactive(&self) -> bool;
    fn enable_raw_mode(&mut self) -> io::Result<()>;
    fn disable_raw_mode(&mut self) -> io::Result<()>;
    fn hide_cursor(&mut self) -> io::Result<()>;
    fn show_cursor(&mut self) -> io::Result<()>;
    /// Clear the screen and draw `frame` from the top-left corner.
    fn draw(&mut self, frame: &Frame) -> io::Result<()>;
}

/// Raw mode belongs to the process's controlling terminal, not to any one
/// `CrosstermTerminal`, so the single-holder rule is tracked at the same scope. Set while a
/// [`RawModeGuard`] over a `CrosstermTerminal` is alive; a second acquisition fails instead
/// of saving an already-raw mode as the one to restore.
static RAW_MODE_HELD: AtomicBool = AtomicBool::new(false);

/// Real terminal on stdin/stdout, driven through crossterm.
#[derive(Debug)]
pub struct CrosstermTerminal {
    out: Stdout,
}

impl CrosstermTerminal {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for CrosstermTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalControl for CrosstermTerminal {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        if RAW_MODE_HELD
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "raw mode is already held by another selector",
            ));
        }
        crossterm::terminal::enable_raw_mode().inspect_err(|_| {
            RAW_MODE_HELD.store(false, Ordering::SeqCst);
        })
    }

    fn disable_raw_mode(&mut self) -> io::Result<()> {
        let res = crossterm::terminal::disable_raw_mode();
        RAW_MODE_HELD.store(false, Ordering::SeqCst);
        res
    }

    fn hide_cursor(&mut self) -> io::Result<()> {
        execute!(self.out, Hide)
    }

    fn show_cursor(&mut self) -> io::Result<()> {
        execute!(self.out, Show)
    }

    fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        // Raw mode disables output post-processing, so every line ends in "\r\n".
        queue!(
            self.out,
            Clear(ClearType::All),
            MoveTo(0, 0),
            SetAttribute(Attribute::Bold),
            Print(&frame.title),
            SetAttribute(Attribute::Reset),
            Print("\r\n"),
            SetAttribute(Attribute::Dim),
            Print(&frame.hint),
            SetAttribute(Attribute::Reset),
            Print("\r\n\r\n")
        )?;
        for row in &frame.rows {
            if row.highlighted {
                queue!(
                    self.out,
                    SetAttribute(Attribute::Reverse),
                    Print(format!("> {}", row.label)),
                    SetAttribute(Attribute::Reset),
                    Print("\r\n")
                )?;
            } else {
                queue!(self.out, Print(format!("  {}\r\n", row.label)))?;
            }
        }
        self.out.flush()
    }
}

/// Raw mode held for the guard's lifetime. Dropping it shows the cursor and restores the
/// saved terminal mode, once, whichever way the holder's scope is left.
pub struct RawModeGuard<'a, T: TerminalControl> {
    term: &'a mut T,
}

impl<'a, T: TerminalControl> RawModeGuard<'a, T> {
    /// Enter raw mode and hide the cursor. If hiding fails, raw mode is released before
    /// the error is returned.
    pub fn acquire(term: &'a mut T) -> io::Result<Self> {
        term.enable_raw_mode()?;
        let mut guard = Self { term };
        guard.term.hide_cursor()?;
        Ok(guard)
    }

    pub fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        self.term.draw(frame)
    }
}

impl<T: TerminalControl> Drop for RawModeGuard<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.term.show_cursor() {
            log::debug!("failed to show cursor: {}", e);
        }
        if let Err(e) = self.term.disable_raw_mode() {
            log::warn!("failed to restore terminal mode: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_raw_mode_holder_is_refused() {
        RAW_MODE_HELD.store(true, Ordering::SeqCst);
        let err = CrosstermTerminal::new().enable_raw_mode().unwrap_err();
        RAW_MODE_HELD.store(false, Ordering::SeqCst);
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }
}
