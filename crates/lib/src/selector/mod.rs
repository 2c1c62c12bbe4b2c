//! Interactive menu selector in raw terminal mode.
//!
//! Draws a full-screen list, moves a wrapping cursor with arrow keys or `j`/`k`, and
//! returns the payload of the chosen entry. The terminal is put back the way it was found
//! on every exit path (selection, cancel, Ctrl-C, I/O error, panic) by [`RawModeGuard`].

mod keys;
mod menu;
mod terminal;

use std::io;

pub use keys::{read_key, ByteSource, ChunkedReader, Key};
pub use menu::{Frame, MenuState, Row};
pub use terminal::{CrosstermTerminal, RawModeGuard, TerminalControl};

/// Outcome of a selector run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Payload of the chosen option.
    Selected(String),
    /// `q`, ESC, end of input, or nothing to choose from.
    Cancelled,
    /// Ctrl-C.
    Interrupted,
}

#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("interactive selection requires a terminal (stdin is not a tty)")]
    NotInteractive,
    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// Let the user pick one of `options` (display, payload) on the real terminal.
pub fn select(options: &[(String, String)], title: &str) -> Result<Selection, SelectorError> {
    let mut term = CrosstermTerminal::new();
    let mut input = ChunkedReader::new(io::stdin().lock());
    select_with(&mut term, &mut input, options, title)
}

/// [`select`] against any terminal and byte source.
///
/// An empty option list returns `Cancelled` without touching the terminal; a
/// non-interactive terminal is reported before any mode change.
pub fn select_with<T, S>(
    term: &mut T,
    input: &mut S,
    options: &[(String, String)],
    title: &str,
) -> Result<Selection, SelectorError>
where
    T: TerminalControl,
    S: ByteSource,
{
    let Some(mut menu) = MenuState::new(options) else {
        return Ok(Selection::Cancelled);
    };
    if !term.is_interactive() {
        return Err(SelectorError::NotInteractive);
    }

    let mut guard = RawModeGuard::acquire(term)?;
    loop {
        guard.draw(&menu.frame(title))?;
        let Some(key) = read_key(input)? else {
            return Ok(Selection::Cancelled);
        };
        match key {
            Key::Up => menu.move_up(),
            Key::Down => menu.move_down(),
            Key::Enter => return Ok(Selection::Selected(menu.selected_payload().to_string())),
            Key::Quit | Key::Escape => return Ok(Selection::Cancelled),
            Key::Interrupt => return Ok(Selection::Interrupted),
            Key::Unknown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::keys::tests::Chunks;
    use super::*;

    #[derive(Debug, Default)]
    struct FakeTerminal {
        non_interactive: bool,
        raw: bool,
        enables: usize,
        restores: usize,
        hides: usize,
        shows: usize,
        frames: Vec<Frame>,
        fail_draw: bool,
    }

    impl TerminalControl for FakeTerminal {
        fn is_interactive(&self) -> bool {
            !self.non_interactive
        }
        fn enable_raw_mode(&mut self) -> io::Result<()> {
            assert!(!self.raw, "raw mode acquired twice");
            self.raw = true;
            self.enables += 1;
            Ok(())
        }
        fn disable_raw_mode(&mut self) -> io::Result<()> {
            self.raw = false;
            self.restores += 1;
            Ok(())
        }
        fn hide_cursor(&mut self) -> io::Result<()> {
            self.hides += 1;
            Ok(())
        }
        fn show_cursor(&mut self) -> io::Result<()> {
            self.shows += 1;
            Ok(())
        }
        fn draw(&mut self, frame: &Frame) -> io::Result<()> {
            if self.fail_draw {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
            }
            self.frames.push(frame.clone());
            Ok(())
        }
    }

    /// Byte source that fails on the first read.
    struct Broken;

    impl ByteSource for Broken {
        fn next_byte(&mut self) -> io::Result<Option<u8>> {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "tty closed"))
        }
        fn has_pending(&self) -> bool {
            false
        }
    }

    fn options(names: &[&str]) -> Vec<(String, String)> {
        names
            .iter()
            .map(|n| (format!("{} (tool)", n), n.to_string()))
            .collect()
    }

    fn run(term: &mut FakeTerminal, chunks: &[&[u8]], names: &[&str]) -> Selection {
        let mut input = ChunkedReader::new(Chunks::new(chunks));
        select_with(term, &mut input, &options(names), "Pick").unwrap()
    }

    fn assert_restored_once(term: &FakeTerminal) {
        assert_eq!(term.enables, 1);
        assert_eq!(term.restores, 1);
        assert_eq!(term.hides, 1);
        assert_eq!(term.shows, 1);
        assert!(!term.raw);
    }

    #[test]
    fn empty_options_never_touch_the_terminal() {
        let mut term = FakeTerminal::default();
        assert_eq!(run(&mut term, &[b"\r"], &[]), Selection::Cancelled);
        assert_eq!(term.enables + term.restores + term.hides + term.shows, 0);
        assert!(term.frames.is_empty());
    }

    #[test]
    fn non_interactive_input_is_an_error_without_mode_changes() {
        let mut term = FakeTerminal {
            non_interactive: true,
            ..Default::default()
        };
        let mut input = ChunkedReader::new(Chunks::new(&[b"\r"]));
        let err = select_with(&mut term, &mut input, &options(&["a"]), "Pick").unwrap_err();
        assert!(matches!(err, SelectorError::NotInteractive));
        assert_eq!(term.enables + term.restores, 0);
    }

    #[test]
    fn enter_selects_the_item_under_the_cursor() {
        let mut term = FakeTerminal::default();
        let got = run(&mut term, &[b"\x1b[B", b"j", b"\r"], &["a", "b", "c"]);
        assert_eq!(got, Selection::Selected("c".to_string()));
        assert_restored_once(&term);
        assert_eq!(term.frames.len(), 3);
    }

    #[test]
    fn up_from_first_item_wraps_to_last() {
        let mut term = FakeTerminal::default();
        let got = run(&mut term, &[b"\x1b[A", b"\r"], &["a", "b", "c"]);
        assert_eq!(got, Selection::Selected("c".to_string()));
    }

    #[test]
    fn unknown_sequences_redraw_without_moving() {
        let mut term = FakeTerminal::default();
        let got = run(&mut term, &[b"\x1b[C", b"x", b"\r"], &["a", "b"]);
        assert_eq!(got, Selection::Selected("a".to_string()));
        assert_eq!(term.frames.len(), 3);
        assert_eq!(term.frames[0], term.frames[2]);
    }

    #[test]
    fn q_and_lone_escape_cancel() {
        let mut term = FakeTerminal::default();
        assert_eq!(run(&mut term, &[b"j", b"q"], &["a", "b"]), Selection::Cancelled);
        assert_restored_once(&term);

        let mut term = FakeTerminal::default();
        assert_eq!(run(&mut term, &[b"\x1b"], &["a", "b"]), Selection::Cancelled);
        assert_restored_once(&term);
    }

    #[test]
    fn ctrl_c_interrupts_and_still_restores_once() {
        let mut term = FakeTerminal::default();
        assert_eq!(run(&mut term, &[b"j", b"\x03"], &["a", "b"]), Selection::Interrupted);
        assert_restored_once(&term);
    }

    #[test]
    fn end_of_input_cancels() {
        let mut term = FakeTerminal::default();
        assert_eq!(run(&mut term, &[b"j"], &["a", "b"]), Selection::Cancelled);
        assert_restored_once(&term);
    }

    #[test]
    fn read_errors_propagate_after_cleanup() {
        let mut term = FakeTerminal::default();
        let err = select_with(&mut term, &mut Broken, &options(&["a"]), "Pick").unwrap_err();
        assert!(matches!(err, SelectorError::Io(_)));
        assert_restored_once(&term);
    }

    #[test]
    fn draw_errors_propagate_after_cleanup() {
        let mut term = FakeTerminal {
            fail_draw: true,
            ..Default::default()
        };
        let mut input = ChunkedReader::new(Chunks::new(&[b"\r"]));
        let err = select_with(&mut term, &mut input, &options(&["a"]), "Pick").unwrap_err();
        assert!(matches!(err, SelectorError::Io(_)));
        assert_restored_once(&term);
    }

    #[test]
    fn frames_show_title_and_cursor() {
        let mut term = FakeTerminal::default();
        run(&mut term, &[b"j", b"q"], &["a", "b"]);
        let last = term.frames.last().unwrap();
        assert_eq!(last.title, "Pick");
        assert_eq!(last.rows[1].label, "b (tool)");
        assert!(last.rows[1].highlighted);
        assert!(!last.rows[0].highlighted);
    }
}
