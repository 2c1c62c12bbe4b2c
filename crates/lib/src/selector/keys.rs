//! Raw byte input and key decoding.
//!
//! Bytes are consumed one at a time, but they are fetched from the terminal in chunks so
//! the decoder can tell a lone ESC (nothing else arrived with it) from the start of an
//! arrow-key sequence (`ESC [ A`), which terminals deliver in a single read.

use std::io::{self, Read};

const ESC: u8 = 0x1b;
const CTRL_C: u8 = 0x03;

/// A decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    /// `q` / `Q`.
    Quit,
    /// ESC with nothing following it.
    Escape,
    /// Ctrl-C (raw mode delivers it as a byte instead of a signal).
    Interrupt,
    /// Anything else, including unrecognized escape sequences.
    Unknown,
}

/// Blocking byte input with a view of what has already been read.
pub trait ByteSource {
    /// Next byte, blocking until one arrives. `Ok(None)` at end of input.
    fn next_byte(&mut self) -> io::Result<Option<u8>>;

    /// True when a byte is already buffered, i.e. `next_byte` will not block.
    fn has_pending(&self) -> bool;
}

/// [`ByteSource`] over any reader, filling a small buffer one `read` at a time.
#[derive(Debug)]
pub struct ChunkedReader<R> {
    inner: R,
    buf: [u8; 64],
    pos: usize,
    len: usize,
}

impl<R: Read> ChunkedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: [0; 64],
            pos: 0,
            len: 0,
        }
    }
}

impl<R: Read> ByteSource for ChunkedReader<R> {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if self.pos >= self.len {
            let n = loop {
                match self.inner.read(&mut self.buf) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            };
            if n == 0 {
                return Ok(None);
            }
            self.pos = 0;
            self.len = n;
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(b))
    }

    fn has_pending(&self) -> bool {
        self.pos < self.len
    }
}

/// Drop whatever is left of the current read after an unrecognized sequence.
fn discard_pending<S: ByteSource>(src: &mut S) -> io::Result<()> {
    while src.has_pending() {
        src.next_byte()?;
    }
    Ok(())
}

fn read_escape<S: ByteSource>(src: &mut S) -> io::Result<Key> {
    if !src.has_pending() {
        return Ok(Key::Escape);
    }
    let key = match src.next_byte()? {
        None => return Ok(Key::Escape),
        Some(b'[') if src.has_pending() => match src.next_byte()? {
            Some(b'A') => Key::Up,
            Some(b'B') => Key::Down,
            _ => Key::Unknown,
        },
        Some(_) => Key::Unknown,
    };
    if key == Key::Unknown {
        discard_pending(src)?;
    }
    Ok(key)
}

/// Read and decode one key. `Ok(None)` at end of input.
pub fn read_key<S: ByteSource>(src: &mut S) -> io::Result<Option<Key>> {
    let Some(b) = src.next_byte()? else {
        return Ok(None);
    };
    let key = match b {
        ESC => read_escape(src)?,
        b'\r' | b'\n' => Key::Enter,
        b'k' | b'K' => Key::Up,
        b'j' | b'J' => Key::Down,
        b'q' | b'Q' => Key::Quit,
        CTRL_C => Key::Interrupt,
        _ => Key::Unknown,
    };
    Ok(Some(key))
}
