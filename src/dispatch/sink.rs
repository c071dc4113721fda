// src/dispatch/sink.rs
// =============================================================================
// The one place every probe writes its result line to.
//
// Many tasks finish at about the same time. If they all wrote to stdout
// directly, two lines could end up mixed together. The Sink wraps the real
// writer in a Mutex and writes each line with a single call while holding
// the lock, so lines come out whole.
//
// Rust concepts:
// - Mutex<T>: Only one thread at a time can get at the T inside
// - Generics: Sink<W> works with stdout, a file, or a Vec<u8> in tests
// =============================================================================

use std::io::{self, Write};
use std::sync::Mutex;

#[derive(Debug)]
pub struct Sink<W: Write> {
    writer: Mutex<W>,
}

impl<W: Write> Sink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    // Writes `line` plus a newline as one unit.
    //
    // The text is fully built before locking; the lock is held only for the
    // write and flush, never across an .await. Both are blocking calls made
    // from a runtime worker; one line at a time that is a few bytes.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "output lock poisoned"))?;
        writer.write_all(buf.as_bytes())?;
        writer.flush()
    }

    /// Gives back the underlying writer (used once every writer is done)
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
