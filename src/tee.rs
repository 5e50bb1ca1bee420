//! Tee writer: duplicates console output into a log file
//!
//! `TeeWriter` wraps a console sink (usually [`std::io::Stdout`]) and an
//! append-mode log file. Every write goes to the console first, then to the
//! log. The console is borrowed as a handle only; it is never closed here and
//! is handed back by [`TeeWriter::close`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::io::Write;
//! use trueno_lab::tee::TeeWriter;
//!
//! let mut tee = TeeWriter::open(std::io::stdout(), "run/out.log")?;
//! writeln!(tee, "epoch 1: loss=0.42")?;
//! let _stdout = tee.close();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::Result;

/// Console sink plus append-mode log file.
#[derive(Debug)]
pub struct TeeWriter<W: Write> {
    console: W,
    log: File,
    log_path: PathBuf,
}

impl<W: Write> TeeWriter<W> {
    /// Open `path` for appending (creating it if absent) and pair it with `console`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the parent directory does not exist or the
    /// file cannot be opened for writing.
    pub fn open(console: W, path: impl AsRef<Path>) -> Result<Self> {
        let log_path = path.as_ref().to_path_buf();
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        tracing::debug!(path = %log_path.display(), "opened output log");

        Ok(Self {
            console,
            log,
            log_path,
        })
    }

    /// Path of the log file.
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Shared access to the console sink.
    #[must_use]
    pub const fn console(&self) -> &W {
        &self.console
    }

    /// Mutable access to the console sink; writes through it skip the log.
    pub fn console_mut(&mut self) -> &mut W {
        &mut self.console
    }

    /// Write `message` verbatim to the console, then to the log.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if either sink rejects the write.
    pub fn write_message(&mut self, message: &str) -> Result<()> {
        self.write_all(message.as_bytes())?;
        Ok(())
    }

    /// Flush both sinks.
    ///
    /// Unlike [`Write::flush`], which is a no-op on this type, this pushes
    /// buffered console bytes out and asks the log file to flush as well.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if either flush fails.
    pub fn sync(&mut self) -> Result<()> {
        self.console.flush()?;
        self.log.flush()?;
        Ok(())
    }

    /// Close the log file and hand the console back.
    #[must_use = "the console sink is returned so the caller can keep using it"]
    pub fn close(self) -> W {
        tracing::debug!(path = %self.log_path.display(), "closed output log");
        // Dropping `log` closes the file descriptor.
        self.console
    }
}

impl<W: Write> Write for TeeWriter<W> {
    /// Writes the whole buffer to both sinks and reports it as fully written.
    /// Both copies must hold identical bytes.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.console.write_all(buf)?;
        self.log.write_all(buf)?;
        Ok(buf.len())
    }

    /// No-op. Loop-flushing callers keep working; flushing is not forwarded.
    /// Use [`TeeWriter::sync`] for an explicit flush.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
