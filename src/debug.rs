//! TLS library debug output.
//!
//! Two sinks for mbedTLS diagnostics:
//!
//! - [`CrlfWriter`] backs the library's `printf` replacement.  The board
//!   console expects `\r\n` line endings, so every `\n` is expanded.
//! - [`forward`] backs the per-session debug callback and routes each line
//!   into the `log` facade at a level derived from the mbedTLS verbosity.

use core::fmt::{self, Write};

use log::Level;

/// `fmt::Write` adapter that expands `\n` into `\r\n`.
pub struct CrlfWriter<W> {
    inner: W,
    written: usize,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Bytes handed to the inner writer so far, CRs included.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut lines = s.split('\n');
        if let Some(first) = lines.next() {
            self.inner.write_str(first)?;
            self.written += first.len();
        }
        for line in lines {
            self.inner.write_str("\r\n")?;
            self.inner.write_str(line)?;
            self.written += 2 + line.len();
        }
        Ok(())
    }
}

/// Counts formatted bytes without storing them.
struct Measure(usize);

impl Write for Measure {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

/// Format `args` onto `out`, CRLF-expanding if `crlf` is set.
///
/// Returns the formatted length plus one for the terminator, the value the
/// library's `printf` hook is expected to report.  Newline expansion is not
/// counted.
pub fn print<W: Write>(mut out: W, crlf: bool, args: fmt::Arguments<'_>) -> Result<usize, fmt::Error> {
    let mut measure = Measure(0);
    measure.write_fmt(args)?;
    if crlf {
        CrlfWriter::new(out).write_fmt(args)?;
    } else {
        out.write_fmt(args)?;
    }
    Ok(measure.0 + 1)
}

/// `log` level for an mbedTLS debug verbosity (0 = error … 4 = verbose).
pub fn level_for(verbosity: i32) -> Level {
    match verbosity {
        i32::MIN..=0 => Level::Error,
        1 => Level::Warn,
        2 => Level::Info,
        3 => Level::Debug,
        _ => Level::Trace,
    }
}

/// Where mbedTLS debug lines go, packed into the callback's context pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugSink {
    pub threshold: u8,
    /// Write raw CRLF-terminated lines to the console instead of `log`.
    pub console: bool,
}

impl DebugSink {
    pub fn new(threshold: u8, console: bool) -> Self {
        Self { threshold, console }
    }

    /// Encode as an integer context value.
    pub fn to_ctx(self) -> usize {
        usize::from(self.threshold) | (usize::from(self.console) << 8)
    }

    pub fn from_ctx(ctx: usize) -> Self {
        Self {
            threshold: (ctx & 0xff) as u8,
            console: ctx & 0x100 != 0,
        }
    }

    /// Emit one debug line.  `console` receives it only in console mode.
    pub fn emit<W: Write>(self, console: W, verbosity: i32, file: &str, line: u32, msg: &str) {
        if verbosity > i32::from(self.threshold) {
            return;
        }
        if self.console {
            let file = file.rsplit('/').next().unwrap_or(file);
            // Console write errors have nowhere to go.
            let _ = print(console, true, format_args!("{}:{}: {}", file, line, msg));
        } else {
            forward(self.threshold, verbosity, file, line, msg);
        }
    }
}

/// Route one mbedTLS debug line into `log`.
///
/// Lines above `threshold` are dropped.  Trailing newlines are trimmed since
/// the logger terminates records itself.
pub fn forward(threshold: u8, verbosity: i32, file: &str, line: u32, msg: &str) {
    if verbosity > i32::from(threshold) {
        return;
    }
    let file = file.rsplit('/').next().unwrap_or(file);
    log::log!(
        target: "mbedtls",
        level_for(verbosity),
        "{}:{}: {}",
        file,
        line,
        msg.trim_end_matches(['\r', '\n'])
    );
}
