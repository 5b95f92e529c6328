//! Extraction of resolved domains from raw resolver output
//!
//! The resolver writes one record block per queried name: the line naming the
//! query and its status, followed by answer lines. A domain counts as resolved
//! when a `NOERROR` line appears inside the answer window, i.e. lines
//! `1..=window` counted from the block start. A line carrying `NXDOMAIN`
//! closes the window.
//!
//! This depends on the resolver's record layout staying rigid. Extra records
//! or multi-answer responses shift lines out of the window, so such domains are
//! missed; a `NOERROR` that merely appears in an answer line inside the window
//! is taken at face value.
//!
//! `NXDOMAIN` is final: nothing later in the same output is emitted. Resetting
//! the count to zero instead would reopen a window one line after the
//! `NXDOMAIN` and accept the `NOERROR` lines that follow it. Workers that reset
//! the count report a superset of what this parser reports.
//!
//! [`AnswerWindow`] is the state machine, [`Domains`] drives it lazily over any
//! line iterator, and [`parse_output`] streams a file through it.

use crate::error::{Disposition, Error, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

/// Status marker for a successful lookup
pub const NOERROR: &str = "NOERROR";
/// Status marker for a non-existent domain
pub const NXDOMAIN: &str = "NXDOMAIN";

/// Position of the parser relative to the current record block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// At the block start; the next line opens the answer window
    AwaitingBlock,
    /// Inside the answer window, `n` lines after the block start
    WithinWindow(usize),
    /// Past the window, or the block reported NXDOMAIN
    Suppressed,
}

/// Line-by-line state machine deciding which lines yield a domain
#[derive(Debug, Clone)]
pub struct AnswerWindow {
    state: WindowState,
    window: usize,
}

impl AnswerWindow {
    /// Start at the beginning of a block with a window of `window` lines
    pub fn new(window: usize) -> Self {
        Self::starting_at(window, 0)
    }

    /// Start as if `position` lines had already been seen since the block start
    pub fn starting_at(window: usize, position: usize) -> Self {
        let state = match position {
            0 => WindowState::AwaitingBlock,
            n if n <= window => WindowState::WithinWindow(n),
            _ => WindowState::Suppressed,
        };
        Self { state, window }
    }

    /// Current state
    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Consume one line, returning the domain it confirms, if any
    pub fn feed(&mut self, line: &str) -> Option<String> {
        if line.contains(NXDOMAIN) {
            self.state = WindowState::Suppressed;
            return None;
        }

        let domain = match self.state {
            WindowState::WithinWindow(_) if line.contains(NOERROR) => extract_domain(line),
            _ => None,
        };
        self.advance();
        domain
    }

    /// Consume a line that could not be read; it counts but never matches
    pub fn skip(&mut self) {
        self.advance();
    }

    fn advance(&mut self) {
        self.state = match self.state {
            WindowState::AwaitingBlock if self.window > 0 => WindowState::WithinWindow(1),
            WindowState::WithinWindow(n) if n < self.window => WindowState::WithinWindow(n + 1),
            _ => WindowState::Suppressed,
        };
    }
}

/// Normalize the first field of `line` into a domain name
///
/// Strips one trailing root-label dot and lower-cases the result. Returns
/// `None` when nothing is left.
pub fn extract_domain(line: &str) -> Option<String> {
    let token = line.split_whitespace().next()?;
    let name = token.strip_suffix('.').unwrap_or(token);
    if name.is_empty() {
        return None;
    }
    Some(name.to_lowercase())
}

/// Lazy iterator of domains confirmed by a sequence of output lines
#[derive(Debug, Clone)]
pub struct Domains<I> {
    lines: I,
    window: AnswerWindow,
}

impl<I, S> Iterator for Domains<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        for line in self.lines.by_ref() {
            if let Some(domain) = self.window.feed(line.as_ref()) {
                return Some(domain);
            }
        }
        None
    }
}

/// Run `window` over `lines`
///
/// ```
/// use freya::parser::{AnswerWindow, extract_domains};
///
/// let lines = ["Example.COM. IN A NOERROR", "example.com. 300 IN A 1.2.3.4"];
/// let found: Vec<_> = extract_domains(lines, AnswerWindow::starting_at(3, 1)).collect();
/// assert_eq!(found, vec!["example.com".to_string()]);
/// ```
pub fn extract_domains<I>(lines: I, window: AnswerWindow) -> Domains<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    Domains {
        lines: lines.into_iter(),
        window,
    }
}

/// Counters from one [`parse_output`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    /// Lines read from the resolver output
    pub lines: u64,
    /// Domains written to the result file
    pub domains: u64,
    /// Lines dropped because they could not be decoded
    pub skipped: u64,
}

/// Stream `output` through an [`AnswerWindow`] and write one domain per line to `results`
///
/// `results` is truncated first, so running this twice on the same input
/// produces identical files. Undecodable lines are skipped and counted.
pub async fn parse_output(output: &Path, results: &Path, window: usize) -> Result<ParseSummary> {
    let source = File::open(output)
        .await
        .map_err(|e| Error::io_at(output, e))?;
    let mut reader = BufReader::new(source);

    let sink = File::create(results)
        .await
        .map_err(|e| Error::io_at(results, e))?;
    let mut writer = BufWriter::new(sink);

    let mut state = AnswerWindow::new(window);
    let mut summary = ParseSummary::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| Error::io_at(output, e))?;
        if read == 0 {
            break;
        }
        summary.lines += 1;

        let line = match decode_line(&buf, summary.lines) {
            Ok(line) => line,
            Err(e) if e.disposition() == Disposition::Skip => {
                tracing::trace!(error = %e, "Skipping output line");
                summary.skipped += 1;
                state.skip();
                continue;
            }
            Err(e) => return Err(e),
        };

        if let Some(domain) = state.feed(line) {
            writer
                .write_all(domain.as_bytes())
                .await
                .map_err(|e| Error::io_at(results, e))?;
            writer
                .write_all(b"\n")
                .await
                .map_err(|e| Error::io_at(results, e))?;
            summary.domains += 1;
        }
    }

    writer.flush().await.map_err(|e| Error::io_at(results, e))?;
    Ok(summary)
}

fn decode_line(raw: &[u8], line: u64) -> Result<&str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    std::str::from_utf8(raw).map_err(|_| Error::MalformedLine { line })
}
