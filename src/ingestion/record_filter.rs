//! Record arity filtering.
//!
//! Malformed rows in the source come from fields that contain a literal delimiter. Counting
//! delimiters per line is a cheap heuristic for spotting them. The artifact's consumer applies the
//! same count to decide which rows exist, so [`DelimiterArity`] must not drift from it.

use std::io::{self, BufRead, Read};

/// Result of classifying one raw line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The line is passed on to the parser.
    Accepted,
    /// The line is dropped without a trace.
    Rejected,
}

/// Decides whether a raw line (without its terminator) is a well-formed record.
pub trait RecordPredicate {
    fn classify(&self, line: &str) -> RecordOutcome;
}

impl<F> RecordPredicate for F
where
    F: Fn(&str) -> RecordOutcome,
{
    fn classify(&self, line: &str) -> RecordOutcome {
        self(line)
    }
}

/// Accepts a line iff it holds exactly `arity - 1` delimiter bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterArity {
    delimiter: u8,
    arity: usize,
}

impl DelimiterArity {
    /// Create a predicate for records of `arity` fields separated by `delimiter`.
    pub fn new(delimiter: u8, arity: usize) -> Self {
        Self { delimiter, arity }
    }

    /// Number of delimiters a well-formed line contains.
    pub fn expected_delimiters(&self) -> usize {
        self.arity.saturating_sub(1)
    }
}

impl Default for DelimiterArity {
    fn default() -> Self {
        Self::new(b'\t', 9)
    }
}

impl RecordPredicate for DelimiterArity {
    fn classify(&self, line: &str) -> RecordOutcome {
        let count = line.bytes().filter(|&b| b == self.delimiter).count();
        if count == self.expected_delimiters() {
            RecordOutcome::Accepted
        } else {
            RecordOutcome::Rejected
        }
    }
}

/// A [`Read`] adapter that yields only the accepted lines of `inner`, terminators included.
///
/// Lines are pulled one at a time, so memory stays bounded by the longest line.
#[derive(Debug)]
pub struct FilteredLines<R, P> {
    inner: R,
    predicate: P,
    line: String,
    pos: usize,
}

impl<R: BufRead, P: RecordPredicate> FilteredLines<R, P> {
    /// Wrap a line source with a record predicate.
    pub fn new(inner: R, predicate: P) -> Self {
        Self {
            inner,
            predicate,
            line: String::new(),
            pos: 0,
        }
    }

    /// Load the next accepted line. Returns `false` at end of input.
    fn next_accepted(&mut self) -> io::Result<bool> {
        loop {
            self.line.clear();
            self.pos = 0;
            if self.inner.read_line(&mut self.line)? == 0 {
                return Ok(false);
            }
            let content = self.line.trim_end_matches(['\n', '\r']);
            if self.predicate.classify(content) == RecordOutcome::Accepted {
                return Ok(true);
            }
        }
    }
}

impl<R: BufRead, P: RecordPredicate> Read for FilteredLines<R, P> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.line.len() && !self.next_accepted()? {
            return Ok(0);
        }
        let pending = &self.line.as_bytes()[self.pos..];
        let n = pending.len().min(buf.len());
        buf[..n].copy_from_slice(&pending[..n]);
        self.pos += n;
        Ok(n)
    }
}
