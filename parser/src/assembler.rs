//! Byte/Line Assembler (C1, §4.1).
//!
//! Accumulates arbitrary byte chunks into complete, CR-delimited, ANSI-free
//! lines plus a trailing partial "prompt" view the dispatcher may peek at
//! without consuming.

use tracing::warn;

use crate::ansi::AnsiStripper;
use crate::error::ParseAnomaly;

/// One fully-assembled line: the ANSI-stripped text used for parsing, and
/// the original (still ANSI-decorated) bytes for anything downstream that
/// wants to re-render the line (§4.1: "parallel with-ANSI buffer ... not
/// consumed by parsing").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledLine {
    pub text: String,
    pub with_ansi: Vec<u8>,
}

/// Accumulates bytes across `feed()` calls and emits complete lines.
pub struct LineAssembler {
    max_line_length: usize,
    stripper: AnsiStripper,
    partial_line: String,
    partial_ansi: Vec<u8>,
}

impl LineAssembler {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            stripper: AnsiStripper::new(),
            partial_line: String::new(),
            partial_ansi: Vec::new(),
        }
    }

    /// Accepts an arbitrary chunk, returning zero or more complete lines.
    /// Never panics; malformed UTF-8 and oversize lines are dropped with a
    /// warning rather than surfaced as an error (§4.1 failure semantics).
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<AssembledLine> {
        let mut out = Vec::new();
        let mut plain_bytes: Vec<u8> = Vec::with_capacity(bytes.len());

        for &b in bytes {
            // NUL and BEL are stripped unconditionally, before ANSI handling.
            if b == 0x00 || b == 0x07 {
                continue;
            }

            if b == b'\r' {
                self.finish_line(&mut out);
                continue;
            }
            if b == b'\n' {
                // LF is ignored entirely; CR is the only delimiter (§4.1, §6).
                continue;
            }

            self.partial_ansi.push(b);
            if let Some(plain) = self.stripper.feed_byte(b) {
                plain_bytes.push(plain);
            }
        }

        if !plain_bytes.is_empty() {
            match std::str::from_utf8(&plain_bytes) {
                Ok(s) => self.partial_line.push_str(s),
                Err(_) => {
                    warn!(anomaly = %ParseAnomaly::InvalidUtf8, "dropping non-utf8 bytes");
                }
            }
        }

        out
    }

    fn finish_line(&mut self, out: &mut Vec<AssembledLine>) {
        let text = std::mem::take(&mut self.partial_line);
        let with_ansi = std::mem::take(&mut self.partial_ansi);

        if text.len() > self.max_line_length {
            warn!(anomaly = %ParseAnomaly::OversizeLine { len: text.len() }, "dropping line");
            return;
        }

        out.push(AssembledLine { text, with_ansi });
    }

    /// The current (not-yet-terminated) partial line, exposed for
    /// prompt-prefix matching without being consumed (§4.1, §4.3).
    pub fn prompt(&self) -> &str {
        &self.partial_line
    }

    /// Flushes any non-empty partial as a final line. Call when the
    /// underlying stream closes.
    pub fn finalize(&mut self) -> Option<AssembledLine> {
        if self.partial_line.is_empty() {
            return None;
        }
        let mut out = Vec::new();
        self.finish_line(&mut out);
        out.into_iter().next()
    }
}
