use thiserror::Error;

/// Top-level error surface for the public API.
///
/// Per spec §7, parse-time anomalies never reach the caller as an `Err` —
/// they are logged and absorbed. `TwistError` only covers failures that
/// cross a real fallible boundary: store I/O, config loading, and replay
/// of a malformed transcript file in the CLI.
#[derive(Debug, Error)]
pub enum TwistError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors surfaced by the persistence layer (§6).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("tracker {tracker} had no discovered fields to execute")]
    Empty { tracker: &'static str },
}

/// Errors loading a `ParserConfig` from TOML.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Reasons a line or field was discarded or clamped during parsing (§7).
///
/// These are never returned to the caller. They exist so handlers can
/// attach a structured reason to their `tracing::warn!` call instead of
/// formatting ad-hoc strings at every call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAnomaly {
    MalformedNumeric { field: &'static str, text: String },
    UnexpectedKeyword { expected: &'static str, found: String },
    OversizeLine { len: usize },
    InvalidUtf8,
    RangeViolation { field: &'static str, value: i64, clamped_to: i64 },
}

impl std::fmt::Display for ParseAnomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseAnomaly::MalformedNumeric { field, text } => {
                write!(f, "malformed numeric in {field}: {text:?}")
            }
            ParseAnomaly::UnexpectedKeyword { expected, found } => {
                write!(f, "expected keyword {expected:?}, found {found:?}")
            }
            ParseAnomaly::OversizeLine { len } => write!(f, "line of {len} bytes exceeds bound"),
            ParseAnomaly::InvalidUtf8 => write!(f, "invalid utf-8 in line"),
            ParseAnomaly::RangeViolation { field, value, clamped_to } => write!(
                f,
                "{field} value {value} out of range, clamped to {clamped_to}"
            ),
        }
    }
}
