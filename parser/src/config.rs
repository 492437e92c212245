//! Tunable knobs for the extractor (§6 "Tunable environment").
//!
//! Loading a config file from disk and wiring it into the surrounding proxy
//! is out of scope (§1); this type only models the values themselves and
//! how to read them from a TOML file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Lines longer than this are dropped with a warning (§4.1, §6).
    pub max_line_length: usize,
    /// Ring-buffer capacity for retained `Message`s (§6).
    pub max_message_history: usize,
    /// Upper bound for a sector index accepted by validation (§3, §6).
    pub sector_validation_bound: u32,
    /// Upper bound the storage layer itself will accept (§6).
    pub sector_storage_bound: u32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_line_length: 2000,
            max_message_history: 1000,
            sector_validation_bound: 20_000,
            sector_storage_bound: 50_000,
        }
    }
}

impl ParserConfig {
    /// Load config from a TOML file, falling back to defaults for any
    /// field the file omits.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Generate a commented default TOML config string.
    pub fn generate_default_toml() -> String {
        r#"# twist-telemetry parser configuration
# All fields are optional; omitted fields take the default shown below.

# Lines longer than this are dropped with a warning.
max_line_length = 2000

# Ring-buffer capacity for retained transmission/radio messages.
max_message_history = 1000

# Upper bound for a sector index accepted by validation.
sector_validation_bound = 20000

# Upper bound the storage layer itself will accept.
sector_storage_bound = 50000
"#
        .to_string()
    }
}
