//! CLI runtime configuration.
//!
//! Resolved once at startup and then passed into the command handlers, so nothing below `main`
//! reads process-wide environment variables.

use oplist_wire::{DocumentFormat, WireResult};
use std::path::Path;

/// Environment variable naming the format used when a path's extension does not decide it.
pub const DOCUMENT_FORMAT_ENV: &str = "OPLIST_DOCUMENT_FORMAT";

/// CLI configuration resolved at startup.
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    default_format: DocumentFormat,
}

impl CliConfig {
    pub fn new(default_format: DocumentFormat) -> Self {
        Self { default_format }
    }

    /// Reads [`DOCUMENT_FORMAT_ENV`] from the process environment.
    pub fn from_env() -> WireResult<Self> {
        let value = std::env::var(DOCUMENT_FORMAT_ENV).ok();
        Ok(Self::new(document_format_from_env_value(value)?))
    }

    /// Format for `path`: explicit override, then file extension, then the configured default.
    pub fn format_for(&self, path: &Path, explicit: Option<DocumentFormat>) -> DocumentFormat {
        explicit
            .or_else(|| DocumentFormat::from_path(path))
            .unwrap_or(self.default_format)
    }
}

/// Parse the default document format from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns JSON.
pub fn document_format_from_env_value(value: Option<String>) -> WireResult<DocumentFormat> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<DocumentFormat>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}
