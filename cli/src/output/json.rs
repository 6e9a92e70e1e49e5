//! JSON output helpers for `--json` mode.

use anyhow::{Context, Result};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format the terminal status of a provisioning run, e.g. `{"status": "completed"}`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_status(status: &str) -> Result<String> {
    let obj = serde_json::json!({ "status": status });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
