//! Tool-side errors.

use thiserror::Error;

/// Errors a tool implementation can raise.
///
/// Upstream API failures are NOT errors here — tools fold those into a
/// failed `ToolOutcome`. `ToolError` covers caller mistakes (missing
/// arguments) and client-side infrastructure faults.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A required argument was absent or empty.
    #[error("missing required argument '{0}'")]
    MissingArgument(&'static str),

    /// HTTP client infrastructure failure (not an upstream API error).
    #[error("http client error: {message}")]
    Http {
        /// What went wrong.
        message: String,
    },
}
