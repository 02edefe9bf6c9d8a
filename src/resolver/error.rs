//! Error types for metadata resolution strategies.
//!
//! Strategies never propagate these out of [`MetadataResolver::resolve`](super::MetadataResolver::resolve);
//! they travel inside [`StrategyOutcome::NoResult`](super::StrategyOutcome) so the
//! orchestrator can log why a strategy came back empty and move on.

use thiserror::Error;

/// Reasons a resolution strategy produced no usable data.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// Connection, DNS, TLS or timeout failure
    #[error("request to '{url}' failed: {reason}\n  Suggestion: {suggestion}")]
    Transport {
        /// The URL that was being fetched
        url: String,
        /// Why the request failed
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// The server answered with a non-success status
    #[error("'{url}' returned HTTP {status}")]
    HttpStatus {
        /// The URL that was fetched
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The payload could not be parsed (HTML, JSON or PDF)
    #[error("malformed {format} from '{url}': {reason}")]
    Malformed {
        /// Payload kind ("json", "pdf", ...)
        format: &'static str,
        /// Source URL or identifier
        url: String,
        /// Parser message
        reason: String,
    },

    /// The payload parsed but lacked the field a strategy needs
    #[error("no {field} found for '{input}'")]
    MissingField {
        /// Field that was expected ("title", "icons", ...)
        field: &'static str,
        /// Input being resolved
        input: String,
    },

    /// The strategy does not apply to this input
    #[error("strategy '{strategy}' skipped for '{input}': {reason}")]
    Skipped {
        /// Strategy name
        strategy: &'static str,
        /// Input being resolved
        input: String,
        /// Why it was skipped
        reason: String,
    },

    /// The HTTP client could not be constructed
    #[error("HTTP client construction failed: {reason}\n  Suggestion: {suggestion}")]
    ClientBuild {
        /// Builder error message
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },
}

impl ResolveError {
    /// Creates a `Transport` error from a reqwest error.
    #[must_use]
    pub fn transport(url: &str, error: &reqwest::Error) -> Self {
        let suggestion = if error.is_timeout() {
            "The site is slow or blocking automated requests; raise the fetch timeout"
        } else if error.is_connect() {
            "Check the hostname and your network connection"
        } else {
            "Check the URL and try again"
        };
        Self::Transport {
            url: url.to_string(),
            reason: error.to_string(),
            suggestion: suggestion.to_string(),
        }
    }

    /// Creates an `HttpStatus` error.
    #[must_use]
    pub fn http_status(url: &str, status: u16) -> Self {
        Self::HttpStatus {
            url: url.to_string(),
            status,
        }
    }

    /// Creates a `Malformed` error.
    #[must_use]
    pub fn malformed(format: &'static str, url: &str, reason: impl ToString) -> Self {
        Self::Malformed {
            format,
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a `MissingField` error.
    #[must_use]
    pub fn missing(field: &'static str, input: &str) -> Self {
        Self::MissingField {
            field,
            input: input.to_string(),
        }
    }

    /// Creates a `Skipped` error.
    #[must_use]
    pub fn skipped(strategy: &'static str, input: &str, reason: &str) -> Self {
        Self::Skipped {
            strategy,
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a `ClientBuild` error.
    #[must_use]
    pub fn client_build(reason: impl ToString) -> Self {
        Self::ClientBuild {
            reason: reason.to_string(),
            suggestion: "Check proxy environment variables and TLS configuration".to_string(),
        }
    }
}
