//! Rich diagnostic error types for the bookshelf crate.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so callers know exactly what went wrong
//! without inspecting book internals.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for book operations.
///
/// Each subsystem variant wraps a more specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the caller. The
/// remaining variants belong to the dynamic dispatch surface itself.
#[derive(Debug, Error, Diagnostic)]
pub enum BookError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    #[error("no book registered under the name {name:?}")]
    #[diagnostic(
        code(bookshelf::facade::unknown_book),
        help("Register the book on the shelf before connecting to or calling it.")
    )]
    UnknownBook { name: String },

    #[error("book {book:?} has no procedure named {name:?}")]
    #[diagnostic(
        code(bookshelf::facade::unknown_procedure),
        help("Check the book's signature for the list of procedures it exposes.")
    )]
    UnknownProcedure { book: String, name: String },

    #[error("procedure {procedure:?} is missing required parameter {name:?}")]
    #[diagnostic(
        code(bookshelf::facade::missing_parameter),
        help("Provide the parameter on the procedure input. Required parameters are listed in the procedure signature.")
    )]
    MissingParameter { procedure: String, name: String },

    #[error("book {book:?} is not connected")]
    #[diagnostic(
        code(bookshelf::facade::not_connected),
        help("Call connect() with valid credentials before invoking procedures that reach the provider.")
    )]
    NotConnected { book: String },
}

/// Convenience alias for book operations.
pub type BookResult<T> = std::result::Result<T, BookError>;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors rejected at configuration time, before any network call.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("timeout must be positive, got {seconds}")]
    #[diagnostic(
        code(bookshelf::config::timeout),
        help("The per-call timeout is expressed in seconds and must be strictly greater than zero.")
    )]
    NonPositiveTimeout { seconds: f64 },

    #[error("timeout is not a number: {value:?}")]
    #[diagnostic(
        code(bookshelf::config::timeout_parse),
        help("Provide the timeout as decimal seconds, e.g. \"30\" or \"2.5\".")
    )]
    UnparseableTimeout { value: String },

    #[error("unknown measurement unit {value:?}")]
    #[diagnostic(
        code(bookshelf::config::unit),
        help("Supported units are \"standard\", \"metric\" and \"imperial\".")
    )]
    UnknownUnit { value: String },
}

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a provider client wrapper.
///
/// Transport failures are logged at the call site and then propagated
/// unchanged; there is no local recovery and no retry.
#[derive(Debug, Error, Diagnostic)]
pub enum ProviderError {
    #[error("{provider} rejected the supplied credentials")]
    #[diagnostic(
        code(bookshelf::provider::invalid_credentials),
        help("The provider refused the credential during the connect handshake. The credential was not retained; fix it and connect again.")
    )]
    InvalidCredentials { provider: &'static str },

    #[error("{provider} request failed: {message}")]
    #[diagnostic(
        code(bookshelf::provider::transport),
        help("The call timed out or the connection failed before an HTTP response arrived. Check network reachability and the configured timeout.")
    )]
    Transport {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned HTTP {status}: {body}")]
    #[diagnostic(
        code(bookshelf::provider::status),
        help("The provider answered with a non-success status. The response body usually carries a provider-specific error message.")
    )]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} response was not in the expected shape: {message}")]
    #[diagnostic(
        code(bookshelf::provider::payload),
        help("The HTTP call succeeded but the payload could not be decoded or is missing an expected field.")
    )]
    UnexpectedPayload {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    /// Map a `ureq` failure into the provider taxonomy.
    ///
    /// Non-2xx statuses keep the response body so the provider's own error
    /// message survives; transport failures keep the underlying cause text.
    pub fn from_ureq(provider: &'static str, error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(status, response) => Self::Status {
                provider,
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => Self::Transport {
                provider,
                message: transport.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors raised while walking a filter expression tree.
///
/// Any of these aborts the read operation; partially populated filter state
/// is discarded, never used downstream.
#[derive(Debug, Error, Diagnostic)]
pub enum FilterError {
    #[error("unsupported filter operator: {operator}")]
    #[diagnostic(
        code(bookshelf::filter::operator),
        help("Message filters support equals, greater-than, less-than and conjunction only.")
    )]
    UnsupportedOperator { operator: String },

    #[error("unsupported filter field: {field}")]
    #[diagnostic(
        code(bookshelf::filter::field),
        help("Messages can be filtered by \"sender number\", \"recipient number\" and \"date sent\" only, one field per comparison.")
    )]
    UnsupportedField { field: String },

    #[error("filter on {field} requires a {expected} value")]
    #[diagnostic(
        code(bookshelf::filter::type_mismatch),
        help("Temporal comparisons need a timestamp literal, not text or a number. Convert the value to a datetime first.")
    )]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Document errors
// ---------------------------------------------------------------------------

/// Errors raised by the YAML document concept.
#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error("key not found: {key:?}")]
    #[diagnostic(
        code(bookshelf::document::key_not_found),
        help("The key is absent from the document (after case-insensitive resolution, when enabled). The document was left unmodified.")
    )]
    KeyNotFound { key: String },

    #[error("could not decode YAML document: {message}")]
    #[diagnostic(
        code(bookshelf::document::decode),
        help("The input is not well-formed YAML, or its top level is not a mapping. Decode failures are fatal to the calling procedure.")
    )]
    Decode { message: String },

    #[error("could not encode YAML document: {message}")]
    #[diagnostic(
        code(bookshelf::document::encode),
        help("The in-memory mapping could not be serialized back to YAML text.")
    )]
    Encode { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_error_names_the_value() {
        let err = ConfigError::NonPositiveTimeout { seconds: -1.5 };
        assert!(err.to_string().contains("-1.5"));
    }

    #[test]
    fn type_mismatch_names_field_and_type() {
        let err = FilterError::TypeMismatch {
            field: "date_sent",
            expected: "timestamp",
        };
        let text = err.to_string();
        assert!(text.contains("date_sent"));
        assert!(text.contains("timestamp"));
    }

    #[test]
    fn status_error_keeps_provider_body() {
        let err = ProviderError::Status {
            provider: "openweather",
            status: 404,
            body: "city not found".into(),
        };
        let text = err.to_string();
        assert!(text.contains("404"));
        assert!(text.contains("city not found"));
    }

    #[test]
    fn key_not_found_display() {
        let err = DocumentError::KeyNotFound {
            key: "Movies".into(),
        };
        assert!(err.to_string().contains("Movies"));
    }

    #[test]
    fn subsystem_errors_convert_to_book_error() {
        let err: BookError = ConfigError::NonPositiveTimeout { seconds: 0.0 }.into();
        assert!(matches!(err, BookError::Config(_)));
        let err: BookError = FilterError::UnsupportedOperator {
            operator: "or".into(),
        }
        .into();
        assert!(matches!(err, BookError::Filter(_)));
    }
}
