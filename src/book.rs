//! Book system: trait-based provider adapters with runtime registration.
//!
//! A book exposes one external provider's capabilities as a set of named
//! procedures with typed inputs and outputs. Each book implements the
//! [`Book`] trait and can be registered on a [`Bookshelf`] for uniform
//! connect/call dispatch by name.

use std::collections::HashMap;

use crate::error::{BookError, BookResult, ConfigError};
use crate::filter::FilterExpr;
use crate::value::Value;
use crate::yaml::YamlDocument;

/// Description of a book's interface.
#[derive(Debug, Clone)]
pub struct BookSignature {
    /// Unique name of the book.
    pub name: String,
    /// What this book integrates with.
    pub description: String,
    /// The procedures the book exposes.
    pub procedures: Vec<ProcedureSignature>,
}

/// Description of a single procedure.
#[derive(Debug, Clone)]
pub struct ProcedureSignature {
    /// Unique name of the procedure within its book.
    pub name: String,
    /// What this procedure does.
    pub description: String,
    /// Parameters the procedure accepts.
    pub parameters: Vec<ProcedureParam>,
}

/// A single parameter in a procedure's signature.
#[derive(Debug, Clone)]
pub struct ProcedureParam {
    /// Parameter name.
    pub name: String,
    /// What this parameter controls.
    pub description: String,
    /// Whether this parameter must be provided.
    pub required: bool,
}

impl ProcedureParam {
    /// A required parameter.
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }

    /// An optional parameter.
    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }
}

/// Credentials and options supplied to a book's connect handshake.
#[derive(Debug, Clone, Default)]
pub struct ConnectInput {
    params: HashMap<String, String>,
}

impl ConnectInput {
    /// Create a new empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential or option.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Get a parameter value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Get a required parameter, returning an error if missing.
    pub fn require(&self, name: &str, book: &str) -> BookResult<&str> {
        self.get(name).ok_or_else(|| BookError::MissingParameter {
            procedure: format!("{book}.connect"),
            name: name.to_string(),
        })
    }

    /// Parse the optional "timeout" option, in seconds.
    ///
    /// Absent means "keep the default"; present but non-numeric is a
    /// configuration error. Range validation belongs to the book's setter.
    pub fn timeout(&self) -> BookResult<Option<f64>> {
        match self.get("timeout") {
            None => Ok(None),
            Some(text) => text.parse::<f64>().map(Some).map_err(|_| {
                ConfigError::UnparseableTimeout {
                    value: text.to_string(),
                }
                .into()
            }),
        }
    }
}

/// Input to a procedure invocation.
///
/// Scalar and document parameters travel in the named-parameter map; the
/// read-side filter expression and the offset/limit pagination pair are
/// framework-level inputs carried alongside.
#[derive(Debug, Clone, Default)]
pub struct ProcedureInput {
    params: HashMap<String, Concept>,
    /// Optional boolean filter over the procedure's result set.
    pub filter: Option<FilterExpr>,
    /// Number of leading results to skip. Default: no skip.
    pub offset: Option<usize>,
    /// Maximum number of results to return. Default: no truncation.
    pub limit: Option<usize>,
}

impl ProcedureInput {
    /// Create a new empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Concept>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add a text parameter.
    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_param(name, Concept::Scalar(Value::Text(value.into())))
    }

    /// Add a document parameter.
    pub fn with_document(self, name: impl Into<String>, document: YamlDocument) -> Self {
        self.with_param(name, Concept::Document(document))
    }

    /// Attach a filter expression.
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Skip the first `offset` results.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Return at most `limit` results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Get a parameter.
    pub fn get(&self, name: &str) -> Option<&Concept> {
        self.params.get(name)
    }

    /// Get a text parameter.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Concept::Scalar(Value::Text(s))) => Some(s),
            _ => None,
        }
    }

    /// Get a document parameter.
    pub fn document(&self, name: &str) -> Option<&YamlDocument> {
        match self.get(name) {
            Some(Concept::Document(doc)) => Some(doc),
            _ => None,
        }
    }

    /// Get a required parameter, returning an error if missing.
    pub fn require(&self, name: &str, procedure: &str) -> BookResult<&Concept> {
        self.get(name).ok_or_else(|| BookError::MissingParameter {
            procedure: procedure.to_string(),
            name: name.to_string(),
        })
    }

    /// Get a required text parameter.
    pub fn require_text(&self, name: &str, procedure: &str) -> BookResult<&str> {
        self.text(name).ok_or_else(|| BookError::MissingParameter {
            procedure: procedure.to_string(),
            name: name.to_string(),
        })
    }

    /// Get a required document parameter.
    pub fn require_document(&self, name: &str, procedure: &str) -> BookResult<&YamlDocument> {
        self.document(name)
            .ok_or_else(|| BookError::MissingParameter {
                procedure: procedure.to_string(),
                name: name.to_string(),
            })
    }
}

/// A typed value returned from (or passed to) a procedure.
#[derive(Debug, Clone, PartialEq)]
pub enum Concept {
    /// No value (an absent optional result).
    Empty,
    /// A scalar.
    Scalar(Value),
    /// A YAML document node.
    Document(YamlDocument),
    /// A list of concepts.
    List(Vec<Concept>),
    /// A list of flat records, one JSON object per provider response item.
    Records(Vec<serde_json::Value>),
}

impl Concept {
    /// The scalar, if this concept is one.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Concept::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// The text content, if this is a text scalar.
    pub fn as_text(&self) -> Option<&str> {
        self.as_scalar().and_then(Value::as_text)
    }

    /// The numeric content, if this is a number scalar.
    pub fn as_number(&self) -> Option<f64> {
        self.as_scalar().and_then(Value::as_number)
    }

    /// The document, if this concept is one.
    pub fn as_document(&self) -> Option<&YamlDocument> {
        match self {
            Concept::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// The records, if this concept is a record list.
    pub fn as_records(&self) -> Option<&[serde_json::Value]> {
        match self {
            Concept::Records(records) => Some(records),
            _ => None,
        }
    }
}

impl From<Value> for Concept {
    fn from(value: Value) -> Self {
        Concept::Scalar(value)
    }
}

impl From<&str> for Concept {
    fn from(s: &str) -> Self {
        Concept::Scalar(Value::from(s))
    }
}

impl From<String> for Concept {
    fn from(s: String) -> Self {
        Concept::Scalar(Value::from(s))
    }
}

impl From<f64> for Concept {
    fn from(n: f64) -> Self {
        Concept::Scalar(Value::from(n))
    }
}

impl From<i64> for Concept {
    fn from(n: i64) -> Self {
        Concept::Scalar(Value::from(n))
    }
}

impl From<bool> for Concept {
    fn from(b: bool) -> Self {
        Concept::Scalar(Value::from(b))
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Concept {
    fn from(t: chrono::DateTime<chrono::Utc>) -> Self {
        Concept::Scalar(Value::from(t))
    }
}

impl From<YamlDocument> for Concept {
    fn from(doc: YamlDocument) -> Self {
        Concept::Document(doc)
    }
}

/// A provider adapter exposing named procedures.
pub trait Book: Send {
    /// Describe this book's interface.
    fn signature(&self) -> BookSignature;

    /// Verify credentials against the provider and retain them on success.
    ///
    /// Books without credentials accept any input and succeed immediately.
    fn connect(&mut self, input: ConnectInput) -> BookResult<()> {
        let _ = input;
        Ok(())
    }

    /// Invoke a procedure by name.
    fn call(&self, procedure: &str, input: ProcedureInput) -> BookResult<Concept>;
}

/// Registry of available books.
pub struct Bookshelf {
    books: HashMap<String, Box<dyn Book>>,
}

impl Bookshelf {
    /// Create a new empty shelf.
    pub fn new() -> Self {
        Self {
            books: HashMap::new(),
        }
    }

    /// Register a book. If a book with the same name exists, it is replaced.
    pub fn register(&mut self, book: Box<dyn Book>) {
        let sig = book.signature();
        self.books.insert(sig.name.clone(), book);
    }

    /// Get a book by name.
    pub fn get(&self, name: &str) -> Option<&dyn Book> {
        self.books.get(name).map(|b| b.as_ref())
    }

    /// Run a book's connect handshake by name.
    pub fn connect(&mut self, name: &str, input: ConnectInput) -> BookResult<()> {
        let book = self
            .books
            .get_mut(name)
            .ok_or_else(|| BookError::UnknownBook {
                name: name.to_string(),
            })?;
        book.connect(input)
    }

    /// Invoke a procedure on a book by name.
    pub fn call(&self, name: &str, procedure: &str, input: ProcedureInput) -> BookResult<Concept> {
        let book = self.get(name).ok_or_else(|| BookError::UnknownBook {
            name: name.to_string(),
        })?;
        book.call(procedure, input)
    }

    /// List all registered book signatures.
    pub fn list(&self) -> Vec<BookSignature> {
        self.books.values().map(|b| b.signature()).collect()
    }

    /// Number of registered books.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Whether the shelf is empty.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl Default for Bookshelf {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bookshelf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bookshelf")
            .field("books", &self.books.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Apply client-side offset/limit slicing to an already-fetched result list.
///
/// The slice is half-open: `offset` leading elements are skipped (an offset
/// past the end yields an empty list), then at most `limit` elements are
/// kept. Omitted offset/limit mean "no skip" and "no truncation".
pub fn paginate<T>(items: Vec<T>, offset: Option<usize>, limit: Option<usize>) -> Vec<T> {
    let skipped = items.into_iter().skip(offset.unwrap_or(0));
    match limit {
        Some(limit) => skipped.take(limit).collect(),
        None => skipped.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_slices_half_open() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(paginate(items, Some(3), Some(4)), vec![3, 4, 5, 6]);
    }

    #[test]
    fn paginate_offset_past_end_is_empty() {
        let items: Vec<u32> = (0..10).collect();
        assert!(paginate(items, Some(20), None).is_empty());
    }

    #[test]
    fn paginate_defaults_pass_everything_through() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(paginate(items.clone(), None, None), items);
        assert_eq!(paginate(items.clone(), Some(0), None), items);
        assert_eq!(paginate(items.clone(), None, Some(100)), items);
    }

    #[test]
    fn connect_input_reports_missing_credentials() {
        let input = ConnectInput::new().with_param("api_key", "k");
        assert_eq!(input.get("api_key"), Some("k"));
        let err = input.require("auth_token", "twilio").unwrap_err();
        assert!(matches!(err, BookError::MissingParameter { .. }));
        assert!(err.to_string().contains("auth_token"));
    }

    #[test]
    fn connect_input_parses_the_timeout_option() {
        assert_eq!(ConnectInput::new().timeout().unwrap(), None);
        let input = ConnectInput::new().with_param("timeout", "2.5");
        assert_eq!(input.timeout().unwrap(), Some(2.5));
        let err = ConnectInput::new()
            .with_param("timeout", "fast")
            .timeout()
            .unwrap_err();
        assert!(matches!(
            err,
            BookError::Config(ConfigError::UnparseableTimeout { .. })
        ));
    }

    #[test]
    fn procedure_input_typed_accessors() {
        let input = ProcedureInput::new()
            .with_text("city", "London")
            .with_param("count", 3i64);
        assert_eq!(input.text("city"), Some("London"));
        assert_eq!(input.get("count").and_then(Concept::as_number), Some(3.0));
        assert!(input.document("city").is_none());
        assert!(input.require_text("missing", "current_temperature").is_err());
    }
}
