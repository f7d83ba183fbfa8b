//! YAML book: open, read and edit YAML documents while keeping structure intact.
//!
//! The document concept itself lives in [`document`]; this module adds the
//! book façade with its named procedures and the conversions between
//! document values and generic procedure concepts.

pub mod document;

pub use document::{YamlDocument, YamlValue};

use serde_yaml::Value as Yaml;

use crate::book::{
    Book, BookSignature, Concept, ProcedureInput, ProcedureParam, ProcedureSignature,
};
use crate::error::{BookError, BookResult, DocumentError};
use crate::phrase::NounPhrase;
use crate::value::Value;

/// How a procedure addresses a document property.
#[derive(Debug, Clone)]
pub enum PropertyName {
    /// Exact key, matched case-sensitively.
    Exact(String),
    /// Natural-language phrase, resolved case-insensitively against
    /// candidate field names.
    Phrase(NounPhrase),
}

impl From<&str> for PropertyName {
    fn from(key: &str) -> Self {
        PropertyName::Exact(key.to_string())
    }
}

impl From<NounPhrase> for PropertyName {
    fn from(phrase: NounPhrase) -> Self {
        PropertyName::Phrase(phrase)
    }
}

impl std::fmt::Display for PropertyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyName::Exact(key) => f.write_str(key),
            PropertyName::Phrase(phrase) => phrase.fmt(f),
        }
    }
}

/// The YAML book. Stateless: every procedure operates on documents the
/// caller passes in, so there is no connect handshake and no configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlBook;

impl YamlBook {
    /// Create the book.
    pub fn new() -> Self {
        Self
    }

    /// Retrieve a property from a document.
    ///
    /// Exact names use case-sensitive lookup; phrases try each candidate
    /// field name case-insensitively and return the first match.
    pub fn get_property(
        &self,
        document: &YamlDocument,
        property: &PropertyName,
    ) -> BookResult<YamlValue> {
        match property {
            PropertyName::Exact(key) => Ok(document.get(key, true)?),
            PropertyName::Phrase(phrase) => {
                for name in phrase.to_field_names() {
                    if document.has(&name, false) {
                        return Ok(document.get(&name, false)?);
                    }
                }
                Err(DocumentError::KeyNotFound {
                    key: phrase.to_string(),
                }
                .into())
            }
        }
    }

    /// Set a property on a document, in place.
    ///
    /// Exact names upsert; phrases only overwrite an existing key resolved
    /// case-insensitively and fail when nothing matches.
    pub fn set_property(
        &self,
        document: &mut YamlDocument,
        property: &PropertyName,
        value: YamlValue,
    ) -> BookResult<()> {
        match property {
            PropertyName::Exact(key) => Ok(document.set(key, value, true)?),
            PropertyName::Phrase(phrase) => {
                for name in phrase.to_field_names() {
                    if document.has(&name, false) {
                        return Ok(document.set(&name, value, false)?);
                    }
                }
                Err(DocumentError::KeyNotFound {
                    key: phrase.to_string(),
                }
                .into())
            }
        }
    }

    /// Remove a property from a document, in place.
    pub fn delete_property(
        &self,
        document: &mut YamlDocument,
        property: &PropertyName,
    ) -> BookResult<()> {
        match property {
            PropertyName::Exact(key) => Ok(document.delete(key, true)?),
            PropertyName::Phrase(phrase) => {
                for name in phrase.to_field_names() {
                    if document.has(&name, false) {
                        return Ok(document.delete(&name, false)?);
                    }
                }
                Err(DocumentError::KeyNotFound {
                    key: phrase.to_string(),
                }
                .into())
            }
        }
    }

    /// Serialize a document to text.
    pub fn to_text(&self, document: &YamlDocument) -> BookResult<String> {
        let bytes = document.to_bytes()?;
        String::from_utf8(bytes).map_err(|e| {
            DocumentError::Encode {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Parse text into a document.
    pub fn from_text(&self, text: &str) -> BookResult<YamlDocument> {
        Ok(YamlDocument::from_bytes(text.as_bytes())?)
    }

    /// Serialize a document into a writer (e.g. a file).
    pub fn to_stream<W: std::io::Write>(
        &self,
        document: &YamlDocument,
        writer: W,
    ) -> BookResult<()> {
        Ok(document.to_writer(writer)?)
    }

    /// Parse a document from a reader (e.g. a file).
    pub fn from_stream<R: std::io::Read>(&self, reader: R) -> BookResult<YamlDocument> {
        Ok(YamlDocument::from_reader(reader)?)
    }

    /// Deep-merge `other` into `document` and return a clone of the result.
    pub fn merge(&self, document: &mut YamlDocument, other: &YamlDocument) -> YamlDocument {
        document.merge(other).clone()
    }
}

// ── Concept conversions ─────────────────────────────────────────────────

/// Expose a document value as a generic procedure concept.
impl From<YamlValue> for Concept {
    fn from(value: YamlValue) -> Self {
        match value {
            YamlValue::Document(doc) => Concept::Document(doc),
            YamlValue::Sequence(items) => {
                Concept::List(items.into_iter().map(Concept::from).collect())
            }
            YamlValue::Scalar(scalar) => match scalar {
                Yaml::Null => Concept::Empty,
                Yaml::Bool(b) => Concept::Scalar(Value::Bool(b)),
                Yaml::String(s) => Concept::Scalar(Value::Text(s)),
                Yaml::Number(n) => match n.as_f64() {
                    Some(f) => Concept::Scalar(Value::Number(f)),
                    None => Concept::Scalar(Value::Text(n.to_string())),
                },
                other => match serde_yaml::to_string(&other) {
                    Ok(text) => Concept::Scalar(Value::Text(text.trim_end().to_string())),
                    Err(_) => Concept::Empty,
                },
            },
        }
    }
}

/// Bring a generic concept back into the document representation.
impl From<Concept> for YamlValue {
    fn from(concept: Concept) -> Self {
        match concept {
            Concept::Empty => YamlValue::Scalar(Yaml::Null),
            Concept::Scalar(Value::Text(s)) => YamlValue::Scalar(Yaml::String(s)),
            Concept::Scalar(Value::Number(n)) => YamlValue::Scalar(yaml_number(n)),
            Concept::Scalar(Value::Bool(b)) => YamlValue::Scalar(Yaml::Bool(b)),
            Concept::Scalar(Value::Timestamp(t)) => {
                YamlValue::Scalar(Yaml::String(t.to_rfc3339()))
            }
            Concept::Document(doc) => YamlValue::Document(doc),
            Concept::List(items) => {
                YamlValue::Sequence(items.into_iter().map(YamlValue::from).collect())
            }
            Concept::Records(records) => YamlValue::Sequence(
                records
                    .into_iter()
                    .map(|r| YamlValue::wrap(serde_yaml::to_value(r).unwrap_or(Yaml::Null)))
                    .collect(),
            ),
        }
    }
}

/// Scalars travel as `f64` through the concept layer; keep integral values
/// as YAML integers so a set does not rewrite `2` into `2.0`.
fn yaml_number(n: f64) -> Yaml {
    let truncated = n as i64;
    if truncated as f64 == n {
        Yaml::Number(truncated.into())
    } else {
        Yaml::Number(n.into())
    }
}

// ── Dynamic dispatch surface ────────────────────────────────────────────

/// Resolve the "property" parameter of a dynamic call: exact match first,
/// then a case-insensitive phrase match.
fn property_or_phrase(document: &YamlDocument, name: &str) -> PropertyName {
    if document.has(name, true) {
        PropertyName::Exact(name.to_string())
    } else {
        PropertyName::Phrase(NounPhrase::new(name))
    }
}

impl Book for YamlBook {
    fn signature(&self) -> BookSignature {
        BookSignature {
            name: "yaml".into(),
            description: "Open, read and edit YAML documents while keeping their structure and format intact.".into(),
            procedures: vec![
                ProcedureSignature {
                    name: "get_property".into(),
                    description: "Retrieve a property from a YAML document by exact name or natural-language phrase.".into(),
                    parameters: vec![
                        ProcedureParam::required("yaml", "The YAML document."),
                        ProcedureParam::required("property", "Name of the property to retrieve."),
                    ],
                },
                ProcedureSignature {
                    name: "set_property".into(),
                    description: "Set or change a property of a YAML document.".into(),
                    parameters: vec![
                        ProcedureParam::required("yaml", "The YAML document."),
                        ProcedureParam::required("property", "Name of the property to change."),
                        ProcedureParam::required("value", "New value for the property."),
                    ],
                },
                ProcedureSignature {
                    name: "delete_property".into(),
                    description: "Remove a property from a YAML document.".into(),
                    parameters: vec![
                        ProcedureParam::required("yaml", "The YAML document."),
                        ProcedureParam::required("property", "Name of the property to remove."),
                    ],
                },
                ProcedureSignature {
                    name: "to_text".into(),
                    description: "Serialize a YAML document to text.".into(),
                    parameters: vec![ProcedureParam::required("yaml", "The YAML document.")],
                },
                ProcedureSignature {
                    name: "from_text".into(),
                    description: "Parse text into a YAML document.".into(),
                    parameters: vec![ProcedureParam::required("text", "The text to parse.")],
                },
                ProcedureSignature {
                    name: "merge".into(),
                    description: "Deep-merge one YAML document into another.".into(),
                    parameters: vec![
                        ProcedureParam::required("yaml", "The document merged into (and returned)."),
                        ProcedureParam::required("other", "The document whose values win on overlap."),
                    ],
                },
            ],
        }
    }

    fn call(&self, procedure: &str, input: ProcedureInput) -> BookResult<Concept> {
        match procedure {
            "get_property" => {
                let document = input.require_document("yaml", procedure)?;
                let name = input.require_text("property", procedure)?;
                let value = self.get_property(document, &property_or_phrase(document, name))?;
                Ok(value.into())
            }
            "set_property" => {
                let mut document = input.require_document("yaml", procedure)?.clone();
                let name = input.require_text("property", procedure)?;
                let value = input.require("value", procedure)?.clone();
                let property = property_or_phrase(&document, name);
                self.set_property(&mut document, &property, value.into())?;
                Ok(document.into())
            }
            "delete_property" => {
                let mut document = input.require_document("yaml", procedure)?.clone();
                let name = input.require_text("property", procedure)?;
                let property = property_or_phrase(&document, name);
                self.delete_property(&mut document, &property)?;
                Ok(document.into())
            }
            "to_text" => {
                let document = input.require_document("yaml", procedure)?;
                Ok(self.to_text(document)?.into())
            }
            "from_text" => {
                let text = input.require_text("text", procedure)?;
                Ok(self.from_text(text)?.into())
            }
            "merge" => {
                let mut document = input.require_document("yaml", procedure)?.clone();
                let other = input.require_document("other", procedure)?;
                Ok(self.merge(&mut document, other).into())
            }
            other => Err(BookError::UnknownProcedure {
                book: "yaml".into(),
                name: other.to_string(),
            }),
        }
    }
}
