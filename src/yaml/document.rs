//! In-memory YAML document: a mutable, optionally-empty key-value tree.

use std::io::{Read, Write};

use serde_yaml::{Mapping, Value as Yaml};

use crate::error::DocumentError;

/// A YAML document node wrapping an optional mapping.
///
/// Freshly deserialized empty input yields a node with no mapping at all;
/// such a node serializes back to empty output and reports every key as
/// absent. Key lookups come in case-sensitive and case-insensitive flavors;
/// the case-insensitive form lower-cases both the query key and the existing
/// keys and resolves to the first match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YamlDocument {
    value: Option<Mapping>,
}

/// A value stored under a document key.
///
/// Nested mappings are always exposed as further document nodes, and
/// sequence elements are wrapped element-wise, so callers never see a raw
/// mapping. Writing a value back through [`YamlDocument::set`] reverses the
/// conversion structurally.
#[derive(Debug, Clone, PartialEq)]
pub enum YamlValue {
    /// A scalar leaf (string, number, boolean, null, or tagged scalar).
    Scalar(Yaml),
    /// A nested mapping, wrapped as its own document node.
    Document(YamlDocument),
    /// A sequence of values, each wrapped recursively.
    Sequence(Vec<YamlValue>),
}

impl YamlValue {
    /// Wrap a raw parsed value: mappings become documents, sequences wrap
    /// element-wise, everything else passes through as a scalar.
    pub fn wrap(value: Yaml) -> Self {
        match value {
            Yaml::Mapping(mapping) => YamlValue::Document(YamlDocument::new(Some(mapping))),
            Yaml::Sequence(items) => {
                YamlValue::Sequence(items.into_iter().map(YamlValue::wrap).collect())
            }
            scalar => YamlValue::Scalar(scalar),
        }
    }

    /// Unwrap back to the plain representation stored inside a mapping.
    /// A document with no mapping unwraps to null.
    pub fn unwrap(self) -> Yaml {
        match self {
            YamlValue::Scalar(scalar) => scalar,
            YamlValue::Document(doc) => doc.value.map(Yaml::Mapping).unwrap_or(Yaml::Null),
            YamlValue::Sequence(items) => {
                Yaml::Sequence(items.into_iter().map(YamlValue::unwrap).collect())
            }
        }
    }

    /// The nested document, if this value is one.
    pub fn as_document(&self) -> Option<&YamlDocument> {
        match self {
            YamlValue::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// The scalar, if this value is one.
    pub fn as_scalar(&self) -> Option<&Yaml> {
        match self {
            YamlValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl From<&str> for YamlValue {
    fn from(s: &str) -> Self {
        YamlValue::Scalar(Yaml::String(s.to_string()))
    }
}

impl From<i64> for YamlValue {
    fn from(n: i64) -> Self {
        YamlValue::Scalar(Yaml::Number(n.into()))
    }
}

impl YamlDocument {
    /// Create a document over an explicit mapping (or none at all).
    pub fn new(value: Option<Mapping>) -> Self {
        Self { value }
    }

    /// The underlying mapping, if any.
    pub fn mapping(&self) -> Option<&Mapping> {
        self.value.as_ref()
    }

    /// Whether this document has no mapping or an empty one.
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().is_none_or(|m| m.is_empty())
    }

    // ── (De)serialization ───────────────────────────────────────────────

    /// Serialize to YAML bytes. A document with no mapping serializes to
    /// empty bytes by convention.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        match &self.value {
            None => Ok(Vec::new()),
            Some(mapping) => serde_yaml::to_string(mapping)
                .map(String::into_bytes)
                .map_err(|e| DocumentError::Encode {
                    message: e.to_string(),
                }),
        }
    }

    /// Deserialize from YAML bytes.
    ///
    /// Empty (or whitespace-only, which parses to null) input yields a
    /// document with no mapping. Anything else must parse to a mapping;
    /// malformed input or a scalar/sequence root is a decode error.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DocumentError> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new(None));
        }
        let parsed: Yaml = serde_yaml::from_slice(data).map_err(|e| DocumentError::Decode {
            message: e.to_string(),
        })?;
        match parsed {
            Yaml::Null => Ok(Self::new(None)),
            Yaml::Mapping(mapping) => Ok(Self::new(Some(mapping))),
            other => Err(DocumentError::Decode {
                message: format!("top-level YAML value is not a mapping: {other:?}"),
            }),
        }
    }

    /// Serialize into a writer; writes nothing when there is no mapping.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), DocumentError> {
        match &self.value {
            None => Ok(()),
            Some(mapping) => {
                serde_yaml::to_writer(writer, mapping).map_err(|e| DocumentError::Encode {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Deserialize from a reader, with the same conventions as [`Self::from_bytes`].
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, DocumentError> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| DocumentError::Decode {
                message: e.to_string(),
            })?;
        Self::from_bytes(&data)
    }

    // ── Key access ──────────────────────────────────────────────────────

    /// Whether `key` exists. Always false when there is no mapping.
    pub fn has(&self, key: &str, case_sensitive: bool) -> bool {
        self.resolve_key(key, case_sensitive).is_some()
    }

    /// Get the value at `key`, wrapping nested structure.
    pub fn get(&self, key: &str, case_sensitive: bool) -> Result<YamlValue, DocumentError> {
        let resolved = self.resolve_key(key, case_sensitive).ok_or_else(|| {
            DocumentError::KeyNotFound {
                key: key.to_string(),
            }
        })?;
        let value = self
            .value
            .as_ref()
            .and_then(|mapping| mapping.get(&resolved))
            .cloned()
            .ok_or_else(|| DocumentError::KeyNotFound {
                key: key.to_string(),
            })?;
        Ok(YamlValue::wrap(value))
    }

    /// Set `key` to `value`, unwrapping documents and sequences before storing.
    ///
    /// Case-sensitive mode upserts, creating the key when absent.
    /// Case-insensitive mode only overwrites an existing key whose
    /// case-folded name matches; it never creates a new key.
    pub fn set(
        &mut self,
        key: &str,
        value: YamlValue,
        case_sensitive: bool,
    ) -> Result<(), DocumentError> {
        let target = if case_sensitive {
            Yaml::String(key.to_string())
        } else {
            self.resolve_key(key, false)
                .ok_or_else(|| DocumentError::KeyNotFound {
                    key: key.to_string(),
                })?
        };
        let mapping = self
            .value
            .as_mut()
            .ok_or_else(|| DocumentError::KeyNotFound {
                key: key.to_string(),
            })?;
        mapping.insert(target, value.unwrap());
        Ok(())
    }

    /// Remove `key`, resolved with the same rules as [`Self::set`] lookups.
    pub fn delete(&mut self, key: &str, case_sensitive: bool) -> Result<(), DocumentError> {
        let resolved = self.resolve_key(key, case_sensitive).ok_or_else(|| {
            DocumentError::KeyNotFound {
                key: key.to_string(),
            }
        })?;
        if let Some(mapping) = self.value.as_mut() {
            mapping.remove(&resolved);
        }
        Ok(())
    }

    /// Deep-merge `other` into this document in place and return the receiver.
    ///
    /// Overlapping keys holding mappings merge recursively; for any other
    /// overlap the incoming value wins. A document with no mapping adopts
    /// the other's mapping wholesale; merging an empty other is a no-op.
    pub fn merge(&mut self, other: &YamlDocument) -> &mut Self {
        if let Some(incoming) = &other.value {
            match &mut self.value {
                Some(base) => deep_merge(base, incoming),
                None => self.value = Some(incoming.clone()),
            }
        }
        self
    }

    /// Resolve `key` to the actual mapping key it addresses, honoring the
    /// case-sensitivity mode. Returns `None` when absent or when there is no
    /// mapping at all.
    fn resolve_key(&self, key: &str, case_sensitive: bool) -> Option<Yaml> {
        let mapping = self.value.as_ref()?;
        if case_sensitive {
            let candidate = Yaml::String(key.to_string());
            return mapping.contains_key(&candidate).then_some(candidate);
        }
        let folded = key.to_lowercase();
        mapping
            .keys()
            .find(|k| {
                k.as_str()
                    .is_some_and(|name| name.to_lowercase() == folded)
            })
            .cloned()
    }
}

/// Recursive mapping merge: mapping-into-mapping recurses, anything else is
/// replaced by the incoming value.
fn deep_merge(base: &mut Mapping, incoming: &Mapping) {
    for (key, value) in incoming {
        match (base.get_mut(key), value) {
            (Some(Yaml::Mapping(existing)), Yaml::Mapping(nested)) => {
                deep_merge(existing, nested);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
