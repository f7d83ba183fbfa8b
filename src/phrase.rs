//! Multi-word names for concepts and fields.

use serde::{Deserialize, Serialize};

/// A multi-word name such as "sender number" or "date sent".
///
/// Filter expressions and natural-language property lookups address fields
/// by phrase rather than by identifier. Equality is case-insensitive on the
/// word sequence, so "Sender Number" and "sender number" name the same field.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct NounPhrase {
    words: Vec<String>,
}

impl NounPhrase {
    /// Build a phrase from free text, splitting on whitespace and underscores.
    pub fn new(text: &str) -> Self {
        Self {
            words: text
                .split(|c: char| c.is_whitespace() || c == '_')
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Build a phrase from an explicit word list.
    pub fn from_words(words: &[&str]) -> Self {
        Self {
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// The words of this phrase, in order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// The phrase as a snake_case identifier ("sender number" → "sender_number").
    pub fn snake_case(&self) -> String {
        self.words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Candidate field names for key lookup, most specific first: the words
    /// joined by spaces as written, lower-cased with spaces, and snake_case.
    pub fn to_field_names(&self) -> Vec<String> {
        let spaced = self.words.join(" ");
        let lowered = spaced.to_lowercase();
        let snake = self.snake_case();
        let mut names = vec![spaced];
        if !names.contains(&lowered) {
            names.push(lowered);
        }
        if !names.contains(&snake) {
            names.push(snake);
        }
        names
    }
}

impl PartialEq for NounPhrase {
    fn eq(&self, other: &Self) -> bool {
        self.words.len() == other.words.len()
            && self
                .words
                .iter()
                .zip(&other.words)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl std::hash::Hash for NounPhrase {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for word in &self.words {
            word.to_lowercase().hash(state);
        }
    }
}

impl std::fmt::Display for NounPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.words.join(" "))
    }
}

impl From<&str> for NounPhrase {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_case() {
        assert_eq!(
            NounPhrase::from_words(&["Sender", "Number"]),
            NounPhrase::new("sender number")
        );
        assert_ne!(NounPhrase::new("sender number"), NounPhrase::new("sender"));
    }

    #[test]
    fn splits_underscores() {
        assert_eq!(NounPhrase::new("date_sent"), NounPhrase::new("date sent"));
    }

    #[test]
    fn field_name_candidates() {
        let names = NounPhrase::from_words(&["Sender", "Number"]).to_field_names();
        assert_eq!(
            names,
            vec!["Sender Number", "sender number", "sender_number"]
        );
    }

    #[test]
    fn snake_case_lowers() {
        assert_eq!(NounPhrase::new("Date Sent").snake_case(), "date_sent");
    }
}
