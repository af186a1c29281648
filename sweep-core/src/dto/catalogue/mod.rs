//! Model catalogue
//!
//! The set of canonical model ids (e.g. `GritLM/GritLM-7B`) that manifest
//! model names are resolved against. Accepted either as a JSON array of
//! strings or as plain text with one id per line.

use serde::{Deserialize, Serialize};

/// Known canonical model ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalogue {
    ids: Vec<String>,
}

impl ModelCatalogue {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a catalogue, detecting JSON arrays by their leading `[`
    ///
    /// Plain text input ignores blank lines and lines starting with `#`.
    pub fn parse(input: &str) -> serde_json::Result<Self> {
        if input.trim_start().starts_with('[') {
            return serde_json::from_str(input);
        }

        Ok(Self::new(
            input
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        ))
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_catalogue() {
        let catalogue = ModelCatalogue::parse(r#"["GritLM/GritLM-7B", "intfloat/e5-small"]"#).unwrap();
        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue.ids()[1], "intfloat/e5-small");
    }

    #[test]
    fn test_parse_line_catalogue() {
        let input = "# known models\nGritLM/GritLM-7B\n\n  intfloat/e5-small  \n";
        let catalogue = ModelCatalogue::parse(input).unwrap();
        assert_eq!(
            catalogue.ids(),
            &["GritLM/GritLM-7B".to_string(), "intfloat/e5-small".to_string()]
        );
    }

    #[test]
    fn test_parse_invalid_json_catalogue() {
        assert!(ModelCatalogue::parse("[1, 2").is_err());
    }
}
