//! Placeholder token parsing.
//!
//! A token is an expansion name, an underscore, and an identifier, bounded
//! by a delimiter character on both sides:
//!
//! ```text
//! %player_name%                 expansion=player    identifier=name
//! %rel_factions_rel_faction%    expansion=factions  identifier=rel_faction  (relational)
//! ```
//!
//! The `rel_` marker in front of the expansion makes a token relational.
//! The identifier is everything after the first underscore that follows the
//! expansion name and may itself contain underscores.
//!
//! Anything that does not form a valid token (unterminated delimiters,
//! whitespace inside, missing identifier) is left alone. Parsing never fails.

use crate::types::{ParsedPlaceholder, RELATIONAL_PREFIX};
use crate::{MimirError, Result};

/// Default token delimiter.
pub const DEFAULT_DELIMITER: char = '%';

/// Extracts placeholder tokens from text.
///
/// Implementations must be deterministic: the same text always yields the
/// same tokens at the same offsets, in ascending order of `start`, without
/// overlap.
pub trait PlaceholderParser: Send + Sync {
    /// All tokens in `text`, ordered by start offset.
    fn find_all(&self, text: &str) -> Vec<ParsedPlaceholder>;

    /// Parse a single placeholder, with or without its delimiters.
    ///
    /// The whole input must form one token; `None` otherwise.
    fn try_parse(&self, token: &str) -> Option<ParsedPlaceholder>;

    /// Cheap pre-check used to skip parsing for token-free text.
    ///
    /// May return false positives, never false negatives.
    fn contains_placeholders(&self, text: &str) -> bool;
}

/// Parser for `<delim>expansion_identifier<delim>` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedParser {
    delimiter: char,
}

impl DelimitedParser {
    /// Create a parser with a custom delimiter.
    ///
    /// The delimiter cannot be alphanumeric, whitespace, a control
    /// character, or `_`, since those occur inside tokens.
    pub fn new(delimiter: char) -> Result<Self> {
        if delimiter.is_alphanumeric()
            || delimiter.is_whitespace()
            || delimiter.is_control()
            || delimiter == '_'
        {
            return Err(MimirError::InvalidDelimiter(delimiter));
        }
        Ok(Self { delimiter })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Split the text between two delimiters into its parts.
    fn split_inner<'a>(&self, inner: &'a str) -> Option<(&'a str, &'a str, bool)> {
        if inner.is_empty()
            || inner
                .chars()
                .any(|c| c == self.delimiter || c.is_whitespace() || c.is_control())
        {
            return None;
        }

        let (body, relational) = match inner.strip_prefix(RELATIONAL_PREFIX) {
            Some(rest) => (rest, true),
            None => (inner, false),
        };

        let (expansion, identifier) = body.split_once('_')?;
        if expansion.is_empty() || identifier.is_empty() || !is_expansion_name(expansion) {
            return None;
        }
        Some((expansion, identifier, relational))
    }
}

impl Default for DelimitedParser {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl PlaceholderParser for DelimitedParser {
    fn find_all(&self, text: &str) -> Vec<ParsedPlaceholder> {
        let delim = self.delimiter;
        let width = delim.len_utf8();
        let mut tokens = Vec::new();
        let mut cursor = 0;

        while let Some(found) = text[cursor..].find(delim) {
            let open = cursor + found;
            let inner_start = open + width;
            let Some(len) = text[inner_start..].find(delim) else {
                break;
            };
            let close = inner_start + len;

            match self.split_inner(&text[inner_start..close]) {
                Some((expansion, identifier, relational)) => {
                    tokens.push(ParsedPlaceholder::new(
                        open,
                        close + width,
                        expansion,
                        identifier,
                        relational,
                    ));
                    cursor = close + width;
                }
                // The closing delimiter may open the next token, as in "100% of %player_name%".
                None => cursor = close,
            }
        }

        tokens
    }

    fn try_parse(&self, token: &str) -> Option<ParsedPlaceholder> {
        let inner = token
            .strip_prefix(self.delimiter)
            .and_then(|t| t.strip_suffix(self.delimiter))
            .unwrap_or(token);
        let (expansion, identifier, relational) = self.split_inner(inner)?;
        Some(ParsedPlaceholder::new(
            0,
            token.len(),
            expansion,
            identifier,
            relational,
        ))
    }

    fn contains_placeholders(&self, text: &str) -> bool {
        match text.find(self.delimiter) {
            Some(first) => text[first + self.delimiter.len_utf8()..].contains(self.delimiter),
            None => false,
        }
    }
}

/// Expansion names are ASCII alphanumerics plus `-`.
fn is_expansion_name(name: &str) -> bool {
    name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}
