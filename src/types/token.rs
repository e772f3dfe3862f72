//! Parsed placeholder tokens.

use std::fmt;

/// Marker prefix that turns a placeholder into a relational one.
pub const RELATIONAL_PREFIX: &str = "rel_";

/// One recognised placeholder occurrence in a source text.
///
/// `start..end` is the byte range of the whole token including its
/// delimiters (`end` exclusive), so splicing a value over that range
/// replaces the token exactly. Tokens from a single parse never overlap.
///
/// `full_key` is the token's semantic identity (expansion + identifier,
/// with the `rel_` marker when relational) and is independent of where
/// the token appears. It is the dedupe key within one resolve pass and
/// the key under which values are cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedPlaceholder {
    start: usize,
    end: usize,
    expansion: String,
    identifier: String,
    full_key: String,
    relational: bool,
}

impl ParsedPlaceholder {
    /// Build a token. Callers must uphold `start < end`.
    ///
    /// The expansion is lowercased, matching the registry's
    /// case-insensitive lookup, so `full_key` is too.
    pub(crate) fn new(
        start: usize,
        end: usize,
        expansion: impl Into<String>,
        identifier: impl Into<String>,
        relational: bool,
    ) -> Self {
        debug_assert!(start < end, "token range must be non-empty");
        let expansion = expansion.into().to_ascii_lowercase();
        let identifier = identifier.into();
        let full_key = if relational {
            format!("{RELATIONAL_PREFIX}{expansion}_{identifier}")
        } else {
            format!("{expansion}_{identifier}")
        };
        Self {
            start,
            end,
            expansion,
            identifier,
            full_key,
            relational,
        }
    }

    /// Byte offset of the opening delimiter.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset one past the closing delimiter.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn expansion(&self) -> &str {
        &self.expansion
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn full_key(&self) -> &str {
        &self.full_key
    }

    pub fn is_relational(&self) -> bool {
        self.relational
    }

    /// Length of the token in the source text, delimiters included.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for ParsedPlaceholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_key_includes_relational_marker() {
        let plain = ParsedPlaceholder::new(0, 13, "player", "name", false);
        let rel = ParsedPlaceholder::new(0, 26, "factions", "rel_faction", true);
        assert_eq!(plain.full_key(), "player_name");
        assert_eq!(rel.full_key(), "rel_factions_rel_faction");
        assert_eq!(rel.to_string(), "rel_factions_rel_faction");
    }

    #[test]
    fn expansion_case_is_folded() {
        let upper = ParsedPlaceholder::new(0, 13, "Player", "Name", false);
        assert_eq!(upper.expansion(), "player");
        assert_eq!(upper.identifier(), "Name");
        assert_eq!(upper.full_key(), "player_Name");
    }

    #[test]
    fn len_covers_delimiters() {
        let token = ParsedPlaceholder::new(6, 19, "player", "name", false);
        assert_eq!(token.len(), 13);
        assert!(!token.is_empty());
    }
}
