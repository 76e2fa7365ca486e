//! Search terms

use thiserror::Error;

/// Shortest term the backend will search for.
pub const MIN_QUERY_CHARS: usize = 2;

/// Reasons a search term is not sent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchTermError {
    /// The trimmed term is shorter than [`MIN_QUERY_CHARS`].
    #[error("search term must be at least {MIN_QUERY_CHARS} characters")]
    TooShort,
}

/// A trimmed search term of at least [`MIN_QUERY_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Validate a raw query.
    ///
    /// # Errors
    ///
    /// Returns [`SearchTermError::TooShort`] for blank or one-character queries.
    pub fn parse(query: &str) -> Result<Self, SearchTermError> {
        let trimmed = query.trim();

        if trimmed.chars().count() < MIN_QUERY_CHARS {
            return Err(SearchTermError::TooShort);
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The trimmed term.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_terms_are_rejected() {
        assert_eq!(SearchTerm::parse(""), Err(SearchTermError::TooShort));
        assert_eq!(SearchTerm::parse(" g "), Err(SearchTermError::TooShort));
    }

    #[test]
    fn terms_are_trimmed() {
        let term = SearchTerm::parse("  goat ").map(|term| term.as_str().to_string());

        assert_eq!(term, Ok("goat".to_string()));
    }
}
