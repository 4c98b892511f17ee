//! Clause and diff value objects.
//!
//! A [`Clause`] is one textual ECL fragment inside a query expression's
//! inclusion or exclusion list. A [`QueryExpressionDiff`] is the outcome
//! of one optimization run: clauses to add to each list and caller
//! clauses made redundant by them.

use std::collections::BTreeSet;

/// One ECL fragment of a query expression.
///
/// `pinned` marks a caller clause the optimizer must carry through
/// unmodified; pinned clauses are only ever deduplicated, never rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Clause {
    /// Caller-assigned identifier, if any.
    pub id: Option<String>,
    /// The ECL text. Must parse with [`ecl_ast::parse`].
    pub query_text: String,
    /// Whether the caller marked this clause as non-negotiable.
    pub pinned: bool,
}

impl Clause {
    /// Creates an unpinned clause from ECL text.
    pub fn new(query_text: impl Into<String>) -> Self {
        Self { id: None, query_text: query_text.into(), pinned: false }
    }

    /// Creates a pinned clause from ECL text.
    pub fn pinned(query_text: impl Into<String>) -> Self {
        Self { id: None, query_text: query_text.into(), pinned: true }
    }

    /// Attaches a caller-assigned identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl std::fmt::Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.query_text)
    }
}

/// The outcome of one optimization run.
///
/// Applying the diff to the caller's clause lists (append `add_to_inclusion`
/// and `add_to_exclusion`, delete every clause in `remove`) produces lists
/// that evaluate to the same concept set as the originals, except under the
/// lossy strategy where a bounded false-positive rate is tolerated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryExpressionDiff {
    /// Clauses to append to the inclusion list.
    pub add_to_inclusion: Vec<Clause>,
    /// Clauses to append to the exclusion list.
    pub add_to_exclusion: Vec<Clause>,
    /// Caller clauses the optimized lists no longer need.
    pub remove: Vec<Clause>,
}

impl QueryExpressionDiff {
    /// A diff that changes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the diff changes anything at all.
    pub fn is_empty(&self) -> bool {
        self.add_to_inclusion.is_empty()
            && self.add_to_exclusion.is_empty()
            && self.remove.is_empty()
    }

    /// Total number of clauses across all three lists.
    pub fn len(&self) -> usize {
        self.add_to_inclusion.len() + self.add_to_exclusion.len() + self.remove.len()
    }

    /// The inclusion clause texts, as a set for order-insensitive checks.
    pub fn inclusion_texts(&self) -> BTreeSet<&str> {
        self.add_to_inclusion.iter().map(|c| c.query_text.as_str()).collect()
    }

    /// The exclusion clause texts, as a set for order-insensitive checks.
    pub fn exclusion_texts(&self) -> BTreeSet<&str> {
        self.add_to_exclusion.iter().map(|c| c.query_text.as_str()).collect()
    }

    /// The removed clause texts, as a set for order-insensitive checks.
    pub fn removed_texts(&self) -> BTreeSet<&str> {
        self.remove.iter().map(|c| c.query_text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clause_constructors() {
        let plain = Clause::new("<< 404684003");
        assert!(!plain.pinned);
        assert!(plain.id.is_none());

        let pinned = Clause::pinned("^ 447562003").with_id("component-1");
        assert!(pinned.pinned);
        assert_eq!(pinned.id.as_deref(), Some("component-1"));
        assert_eq!(pinned.to_string(), "^ 447562003");
    }

    #[test]
    fn test_empty_diff() {
        let diff = QueryExpressionDiff::empty();
        assert!(diff.is_empty());
        assert_eq!(diff.len(), 0);
    }

    #[test]
    fn test_diff_text_sets() {
        let diff = QueryExpressionDiff {
            add_to_inclusion: vec![Clause::new("<< 100"), Clause::new("200")],
            add_to_exclusion: vec![Clause::new("< 300")],
            remove: vec![Clause::new("100"), Clause::new("200")],
        };
        assert!(!diff.is_empty());
        assert_eq!(diff.len(), 5);
        assert_eq!(diff.inclusion_texts(), ["<< 100", "200"].into_iter().collect());
        assert_eq!(diff.exclusion_texts(), ["< 300"].into_iter().collect());
        assert_eq!(diff.removed_texts(), ["100", "200"].into_iter().collect());
    }
}
