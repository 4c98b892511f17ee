//! Compiled query expressions.
//!
//! The evaluator turns an ECL syntax tree into a [`Query`]: a boolean
//! predicate tree over index documents. A query is either one of the two
//! constants [`Query::MatchAll`] and [`Query::MatchNone`], a single-field
//! predicate, or a boolean combinator. The constants are absorbing elements
//! of [`Query::and`], [`Query::or`] and [`Query::not`], which lets the
//! evaluator short-circuit without touching the graph.

use std::collections::BTreeSet;

use ecl_ast::{ConceptId, TermMatchType};

/// Document field names understood by the query layer, grouped by the
/// document space they live in.
pub mod fields {
    /// Fields of concept documents.
    pub mod concept {
        /// Concept identifier.
        pub const ID: &str = "id";
        /// Active flag.
        pub const ACTIVE: &str = "active";
        /// Module identifier.
        pub const MODULE_ID: &str = "moduleId";
        /// Effective time, yyyyMMdd.
        pub const EFFECTIVE_TIME: &str = "effectiveTime";
        /// Primitive (vs fully defined) flag.
        pub const PRIMITIVE: &str = "primitive";
        /// Semantic tag taken from the fully specified name.
        pub const SEMANTIC_TAG: &str = "semanticTag";
        /// Direct parents in the inferred hierarchy.
        pub const PARENTS: &str = "parents";
        /// Indirect (non-parent) ancestors in the inferred hierarchy.
        pub const ANCESTORS: &str = "ancestors";
        /// Direct parents in the stated hierarchy.
        pub const STATED_PARENTS: &str = "statedParents";
        /// Indirect ancestors in the stated hierarchy.
        pub const STATED_ANCESTORS: &str = "statedAncestors";
        /// Reference sets the concept is an active member of.
        pub const ACTIVE_MEMBER_OF: &str = "activeMemberOf";
    }

    /// Fields of description documents.
    pub mod description {
        /// Identifier of the concept the description belongs to.
        pub const CONCEPT_ID: &str = "conceptId";
        /// The description term text.
        pub const TERM: &str = "term";
        /// Description type (FSN, synonym, ...).
        pub const TYPE_ID: &str = "typeId";
        /// Language code, lowercase.
        pub const LANGUAGE: &str = "languageCode";
        /// Active flag.
        pub const ACTIVE: &str = "active";
        /// Module identifier.
        pub const MODULE_ID: &str = "moduleId";
        /// Effective time, yyyyMMdd.
        pub const EFFECTIVE_TIME: &str = "effectiveTime";
        /// Language reference sets in which this description is preferred.
        pub const PREFERRED_IN: &str = "preferredIn";
        /// Language reference sets in which this description is acceptable.
        pub const ACCEPTABLE_IN: &str = "acceptableIn";
        /// All language reference sets carrying any acceptability.
        pub const LANGUAGE_REFSET: &str = "languageRefSetIds";
    }

    /// Fields of reference set member documents. Member documents also
    /// carry free-form additional fields (e.g. `mapTarget`) addressed by
    /// their literal name.
    pub mod member {
        /// Identifier of the reference set.
        pub const REFSET_ID: &str = "refsetId";
        /// The component the membership is about.
        pub const REFERENCED_COMPONENT: &str = "referencedComponentId";
        /// Association target component, present on association members.
        pub const TARGET_COMPONENT: &str = "targetComponentId";
        /// Active flag.
        pub const ACTIVE: &str = "active";
        /// Module identifier.
        pub const MODULE_ID: &str = "moduleId";
        /// Effective time, yyyyMMdd.
        pub const EFFECTIVE_TIME: &str = "effectiveTime";
    }
}

/// A typed value compared against a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A string value (identifiers, terms, dates, language codes).
    String(String),
    /// A boolean value.
    Boolean(bool),
    /// An integer value.
    Integer(i64),
    /// A decimal value.
    Decimal(f64),
}

impl Eq for FieldValue {}

impl FieldValue {
    /// Orders two values of the same kind. Strings compare
    /// lexicographically, numbers numerically; booleans and mixed
    /// string/number pairs are unordered.
    pub fn compare(&self, other: &FieldValue) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => a.partial_cmp(b),
            (FieldValue::Integer(a), FieldValue::Decimal(b)) => (*a as f64).partial_cmp(b),
            (FieldValue::Decimal(a), FieldValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Decimal(d) => write!(f, "{}", d),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&ConceptId> for FieldValue {
    fn from(value: &ConceptId) -> Self {
        FieldValue::String(value.as_str().to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Decimal(value)
    }
}

/// A compiled boolean predicate tree over index documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Matches every document.
    MatchAll,
    /// Matches no document.
    MatchNone,
    /// Field equals (or, for multi-valued fields, contains) a value.
    Term {
        /// The document field.
        field: String,
        /// The value to compare against.
        value: FieldValue,
    },
    /// Field value (or any of a multi-valued field's values) is in a set.
    Terms {
        /// The document field.
        field: String,
        /// The accepted values.
        values: BTreeSet<String>,
    },
    /// Field is present with at least one value.
    Exists {
        /// The document field.
        field: String,
    },
    /// Field value lies within a range.
    Range {
        /// The document field.
        field: String,
        /// Lower bound, if any.
        from: Option<FieldValue>,
        /// Upper bound, if any.
        to: Option<FieldValue>,
        /// Whether the lower bound itself matches.
        from_inclusive: bool,
        /// Whether the upper bound itself matches.
        to_inclusive: bool,
    },
    /// Lexical match against a text field, in one of the ECL search modes.
    Text {
        /// The document field.
        field: String,
        /// The search term or pattern.
        term: String,
        /// Lexical mode (word match, wildcard, regex, exact).
        match_type: TermMatchType,
    },
    /// Boolean combinator. A document matches when every `filter` clause
    /// matches, at least one `should` clause matches (vacuously true when
    /// `should` is empty), and no `must_not` clause matches.
    Bool {
        /// Conjunctive clauses.
        filter: Vec<Query>,
        /// Disjunctive clauses.
        should: Vec<Query>,
        /// Negated clauses.
        must_not: Vec<Query>,
    },
}

impl Query {
    /// Single-field equality predicate.
    pub fn term(field: impl Into<String>, value: impl Into<FieldValue>) -> Query {
        Query::Term { field: field.into(), value: value.into() }
    }

    /// Set-membership predicate over string values.
    pub fn terms(field: impl Into<String>, values: impl IntoIterator<Item = String>) -> Query {
        Query::Terms { field: field.into(), values: values.into_iter().collect() }
    }

    /// Field-presence predicate.
    pub fn exists(field: impl Into<String>) -> Query {
        Query::Exists { field: field.into() }
    }

    /// Id predicate over a concept id set: match-none for an empty set, a
    /// term for a single id, a terms predicate otherwise.
    pub fn ids<'a>(field: impl Into<String>, ids: impl IntoIterator<Item = &'a ConceptId>) -> Query {
        let values: BTreeSet<String> =
            ids.into_iter().map(|id| id.as_str().to_string()).collect();
        match values.len() {
            0 => Query::MatchNone,
            1 => {
                let only = values.into_iter().next().unwrap_or_default();
                Query::term(field, only)
            }
            _ => Query::Terms { field: field.into(), values },
        }
    }

    /// Conjunction with match-all/match-none short-circuits. Pure
    /// conjunctions flatten instead of nesting.
    pub fn and(self, other: Query) -> Query {
        match (self, other) {
            (Query::MatchAll, q) | (q, Query::MatchAll) => q,
            (Query::MatchNone, _) | (_, Query::MatchNone) => Query::MatchNone,
            (Query::Bool { mut filter, should, must_not }, q)
                if should.is_empty() && must_not.is_empty() =>
            {
                filter.push(q);
                Query::Bool { filter, should, must_not }
            }
            (a, b) => Query::Bool { filter: vec![a, b], should: vec![], must_not: vec![] },
        }
    }

    /// Disjunction with match-all/match-none short-circuits. Pure
    /// disjunctions flatten instead of nesting.
    pub fn or(self, other: Query) -> Query {
        match (self, other) {
            (Query::MatchAll, _) | (_, Query::MatchAll) => Query::MatchAll,
            (Query::MatchNone, q) | (q, Query::MatchNone) => q,
            (Query::Bool { filter, mut should, must_not }, q)
                if filter.is_empty() && must_not.is_empty() && !should.is_empty() =>
            {
                should.push(q);
                Query::Bool { filter, should, must_not }
            }
            (a, b) => Query::Bool { filter: vec![], should: vec![a, b], must_not: vec![] },
        }
    }

    /// Negation. The two constants invert into each other.
    pub fn not(self) -> Query {
        match self {
            Query::MatchAll => Query::MatchNone,
            Query::MatchNone => Query::MatchAll,
            q => Query::Bool { filter: vec![], should: vec![], must_not: vec![q] },
        }
    }

    /// Conjunction over an iterator. Empty input yields match-all.
    pub fn all_of(queries: impl IntoIterator<Item = Query>) -> Query {
        queries.into_iter().fold(Query::MatchAll, Query::and)
    }

    /// Disjunction over an iterator. Empty input yields match-none.
    pub fn any_of(queries: impl IntoIterator<Item = Query>) -> Query {
        queries.into_iter().fold(Query::MatchNone, Query::or)
    }

    /// Zero-cost structural extraction of the concept id set this query
    /// selects. Succeeds only for queries that select concepts purely by
    /// the id field (plus match-none, an empty set); anything else needs a
    /// graph search.
    pub fn as_concept_ids(&self) -> Option<BTreeSet<ConceptId>> {
        match self {
            Query::MatchNone => Some(BTreeSet::new()),
            Query::Term { field, value: FieldValue::String(value) }
                if field == fields::concept::ID =>
            {
                Some(std::iter::once(ConceptId::new(value.as_str())).collect())
            }
            Query::Terms { field, values } if field == fields::concept::ID => {
                Some(values.iter().map(|value| ConceptId::new(value.as_str())).collect())
            }
            _ => None,
        }
    }
}
