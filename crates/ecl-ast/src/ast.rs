//! Abstract syntax tree types for ECL expression constraints.

use std::sync::Arc;

// =============================================================================
// Concept Identifiers
// =============================================================================

/// An opaque concept identifier.
///
/// Concept ids are treated as ordered string tokens, never as numbers, so the
/// same engine serves code systems whose ids are not numeric. Cloning is cheap
/// because the backing storage is shared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConceptId(Arc<str>);

impl ConceptId {
    /// Creates a concept id from any string-like value.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConceptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConceptId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConceptId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl std::borrow::Borrow<str> for ConceptId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ConceptId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ConceptId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ConceptId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ConceptId::new)
    }
}

// =============================================================================
// Refinement Types
// =============================================================================

/// Comparison operator for an attribute constraint.
///
/// Hierarchy operators on the target (`= << X`) are carried by the value
/// expression itself, so only equality and inequality live here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefinementOperator {
    /// Exact match: `=`
    Equal,
    /// Not equal: `!=`
    NotEqual,
}

impl std::fmt::Display for RefinementOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefinementOperator::Equal => write!(f, "="),
            RefinementOperator::NotEqual => write!(f, "!="),
        }
    }
}

/// Cardinality constraint for attributes: `[min..max]`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cardinality {
    /// Minimum occurrences.
    pub min: usize,
    /// Maximum occurrences (None = unbounded `*`).
    pub max: Option<usize>,
}

impl Cardinality {
    /// Creates a cardinality constraint.
    pub fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }

    /// Cardinality of exactly zero: `[0..0]`
    pub fn zero() -> Self {
        Self { min: 0, max: Some(0) }
    }

    /// Cardinality of at least one: `[1..*]`
    pub fn at_least_one() -> Self {
        Self { min: 1, max: None }
    }

    /// Checks if a count satisfies this cardinality constraint.
    pub fn matches(&self, count: usize) -> bool {
        if count < self.min {
            return false;
        }
        if let Some(max) = self.max {
            count <= max
        } else {
            true
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}..{}]", self.min, max),
            None => write!(f, "[{}..*]", self.min),
        }
    }
}

/// A single attribute constraint within a refinement.
///
/// Example: `363698007 |Finding site| = << 39057004 |Pulmonary structure|`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeConstraint {
    /// Optional cardinality constraint.
    pub cardinality: Option<Cardinality>,
    /// The attribute type (a constraint over relationship type concepts).
    pub attribute_type: Box<EclExpression>,
    /// Comparison operator.
    pub operator: RefinementOperator,
    /// The target value (may be an expression or wildcard).
    pub value: Box<EclExpression>,
}

impl std::fmt::Display for AttributeConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref card) = self.cardinality {
            write!(f, "{} ", card)?;
        }
        write!(f, "{} {} {}", self.attribute_type, self.operator, self.value)
    }
}

/// A group of attribute constraints that must all be satisfied within the
/// same relationship group.
///
/// Example: `{ 363698007 = << 39057004, 116676008 = << 415582006 }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeGroup {
    /// Optional cardinality for the group itself.
    pub cardinality: Option<Cardinality>,
    /// The attribute constraints in this group.
    pub constraints: Vec<AttributeConstraint>,
}

impl std::fmt::Display for AttributeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref card) = self.cardinality {
            write!(f, "{} ", card)?;
        }
        write!(f, "{{ ")?;
        for (i, c) in self.constraints.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, " }}")
    }
}

/// Refinement clause containing attribute constraints.
///
/// A refinement can have both ungrouped attributes and grouped attributes,
/// all AND-combined.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Refinement {
    /// Ungrouped attribute constraints.
    pub ungrouped: Vec<AttributeConstraint>,
    /// Grouped attribute constraints.
    pub groups: Vec<AttributeGroup>,
}

impl std::fmt::Display for Refinement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for c in &self.ungrouped {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
            first = false;
        }
        for g in &self.groups {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", g)?;
            first = false;
        }
        Ok(())
    }
}

// =============================================================================
// Filter Types
// =============================================================================

/// Comparison operators for filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComparisonOperator {
    /// Equal: `=`
    Equal,
    /// Not equal: `!=`
    NotEqual,
    /// Less than: `<`
    LessThan,
    /// Less than or equal: `<=`
    LessThanOrEqual,
    /// Greater than: `>`
    GreaterThan,
    /// Greater than or equal: `>=`
    GreaterThanOrEqual,
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonOperator::Equal => write!(f, "="),
            ComparisonOperator::NotEqual => write!(f, "!="),
            ComparisonOperator::LessThan => write!(f, "<"),
            ComparisonOperator::LessThanOrEqual => write!(f, "<="),
            ComparisonOperator::GreaterThan => write!(f, ">"),
            ComparisonOperator::GreaterThanOrEqual => write!(f, ">="),
        }
    }
}

/// Lexical mode of a term filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TermMatchType {
    /// All words of the search term occur as word prefixes (default).
    Match,
    /// `*` wildcards: `term = wild:"diab*"`
    Wild,
    /// Regular expression: `term = regex:".*itis"`
    Regex,
    /// Whole-term equality: `term = exact:"Asthma"`
    Exact,
}

impl std::fmt::Display for TermMatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TermMatchType::Match => write!(f, "match"),
            TermMatchType::Wild => write!(f, "wild"),
            TermMatchType::Regex => write!(f, "regex"),
            TermMatchType::Exact => write!(f, "exact"),
        }
    }
}

/// History supplement profile for historical associations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HistoryProfile {
    /// Minimal: SAME AS only.
    Min,
    /// Moderate: a fixed list of well-known association types.
    Mod,
    /// Maximum: every historical association type.
    Max,
}

impl std::fmt::Display for HistoryProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryProfile::Min => write!(f, "-MIN"),
            HistoryProfile::Mod => write!(f, "-MOD"),
            HistoryProfile::Max => write!(f, "-MAX"),
        }
    }
}

/// Acceptability value for dialect filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterAcceptability {
    /// Preferred term only.
    Preferred,
    /// Acceptable term only.
    Acceptable,
}

/// The document space a filter constraint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterDomain {
    /// Concept documents (`{{ C ... }}`).
    Concept,
    /// Description documents (`{{ D ... }}`).
    Description,
    /// Reference set member documents (`{{ M ... }}`).
    Member,
}

impl FilterDomain {
    /// The single-letter prefix used inside a filter block.
    pub fn letter(&self) -> char {
        match self {
            FilterDomain::Concept => 'C',
            FilterDomain::Description => 'D',
            FilterDomain::Member => 'M',
        }
    }
}

/// Value types for member field filters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemberFieldValue {
    /// String value.
    String(String),
    /// Integer value.
    Integer(i64),
    /// Decimal value.
    Decimal(f64),
    /// Boolean value.
    Boolean(bool),
}

impl Eq for MemberFieldValue {}

impl std::fmt::Display for MemberFieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberFieldValue::String(s) => write!(f, "\"{}\"", s),
            MemberFieldValue::Integer(n) => write!(f, "{}", n),
            MemberFieldValue::Decimal(n) => write!(f, "{}", n),
            MemberFieldValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Leaf and composite filters inside a `{{ ... }}` block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(clippy::derive_partial_eq_without_eq)]
pub enum EclFilter {
    // =========================================================================
    // Concept Filters
    // =========================================================================
    /// Active filter: `{{ active = true }}`
    Active(bool),

    /// Module filter: `{{ moduleId = 900000000000207008 }}`
    Module {
        /// Module concept ids to match.
        module_ids: Vec<ConceptId>,
    },

    /// Effective time filter: `{{ effectiveTime >= "20200131" }}`
    ///
    /// The value keeps its textual `yyyymmdd` form; validation happens when
    /// the filter is compiled.
    EffectiveTime {
        /// Comparison operator.
        operator: ComparisonOperator,
        /// Date in `yyyymmdd` format.
        value: String,
    },

    /// Definition status filter: `{{ definitionStatus = primitive }}`
    DefinitionStatus {
        /// True = primitive, false = fully defined.
        is_primitive: bool,
    },

    /// Semantic tag filter: `{{ semanticTag = "disorder" }}`
    SemanticTag {
        /// Semantic tags to match.
        tags: Vec<String>,
    },

    // =========================================================================
    // Description Filters
    // =========================================================================
    /// Term filter: `{{ term = "heart" }}` or `{{ term = wild:"hear*" }}`
    Term {
        /// How to match the term.
        match_type: TermMatchType,
        /// The term value to match.
        value: String,
    },

    /// Description type filter: `{{ typeId = 900000000000003001 }}`
    DescriptionType {
        /// Description type concept ids.
        type_ids: Vec<ConceptId>,
    },

    /// Dialect filter: `{{ dialectId = 900000000000509007 }}`
    Dialect {
        /// Dialect (language reference set) concept ids.
        dialect_ids: Vec<ConceptId>,
        /// Optional acceptability constraint.
        acceptability: Option<FilterAcceptability>,
    },

    /// Language reference set filter: `{{ languageRefSetId = 900000000000509007 }}`
    LanguageRefSet {
        /// Language reference set concept ids.
        refset_ids: Vec<ConceptId>,
    },

    /// Language code filter: `{{ language = en }}` or `{{ language = (en es) }}`
    Language {
        /// Language codes (ISO 639-1).
        codes: Vec<String>,
    },

    // =========================================================================
    // Member Filters
    // =========================================================================
    /// Member field filter: `{{ M mapTarget = "J45.9" }}`
    MemberField {
        /// The member field name.
        field: String,
        /// The comparison operator.
        operator: ComparisonOperator,
        /// The value to compare against.
        value: MemberFieldValue,
    },

    // =========================================================================
    // Composite and Supplement Filters
    // =========================================================================
    /// Conjunction of filters within one block: `{{ a, b }}`
    Conjunction(Vec<EclFilter>),

    /// Disjunction of filters within one block: `{{ a OR b }}`
    Disjunction(Vec<EclFilter>),

    /// History supplement: `{{ +HISTORY }}` or `{{ +HISTORY-MIN }}`
    History {
        /// Optional profile; absent means `-MAX`.
        profile: Option<HistoryProfile>,
    },
}

impl EclFilter {
    /// The domain this filter applies to when no explicit prefix is written.
    pub fn default_domain(&self) -> FilterDomain {
        match self {
            EclFilter::Active(_)
            | EclFilter::Module { .. }
            | EclFilter::EffectiveTime { .. }
            | EclFilter::DefinitionStatus { .. }
            | EclFilter::SemanticTag { .. }
            | EclFilter::History { .. } => FilterDomain::Concept,
            EclFilter::Term { .. }
            | EclFilter::DescriptionType { .. }
            | EclFilter::Dialect { .. }
            | EclFilter::LanguageRefSet { .. }
            | EclFilter::Language { .. } => FilterDomain::Description,
            EclFilter::MemberField { .. } => FilterDomain::Member,
            EclFilter::Conjunction(inner) | EclFilter::Disjunction(inner) => inner
                .first()
                .map(EclFilter::default_domain)
                .unwrap_or(FilterDomain::Concept),
        }
    }
}

fn write_id_set(f: &mut std::fmt::Formatter<'_>, ids: &[ConceptId]) -> std::fmt::Result {
    if ids.len() == 1 {
        write!(f, "{}", ids[0])
    } else {
        let joined: Vec<&str> = ids.iter().map(ConceptId::as_str).collect();
        write!(f, "({})", joined.join(" "))
    }
}

impl std::fmt::Display for EclFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EclFilter::Active(active) => write!(f, "active = {}", active),
            EclFilter::Module { module_ids } => {
                write!(f, "moduleId = ")?;
                write_id_set(f, module_ids)
            }
            EclFilter::EffectiveTime { operator, value } => {
                write!(f, "effectiveTime {} \"{}\"", operator, value)
            }
            EclFilter::DefinitionStatus { is_primitive } => {
                if *is_primitive {
                    write!(f, "definitionStatus = primitive")
                } else {
                    write!(f, "definitionStatus = defined")
                }
            }
            EclFilter::SemanticTag { tags } => {
                if tags.len() == 1 {
                    write!(f, "semanticTag = \"{}\"", tags[0])
                } else {
                    let quoted: Vec<String> = tags.iter().map(|t| format!("\"{}\"", t)).collect();
                    write!(f, "semanticTag = ({})", quoted.join(" "))
                }
            }
            EclFilter::Term { match_type, value } => match match_type {
                TermMatchType::Match => write!(f, "term = \"{}\"", value),
                other => write!(f, "term = {}:\"{}\"", other, value),
            },
            EclFilter::DescriptionType { type_ids } => {
                write!(f, "typeId = ")?;
                write_id_set(f, type_ids)
            }
            EclFilter::Dialect { dialect_ids, acceptability } => {
                write!(f, "dialectId = ")?;
                write_id_set(f, dialect_ids)?;
                match acceptability {
                    Some(FilterAcceptability::Preferred) => write!(f, " prefer"),
                    Some(FilterAcceptability::Acceptable) => write!(f, " accept"),
                    None => Ok(()),
                }
            }
            EclFilter::LanguageRefSet { refset_ids } => {
                write!(f, "languageRefSetId = ")?;
                write_id_set(f, refset_ids)
            }
            EclFilter::Language { codes } => {
                if codes.len() == 1 {
                    write!(f, "language = {}", codes[0])
                } else {
                    write!(f, "language = ({})", codes.join(" "))
                }
            }
            EclFilter::MemberField { field, operator, value } => {
                write!(f, "{} {} {}", field, operator, value)
            }
            EclFilter::Conjunction(filters) => {
                for (i, filter) in filters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", filter)?;
                }
                Ok(())
            }
            EclFilter::Disjunction(filters) => {
                for (i, filter) in filters.iter().enumerate() {
                    if i > 0 {
                        write!(f, " OR ")?;
                    }
                    write!(f, "{}", filter)?;
                }
                Ok(())
            }
            EclFilter::History { profile } => {
                write!(f, "+HISTORY")?;
                if let Some(p) = profile {
                    write!(f, "{}", p)?;
                }
                Ok(())
            }
        }
    }
}

/// One `{{ ... }}` block: a filter tree tagged with the domain it queries.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterConstraint {
    /// The document space the filter runs against.
    pub domain: FilterDomain,
    /// The filter tree inside the block.
    pub filter: EclFilter,
}

impl FilterConstraint {
    /// Creates a filter constraint with the filter's default domain.
    pub fn new(filter: EclFilter) -> Self {
        Self { domain: filter.default_domain(), filter }
    }

    /// Creates a filter constraint with an explicit domain.
    pub fn with_domain(domain: FilterDomain, filter: EclFilter) -> Self {
        Self { domain, filter }
    }
}

impl std::fmt::Display for FilterConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{{ {} {} }}}}", self.domain.letter(), self.filter)
    }
}

// =============================================================================
// Expression Constraints
// =============================================================================

/// Abstract syntax tree for ECL expression constraints.
///
/// # Examples
///
/// ```rust
/// use ecl_ast::{parse, EclExpression};
///
/// // Simple concept reference
/// let expr = parse("404684003").unwrap();
/// assert!(matches!(expr, EclExpression::ConceptReference { .. }));
///
/// // Descendants-or-self of a concept
/// let expr = parse("<< 404684003 |Clinical finding|").unwrap();
/// assert!(matches!(expr, EclExpression::DescendantOrSelfOf(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EclExpression {
    /// Wildcard matching any concept.
    /// Syntax: `*`
    Any,

    /// A single concept reference.
    /// Example: `404684003` or `404684003 |Clinical finding|`
    ConceptReference {
        /// The concept id.
        id: ConceptId,
        /// Optional display term in pipe notation.
        term: Option<String>,
    },

    /// An enumerated set of concept references.
    /// Syntax: `(404684003 64572001)`
    ConceptReferenceSet(Vec<ConceptId>),

    /// Reference set membership.
    /// Syntax: `^ refsetExpression`
    /// Example: `^ 700043003 |Example problem list concepts reference set|`
    MemberOf(Box<EclExpression>),

    /// Descendants of a concept (exclusive).
    /// Syntax: `< subExpression`
    DescendantOf(Box<EclExpression>),

    /// Descendants of a concept or the concept itself.
    /// Syntax: `<< subExpression`
    DescendantOrSelfOf(Box<EclExpression>),

    /// Direct children of a concept.
    /// Syntax: `<! subExpression`
    ChildOf(Box<EclExpression>),

    /// Direct children of a concept or the concept itself.
    /// Syntax: `<<! subExpression`
    ChildOrSelfOf(Box<EclExpression>),

    /// Ancestors of a concept (exclusive).
    /// Syntax: `> subExpression`
    AncestorOf(Box<EclExpression>),

    /// Ancestors of a concept or the concept itself.
    /// Syntax: `>> subExpression`
    AncestorOrSelfOf(Box<EclExpression>),

    /// Direct parents of a concept.
    /// Syntax: `>! subExpression`
    ParentOf(Box<EclExpression>),

    /// Direct parents of a concept or the concept itself.
    /// Syntax: `>>! subExpression`
    ParentOrSelfOf(Box<EclExpression>),

    /// Conjunction of two constraints.
    /// Syntax: `a AND b` (a comma also reads as AND)
    And(Box<EclExpression>, Box<EclExpression>),

    /// Disjunction of two constraints.
    /// Syntax: `a OR b`
    Or(Box<EclExpression>, Box<EclExpression>),

    /// Set difference of two constraints.
    /// Syntax: `a MINUS b`
    Exclusion(Box<EclExpression>, Box<EclExpression>),

    /// Refined constraint with attribute refinements.
    /// Syntax: `focus : refinement`
    /// Example: `< 19829001 : 116676008 = << 79654002`
    Refined {
        /// The focus constraint.
        focus: Box<EclExpression>,
        /// The refinement clause.
        refinement: Refinement,
    },

    /// Dotted attribute projection.
    /// Syntax: `focus . attributeType`
    /// Example: `< 125605004 . 363698007`
    Dotted {
        /// The focus constraint supplying source concepts.
        focus: Box<EclExpression>,
        /// The attribute type whose destinations are projected.
        attribute_type: Box<EclExpression>,
    },

    /// Parenthesized sub-constraint, kept to preserve precedence on output.
    Nested(Box<EclExpression>),

    /// Constraint with one or more `{{ ... }}` filter blocks.
    /// Example: `< 64572001 {{ term = "heart" }}`
    Filtered {
        /// The filtered constraint.
        constraint: Box<EclExpression>,
        /// The filter blocks, AND-combined.
        filters: Vec<FilterConstraint>,
    },
}

impl EclExpression {
    /// Creates a concept reference.
    pub fn concept(id: impl Into<ConceptId>) -> Self {
        EclExpression::ConceptReference { id: id.into(), term: None }
    }

    /// Creates a concept reference with a display term.
    pub fn concept_with_term(id: impl Into<ConceptId>, term: impl Into<String>) -> Self {
        EclExpression::ConceptReference { id: id.into(), term: Some(term.into()) }
    }

    /// Creates a member-of constraint.
    pub fn member_of(inner: EclExpression) -> Self {
        EclExpression::MemberOf(Box::new(inner))
    }

    /// Creates a descendant-of constraint.
    pub fn descendant_of(inner: EclExpression) -> Self {
        EclExpression::DescendantOf(Box::new(inner))
    }

    /// Creates a descendant-or-self-of constraint.
    pub fn descendant_or_self_of(inner: EclExpression) -> Self {
        EclExpression::DescendantOrSelfOf(Box::new(inner))
    }

    /// Creates a child-of constraint.
    pub fn child_of(inner: EclExpression) -> Self {
        EclExpression::ChildOf(Box::new(inner))
    }

    /// Creates a child-or-self-of constraint.
    pub fn child_or_self_of(inner: EclExpression) -> Self {
        EclExpression::ChildOrSelfOf(Box::new(inner))
    }

    /// Creates an ancestor-of constraint.
    pub fn ancestor_of(inner: EclExpression) -> Self {
        EclExpression::AncestorOf(Box::new(inner))
    }

    /// Creates an ancestor-or-self-of constraint.
    pub fn ancestor_or_self_of(inner: EclExpression) -> Self {
        EclExpression::AncestorOrSelfOf(Box::new(inner))
    }

    /// Creates a parent-of constraint.
    pub fn parent_of(inner: EclExpression) -> Self {
        EclExpression::ParentOf(Box::new(inner))
    }

    /// Creates a parent-or-self-of constraint.
    pub fn parent_or_self_of(inner: EclExpression) -> Self {
        EclExpression::ParentOrSelfOf(Box::new(inner))
    }

    /// Creates an AND constraint.
    pub fn and(left: EclExpression, right: EclExpression) -> Self {
        EclExpression::And(Box::new(left), Box::new(right))
    }

    /// Creates an OR constraint.
    pub fn or(left: EclExpression, right: EclExpression) -> Self {
        EclExpression::Or(Box::new(left), Box::new(right))
    }

    /// Creates a MINUS constraint.
    pub fn exclusion(left: EclExpression, right: EclExpression) -> Self {
        EclExpression::Exclusion(Box::new(left), Box::new(right))
    }

    /// Creates a parenthesized constraint.
    pub fn nested(inner: EclExpression) -> Self {
        EclExpression::Nested(Box::new(inner))
    }

    /// Returns true if this is a simple concept reference.
    pub fn is_concept_reference(&self) -> bool {
        matches!(self, EclExpression::ConceptReference { .. })
    }

    /// Returns the concept id if this is a simple concept reference.
    pub fn as_concept_id(&self) -> Option<&ConceptId> {
        match self {
            EclExpression::ConceptReference { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Unwraps parentheses to get the innermost constraint.
    pub fn unwrap_nested(&self) -> &EclExpression {
        match self {
            EclExpression::Nested(inner) => inner.unwrap_nested(),
            other => other,
        }
    }
}

impl std::fmt::Display for EclExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EclExpression::Any => write!(f, "*"),
            EclExpression::ConceptReference { id, term } => {
                if let Some(t) = term {
                    write!(f, "{} |{}|", id, t)
                } else {
                    write!(f, "{}", id)
                }
            }
            EclExpression::ConceptReferenceSet(ids) => {
                let joined: Vec<&str> = ids.iter().map(ConceptId::as_str).collect();
                write!(f, "({})", joined.join(" "))
            }
            EclExpression::MemberOf(inner) => write!(f, "^ {}", inner),
            EclExpression::DescendantOf(inner) => write!(f, "< {}", inner),
            EclExpression::DescendantOrSelfOf(inner) => write!(f, "<< {}", inner),
            EclExpression::ChildOf(inner) => write!(f, "<! {}", inner),
            EclExpression::ChildOrSelfOf(inner) => write!(f, "<<! {}", inner),
            EclExpression::AncestorOf(inner) => write!(f, "> {}", inner),
            EclExpression::AncestorOrSelfOf(inner) => write!(f, ">> {}", inner),
            EclExpression::ParentOf(inner) => write!(f, ">! {}", inner),
            EclExpression::ParentOrSelfOf(inner) => write!(f, ">>! {}", inner),
            EclExpression::And(left, right) => write!(f, "{} AND {}", left, right),
            EclExpression::Or(left, right) => write!(f, "{} OR {}", left, right),
            EclExpression::Exclusion(left, right) => write!(f, "{} MINUS {}", left, right),
            EclExpression::Refined { focus, refinement } => {
                write!(f, "{} : {}", focus, refinement)
            }
            EclExpression::Dotted { focus, attribute_type } => {
                write!(f, "{} . {}", focus, attribute_type)
            }
            EclExpression::Nested(inner) => write!(f, "({})", inner),
            EclExpression::Filtered { constraint, filters } => {
                write!(f, "{}", constraint)?;
                for filter in filters {
                    write!(f, " {}", filter)?;
                }
                Ok(())
            }
        }
    }
}
