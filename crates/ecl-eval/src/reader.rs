//! The concept graph abstraction consumed by the evaluator.
//!
//! This module defines the [`GraphReader`] trait that must be implemented
//! by any store that wants to answer ECL queries, along with the record
//! types it returns. The trait is asynchronous: every method is a
//! suspension point, and the evaluator awaits exactly these calls.
//!
//! A reference implementation backed by in-memory maps is provided by
//! [`MemoryGraph`](crate::MemoryGraph); production backends adapt their
//! own search index to the same contract and surface backend failures as
//! [`EvalError::Graph`](crate::EvalError::Graph).

use std::collections::BTreeSet;

use async_trait::async_trait;
use ecl_ast::ConceptId;

use crate::error::EvalResult;
use crate::query::{fields, Query};

/// The hierarchy view that descendant and ancestor predicates are
/// compiled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Form {
    /// The inferred (distribution) hierarchy.
    #[default]
    Inferred,
    /// The stated (authoring) hierarchy.
    Stated,
}

impl Form {
    /// The concept document field holding direct parents in this form.
    pub fn parents_field(&self) -> &'static str {
        match self {
            Form::Inferred => fields::concept::PARENTS,
            Form::Stated => fields::concept::STATED_PARENTS,
        }
    }

    /// The concept document field holding indirect ancestors in this form.
    pub fn ancestors_field(&self) -> &'static str {
        match self {
            Form::Inferred => fields::concept::ANCESTORS,
            Form::Stated => fields::concept::STATED_ANCESTORS,
        }
    }
}

impl std::fmt::Display for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Form::Inferred => write!(f, "inferred"),
            Form::Stated => write!(f, "stated"),
        }
    }
}

/// A concept document as stored in the graph.
///
/// Parent lists carry the synthetic root sentinel for top-level concepts;
/// ancestor lists hold the indirect (non-parent) transitive ancestors.
/// Both are per hierarchy form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptRecord {
    /// The concept identifier.
    pub id: ConceptId,
    /// Whether the concept is active.
    pub active: bool,
    /// Whether the concept is primitive (not fully defined).
    pub primitive: bool,
    /// The module the concept belongs to.
    pub module_id: ConceptId,
    /// Effective time as yyyyMMdd, if versioned.
    pub effective_time: Option<String>,
    /// Semantic tag from the fully specified name, if any.
    pub semantic_tag: Option<String>,
    /// Direct parents, inferred form.
    pub parents: Vec<ConceptId>,
    /// Indirect ancestors, inferred form.
    pub ancestors: Vec<ConceptId>,
    /// Direct parents, stated form.
    pub stated_parents: Vec<ConceptId>,
    /// Indirect ancestors, stated form.
    pub stated_ancestors: Vec<ConceptId>,
    /// Reference sets the concept is an active member of.
    pub active_member_of: Vec<ConceptId>,
}

impl ConceptRecord {
    /// Direct parents in the given hierarchy form.
    pub fn parents_for(&self, form: Form) -> &[ConceptId] {
        match form {
            Form::Inferred => &self.parents,
            Form::Stated => &self.stated_parents,
        }
    }

    /// Indirect ancestors in the given hierarchy form.
    pub fn ancestors_for(&self, form: Form) -> &[ConceptId] {
        match form {
            Form::Inferred => &self.ancestors,
            Form::Stated => &self.stated_ancestors,
        }
    }
}

/// A single attribute statement between two concepts.
///
/// Hierarchy (IS A) edges are not represented here; they live in the
/// parent and ancestor fields of [`ConceptRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// The source concept.
    pub source: ConceptId,
    /// The attribute type.
    pub type_id: ConceptId,
    /// The destination concept.
    pub destination: ConceptId,
    /// Relationship group number; 0 means ungrouped.
    pub group: u16,
}

/// Read-only access to the concept graph.
///
/// Search methods take a compiled [`Query`] against their own document
/// space. Description and member searches project their hits back to
/// concept identifiers (the owning concept, or the referenced component)
/// so that results from every document space compose.
///
/// # Example: adapting a store
///
/// ```ignore
/// use ecl_eval::{GraphReader, EclEvaluator};
///
/// struct IndexBackedGraph { /* ... */ }
///
/// #[async_trait::async_trait]
/// impl GraphReader for IndexBackedGraph {
///     // translate Query to the native index query language ...
/// }
///
/// let graph = IndexBackedGraph::connect(url).await?;
/// let evaluator = EclEvaluator::new(&graph);
/// let query = evaluator.evaluate_ecl("<< 404684003").await?;
/// ```
#[async_trait]
pub trait GraphReader: Send + Sync {
    /// Searches concept documents, returning matching concept ids.
    async fn search_concepts(&self, query: &Query) -> EvalResult<BTreeSet<ConceptId>>;

    /// Fetches the full records for the given concept ids. Unknown ids are
    /// skipped, not errors.
    async fn concepts(&self, ids: &BTreeSet<ConceptId>) -> EvalResult<Vec<ConceptRecord>>;

    /// Searches description documents, returning the distinct ids of the
    /// concepts owning the matching descriptions.
    async fn search_descriptions(&self, query: &Query) -> EvalResult<BTreeSet<ConceptId>>;

    /// Searches reference set member documents, returning the distinct
    /// referenced component ids of the matching members.
    async fn search_members(&self, query: &Query) -> EvalResult<BTreeSet<ConceptId>>;

    /// Returns all attribute relationships whose source is in `sources`,
    /// in the given hierarchy form.
    async fn relationships_by_source(
        &self,
        sources: &BTreeSet<ConceptId>,
        form: Form,
    ) -> EvalResult<Vec<Relationship>>;

    /// Returns all attribute relationships with a type in `types` and a
    /// destination in `destinations`, in the given hierarchy form.
    async fn relationships_by_type_and_destination(
        &self,
        types: &BTreeSet<ConceptId>,
        destinations: &BTreeSet<ConceptId>,
        form: Form,
    ) -> EvalResult<Vec<Relationship>>;
}
