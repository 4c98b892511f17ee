//! Resolving ECL clause text to concrete concept sets.
//!
//! The optimizer talks to the terminology through [`ConceptSetEvaluator`]
//! rather than the evaluator directly, so tests can substitute canned
//! resolutions and servers can slot in a caching layer.

use std::collections::BTreeSet;

use async_trait::async_trait;
use ecl_ast::ConceptId;
use ecl_eval::{EclEvaluator, EvalCacheConfig, Form, GraphReader};

use crate::clause::Clause;
use crate::error::OptimizerResult;

/// Resolves ECL text to the set of matching concept ids.
#[async_trait]
pub trait ConceptSetEvaluator: Send + Sync {
    /// Evaluates one ECL expression.
    async fn evaluate(&self, ecl: &str) -> OptimizerResult<BTreeSet<ConceptId>>;

    /// Evaluates a clause list: the union of the inclusions minus the
    /// union of the exclusions.
    async fn evaluate_clauses(
        &self,
        inclusions: &[Clause],
        exclusions: &[Clause],
    ) -> OptimizerResult<BTreeSet<ConceptId>> {
        let mut ids = BTreeSet::new();
        for clause in inclusions {
            ids.extend(self.evaluate(&clause.query_text).await?);
        }
        for clause in exclusions {
            for id in self.evaluate(&clause.query_text).await? {
                ids.remove(&id);
            }
        }
        Ok(ids)
    }
}

/// A [`ConceptSetEvaluator`] backed by an [`EclEvaluator`] over a graph.
pub struct EclConceptSetEvaluator<'a, G: GraphReader + ?Sized> {
    evaluator: EclEvaluator<'a, G>,
}

impl<'a, G: GraphReader + ?Sized> EclConceptSetEvaluator<'a, G> {
    /// Creates an evaluator over the inferred view of the graph.
    pub fn new(graph: &'a G) -> Self {
        Self { evaluator: EclEvaluator::new(graph) }
    }

    /// Creates an evaluator over the given hierarchy form.
    pub fn with_form(graph: &'a G, form: Form) -> Self {
        Self { evaluator: EclEvaluator::with_form(graph, form) }
    }

    /// Enables expression caching. The optimizer resolves overlapping
    /// clause sets repeatedly, so a small cache pays for itself quickly.
    pub fn cached(mut self, config: EvalCacheConfig) -> Self {
        self.evaluator = self.evaluator.cached(config);
        self
    }
}

#[async_trait]
impl<G: GraphReader + ?Sized> ConceptSetEvaluator for EclConceptSetEvaluator<'_, G> {
    async fn evaluate(&self, ecl: &str) -> OptimizerResult<BTreeSet<ConceptId>> {
        let query = self.evaluator.evaluate_ecl(ecl).await?;
        Ok(self.evaluator.resolve_ids(query).await?)
    }
}

/// Attaches display labels to clauses before they are returned to the
/// caller.
///
/// Labeling is cosmetic, so implementations return the clauses unchanged
/// on lookup failure instead of failing the optimization.
#[async_trait]
pub trait EclLabeler: Send + Sync {
    /// Returns the clauses with display labels filled in where known.
    async fn labeled_expressions(&self, clauses: Vec<Clause>) -> Vec<Clause>;
}

/// A labeler that leaves every clause untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughLabeler;

#[async_trait]
impl EclLabeler for PassthroughLabeler {
    async fn labeled_expressions(&self, clauses: Vec<Clause>) -> Vec<Clause> {
        clauses
    }
}
