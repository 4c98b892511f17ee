//! # ecl-optimizer
//!
//! Rewriting enumerated concept sets as compact ECL expressions.
//!
//! Hand-maintained concept lists grow until nobody can review them.
//! This crate turns such a list back into a small set of ECL clauses:
//! [`QueryOptimizer`] analyses the hierarchy and attribute structure of
//! the target set through the same [`GraphReader`](ecl_eval::GraphReader)
//! the evaluator uses, then proposes a [`QueryExpressionDiff`] with
//! inclusion clauses covering the target, exclusion clauses compensating
//! for any overshoot, and removals for caller clauses made redundant.
//!
//! Optimization is best effort. The entry points never fail; a caller
//! clause that does not parse logs a warning and produces an empty diff,
//! and internal iteration, zoom and wall-clock caps in
//! [`OptimizerConfig`] bound every run.
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeSet;
//!
//! use ecl_ast::ConceptId;
//! use ecl_eval::MemoryGraph;
//! use ecl_optimizer::{EclConceptSetEvaluator, QueryOptimizer};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut graph = MemoryGraph::new();
//! graph.add_is_a("80146002", "57809008");
//! graph.add_is_a("174041007", "57809008");
//!
//! let sets = EclConceptSetEvaluator::new(&graph);
//! let optimizer = QueryOptimizer::new(&graph, &sets);
//!
//! let target: BTreeSet<ConceptId> = ["57809008", "80146002", "174041007"]
//!     .iter()
//!     .map(|id| ConceptId::new(*id))
//!     .collect();
//! let diff = optimizer.optimize(&target, Vec::new()).await;
//! assert!(diff.inclusion_texts().contains("<< 57809008"));
//! assert!(diff.remove.is_empty());
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod clause;
mod config;
mod error;
mod hierarchy_stats;
mod optimizer;
mod relationship_stats;
mod set_evaluator;
mod strategy;

pub use clause::{Clause, QueryExpressionDiff};
pub use config::{OptimizerConfig, OptimizerConfigBuilder};
pub use error::{OptimizerError, OptimizerResult};
pub use hierarchy_stats::{AncestorStats, HierarchyStats};
pub use optimizer::QueryOptimizer;
pub use relationship_stats::RelationshipStats;
pub use set_evaluator::{
    ConceptSetEvaluator, EclConceptSetEvaluator, EclLabeler, PassthroughLabeler,
};
pub use strategy::OptimizerStrategy;
