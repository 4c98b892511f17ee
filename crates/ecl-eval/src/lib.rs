//! # ecl-eval
//!
//! ECL evaluation against a concept graph.
//!
//! This crate compiles parsed ECL expression constraints into [`Query`]
//! values, an index-agnostic query representation that a terminology
//! store can execute. The compiler is [`EclEvaluator`]; it reaches the
//! store through the async [`GraphReader`] trait, so any search index
//! that can answer term, range and text queries over concept,
//! description and member documents can sit behind it.
//!
//! Hierarchy predicates compile against a chosen [`Form`] (inferred or
//! stated), and a compiled query can be handed back to
//! [`EclEvaluator::resolve_ids`] when the actual id set is needed. An
//! optional [`EvalCache`] memoizes compiled queries per form.
//!
//! # Example
//!
//! ```rust
//! use ecl_eval::{EclEvaluator, MemoryGraph};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ecl_eval::EvalError> {
//! let mut graph = MemoryGraph::new();
//! graph.add_is_a("22298006", "57809008");
//! graph.add_is_a("57809008", "404684003");
//!
//! let evaluator = EclEvaluator::new(&graph);
//! let query = evaluator.evaluate_ecl("<< 57809008").await?;
//! let ids = evaluator.resolve_ids(query).await?;
//! assert!(ids.contains("22298006"));
//! assert!(ids.contains("57809008"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod error;
mod evaluator;
mod filter;
mod memory;
mod query;
mod reader;
mod refinement;
pub mod terminology;

pub use cache::{EvalCache, EvalCacheConfig};
pub use error::{EvalError, EvalResult};
pub use evaluator::EclEvaluator;
pub use memory::{Description, Member, MemoryGraph};
pub use query::{fields, FieldValue, Query};
pub use reader::{ConceptRecord, Form, GraphReader, Relationship};
