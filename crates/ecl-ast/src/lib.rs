//! # ecl-ast
//!
//! Syntax tree and parser for the Expression Constraint Language (ECL),
//! the query language used to select sets of concepts from a terminology
//! graph.
//!
//! ## Supported syntax
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `404684003` | Self (single concept) |
//! | `< X` | Descendants of X |
//! | `<< X` | X and its descendants |
//! | `<! X` | Children of X |
//! | `<<! X` | X and its children |
//! | `> X` | Ancestors of X |
//! | `>> X` | X and its ancestors |
//! | `>! X` | Parents of X |
//! | `>>! X` | X and its parents |
//! | `^ X` | Members of reference set X |
//! | `*` | Any concept |
//! | `A AND B`, `A, B` | Conjunction |
//! | `A OR B` | Disjunction |
//! | `A MINUS B` | Exclusion |
//! | `X : attr = value` | Attribute refinement |
//! | `X : { ... }` | Grouped refinement |
//! | `X . attr` | Dotted attribute projection |
//! | `X {{ ... }}` | Concept, description and member filters |
//! | `X {{ +HISTORY }}` | Historical association supplement |
//!
//! ## Example
//!
//! ```rust
//! use ecl_ast::{parse, EclExpression};
//!
//! let expr = parse("<< 73211009 |Diabetes mellitus| MINUS << 199223000").unwrap();
//! assert!(matches!(expr, EclExpression::Exclusion(_, _)));
//!
//! // Rendering produces canonical ECL that parses back to the same tree.
//! let rendered = expr.to_string();
//! assert_eq!(parse(&rendered).unwrap(), expr);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod ast;
mod error;
mod parser;

pub use ast::{
    AttributeConstraint, AttributeGroup, Cardinality, ComparisonOperator, ConceptId,
    EclExpression, EclFilter, FilterAcceptability, FilterConstraint, FilterDomain, HistoryProfile,
    MemberFieldValue, Refinement, RefinementOperator, TermMatchType,
};
pub use error::{ParseError, ParseResult};
pub use parser::parse;
