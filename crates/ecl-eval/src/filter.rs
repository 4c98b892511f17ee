//! Compilation of ECL filters into queries.
//!
//! Each filter domain (concept, description, member) has its own document
//! space and its own set of meaningful leaf filters; compilation is
//! per-domain and rejects leaves that do not belong. The evaluator runs
//! description- and member-domain queries through the graph reader and
//! projects the hits back to concept ids; concept-domain queries combine
//! directly.

use ecl_ast::{ComparisonOperator, EclFilter, MemberFieldValue, TermMatchType};

use crate::error::{EvalError, EvalResult};
use crate::query::{fields, FieldValue, Query};

/// Compiles a concept-domain filter.
pub(crate) fn concept_filter_query(filter: &EclFilter) -> EvalResult<Query> {
    match filter {
        EclFilter::Active(active) => Ok(Query::term(fields::concept::ACTIVE, *active)),
        EclFilter::Module { module_ids } => Ok(Query::ids(fields::concept::MODULE_ID, module_ids)),
        EclFilter::EffectiveTime { operator, value } => {
            validate_effective_time(value)?;
            Ok(comparison_query(fields::concept::EFFECTIVE_TIME, *operator, value.as_str().into()))
        }
        EclFilter::DefinitionStatus { is_primitive } => {
            Ok(Query::term(fields::concept::PRIMITIVE, *is_primitive))
        }
        EclFilter::SemanticTag { tags } => Ok(string_values(fields::concept::SEMANTIC_TAG, tags)),
        EclFilter::Conjunction(parts) => {
            let compiled: Vec<Query> =
                parts.iter().map(concept_filter_query).collect::<EvalResult<_>>()?;
            Ok(Query::all_of(compiled))
        }
        EclFilter::Disjunction(parts) => {
            let compiled: Vec<Query> =
                parts.iter().map(concept_filter_query).collect::<EvalResult<_>>()?;
            Ok(Query::any_of(compiled))
        }
        other => Err(unsupported_in(other, "concept")),
    }
}

/// Compiles a description-domain filter.
pub(crate) fn description_filter_query(filter: &EclFilter) -> EvalResult<Query> {
    match filter {
        EclFilter::Active(active) => Ok(Query::term(fields::description::ACTIVE, *active)),
        EclFilter::Module { module_ids } => {
            Ok(Query::ids(fields::description::MODULE_ID, module_ids))
        }
        EclFilter::EffectiveTime { operator, value } => {
            validate_effective_time(value)?;
            Ok(comparison_query(
                fields::description::EFFECTIVE_TIME,
                *operator,
                value.as_str().into(),
            ))
        }
        EclFilter::Term { match_type, value } => {
            validate_search_term(*match_type, value)?;
            Ok(Query::Text {
                field: fields::description::TERM.to_string(),
                term: value.clone(),
                match_type: *match_type,
            })
        }
        EclFilter::DescriptionType { type_ids } => {
            Ok(Query::ids(fields::description::TYPE_ID, type_ids))
        }
        EclFilter::Dialect { dialect_ids, acceptability } => {
            use ecl_ast::FilterAcceptability::*;
            let field = match acceptability {
                Some(Preferred) => fields::description::PREFERRED_IN,
                Some(Acceptable) => fields::description::ACCEPTABLE_IN,
                None => fields::description::LANGUAGE_REFSET,
            };
            Ok(Query::ids(field, dialect_ids))
        }
        EclFilter::LanguageRefSet { refset_ids } => {
            Ok(Query::ids(fields::description::LANGUAGE_REFSET, refset_ids))
        }
        EclFilter::Language { codes } => Ok(string_values(fields::description::LANGUAGE, codes)),
        EclFilter::Conjunction(parts) => {
            let compiled: Vec<Query> =
                parts.iter().map(description_filter_query).collect::<EvalResult<_>>()?;
            Ok(Query::all_of(compiled))
        }
        EclFilter::Disjunction(parts) => {
            let compiled: Vec<Query> =
                parts.iter().map(description_filter_query).collect::<EvalResult<_>>()?;
            Ok(Query::any_of(compiled))
        }
        other => Err(unsupported_in(other, "description")),
    }
}

/// Compiles a member-domain filter.
pub(crate) fn member_filter_query(filter: &EclFilter) -> EvalResult<Query> {
    match filter {
        EclFilter::Active(active) => Ok(Query::term(fields::member::ACTIVE, *active)),
        EclFilter::Module { module_ids } => Ok(Query::ids(fields::member::MODULE_ID, module_ids)),
        EclFilter::EffectiveTime { operator, value } => {
            validate_effective_time(value)?;
            Ok(comparison_query(fields::member::EFFECTIVE_TIME, *operator, value.as_str().into()))
        }
        EclFilter::MemberField { field, operator, value } => {
            Ok(comparison_query(field, *operator, member_value(value)))
        }
        EclFilter::Conjunction(parts) => {
            let compiled: Vec<Query> =
                parts.iter().map(member_filter_query).collect::<EvalResult<_>>()?;
            Ok(Query::all_of(compiled))
        }
        EclFilter::Disjunction(parts) => {
            let compiled: Vec<Query> =
                parts.iter().map(member_filter_query).collect::<EvalResult<_>>()?;
            Ok(Query::any_of(compiled))
        }
        other => Err(unsupported_in(other, "member")),
    }
}

/// Maps a relational operator onto a term, negation or range query.
pub(crate) fn comparison_query(
    field: impl Into<String>,
    operator: ComparisonOperator,
    value: FieldValue,
) -> Query {
    let field = field.into();
    match operator {
        ComparisonOperator::Equal => Query::Term { field, value },
        ComparisonOperator::NotEqual => Query::Term { field, value }.not(),
        ComparisonOperator::GreaterThan => Query::Range {
            field,
            from: Some(value),
            to: None,
            from_inclusive: false,
            to_inclusive: false,
        },
        ComparisonOperator::GreaterThanOrEqual => Query::Range {
            field,
            from: Some(value),
            to: None,
            from_inclusive: true,
            to_inclusive: false,
        },
        ComparisonOperator::LessThan => Query::Range {
            field,
            from: None,
            to: Some(value),
            from_inclusive: false,
            to_inclusive: false,
        },
        ComparisonOperator::LessThanOrEqual => Query::Range {
            field,
            from: None,
            to: Some(value),
            from_inclusive: false,
            to_inclusive: true,
        },
    }
}

/// Rejects effective time values that are not 8-digit dates.
pub(crate) fn validate_effective_time(value: &str) -> EvalResult<()> {
    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(EvalError::bad_request(format!(
            "effective time must be an 8-digit yyyyMMdd value, got '{}'",
            value
        )))
    }
}

fn validate_search_term(match_type: TermMatchType, value: &str) -> EvalResult<()> {
    if value.is_empty() {
        return Err(EvalError::bad_request("search term must not be empty"));
    }
    if match_type == TermMatchType::Regex {
        regex::Regex::new(value)
            .map_err(|e| EvalError::bad_request(format!("invalid term regex: {}", e)))?;
    }
    Ok(())
}

fn string_values(field: &str, values: &[String]) -> Query {
    match values.len() {
        0 => Query::MatchNone,
        1 => Query::term(field, values[0].clone()),
        _ => Query::terms(field, values.iter().cloned()),
    }
}

/// Whether a filter tree carries an explicit active constraint anywhere.
/// Description and member searches default to active documents unless the
/// filter says otherwise.
pub(crate) fn mentions_active(filter: &EclFilter) -> bool {
    match filter {
        EclFilter::Active(_) => true,
        EclFilter::Conjunction(parts) | EclFilter::Disjunction(parts) => {
            parts.iter().any(mentions_active)
        }
        _ => false,
    }
}

fn member_value(value: &MemberFieldValue) -> FieldValue {
    match value {
        MemberFieldValue::String(s) => FieldValue::String(s.clone()),
        MemberFieldValue::Integer(i) => FieldValue::Integer(*i),
        MemberFieldValue::Decimal(d) => FieldValue::Decimal(*d),
        MemberFieldValue::Boolean(b) => FieldValue::Boolean(*b),
    }
}

fn unsupported_in(filter: &EclFilter, domain: &str) -> EvalError {
    EvalError::unsupported(format!("{} filter in {} domain", filter_kind(filter), domain))
}

fn filter_kind(filter: &EclFilter) -> &'static str {
    match filter {
        EclFilter::Active(_) => "active",
        EclFilter::Module { .. } => "module",
        EclFilter::EffectiveTime { .. } => "effectiveTime",
        EclFilter::DefinitionStatus { .. } => "definitionStatus",
        EclFilter::SemanticTag { .. } => "semanticTag",
        EclFilter::Term { .. } => "term",
        EclFilter::DescriptionType { .. } => "typeId",
        EclFilter::Dialect { .. } => "dialect",
        EclFilter::LanguageRefSet { .. } => "languageRefSet",
        EclFilter::Language { .. } => "language",
        EclFilter::MemberField { .. } => "member field",
        EclFilter::Conjunction(_) => "conjunction",
        EclFilter::Disjunction(_) => "disjunction",
        EclFilter::History { .. } => "history supplement",
    }
}
