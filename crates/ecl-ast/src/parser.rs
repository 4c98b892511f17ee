//! ECL parser built on nom combinators.
//!
//! The grammar follows the Expression Constraint Language specification:
//! hierarchy operators bind tighter than refinements, refinements bind
//! tighter than compound operators, and compound operators are
//! left-associative. Filter blocks and dotted projections attach at the
//! sub-expression level, so applying them to a compound or refined
//! constraint requires parentheses.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until, take_while, take_while1},
    character::complete::{char, digit1, multispace0, multispace1, one_of},
    combinator::{all_consuming, map, opt, recognize, value},
    multi::{many1, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::ast::{
    AttributeConstraint, AttributeGroup, Cardinality, ComparisonOperator, ConceptId,
    EclExpression, EclFilter, FilterAcceptability, FilterConstraint, FilterDomain, HistoryProfile,
    MemberFieldValue, Refinement, RefinementOperator, TermMatchType,
};
use crate::error::{ParseError, ParseResult};

/// Parses an ECL expression constraint.
///
/// # Arguments
/// * `input` - The ECL text to parse
///
/// # Returns
/// The parsed syntax tree or a [`ParseError`]
///
/// # Examples
///
/// ```rust
/// use ecl_ast::parse;
///
/// let expr = parse("<< 404684003 |Clinical finding|").unwrap();
/// assert_eq!(expr.to_string(), "<< 404684003 |Clinical finding|");
///
/// let expr = parse("< 19829001 AND < 301867009").unwrap();
/// assert_eq!(expr.to_string(), "< 19829001 AND < 301867009");
/// ```
pub fn parse(input: &str) -> ParseResult<EclExpression> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::EmptyExpression);
    }

    match all_consuming(expression_constraint)(input) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = input.len() - e.input.len();
            Err(ParseError::Syntax {
                position,
                message: format!("unexpected input at: '{}'", truncate(e.input, 20)),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(ParseError::Incomplete),
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ============================================================================
// Top-level expression constraint
// ============================================================================

fn expression_constraint(input: &str) -> IResult<&str, EclExpression> {
    delimited(ws, refined_or_compound_expression, ws)(input)
}

fn refined_or_compound_expression(input: &str) -> IResult<&str, EclExpression> {
    let (input, first) = refined_expression(input)?;
    compound_tail(input, first)
}

fn compound_tail(input: &str, left: EclExpression) -> IResult<&str, EclExpression> {
    // Word operators need leading whitespace; a comma does not.
    let result = alt((
        preceded(mws, word_compound_operator),
        preceded(ws, comma_operator),
    ))(input);

    match result {
        Ok((remaining, op)) => {
            let (remaining, right) = preceded(ws, sub_expression_constraint)(remaining)?;
            let combined = match op {
                CompoundOp::And => EclExpression::And(Box::new(left), Box::new(right)),
                CompoundOp::Or => EclExpression::Or(Box::new(left), Box::new(right)),
                CompoundOp::Minus => EclExpression::Exclusion(Box::new(left), Box::new(right)),
            };
            compound_tail(remaining, combined)
        }
        Err(_) => Ok((input, left)),
    }
}

#[derive(Debug, Clone, Copy)]
enum CompoundOp {
    And,
    Or,
    Minus,
}

fn word_compound_operator(input: &str) -> IResult<&str, CompoundOp> {
    alt((
        value(CompoundOp::And, tag_no_case("AND")),
        value(CompoundOp::Or, tag_no_case("OR")),
        value(CompoundOp::Minus, tag_no_case("MINUS")),
    ))(input)
}

fn comma_operator(input: &str) -> IResult<&str, CompoundOp> {
    value(CompoundOp::And, tag(","))(input)
}

// ============================================================================
// Sub-expression constraint
// ============================================================================

/// Parse a base sub-expression (without dotted projections or filters).
fn base_sub_expression(input: &str) -> IResult<&str, EclExpression> {
    alt((
        paren_group,
        constraint_expression,
        member_of_expression,
        focus_concept,
    ))(input)
}

fn sub_expression_constraint(input: &str) -> IResult<&str, EclExpression> {
    let (input, expr) = base_sub_expression(input)?;
    let (input, expr) = dotted_tail(input, expr)?;
    filter_tail(input, expr)
}

/// A parenthesized group: either an enumerated concept set or a nested
/// expression. `(a b)` with two or more references reads as a set; anything
/// else falls back to a nested constraint.
fn paren_group(input: &str) -> IResult<&str, EclExpression> {
    alt((
        concept_reference_set,
        map(
            delimited(
                pair(char('('), ws),
                refined_or_compound_expression,
                pair(ws, char(')')),
            ),
            |inner| EclExpression::Nested(Box::new(inner)),
        ),
    ))(input)
}

fn concept_reference_set(input: &str) -> IResult<&str, EclExpression> {
    let (input, _) = pair(char('('), ws)(input)?;
    let (input, first) = set_concept_reference(input)?;
    let (input, rest) = many1(preceded(mws, set_concept_reference))(input)?;
    let (input, _) = pair(ws, char(')'))(input)?;

    let mut ids = vec![first];
    ids.extend(rest);
    Ok((input, EclExpression::ConceptReferenceSet(ids)))
}

/// A concept reference inside an enumerated set; the display term is read
/// and dropped, only the id is kept.
fn set_concept_reference(input: &str) -> IResult<&str, ConceptId> {
    let (input, id) = concept_id_token(input)?;
    let (input, _) = opt(preceded(ws, term_in_pipes))(input)?;
    Ok((input, id))
}

fn constraint_expression(input: &str) -> IResult<&str, EclExpression> {
    let (input, op) = constraint_operator(input)?;
    let (input, _) = ws(input)?;
    let (input, inner) = base_sub_expression(input)?;

    let expr = match op {
        ConstraintOp::DescendantOf => EclExpression::DescendantOf(Box::new(inner)),
        ConstraintOp::DescendantOrSelfOf => EclExpression::DescendantOrSelfOf(Box::new(inner)),
        ConstraintOp::ChildOf => EclExpression::ChildOf(Box::new(inner)),
        ConstraintOp::ChildOrSelfOf => EclExpression::ChildOrSelfOf(Box::new(inner)),
        ConstraintOp::AncestorOf => EclExpression::AncestorOf(Box::new(inner)),
        ConstraintOp::AncestorOrSelfOf => EclExpression::AncestorOrSelfOf(Box::new(inner)),
        ConstraintOp::ParentOf => EclExpression::ParentOf(Box::new(inner)),
        ConstraintOp::ParentOrSelfOf => EclExpression::ParentOrSelfOf(Box::new(inner)),
    };

    Ok((input, expr))
}

#[derive(Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
enum ConstraintOp {
    DescendantOf,
    DescendantOrSelfOf,
    ChildOf,
    ChildOrSelfOf,
    AncestorOf,
    AncestorOrSelfOf,
    ParentOf,
    ParentOrSelfOf,
}

fn constraint_operator(input: &str) -> IResult<&str, ConstraintOp> {
    alt((
        // Longer operators first
        value(ConstraintOp::ChildOrSelfOf, tag("<<!")),
        value(ConstraintOp::DescendantOrSelfOf, tag("<<")),
        value(ConstraintOp::ChildOf, tag("<!")),
        value(ConstraintOp::DescendantOf, tag("<")),
        value(ConstraintOp::ParentOrSelfOf, tag(">>!")),
        value(ConstraintOp::AncestorOrSelfOf, tag(">>")),
        value(ConstraintOp::ParentOf, tag(">!")),
        value(ConstraintOp::AncestorOf, tag(">")),
    ))(input)
}

fn member_of_expression(input: &str) -> IResult<&str, EclExpression> {
    let (input, _) = char('^')(input)?;
    let (input, _) = ws(input)?;
    let (input, inner) = alt((wildcard, concept_reference, paren_group))(input)?;
    Ok((input, EclExpression::MemberOf(Box::new(inner))))
}

// ============================================================================
// Focus concept
// ============================================================================

fn focus_concept(input: &str) -> IResult<&str, EclExpression> {
    alt((wildcard, concept_reference))(input)
}

fn wildcard(input: &str) -> IResult<&str, EclExpression> {
    value(EclExpression::Any, char('*'))(input)
}

fn concept_reference(input: &str) -> IResult<&str, EclExpression> {
    let (input, id) = concept_id_token(input)?;
    let (input, term) = opt(preceded(ws, term_in_pipes))(input)?;
    Ok((input, EclExpression::ConceptReference { id, term }))
}

fn concept_id_token(input: &str) -> IResult<&str, ConceptId> {
    map(digit1, ConceptId::new)(input)
}

fn term_in_pipes(input: &str) -> IResult<&str, String> {
    let (input, _) = char('|')(input)?;
    let (input, term) = take_while(|c| c != '|')(input)?;
    let (input, _) = char('|')(input)?;
    Ok((input, term.trim().to_string()))
}

// ============================================================================
// Whitespace handling
// ============================================================================

/// Optional whitespace
fn ws(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

/// Mandatory whitespace
fn mws(input: &str) -> IResult<&str, &str> {
    multispace1(input)
}

// =============================================================================
// Refinement Parsing
// =============================================================================

/// Parse a cardinality constraint: `[min..max]` or `[min..*]`
fn cardinality(input: &str) -> IResult<&str, Cardinality> {
    let (input, _) = char('[')(input)?;
    let (input, _) = ws(input)?;
    let (input, min) = map(digit1, |s: &str| s.parse::<usize>().unwrap_or(0))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = tag("..")(input)?;
    let (input, _) = ws(input)?;
    let (input, max) = alt((
        map(char('*'), |_| None),
        map(digit1, |s: &str| Some(s.parse::<usize>().unwrap_or(0))),
    ))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(']')(input)?;
    Ok((input, Cardinality::new(min, max)))
}

fn refinement_operator(input: &str) -> IResult<&str, RefinementOperator> {
    alt((
        value(RefinementOperator::NotEqual, tag("!=")),
        value(RefinementOperator::Equal, char('=')),
    ))(input)
}

/// Parse a single attribute constraint: `[cardinality] attributeType op value`
fn attribute_constraint(input: &str) -> IResult<&str, AttributeConstraint> {
    let (input, cardinality) = opt(terminated(cardinality, ws))(input)?;
    let (input, attr_type) = base_sub_expression(input)?;
    let (input, _) = ws(input)?;
    let (input, operator) = refinement_operator(input)?;
    let (input, _) = ws(input)?;
    let (input, value_expr) = base_sub_expression(input)?;

    Ok((
        input,
        AttributeConstraint {
            cardinality,
            attribute_type: Box::new(attr_type),
            operator,
            value: Box::new(value_expr),
        },
    ))
}

/// Parse an attribute group: `{ constraint, constraint, ... }`
fn attribute_group(input: &str) -> IResult<&str, AttributeGroup> {
    let (input, cardinality) = opt(terminated(cardinality, ws))(input)?;
    let (input, constraints) = delimited(
        pair(char('{'), ws),
        separated_list1(refinement_separator, attribute_constraint),
        pair(ws, char('}')),
    )(input)?;
    Ok((input, AttributeGroup { cardinality, constraints }))
}

/// Commas and the word AND both join refinement items.
fn refinement_separator(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(ws, tag(","), ws),
        delimited(mws, tag_no_case("AND"), mws),
    ))(input)
}

enum RefinementItem {
    Constraint(AttributeConstraint),
    Group(AttributeGroup),
}

fn refinement_clause(input: &str) -> IResult<&str, Refinement> {
    let (input, items) = separated_list1(
        refinement_separator,
        alt((
            map(attribute_group, RefinementItem::Group),
            map(attribute_constraint, RefinementItem::Constraint),
        )),
    )(input)?;

    let mut ungrouped = Vec::new();
    let mut groups = Vec::new();
    for item in items {
        match item {
            RefinementItem::Constraint(c) => ungrouped.push(c),
            RefinementItem::Group(g) => groups.push(g),
        }
    }
    Ok((input, Refinement { ungrouped, groups }))
}

/// Parse a refined expression: `focusExpression : refinement`
fn refined_expression(input: &str) -> IResult<&str, EclExpression> {
    let (remaining, focus) = sub_expression_constraint(input)?;

    // Peek past whitespace without consuming it when no refinement follows.
    if remaining.trim_start().starts_with(':') {
        let (rest, _) = ws(remaining)?;
        let (rest, _) = char(':')(rest)?;
        let (rest, _) = ws(rest)?;
        let (rest, refinement) = refinement_clause(rest)?;
        Ok((rest, EclExpression::Refined { focus: Box::new(focus), refinement }))
    } else {
        Ok((remaining, focus))
    }
}

// =============================================================================
// Dotted Projection Parsing
// =============================================================================

/// Parse dotted projections: `expression . attributeType`
fn dotted_tail(input: &str, left: EclExpression) -> IResult<&str, EclExpression> {
    let trimmed = input.trim_start();

    if trimmed.starts_with('.') && !trimmed.starts_with("..") {
        let (rest, _) = ws(input)?;
        let (rest, _) = char('.')(rest)?;
        let (rest, _) = ws(rest)?;
        let (rest, attr_type) = base_sub_expression(rest)?;

        let expr = EclExpression::Dotted {
            focus: Box::new(left),
            attribute_type: Box::new(attr_type),
        };
        dotted_tail(rest, expr)
    } else {
        Ok((input, left))
    }
}

// =============================================================================
// Filter Parsing
// =============================================================================

/// Parse filter blocks following a sub-expression: `expr {{ ... }} {{ ... }}`
fn filter_tail(input: &str, expr: EclExpression) -> IResult<&str, EclExpression> {
    let mut filters = Vec::new();
    let mut remaining = input;

    while remaining.trim_start().starts_with("{{") {
        let (rest, _) = ws(remaining)?;
        let (rest, constraint) = filter_block(rest)?;
        filters.push(constraint);
        remaining = rest;
    }

    if filters.is_empty() {
        Ok((input, expr))
    } else {
        Ok((remaining, EclExpression::Filtered { constraint: Box::new(expr), filters }))
    }
}

/// Parse one `{{ [C|D|M] filter }}` block.
fn filter_block(input: &str) -> IResult<&str, FilterConstraint> {
    let (input, _) = pair(tag("{{"), ws)(input)?;
    let (input, domain) = opt(terminated(filter_domain, mws))(input)?;
    let (input, filter) = filter_disjunction(input)?;
    let (input, _) = pair(ws, tag("}}"))(input)?;

    let constraint = match domain {
        Some(domain) => FilterConstraint::with_domain(domain, filter),
        None => FilterConstraint::new(filter),
    };
    Ok((input, constraint))
}

fn filter_domain(input: &str) -> IResult<&str, FilterDomain> {
    map(one_of("CDMcdm"), |c| match c.to_ascii_uppercase() {
        'C' => FilterDomain::Concept,
        'D' => FilterDomain::Description,
        _ => FilterDomain::Member,
    })(input)
}

fn filter_disjunction(input: &str) -> IResult<&str, EclFilter> {
    let (input, mut parts) = separated_list1(
        delimited(mws, tag_no_case("OR"), mws),
        filter_conjunction,
    )(input)?;

    if parts.len() == 1 {
        Ok((input, parts.remove(0)))
    } else {
        Ok((input, EclFilter::Disjunction(parts)))
    }
}

fn filter_conjunction(input: &str) -> IResult<&str, EclFilter> {
    let (input, mut parts) = separated_list1(refinement_separator, single_filter)(input)?;

    if parts.len() == 1 {
        Ok((input, parts.remove(0)))
    } else {
        Ok((input, EclFilter::Conjunction(parts)))
    }
}

fn single_filter(input: &str) -> IResult<&str, EclFilter> {
    alt((
        history_filter,
        active_filter,
        module_filter,
        effective_time_filter,
        definition_status_filter,
        semantic_tag_filter,
        term_filter,
        type_id_filter,
        dialect_filter,
        language_refset_filter,
        language_filter,
        member_field_filter,
    ))(input)
}

/// Parse a history supplement: `+HISTORY`, `+HISTORY-MIN`, `-MOD`, `-MAX`
fn history_filter(input: &str) -> IResult<&str, EclFilter> {
    let (input, _) = char('+')(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = tag_no_case("HISTORY")(input)?;
    let (input, profile) = opt(alt((
        value(HistoryProfile::Min, tag_no_case("-MIN")),
        value(HistoryProfile::Mod, tag_no_case("-MOD")),
        value(HistoryProfile::Max, tag_no_case("-MAX")),
    )))(input)?;
    Ok((input, EclFilter::History { profile }))
}

/// Parse an active filter: `active = true`; `!=` flips the polarity.
fn active_filter(input: &str) -> IResult<&str, EclFilter> {
    let (input, _) = tag_no_case("active")(input)?;
    let (input, _) = ws(input)?;
    let (input, negated) = alt((value(true, tag("!=")), value(false, char('='))))(input)?;
    let (input, _) = ws(input)?;
    let (input, active) = boolean(input)?;
    Ok((input, EclFilter::Active(active != negated)))
}

fn boolean(input: &str) -> IResult<&str, bool> {
    alt((
        value(true, tag_no_case("true")),
        value(false, tag_no_case("false")),
        value(true, char('1')),
        value(false, char('0')),
    ))(input)
}

fn module_filter(input: &str) -> IResult<&str, EclFilter> {
    let (input, module_ids) = keyword_id_set("moduleId")(input)?;
    Ok((input, EclFilter::Module { module_ids }))
}

fn type_id_filter(input: &str) -> IResult<&str, EclFilter> {
    let (input, type_ids) = keyword_id_set("typeId")(input)?;
    Ok((input, EclFilter::DescriptionType { type_ids }))
}

fn language_refset_filter(input: &str) -> IResult<&str, EclFilter> {
    let (input, refset_ids) = keyword_id_set("languageRefSetId")(input)?;
    Ok((input, EclFilter::LanguageRefSet { refset_ids }))
}

fn dialect_filter(input: &str) -> IResult<&str, EclFilter> {
    let (input, dialect_ids) = keyword_id_set("dialectId")(input)?;
    let (input, acceptability) = opt(preceded(
        mws,
        alt((
            value(FilterAcceptability::Preferred, tag_no_case("prefer")),
            value(FilterAcceptability::Acceptable, tag_no_case("accept")),
        )),
    ))(input)?;
    Ok((input, EclFilter::Dialect { dialect_ids, acceptability }))
}

/// `keyword = id` or `keyword = (id id ...)`
fn keyword_id_set(keyword: &'static str) -> impl FnMut(&str) -> IResult<&str, Vec<ConceptId>> {
    move |input: &str| {
        let (input, _) = tag_no_case(keyword)(input)?;
        let (input, _) = tuple((ws, char('='), ws))(input)?;
        id_set(input)
    }
}

fn id_set(input: &str) -> IResult<&str, Vec<ConceptId>> {
    alt((
        map(concept_id_token, |id| vec![id]),
        delimited(
            pair(char('('), ws),
            separated_list1(mws, concept_id_token),
            pair(ws, char(')')),
        ),
    ))(input)
}

fn effective_time_filter(input: &str) -> IResult<&str, EclFilter> {
    let (input, _) = tag_no_case("effectiveTime")(input)?;
    let (input, _) = ws(input)?;
    let (input, operator) = comparison_operator(input)?;
    let (input, _) = ws(input)?;
    let (input, value) = alt((quoted_string, map(digit1, str::to_string)))(input)?;
    Ok((input, EclFilter::EffectiveTime { operator, value }))
}

fn definition_status_filter(input: &str) -> IResult<&str, EclFilter> {
    let (input, _) = tag_no_case("definitionStatus")(input)?;
    let (input, _) = tuple((ws, char('='), ws))(input)?;
    let (input, is_primitive) = alt((
        value(true, tag_no_case("primitive")),
        value(false, tag_no_case("defined")),
    ))(input)?;
    Ok((input, EclFilter::DefinitionStatus { is_primitive }))
}

fn semantic_tag_filter(input: &str) -> IResult<&str, EclFilter> {
    let (input, _) = tag_no_case("semanticTag")(input)?;
    let (input, _) = tuple((ws, char('='), ws))(input)?;
    let (input, tags) = alt((
        map(quoted_string, |t| vec![t]),
        delimited(
            pair(char('('), ws),
            separated_list1(mws, quoted_string),
            pair(ws, char(')')),
        ),
    ))(input)?;
    Ok((input, EclFilter::SemanticTag { tags }))
}

/// Parse a term filter: `term = "heart"` or `term = wild:"hear*"`
fn term_filter(input: &str) -> IResult<&str, EclFilter> {
    let (input, _) = tag_no_case("term")(input)?;
    let (input, _) = tuple((ws, char('='), ws))(input)?;
    let (input, match_type) = opt(terminated(
        alt((
            value(TermMatchType::Match, tag_no_case("match")),
            value(TermMatchType::Wild, tag_no_case("wild")),
            value(TermMatchType::Regex, tag_no_case("regex")),
            value(TermMatchType::Exact, tag_no_case("exact")),
        )),
        char(':'),
    ))(input)?;
    let (input, value) = quoted_string(input)?;

    Ok((
        input,
        EclFilter::Term {
            match_type: match_type.unwrap_or(TermMatchType::Match),
            value,
        },
    ))
}

fn language_filter(input: &str) -> IResult<&str, EclFilter> {
    let (input, _) = tag_no_case("language")(input)?;
    let (input, _) = tuple((ws, char('='), ws))(input)?;
    let (input, codes) = alt((
        map(language_code, |c| vec![c]),
        delimited(
            pair(char('('), ws),
            separated_list1(mws, language_code),
            pair(ws, char(')')),
        ),
    ))(input)?;
    Ok((input, EclFilter::Language { codes }))
}

fn language_code(input: &str) -> IResult<&str, String> {
    map(take_while1(|c: char| c.is_ascii_alphabetic()), |s: &str| {
        s.to_ascii_lowercase()
    })(input)
}

/// Parse a member field filter: `mapTarget = "J45.9"`
fn member_field_filter(input: &str) -> IResult<&str, EclFilter> {
    let (input, field) = field_name(input)?;
    let (input, _) = ws(input)?;
    let (input, operator) = comparison_operator(input)?;
    let (input, _) = ws(input)?;
    let (input, value) = member_field_value(input)?;

    Ok((
        input,
        EclFilter::MemberField {
            field: field.to_string(),
            operator,
            value,
        },
    ))
}

fn field_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn member_field_value(input: &str) -> IResult<&str, MemberFieldValue> {
    alt((
        map(quoted_string, MemberFieldValue::String),
        value(MemberFieldValue::Boolean(true), tag_no_case("true")),
        value(MemberFieldValue::Boolean(false), tag_no_case("false")),
        map(
            recognize(tuple((opt(char('-')), digit1, opt(pair(char('.'), digit1))))),
            |s: &str| {
                if s.contains('.') {
                    MemberFieldValue::Decimal(s.parse().unwrap_or(0.0))
                } else {
                    MemberFieldValue::Integer(s.parse().unwrap_or(0))
                }
            },
        ),
    ))(input)
}

fn comparison_operator(input: &str) -> IResult<&str, ComparisonOperator> {
    alt((
        value(ComparisonOperator::LessThanOrEqual, tag("<=")),
        value(ComparisonOperator::GreaterThanOrEqual, tag(">=")),
        value(ComparisonOperator::NotEqual, tag("!=")),
        value(ComparisonOperator::LessThan, char('<')),
        value(ComparisonOperator::GreaterThan, char('>')),
        value(ComparisonOperator::Equal, char('=')),
    ))(input)
}

fn quoted_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let (input, content) = take_until("\"")(input)?;
    let (input, _) = char('"')(input)?;
    Ok((input, content.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
