//! The ECL evaluator.
//!
//! [`EclEvaluator`] recursively compiles a parsed constraint into a
//! [`Query`], suspending only on graph reader calls. Dispatch is an
//! exhaustive match over the AST variants, one handler per variant, so a
//! new variant cannot silently fall through. Independent sub-trees (the
//! operands of a conjunction or disjunction, a filtered constraint and
//! its filters) are evaluated concurrently.
//!
//! Evaluation never mutates the AST, and with an unchanged graph it is
//! referentially transparent; the optional [`EvalCache`] exploits that by
//! memoizing compiled queries keyed on the constraint's canonical
//! rendering and the hierarchy form.

use std::collections::{BTreeMap, BTreeSet};

use ecl_ast::{
    parse, AttributeConstraint, Cardinality, ConceptId, EclExpression, EclFilter,
    FilterConstraint, FilterDomain, HistoryProfile, Refinement,
};
use futures::future::{try_join, try_join_all, BoxFuture};
use futures::FutureExt;
use tracing::debug;

use crate::cache::{EvalCache, EvalCacheConfig};
use crate::error::{EvalError, EvalResult};
use crate::filter;
use crate::query::fields::concept;
use crate::query::{fields, Query};
use crate::reader::{Form, GraphReader, Relationship};
use crate::refinement::{concept_matches, AttributeMatcher, GroupMatcher};
use crate::terminology;

/// Compiles ECL constraints against a concept graph.
///
/// The evaluator borrows its graph reader; it is cheap to construct and a
/// fresh instance per request is the expected usage. All state beyond the
/// optional cache is per-call.
pub struct EclEvaluator<'a, G: GraphReader + ?Sized> {
    graph: &'a G,
    form: Form,
    cache: Option<EvalCache>,
}

impl<'a, G: GraphReader + ?Sized> EclEvaluator<'a, G> {
    /// Creates an evaluator over the inferred hierarchy, without caching.
    pub fn new(graph: &'a G) -> Self {
        Self { graph, form: Form::default(), cache: None }
    }

    /// Creates an evaluator for the given hierarchy form.
    pub fn with_form(graph: &'a G, form: Form) -> Self {
        Self { graph, form, cache: None }
    }

    /// Enables memoization of compiled queries.
    pub fn cached(mut self, config: EvalCacheConfig) -> Self {
        self.cache = Some(EvalCache::new(config));
        self
    }

    /// The hierarchy form this evaluator compiles against.
    pub fn form(&self) -> Form {
        self.form
    }

    /// Compiles a constraint into a query.
    pub async fn evaluate(&self, constraint: &EclExpression) -> EvalResult<Query> {
        let Some(cache) = &self.cache else {
            return self.eval(constraint).await;
        };
        let key = constraint.to_string();
        if let Some(hit) = cache.get(self.form, &key) {
            debug!(ecl = %key, "evaluation cache hit");
            return Ok(hit);
        }
        let query = self.eval(constraint).await?;
        cache.put(self.form, key, query.clone());
        Ok(query)
    }

    /// Parses and compiles ECL text. Parse failures surface as
    /// [`EvalError::BadRequest`].
    pub async fn evaluate_ecl(&self, ecl: &str) -> EvalResult<Query> {
        let constraint = parse(ecl).map_err(|e| EvalError::bad_request(e.to_string()))?;
        self.evaluate(&constraint).await
    }

    /// Compiles a constraint and resolves it to the concept ids it
    /// selects.
    pub async fn resolve(&self, constraint: &EclExpression) -> EvalResult<BTreeSet<ConceptId>> {
        let query = self.evaluate(constraint).await?;
        self.resolve_ids(query).await
    }

    /// Resolves a compiled query to concept ids, preferring the zero-cost
    /// structural extraction over a graph search.
    pub async fn resolve_ids(&self, query: Query) -> EvalResult<BTreeSet<ConceptId>> {
        if let Some(ids) = query.as_concept_ids() {
            return Ok(ids);
        }
        self.graph.search_concepts(&query).await
    }

    fn eval<'b>(&'b self, constraint: &'b EclExpression) -> BoxFuture<'b, EvalResult<Query>> {
        async move {
            match constraint {
                EclExpression::Any => Ok(Query::MatchAll),
                EclExpression::ConceptReference { id, .. } => Ok(Query::term(concept::ID, id)),
                EclExpression::ConceptReferenceSet(ids) => Ok(Query::ids(concept::ID, ids)),
                EclExpression::MemberOf(inner) => self.member_of(inner).await,
                EclExpression::DescendantOf(inner) => self.descendants(inner, false).await,
                EclExpression::DescendantOrSelfOf(inner) => self.descendants(inner, true).await,
                EclExpression::ChildOf(inner) => self.children(inner, false).await,
                EclExpression::ChildOrSelfOf(inner) => self.children(inner, true).await,
                EclExpression::ParentOf(inner) => self.upward(inner, false, false).await,
                EclExpression::ParentOrSelfOf(inner) => self.upward(inner, true, false).await,
                EclExpression::AncestorOf(inner) => self.upward(inner, false, true).await,
                EclExpression::AncestorOrSelfOf(inner) => self.upward(inner, true, true).await,
                EclExpression::And(left, right) => self.conjunction(constraint, left, right).await,
                EclExpression::Or(left, right) => self.disjunction(constraint, left, right).await,
                EclExpression::Exclusion(left, right) => self.exclusion(left, right).await,
                EclExpression::Refined { focus, refinement } => {
                    self.refined(focus, refinement).await
                }
                EclExpression::Dotted { focus, attribute_type } => {
                    self.dotted(focus, attribute_type).await
                }
                EclExpression::Nested(inner) => self.eval(inner).await,
                EclExpression::Filtered { constraint, filters } => {
                    self.filtered(constraint, filters).await
                }
            }
        }
        .boxed()
    }

    async fn member_of(&self, inner: &EclExpression) -> EvalResult<Query> {
        match inner {
            EclExpression::ConceptReference { id, .. } => {
                Ok(Query::term(concept::ACTIVE_MEMBER_OF, id))
            }
            EclExpression::ConceptReferenceSet(ids) => {
                Ok(Query::ids(concept::ACTIVE_MEMBER_OF, ids))
            }
            EclExpression::Any => Ok(Query::exists(concept::ACTIVE_MEMBER_OF)),
            EclExpression::Nested(nested) => {
                let refsets = self.resolve(nested).await?;
                Ok(Query::ids(concept::ACTIVE_MEMBER_OF, &refsets))
            }
            other => Err(EvalError::unsupported(format!(
                "member-of target: {}",
                constraint_kind(other)
            ))),
        }
    }

    async fn descendants(&self, inner: &EclExpression, or_self: bool) -> EvalResult<Query> {
        if matches!(inner, EclExpression::Any) {
            // Descendants of anything is everything below a top-level
            // concept; with self it degenerates to match-all.
            return Ok(if or_self {
                Query::MatchAll
            } else {
                Query::term(self.form.parents_field(), terminology::ROOT_ID).not()
            });
        }
        let ids = self.resolve(inner).await?;
        let below = Query::ids(self.form.parents_field(), &ids)
            .or(Query::ids(self.form.ancestors_field(), &ids));
        Ok(if or_self { below.or(Query::ids(concept::ID, &ids)) } else { below })
    }

    async fn children(&self, inner: &EclExpression, or_self: bool) -> EvalResult<Query> {
        if matches!(inner, EclExpression::Any) {
            return Ok(if or_self {
                Query::MatchAll
            } else {
                Query::term(self.form.parents_field(), terminology::ROOT_ID).not()
            });
        }
        let ids = self.resolve(inner).await?;
        let below = Query::ids(self.form.parents_field(), &ids);
        Ok(if or_self { below.or(Query::ids(concept::ID, &ids)) } else { below })
    }

    /// Parent and ancestor variants. Parent and ancestor id lists are
    /// carried on the concept records, so the inner set is resolved to
    /// full records first; the synthetic root sentinel never appears in
    /// results.
    async fn upward(
        &self,
        inner: &EclExpression,
        include_self: bool,
        transitive: bool,
    ) -> EvalResult<Query> {
        let ids = self.resolve(inner).await?;
        let records = self.graph.concepts(&ids).await?;
        let mut out: BTreeSet<ConceptId> = BTreeSet::new();
        for record in &records {
            if include_self {
                out.insert(record.id.clone());
            }
            for parent in record.parents_for(self.form) {
                if parent.as_str() != terminology::ROOT_ID {
                    out.insert(parent.clone());
                }
            }
            if transitive {
                for ancestor in record.ancestors_for(self.form) {
                    if ancestor.as_str() != terminology::ROOT_ID {
                        out.insert(ancestor.clone());
                    }
                }
            }
        }
        Ok(Query::ids(concept::ID, &out))
    }

    async fn conjunction(
        &self,
        whole: &EclExpression,
        left: &EclExpression,
        right: &EclExpression,
    ) -> EvalResult<Query> {
        if let Some(ids) = literal_conjunction_ids(whole) {
            // One document cannot equal two different ids.
            return Ok(if ids.len() == 1 { Query::ids(concept::ID, &ids) } else { Query::MatchNone });
        }
        if matches!(left, EclExpression::Any) {
            return self.eval(right).await;
        }
        if matches!(right, EclExpression::Any) {
            return self.eval(left).await;
        }
        let (l, r) = try_join(self.eval(left), self.eval(right)).await?;
        Ok(l.and(r))
    }

    async fn disjunction(
        &self,
        whole: &EclExpression,
        left: &EclExpression,
        right: &EclExpression,
    ) -> EvalResult<Query> {
        if let Some(ids) = literal_disjunction_ids(whole) {
            return Ok(Query::ids(concept::ID, &ids));
        }
        if matches!(left, EclExpression::Any) || matches!(right, EclExpression::Any) {
            return Ok(Query::MatchAll);
        }
        let (l, r) = try_join(self.eval(left), self.eval(right)).await?;
        Ok(l.or(r))
    }

    async fn exclusion(&self, left: &EclExpression, right: &EclExpression) -> EvalResult<Query> {
        // The right side decides whether the left needs evaluating at all.
        let right_q = self.eval(right).await?;
        match right_q {
            Query::MatchAll => Ok(Query::MatchNone),
            Query::MatchNone => self.eval(left).await,
            right_q => {
                let left_q = self.eval(left).await?;
                Ok(left_q.and(right_q.not()))
            }
        }
    }

    async fn refined(&self, focus: &EclExpression, refinement: &Refinement) -> EvalResult<Query> {
        let focus_ids = self.resolve(focus).await?;
        if focus_ids.is_empty() {
            return Ok(Query::MatchNone);
        }

        let ungrouped = try_join_all(
            refinement.ungrouped.iter().map(|c| self.attribute_matcher(c)),
        )
        .await?;
        let mut groups = Vec::with_capacity(refinement.groups.len());
        for group in &refinement.groups {
            let constraints =
                try_join_all(group.constraints.iter().map(|c| self.attribute_matcher(c))).await?;
            groups.push(GroupMatcher {
                constraints,
                cardinality: group.cardinality.clone().unwrap_or_else(Cardinality::at_least_one),
            });
        }

        let rels = self.graph.relationships_by_source(&focus_ids, self.form).await?;
        let mut by_source: BTreeMap<ConceptId, Vec<Relationship>> = BTreeMap::new();
        for rel in rels {
            by_source.entry(rel.source.clone()).or_default().push(rel);
        }

        let no_rels: Vec<Relationship> = Vec::new();
        let matching: BTreeSet<ConceptId> = focus_ids
            .into_iter()
            .filter(|id| {
                let rels = by_source.get(id).unwrap_or(&no_rels);
                concept_matches(&ungrouped, &groups, rels)
            })
            .collect();
        Ok(Query::ids(concept::ID, &matching))
    }

    async fn attribute_matcher(
        &self,
        constraint: &AttributeConstraint,
    ) -> EvalResult<AttributeMatcher> {
        let (types, destinations) = try_join(
            self.operand_ids(&constraint.attribute_type),
            self.operand_ids(&constraint.value),
        )
        .await?;
        Ok(AttributeMatcher {
            types,
            destinations,
            operator: constraint.operator,
            cardinality: constraint.cardinality.clone().unwrap_or_else(Cardinality::at_least_one),
        })
    }

    /// Resolves a refinement or projection operand; `None` stands for the
    /// wildcard.
    async fn operand_ids(
        &self,
        expr: &EclExpression,
    ) -> EvalResult<Option<BTreeSet<ConceptId>>> {
        if matches!(expr.unwrap_nested(), EclExpression::Any) {
            return Ok(None);
        }
        Ok(Some(self.resolve(expr).await?))
    }

    async fn dotted(
        &self,
        focus: &EclExpression,
        attribute_type: &EclExpression,
    ) -> EvalResult<Query> {
        let (focus_ids, types) =
            try_join(self.resolve(focus), self.operand_ids(attribute_type)).await?;
        let rels = self.graph.relationships_by_source(&focus_ids, self.form).await?;
        let destinations: BTreeSet<ConceptId> = rels
            .into_iter()
            .filter(|rel| types.as_ref().map_or(true, |t| t.contains(&rel.type_id)))
            .map(|rel| rel.destination)
            .collect();
        Ok(Query::ids(concept::ID, &destinations))
    }

    async fn filtered(
        &self,
        constraint: &EclExpression,
        filters: &[FilterConstraint],
    ) -> EvalResult<Query> {
        let (history, plain): (Vec<&FilterConstraint>, Vec<&FilterConstraint>) =
            filters.iter().partition(|fc| matches!(fc.filter, EclFilter::History { .. }));

        let (base, parts) = try_join(
            self.eval(constraint),
            try_join_all(plain.iter().map(|fc| self.filter_query(fc))),
        )
        .await?;
        let mut combined = parts.into_iter().fold(base, Query::and);

        for fc in &history {
            if let EclFilter::History { profile } = &fc.filter {
                let profile = profile.unwrap_or(HistoryProfile::Max);
                combined = self.with_history(combined, profile).await?;
            }
        }
        Ok(combined)
    }

    /// Compiles one filter block and, for description and member domains,
    /// projects the matching documents back to concept ids. Those two
    /// domains search active documents unless the filter constrains the
    /// active flag itself.
    async fn filter_query(&self, fc: &FilterConstraint) -> EvalResult<Query> {
        match fc.domain {
            FilterDomain::Concept => filter::concept_filter_query(&fc.filter),
            FilterDomain::Description => {
                let mut query = filter::description_filter_query(&fc.filter)?;
                if !filter::mentions_active(&fc.filter) {
                    query = query.and(Query::term(fields::description::ACTIVE, true));
                }
                let ids = self.graph.search_descriptions(&query).await?;
                Ok(Query::ids(concept::ID, &ids))
            }
            FilterDomain::Member => {
                let mut query = filter::member_filter_query(&fc.filter)?;
                if !filter::mentions_active(&fc.filter) {
                    query = query.and(Query::term(fields::member::ACTIVE, true));
                }
                let ids = self.graph.search_members(&query).await?;
                Ok(Query::ids(concept::ID, &ids))
            }
        }
    }

    /// Widens a result with the inactive predecessors reachable through
    /// the profile's historical association reference sets.
    async fn with_history(&self, base: Query, profile: HistoryProfile) -> EvalResult<Query> {
        let focus = self.resolve_ids(base.clone()).await?;
        if focus.is_empty() {
            return Ok(base);
        }
        let refsets = self.history_refsets(profile).await?;
        let member_query = Query::ids(fields::member::REFSET_ID, &refsets)
            .and(Query::term(fields::member::ACTIVE, true))
            .and(Query::ids(fields::member::TARGET_COMPONENT, &focus));
        let predecessors = self.graph.search_members(&member_query).await?;
        debug!(
            profile = ?profile,
            count = predecessors.len(),
            "history supplement resolved"
        );
        Ok(base.or(Query::ids(concept::ID, &predecessors)))
    }

    async fn history_refsets(&self, profile: HistoryProfile) -> EvalResult<BTreeSet<ConceptId>> {
        let fixed = match profile {
            HistoryProfile::Min => terminology::MIN_HISTORY_ASSOCIATIONS,
            HistoryProfile::Mod => terminology::MOD_HISTORY_ASSOCIATIONS,
            HistoryProfile::Max => {
                // Every reference set below the historical association root.
                let all = EclExpression::descendant_or_self_of(EclExpression::concept(
                    terminology::HISTORICAL_ASSOCIATION,
                ));
                return self.resolve(&all).await;
            }
        };
        Ok(fixed.iter().map(|id| ConceptId::new(*id)).collect())
    }
}

/// Collects the distinct ids of a pure conjunction of literal concept
/// references; returns `None` when any other construct appears in the
/// chain. Duplicate occurrences of the same id collapse into one.
fn literal_conjunction_ids(expr: &EclExpression) -> Option<BTreeSet<ConceptId>> {
    fn collect(expr: &EclExpression, out: &mut BTreeSet<ConceptId>) -> bool {
        match expr {
            EclExpression::ConceptReference { id, .. } => {
                out.insert(id.clone());
                true
            }
            EclExpression::And(left, right) => collect(left, out) && collect(right, out),
            EclExpression::Nested(inner) => collect(inner, out),
            _ => false,
        }
    }
    let mut ids = BTreeSet::new();
    collect(expr, &mut ids).then_some(ids)
}

/// Collects the ids of a pure disjunction of literal concept references
/// and reference sets, at any nesting depth.
fn literal_disjunction_ids(expr: &EclExpression) -> Option<BTreeSet<ConceptId>> {
    fn collect(expr: &EclExpression, out: &mut BTreeSet<ConceptId>) -> bool {
        match expr {
            EclExpression::ConceptReference { id, .. } => {
                out.insert(id.clone());
                true
            }
            EclExpression::ConceptReferenceSet(ids) => {
                out.extend(ids.iter().cloned());
                true
            }
            EclExpression::Or(left, right) => collect(left, out) && collect(right, out),
            EclExpression::Nested(inner) => collect(inner, out),
            _ => false,
        }
    }
    let mut ids = BTreeSet::new();
    collect(expr, &mut ids).then_some(ids)
}

fn constraint_kind(expr: &EclExpression) -> &'static str {
    match expr {
        EclExpression::Any => "Any",
        EclExpression::ConceptReference { .. } => "ConceptReference",
        EclExpression::ConceptReferenceSet(_) => "ConceptReferenceSet",
        EclExpression::MemberOf(_) => "MemberOf",
        EclExpression::DescendantOf(_) => "DescendantOf",
        EclExpression::DescendantOrSelfOf(_) => "DescendantOrSelfOf",
        EclExpression::ChildOf(_) => "ChildOf",
        EclExpression::ChildOrSelfOf(_) => "ChildOrSelfOf",
        EclExpression::ParentOf(_) => "ParentOf",
        EclExpression::ParentOrSelfOf(_) => "ParentOrSelfOf",
        EclExpression::AncestorOf(_) => "AncestorOf",
        EclExpression::AncestorOrSelfOf(_) => "AncestorOrSelfOf",
        EclExpression::And(_, _) => "And",
        EclExpression::Or(_, _) => "Or",
        EclExpression::Exclusion(_, _) => "Exclusion",
        EclExpression::Refined { .. } => "Refined",
        EclExpression::Dotted { .. } => "Dotted",
        EclExpression::Nested(_) => "Nested",
        EclExpression::Filtered { .. } => "Filtered",
    }
}
