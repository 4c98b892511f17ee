//! Turning an enumerated concept set into a handful of ECL clauses.
//!
//! The optimizer rewrites a flat list of concept ids (plus any existing
//! query clauses) as a small set of inclusion and exclusion clauses that
//! resolve to the same concepts. It works in passes: attribute
//! refinements first, then exact ancestor clauses, then a greedy scored
//! search that tolerates overshoot and compensates for it on the
//! exclusion side, and finally per-concept literals for whatever is
//! left. Optimization is best effort, so the entry points never fail;
//! a bad caller clause logs a warning and yields an empty diff.

use std::collections::BTreeSet;
use std::time::Instant;

use ecl_ast::{ConceptId, EclExpression};
use ecl_eval::{Form, GraphReader};
use futures::future;
use tracing::{debug, warn};

use crate::clause::{Clause, QueryExpressionDiff};
use crate::config::OptimizerConfig;
use crate::error::OptimizerResult;
use crate::hierarchy_stats::HierarchyStats;
use crate::relationship_stats::RelationshipStats;
use crate::set_evaluator::{ConceptSetEvaluator, EclLabeler};

/// Rewrites enumerated concept sets as compact ECL clause sets.
///
/// The optimizer borrows a graph for statistics queries and a
/// [`ConceptSetEvaluator`] for resolving candidate clause text. The two
/// usually wrap the same index, but keeping them separate lets servers
/// put a cache in front of clause resolution.
pub struct QueryOptimizer<'a, G: GraphReader + ?Sized> {
    graph: &'a G,
    sets: &'a dyn ConceptSetEvaluator,
    labeler: Option<&'a dyn EclLabeler>,
    form: Form,
    config: OptimizerConfig,
}

/// A caller clause with its parsed canonical text and resolved ids.
struct EvaluatedClause {
    clause: Clause,
    canonical: String,
    ids: BTreeSet<ConceptId>,
}

/// One side of the caller's expression after the pinned pass.
struct SideState {
    pinned: Vec<EvaluatedClause>,
    loose: Vec<EvaluatedClause>,
    caller_texts: BTreeSet<String>,
}

impl SideState {
    /// Splits clauses into pinned and loose, deduplicating pinned
    /// clauses that resolve to the same id set. Of a duplicate pair the
    /// shorter query text wins, with ties broken lexicographically; the
    /// loser goes on the removal list.
    fn split(clauses: Vec<EvaluatedClause>, removed: &mut Vec<Clause>) -> Self {
        let mut pinned: Vec<EvaluatedClause> = Vec::new();
        let mut loose = Vec::new();
        let mut caller_texts = BTreeSet::new();
        for clause in clauses {
            caller_texts.insert(clause.canonical.clone());
            if !clause.clause.pinned {
                loose.push(clause);
                continue;
            }
            match pinned.iter_mut().find(|kept| kept.ids == clause.ids) {
                None => pinned.push(clause),
                Some(kept) => {
                    if shorter_text(&clause.clause.query_text, &kept.clause.query_text) {
                        removed.push(std::mem::replace(kept, clause).clause);
                    } else {
                        removed.push(clause.clause);
                    }
                }
            }
        }
        Self { pinned, loose, caller_texts }
    }

    fn resolved_union(&self) -> BTreeSet<ConceptId> {
        let mut ids = BTreeSet::new();
        for clause in &self.pinned {
            ids.extend(clause.ids.iter().cloned());
        }
        ids
    }

    fn reserved_texts(&self) -> BTreeSet<String> {
        self.pinned.iter().map(|clause| clause.canonical.clone()).collect()
    }
}

fn shorter_text(a: &str, b: &str) -> bool {
    a.len() < b.len() || (a.len() == b.len() && a < b)
}

/// A clause produced by an optimization pass, with enough provenance to
/// drop it again during compaction.
struct Emitted {
    text: String,
    // Set for ancestor clauses: the candidate id and whether the clause
    // includes the candidate itself.
    ancestor: Option<(ConceptId, bool)>,
}

impl Emitted {
    fn plain(text: String) -> Self {
        Self { text, ancestor: None }
    }

    fn ancestor(text: String, id: ConceptId, or_self: bool) -> Self {
        Self { text, ancestor: Some((id, or_self)) }
    }
}

impl<'a, G: GraphReader + ?Sized> QueryOptimizer<'a, G> {
    /// Creates an optimizer over the inferred view with default limits.
    pub fn new(graph: &'a G, sets: &'a dyn ConceptSetEvaluator) -> Self {
        Self {
            graph,
            sets,
            labeler: None,
            form: Form::Inferred,
            config: OptimizerConfig::default(),
        }
    }

    /// Replaces the tuning parameters.
    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Selects the hierarchy form statistics and clauses are built on.
    pub fn with_form(mut self, form: Form) -> Self {
        self.form = form;
        self
    }

    /// Attaches a labeler that decorates added clauses with display
    /// terms before the diff is returned.
    pub fn labeled(mut self, labeler: &'a dyn EclLabeler) -> Self {
        self.labeler = Some(labeler);
        self
    }

    /// Optimizes an enumerated concept set.
    ///
    /// The target arrives as bare ids, typically a hand-maintained
    /// concept list, together with any exclusion clauses already on the
    /// expression. The returned diff proposes inclusion clauses covering
    /// the whole target and exclusion clauses compensating for overshoot.
    pub async fn optimize(
        &self,
        target: &BTreeSet<ConceptId>,
        exclusions: Vec<Clause>,
    ) -> QueryExpressionDiff {
        settle(self.run(target.clone(), Vec::new(), exclusions).await)
    }

    /// Optimizes an expression already made of clauses.
    ///
    /// The target set is whatever the inclusion clauses resolve to minus
    /// the exclusions. Pinned clauses are kept as they are; loose ones
    /// are fair game for replacement and land on the removal list when
    /// the rewritten expression no longer needs them.
    pub async fn optimize_clauses(
        &self,
        inclusions: Vec<Clause>,
        exclusions: Vec<Clause>,
    ) -> QueryExpressionDiff {
        settle(self.run(BTreeSet::new(), inclusions, exclusions).await)
    }

    async fn run(
        &self,
        explicit: BTreeSet<ConceptId>,
        inclusions: Vec<Clause>,
        exclusions: Vec<Clause>,
    ) -> OptimizerResult<QueryExpressionDiff> {
        let deadline = Instant::now() + self.config.time_budget;

        let (included, excluded) =
            future::try_join(self.evaluate_all(inclusions), self.evaluate_all(exclusions))
                .await?;

        let mut net_target = explicit;
        for clause in &included {
            net_target.extend(clause.ids.iter().cloned());
        }
        for clause in &excluded {
            for id in &clause.ids {
                net_target.remove(id);
            }
        }

        let mut diff = QueryExpressionDiff::empty();
        if net_target.len() < 2 {
            debug!(size = net_target.len(), "target set too small to optimize");
            return Ok(diff);
        }

        let incl = SideState::split(included, &mut diff.remove);
        let excl = SideState::split(excluded, &mut diff.remove);

        // Ids the kept pinned inclusions already cover drop out of the
        // work set; ids they overshoot must be excluded further down.
        let pinned_included = incl.resolved_union();
        let mut overshoot: BTreeSet<ConceptId> =
            pinned_included.difference(&net_target).cloned().collect();
        let mut incl_work: BTreeSet<ConceptId> =
            net_target.difference(&pinned_included).cloned().collect();

        let mut used: BTreeSet<ConceptId> = BTreeSet::new();
        let incl_texts = self
            .optimize_inclusions(
                &mut incl_work,
                &net_target,
                &mut overshoot,
                &mut used,
                &incl.reserved_texts(),
                deadline,
            )
            .await?;

        let pinned_excluded = excl.resolved_union();
        let mut excl_work: BTreeSet<ConceptId> =
            overshoot.difference(&pinned_excluded).cloned().collect();
        let excl_texts = self
            .optimize_exclusions(
                &mut excl_work,
                &net_target,
                &mut used,
                &excl.reserved_texts(),
                deadline,
            )
            .await?;

        diff.add_to_inclusion = assemble_side(&incl, incl_texts, &mut diff.remove);
        diff.add_to_exclusion = assemble_side(&excl, excl_texts, &mut diff.remove);

        if let Some(labeler) = self.labeler {
            diff.add_to_inclusion = labeler.labeled_expressions(diff.add_to_inclusion).await;
            diff.add_to_exclusion = labeler.labeled_expressions(diff.add_to_exclusion).await;
        }
        Ok(diff)
    }

    /// Parses and resolves every caller clause. Any failure here aborts
    /// the whole run; the caller's expression is the one thing the
    /// optimizer must understand exactly.
    async fn evaluate_all(&self, clauses: Vec<Clause>) -> OptimizerResult<Vec<EvaluatedClause>> {
        let mut evaluated = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let canonical = ecl_ast::parse(&clause.query_text)?.to_string();
            let ids = self.sets.evaluate(&clause.query_text).await?;
            evaluated.push(EvaluatedClause { clause, canonical, ids });
        }
        Ok(evaluated)
    }

    async fn optimize_inclusions(
        &self,
        work: &mut BTreeSet<ConceptId>,
        net_target: &BTreeSet<ConceptId>,
        overshoot: &mut BTreeSet<ConceptId>,
        used: &mut BTreeSet<ConceptId>,
        reserved: &BTreeSet<String>,
        deadline: Instant,
    ) -> OptimizerResult<Vec<String>> {
        let mut emitted: Vec<Emitted> = Vec::new();
        self.refinement_pass(work, net_target, overshoot, &mut emitted, true).await?;

        // Inclusion candidates are ranked against the original target,
        // not the shrinking work set, so an ancestor stays eligible even
        // after refinements picked off some of its descendants.
        let stats = HierarchyStats::create(self.graph, net_target, self.form)
            .await?
            .filter_by_min_cluster(self.config.min_cluster_size)
            .filter_non_member_singletons()
            .filter_by_child_majority()
            .filter_large_fanout(
                self.config.large_fanout_children,
                self.config.large_fanout_precision,
            )
            .remove_redundant();

        self.exact_ancestor_pass(&stats, work, net_target, true, used, &mut emitted, deadline)
            .await?;
        self.greedy_ancestor_pass(&stats, work, net_target, overshoot, used, &mut emitted, deadline)
            .await?;

        for id in std::mem::take(work) {
            emitted.push(Emitted::plain(EclExpression::concept(id).to_string()));
        }
        Ok(compact(emitted, Some(&stats), reserved))
    }

    async fn optimize_exclusions(
        &self,
        work: &mut BTreeSet<ConceptId>,
        net_target: &BTreeSet<ConceptId>,
        used: &mut BTreeSet<ConceptId>,
        reserved: &BTreeSet<String>,
        deadline: Instant,
    ) -> OptimizerResult<Vec<String>> {
        let mut emitted: Vec<Emitted> = Vec::new();
        let mut discarded = BTreeSet::new();
        self.refinement_pass(work, net_target, &mut discarded, &mut emitted, false).await?;

        // Exclusion candidates come from the remaining work set, and an
        // ancestor already spent on an inclusion clause is off limits.
        let mut stats = None;
        if work.len() >= self.config.min_cluster_size && Instant::now() < deadline {
            let table = HierarchyStats::create(self.graph, work, self.form)
                .await?
                .filter_by_min_cluster(self.config.min_cluster_size)
                .filter_non_member_singletons()
                .filter_by_child_majority()
                .without_candidates(used)
                .remove_redundant();
            self.exact_ancestor_pass(&table, work, net_target, false, used, &mut emitted, deadline)
                .await?;
            stats = Some(table);
        }

        for id in std::mem::take(work) {
            emitted.push(Emitted::plain(EclExpression::concept(id).to_string()));
        }
        Ok(compact(emitted, stats.as_ref(), reserved))
    }

    /// Emits `* : type = destination` clauses for attribute pairs that
    /// near-exactly describe the work set.
    async fn refinement_pass(
        &self,
        work: &mut BTreeSet<ConceptId>,
        net_target: &BTreeSet<ConceptId>,
        overshoot: &mut BTreeSet<ConceptId>,
        emitted: &mut Vec<Emitted>,
        inclusion: bool,
    ) -> OptimizerResult<()> {
        if work.len() < self.config.min_cluster_size {
            return Ok(());
        }
        let stats = RelationshipStats::create(self.graph, work, self.form).await?;
        let clauses = if inclusion {
            stats
                .filter_by_precision(self.config.refinement_precision)
                .filter_by_min_true_positives(self.config.refinement_min_true_positives)
                .filter_by_max_false_positives(self.config.refinement_max_false_positives)
                .optimize_refinements()
        } else {
            // A concept excluded by mistake cannot be recovered, so the
            // exclusion side only accepts perfectly precise refinements.
            stats
                .filter_by_precision(1.0)
                .filter_by_min_true_positives(self.config.exclusion_refinement_min_true_positives)
                .optimize_refinements()
        };
        for clause in clauses {
            if work.is_empty() {
                break;
            }
            let resolved = match self.sets.evaluate(&clause.query_text).await {
                Ok(resolved) => resolved,
                Err(err) => {
                    debug!(
                        clause = %clause.query_text,
                        error = %err,
                        "skipping refinement candidate"
                    );
                    continue;
                }
            };
            if resolved.intersection(work).next().is_none() {
                continue;
            }
            if inclusion {
                overshoot.extend(resolved.difference(net_target).cloned());
            } else if resolved.intersection(net_target).next().is_some() {
                continue;
            }
            for id in &resolved {
                work.remove(id);
            }
            emitted.push(Emitted::plain(clause.query_text));
        }
        Ok(())
    }

    /// Accepts ancestor clauses that stray outside the allowed universe
    /// not at all, widest coverage first. Under the lossy strategy a
    /// bounded stray rate is tolerated on the inclusion side.
    #[allow(clippy::too_many_arguments)]
    async fn exact_ancestor_pass(
        &self,
        stats: &HierarchyStats,
        work: &mut BTreeSet<ConceptId>,
        net_target: &BTreeSet<ConceptId>,
        inclusion: bool,
        used: &mut BTreeSet<ConceptId>,
        emitted: &mut Vec<Emitted>,
        deadline: Instant,
    ) -> OptimizerResult<()> {
        for candidate in stats.candidates_by_coverage() {
            if work.is_empty() || Instant::now() >= deadline {
                break;
            }
            if used.contains(&candidate) {
                continue;
            }
            let text = stats.clause_for(&candidate);
            let resolved = match self.sets.evaluate(&text).await {
                Ok(resolved) => resolved,
                Err(err) => {
                    debug!(clause = %text, error = %err, "skipping ancestor candidate");
                    continue;
                }
            };
            if resolved.intersection(work).next().is_none() {
                continue;
            }
            let stray = if inclusion {
                resolved.difference(net_target).count()
            } else {
                resolved.intersection(net_target).count()
            };
            if stray > 0 && !(inclusion && self.within_lossy_bound(stray, resolved.len())) {
                continue;
            }
            for id in &resolved {
                work.remove(id);
            }
            let or_self = stats.is_member(&candidate);
            used.insert(candidate.clone());
            emitted.push(Emitted::ancestor(text, candidate, or_self));
        }
        Ok(())
    }

    /// The scored search over inclusion ancestors.
    ///
    /// Picks the best-scoring candidate each round; when nothing reaches
    /// the fit threshold, first widens the zoom, then lowers the
    /// threshold toward its floor, then gives up. Overshoot from
    /// accepted clauses is recorded for the exclusion side.
    #[allow(clippy::too_many_arguments)]
    async fn greedy_ancestor_pass(
        &self,
        stats: &HierarchyStats,
        work: &mut BTreeSet<ConceptId>,
        net_target: &BTreeSet<ConceptId>,
        overshoot: &mut BTreeSet<ConceptId>,
        used: &mut BTreeSet<ConceptId>,
        emitted: &mut Vec<Emitted>,
        deadline: Instant,
    ) -> OptimizerResult<()> {
        let mut zoom = self.config.initial_zoom.max(1);
        let mut fit = self.config.fit_threshold;
        let mut strategy = self.config.strategy;
        let mut accepted = 0usize;

        for _ in 0..self.config.max_iterations {
            if work.len() < self.config.min_cluster_size {
                break;
            }
            if Instant::now() >= deadline {
                debug!("optimizer wall clock budget exhausted");
                break;
            }
            let Some((candidate, score)) = stats.best_candidate(work, zoom, strategy, used)
            else {
                break;
            };
            if score + 1e-9 < fit {
                if zoom < self.config.max_zoom {
                    zoom = zoom.saturating_mul(2).min(self.config.max_zoom);
                } else if fit - self.config.fit_step >= self.config.fit_floor - 1e-9 {
                    fit -= self.config.fit_step;
                } else {
                    break;
                }
                continue;
            }
            used.insert(candidate.clone());
            let text = stats.clause_for(&candidate);
            let resolved = match self.sets.evaluate(&text).await {
                Ok(resolved) => resolved,
                Err(err) => {
                    debug!(clause = %text, error = %err, "skipping ancestor candidate");
                    continue;
                }
            };
            if resolved.intersection(work).next().is_none() {
                continue;
            }
            overshoot.extend(resolved.difference(net_target).cloned());
            for id in &resolved {
                work.remove(id);
            }
            let or_self = stats.is_member(&candidate);
            emitted.push(Emitted::ancestor(text, candidate, or_self));

            accepted += 1;
            if let Some(threshold) = strategy.advance_after() {
                if accepted >= threshold {
                    strategy = strategy.next();
                    accepted = 0;
                    debug!(strategy = ?strategy, "optimizer strategy advanced");
                }
            }
        }
        Ok(())
    }

    fn within_lossy_bound(&self, stray: usize, resolved: usize) -> bool {
        self.config.strategy.is_lossy()
            && stray as f64 <= self.config.lossy_false_positive_rate * resolved as f64
    }
}

fn settle(outcome: OptimizerResult<QueryExpressionDiff>) -> QueryExpressionDiff {
    match outcome {
        Ok(diff) => diff,
        Err(err) => {
            warn!(error = %err, "query optimization abandoned");
            QueryExpressionDiff::empty()
        }
    }
}

/// Final cleanup of one side's emitted clauses: drops ancestor clauses
/// shadowed by a wider emitted ancestor, `< x` when `<< x` is present,
/// and exact duplicates of each other or of kept pinned clauses.
fn compact(
    emitted: Vec<Emitted>,
    stats: Option<&HierarchyStats>,
    reserved: &BTreeSet<String>,
) -> Vec<String> {
    let ancestors: Vec<(ConceptId, bool)> =
        emitted.iter().filter_map(|entry| entry.ancestor.clone()).collect();
    let mut seen = reserved.clone();
    let mut texts = Vec::new();
    for entry in emitted {
        if let (Some((id, or_self)), Some(stats)) = (&entry.ancestor, stats) {
            let shadowed = ancestors.iter().any(|(other, other_or_self)| {
                if other == id {
                    *other_or_self && !*or_self
                } else {
                    stats.subsumes(other, id)
                }
            });
            if shadowed {
                continue;
            }
        }
        if seen.insert(entry.text.clone()) {
            texts.push(entry.text);
        }
    }
    texts
}

/// Splits one side's final clause texts into additions and removals
/// relative to what the caller sent in.
fn assemble_side(
    side: &SideState,
    emitted: Vec<String>,
    removed: &mut Vec<Clause>,
) -> Vec<Clause> {
    let mut final_texts: BTreeSet<&str> =
        side.pinned.iter().map(|clause| clause.canonical.as_str()).collect();
    final_texts.extend(emitted.iter().map(String::as_str));
    for clause in &side.loose {
        if !final_texts.contains(clause.canonical.as_str()) {
            removed.push(clause.clause.clone());
        }
    }
    let mut added = Vec::new();
    for text in emitted {
        if !side.caller_texts.contains(text.as_str()) {
            added.push(Clause::new(text));
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecl_eval::MemoryGraph;

    fn ids(raw: &[&str]) -> BTreeSet<ConceptId> {
        raw.iter().map(|id| ConceptId::new(*id)).collect()
    }

    fn evaluated(text: &str, pinned: bool, resolved: &[&str]) -> EvaluatedClause {
        let clause =
            if pinned { Clause::pinned(text) } else { Clause::new(text) };
        EvaluatedClause { clause, canonical: text.to_string(), ids: ids(resolved) }
    }

    #[test]
    fn test_shorter_text_prefers_length_then_order() {
        assert!(shorter_text("<<100", "(<< 100)"));
        assert!(!shorter_text("(<< 100)", "<<100"));
        assert!(shorter_text("100", "200"));
        assert!(!shorter_text("200", "100"));
    }

    #[test]
    fn test_split_deduplicates_pinned_by_resolved_set() {
        let clauses = vec![
            evaluated("(<< 100)", true, &["100", "101"]),
            evaluated("<< 100", true, &["100", "101"]),
            evaluated("<< 200", true, &["200"]),
            evaluated("300", false, &["300"]),
        ];
        let mut removed = Vec::new();
        let side = SideState::split(clauses, &mut removed);

        let kept: Vec<&str> =
            side.pinned.iter().map(|c| c.clause.query_text.as_str()).collect();
        assert_eq!(kept, vec!["<< 100", "<< 200"]);
        assert_eq!(removed, vec![Clause::pinned("(<< 100)")]);
        assert_eq!(side.loose.len(), 1);
        assert!(side.caller_texts.contains("(<< 100)"));
        assert_eq!(side.resolved_union(), ids(&["100", "101", "200"]));
    }

    #[test]
    fn test_assemble_side_splits_adds_and_removes() {
        let mut removed = Vec::new();
        let side = SideState::split(
            vec![
                evaluated("<< 100", true, &["100", "101"]),
                evaluated("200", false, &["200"]),
                evaluated("300", false, &["300"]),
            ],
            &mut removed,
        );
        let added = assemble_side(
            &side,
            vec!["<< 500".to_string(), "200".to_string()],
            &mut removed,
        );

        // The emitted clause matching a loose caller clause keeps it
        // alive; the other loose clause is removed; only genuinely new
        // text is added.
        assert_eq!(added, vec![Clause::new("<< 500")]);
        assert_eq!(removed, vec![Clause::new("300")]);
    }

    #[tokio::test]
    async fn test_compact_drops_shadowed_and_duplicate_clauses() {
        let mut graph = MemoryGraph::new();
        graph.add_is_a("300", "138875005");
        graph.add_is_a("310", "300");
        graph.add_is_a("311", "310");
        let members = ids(&["300", "310", "311"]);
        let stats = HierarchyStats::create(&graph, &members, Form::Inferred).await.unwrap();

        let emitted = vec![
            Emitted::ancestor("<< 300".to_string(), ConceptId::new("300"), true),
            Emitted::ancestor("<< 310".to_string(), ConceptId::new("310"), true),
            Emitted::plain("* : 363698007 = 39607008".to_string()),
            Emitted::plain("* : 363698007 = 39607008".to_string()),
            Emitted::plain("<< 200".to_string()),
        ];
        let reserved: BTreeSet<String> = ["<< 200".to_string()].into_iter().collect();
        let texts = compact(emitted, Some(&stats), &reserved);

        // 300 subsumes 310, the refinement repeats, and the pinned text
        // is already on the expression.
        assert_eq!(texts, vec!["<< 300", "* : 363698007 = 39607008"]);
    }

    #[tokio::test]
    async fn test_compact_keeps_descendant_or_self_over_descendant() {
        let mut graph = MemoryGraph::new();
        graph.add_is_a("400", "138875005");
        graph.add_is_a("401", "400");
        let members = ids(&["400", "401"]);
        let stats = HierarchyStats::create(&graph, &members, Form::Inferred).await.unwrap();

        let emitted = vec![
            Emitted::ancestor("< 400".to_string(), ConceptId::new("400"), false),
            Emitted::ancestor("<< 400".to_string(), ConceptId::new("400"), true),
        ];
        let texts = compact(emitted, Some(&stats), &BTreeSet::new());
        assert_eq!(texts, vec!["<< 400"]);
    }
}
