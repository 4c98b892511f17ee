//! Ancestor coverage statistics for a candidate concept set.
//!
//! Built from a member concept set, the table holds one entry per
//! ancestor of any member, recording how many direct children the
//! ancestor has, how many of those are members, and which members its
//! descendant clause would cover. The optimizer filters the table down
//! to promising candidates, scores them, and emits `<< ancestor` or
//! `< ancestor` clauses.

use std::collections::{BTreeMap, BTreeSet};

use ecl_ast::{ConceptId, EclExpression};
use ecl_eval::{ConceptRecord, Form, GraphReader, Query};
use ecl_eval::terminology;

use crate::error::OptimizerResult;
use crate::strategy::OptimizerStrategy;

/// Per-candidate aggregates.
#[derive(Debug, Clone)]
pub struct AncestorStats {
    /// Direct children of the candidate, members or not.
    pub total_children: usize,
    /// Direct children that are members.
    pub member_children: usize,
    /// Whether the candidate is itself a member.
    pub is_member: bool,
    /// Members the candidate's descendant clause covers: descendant
    /// members, plus the candidate itself when it is a member.
    pub covered: BTreeSet<ConceptId>,
}

impl AncestorStats {
    /// Direct children outside the member set.
    pub fn false_positive_children(&self) -> usize {
        self.total_children.saturating_sub(self.member_children)
    }

    /// Fraction of direct children that are members. A candidate without
    /// children counts as fully precise.
    pub fn child_precision(&self) -> f64 {
        if self.total_children == 0 {
            return 1.0;
        }
        self.member_children as f64 / self.total_children as f64
    }
}

/// Ancestor statistics over a member concept set.
///
/// Filters consume the table and return a smaller one; candidates are
/// never added after construction.
#[derive(Debug, Clone)]
pub struct HierarchyStats {
    members: BTreeSet<ConceptId>,
    candidates: BTreeMap<ConceptId, AncestorStats>,
    // Full ancestor sets (direct and transitive, sentinel excluded) for
    // every member and candidate, backing the subsumption relation.
    ancestors: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
}

fn upward_ids(record: &ConceptRecord, form: Form) -> BTreeSet<ConceptId> {
    record
        .parents_for(form)
        .iter()
        .chain(record.ancestors_for(form))
        .filter(|id| id.as_str() != terminology::ROOT_ID)
        .cloned()
        .collect()
}

impl HierarchyStats {
    /// Builds the table for `members`.
    ///
    /// Fetches the member records, the records of their ancestors, and
    /// the direct children of every ancestor in one batched query per
    /// document kind.
    pub async fn create<G: GraphReader + ?Sized>(
        graph: &G,
        members: &BTreeSet<ConceptId>,
        form: Form,
    ) -> OptimizerResult<Self> {
        let mut ancestors: BTreeMap<ConceptId, BTreeSet<ConceptId>> = BTreeMap::new();
        let mut covered: BTreeMap<ConceptId, BTreeSet<ConceptId>> = BTreeMap::new();

        for record in graph.concepts(members).await? {
            let ups = upward_ids(&record, form);
            for up in &ups {
                covered.entry(up.clone()).or_default().insert(record.id.clone());
            }
            ancestors.insert(record.id, ups);
        }

        let candidate_ids: BTreeSet<ConceptId> = covered.keys().cloned().collect();

        // Candidates that are not members still need records, so the
        // subsumption relation is defined between any two candidates.
        let missing: BTreeSet<ConceptId> = candidate_ids
            .iter()
            .filter(|id| !ancestors.contains_key(id.as_str()))
            .cloned()
            .collect();
        for record in graph.concepts(&missing).await? {
            let ups = upward_ids(&record, form);
            ancestors.insert(record.id, ups);
        }

        let mut candidates: BTreeMap<ConceptId, AncestorStats> = BTreeMap::new();
        for id in &candidate_ids {
            let mut stats = AncestorStats {
                total_children: 0,
                member_children: 0,
                is_member: members.contains(id),
                covered: covered.remove(id).unwrap_or_default(),
            };
            if stats.is_member {
                stats.covered.insert(id.clone());
            }
            candidates.insert(id.clone(), stats);
        }

        if !candidate_ids.is_empty() {
            let children = graph
                .search_concepts(&Query::ids(form.parents_field(), &candidate_ids))
                .await?;
            for child in graph.concepts(&children).await? {
                for parent in child.parents_for(form) {
                    if let Some(stats) = candidates.get_mut(parent) {
                        stats.total_children += 1;
                        if members.contains(&child.id) {
                            stats.member_children += 1;
                        }
                    }
                }
            }
        }

        Ok(Self { members: members.clone(), candidates, ancestors })
    }

    // ========================================================================
    // Candidate filters
    // ========================================================================

    /// Drops candidates covering fewer than `min` members.
    pub fn filter_by_min_cluster(mut self, min: usize) -> Self {
        self.candidates.retain(|_, stats| stats.covered.len() >= min);
        self
    }

    /// Drops non-member candidates whose clause would cover exactly one
    /// member. The member's own literal clause is always the better pick.
    pub fn filter_non_member_singletons(mut self) -> Self {
        self.candidates.retain(|_, stats| stats.is_member || stats.covered.len() > 1);
        self
    }

    /// Drops candidates whose non-member children outnumber their member
    /// children.
    pub fn filter_by_child_majority(mut self) -> Self {
        self.candidates
            .retain(|_, stats| stats.false_positive_children() <= stats.member_children);
        self
    }

    /// Drops wide, imprecise candidates: at least `min_children` direct
    /// children with a member fraction below `min_precision`.
    pub fn filter_large_fanout(mut self, min_children: usize, min_precision: f64) -> Self {
        self.candidates.retain(|_, stats| {
            stats.total_children < min_children || stats.child_precision() >= min_precision
        });
        self
    }

    /// Drops the given candidates.
    pub fn without_candidates(mut self, excluded: &BTreeSet<ConceptId>) -> Self {
        self.candidates.retain(|id, _| !excluded.contains(id));
        self
    }

    /// Drops candidates that have an equally clean candidate ancestor.
    ///
    /// The ancestor covers at least the same members, so keeping both
    /// would only emit a redundant clause. Cleanliness is compared on
    /// false-positive child counts.
    pub fn remove_redundant(mut self) -> Self {
        let redundant: BTreeSet<ConceptId> = self
            .candidates
            .iter()
            .filter(|(id, stats)| {
                let fp = stats.false_positive_children();
                self.ancestors.get(id.as_str()).is_some_and(|ups| {
                    ups.iter().any(|up| {
                        self.candidates
                            .get(up)
                            .is_some_and(|upper| upper.false_positive_children() <= fp)
                    })
                })
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in &redundant {
            self.candidates.remove(id);
        }
        self
    }

    // ========================================================================
    // Scoring and selection
    // ========================================================================

    /// Fitness of a candidate against the remaining work set.
    ///
    /// The base score is the fraction of the work set the candidate
    /// covers, multiplied by `zoom` (so smaller clusters qualify at wider
    /// zoom) and by the candidate's child precision, plus the strategy's
    /// boost. Scores are clamped to `0.0..=1.0`.
    pub fn score(
        &self,
        candidate: &ConceptId,
        remaining: &BTreeSet<ConceptId>,
        zoom: u32,
        strategy: OptimizerStrategy,
    ) -> f64 {
        let Some(stats) = self.candidates.get(candidate) else {
            return 0.0;
        };
        if remaining.is_empty() {
            return 0.0;
        }
        let covered = stats.covered.intersection(remaining).count();
        if covered == 0 {
            return 0.0;
        }
        let fraction = covered as f64 / remaining.len() as f64;
        let zoomed = (fraction * f64::from(zoom.max(1))).min(1.0);
        (zoomed * stats.child_precision() + strategy.score_boost()).min(1.0)
    }

    /// The highest-scoring candidate not in `used`, together with its
    /// score. Ties prefer the candidate covering more of the work set,
    /// then the smaller identifier.
    pub fn best_candidate(
        &self,
        remaining: &BTreeSet<ConceptId>,
        zoom: u32,
        strategy: OptimizerStrategy,
        used: &BTreeSet<ConceptId>,
    ) -> Option<(ConceptId, f64)> {
        let mut best: Option<(ConceptId, f64, usize)> = None;
        for (id, stats) in &self.candidates {
            if used.contains(id) {
                continue;
            }
            let covered = stats.covered.intersection(remaining).count();
            if covered == 0 {
                continue;
            }
            let score = self.score(id, remaining, zoom, strategy);
            let replace = match &best {
                None => true,
                Some((_, best_score, best_covered)) => {
                    score > best_score + 1e-9
                        || ((score - best_score).abs() <= 1e-9 && covered > *best_covered)
                }
            };
            if replace {
                best = Some((id.clone(), score, covered));
            }
        }
        best.map(|(id, score, _)| (id, score))
    }

    /// Candidate ids ordered by coverage, widest first; ties order by id.
    pub fn candidates_by_coverage(&self) -> Vec<ConceptId> {
        let mut ids: Vec<(&ConceptId, usize)> =
            self.candidates.iter().map(|(id, stats)| (id, stats.covered.len())).collect();
        ids.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ids.into_iter().map(|(id, _)| id.clone()).collect()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The ECL clause the candidate would contribute: `<< id` for a
    /// member candidate, `< id` otherwise.
    pub fn clause_for(&self, candidate: &ConceptId) -> String {
        let inner = EclExpression::concept(candidate.clone());
        let expr = if self.is_member(candidate) {
            EclExpression::descendant_or_self_of(inner)
        } else {
            EclExpression::descendant_of(inner)
        };
        expr.to_string()
    }

    /// Whether `a` is an ancestor of `b`, as far as the fetched records
    /// show.
    pub fn subsumes(&self, a: &ConceptId, b: &ConceptId) -> bool {
        self.ancestors.get(b.as_str()).is_some_and(|ups| ups.contains(a))
    }

    /// Whether the id belongs to the member set the table was built from.
    pub fn is_member(&self, id: &ConceptId) -> bool {
        self.members.contains(id)
    }

    /// The aggregates for one candidate.
    pub fn get(&self, candidate: &ConceptId) -> Option<&AncestorStats> {
        self.candidates.get(candidate)
    }

    /// Number of surviving candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether any candidate survives.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
