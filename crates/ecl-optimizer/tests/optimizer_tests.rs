//! Integration tests for query-set optimization.
//!
//! Each test builds an in-memory concept graph, asks the optimizer to
//! rewrite an enumerated concept set or a caller clause list, and checks
//! the returned diff. Where the diff claims equivalence the tests also
//! re-evaluate the rewritten clause lists and compare concept sets.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use ecl_ast::ConceptId;
use ecl_eval::MemoryGraph;
use ecl_optimizer::{
    Clause, ConceptSetEvaluator, EclConceptSetEvaluator, EclLabeler, OptimizerConfig,
    OptimizerStrategy, QueryExpressionDiff, QueryOptimizer,
};

/// Builds a small diabetes-centered slice of SNOMED CT.
fn diabetes_graph() -> MemoryGraph {
    let mut graph = MemoryGraph::new();

    // 138875005 - SNOMED CT Concept (root)
    // 404684003 - Clinical finding
    // 64572001  - Disease
    // 73211009  - Diabetes mellitus
    // 46635009  - Type 1 diabetes
    // 44054006  - Type 2 diabetes
    // 11687002  - Gestational diabetes
    // 195967001 - Asthma
    // 38341003  - Hypertensive disorder
    graph.add_is_a("404684003", "138875005");
    graph.add_is_a("64572001", "404684003");
    graph.add_is_a("73211009", "64572001");
    graph.add_is_a("195967001", "64572001");
    graph.add_is_a("38341003", "64572001");
    graph.add_is_a("46635009", "73211009");
    graph.add_is_a("44054006", "73211009");
    graph.add_is_a("11687002", "73211009");

    graph
}

fn ids(raw: &[&str]) -> BTreeSet<ConceptId> {
    raw.iter().map(|id| ConceptId::new(*id)).collect()
}

async fn shrink(graph: &MemoryGraph, target: &BTreeSet<ConceptId>) -> QueryExpressionDiff {
    let sets = EclConceptSetEvaluator::new(graph);
    QueryOptimizer::new(graph, &sets).optimize(target, Vec::new()).await
}

async fn shrink_clauses(
    graph: &MemoryGraph,
    inclusions: Vec<Clause>,
    exclusions: Vec<Clause>,
) -> QueryExpressionDiff {
    let sets = EclConceptSetEvaluator::new(graph);
    QueryOptimizer::new(graph, &sets).optimize_clauses(inclusions, exclusions).await
}

async fn resolve_clauses(
    graph: &MemoryGraph,
    inclusions: &[Clause],
    exclusions: &[Clause],
) -> BTreeSet<ConceptId> {
    EclConceptSetEvaluator::new(graph)
        .evaluate_clauses(inclusions, exclusions)
        .await
        .unwrap()
}

// ============================================================================
// Enumerated Set Shrinkage
// ============================================================================

#[tokio::test]
async fn test_enumerated_subtree_collapses_to_ancestor() {
    let graph = diabetes_graph();
    let target = ids(&["73211009", "46635009", "44054006", "11687002", "195967001"]);

    let diff = shrink(&graph, &target).await;

    assert_eq!(
        diff.inclusion_texts(),
        ["<< 73211009", "195967001"].into_iter().collect()
    );
    assert!(diff.add_to_exclusion.is_empty());
    assert!(diff.remove.is_empty());

    let resolved = resolve_clauses(&graph, &diff.add_to_inclusion, &[]).await;
    assert_eq!(resolved, target);
}

#[tokio::test]
async fn test_non_member_parent_collapses_to_descendant_of() {
    let graph = diabetes_graph();
    // The common parent is not part of the target, so the clause must
    // not include it.
    let target = ids(&["46635009", "44054006", "11687002"]);

    let diff = shrink(&graph, &target).await;

    assert_eq!(diff.inclusion_texts(), ["< 73211009"].into_iter().collect());
    assert!(diff.add_to_exclusion.is_empty());

    let resolved = resolve_clauses(&graph, &diff.add_to_inclusion, &[]).await;
    assert_eq!(resolved, target);
}

#[tokio::test]
async fn test_small_sets_left_alone() {
    let graph = diabetes_graph();

    let diff = shrink(&graph, &ids(&["73211009"])).await;
    assert!(diff.is_empty());

    let diff = shrink(&graph, &BTreeSet::new()).await;
    assert!(diff.is_empty());
}

// ============================================================================
// Caller Clause Handling
// ============================================================================

#[tokio::test]
async fn test_caller_literals_replaced_by_ancestor() {
    let graph = diabetes_graph();
    let inclusions = vec![
        Clause::new("73211009"),
        Clause::new("46635009"),
        Clause::new("44054006"),
        Clause::new("11687002"),
        Clause::new("195967001"),
    ];

    let diff = shrink_clauses(&graph, inclusions, Vec::new()).await;

    assert_eq!(diff.inclusion_texts(), ["<< 73211009"].into_iter().collect());
    assert_eq!(
        diff.removed_texts(),
        ["73211009", "46635009", "44054006", "11687002"].into_iter().collect()
    );
    assert!(diff.add_to_exclusion.is_empty());
}

#[tokio::test]
async fn test_pinned_duplicates_removed_but_never_rewritten() {
    let graph = diabetes_graph();
    // Both pinned clauses resolve to the diabetes subtree; the longer
    // spelling is the duplicate.
    let inclusions = vec![
        Clause::pinned("<< 73211009"),
        Clause::pinned("(<< 73211009)"),
        Clause::new("195967001"),
    ];

    let diff = shrink_clauses(&graph, inclusions, Vec::new()).await;

    assert!(diff.add_to_inclusion.is_empty());
    assert!(diff.add_to_exclusion.is_empty());
    assert_eq!(diff.remove, vec![Clause::pinned("(<< 73211009)")]);
}

#[tokio::test]
async fn test_optimal_clauses_come_back_unchanged() {
    let graph = diabetes_graph();
    let inclusions = vec![Clause::new("<< 73211009"), Clause::new("195967001")];

    let diff = shrink_clauses(&graph, inclusions, Vec::new()).await;

    assert!(diff.is_empty());
}

#[tokio::test]
async fn test_exclusion_clause_shrinks_target_below_threshold() {
    let graph = diabetes_graph();
    let target = ids(&["73211009", "46635009", "44054006", "11687002", "195967001"]);

    // Everything but asthma is excluded again, leaving a single concept.
    let sets = EclConceptSetEvaluator::new(&graph);
    let diff = QueryOptimizer::new(&graph, &sets)
        .optimize(&target, vec![Clause::new("<< 73211009")])
        .await;

    assert!(diff.is_empty());
}

#[tokio::test]
async fn test_unparseable_caller_clause_yields_empty_diff() {
    let graph = diabetes_graph();
    let inclusions = vec![Clause::new("<< 73211009"), Clause::new("(46635009")];

    let diff = shrink_clauses(&graph, inclusions, Vec::new()).await;

    assert!(diff.is_empty());
}

// ============================================================================
// Overshoot Correction
// ============================================================================

#[tokio::test]
async fn test_greedy_overshoot_becomes_exclusion_literal() {
    let mut graph = diabetes_graph();
    // 4855003 - Retinopathy due to diabetes, a sibling the target omits.
    graph.add_is_a("4855003", "73211009");
    let target = ids(&["46635009", "44054006", "11687002"]);

    let diff = shrink(&graph, &target).await;

    assert_eq!(diff.inclusion_texts(), ["< 73211009"].into_iter().collect());
    assert_eq!(diff.exclusion_texts(), ["4855003"].into_iter().collect());
    assert!(diff.remove.is_empty());

    let resolved =
        resolve_clauses(&graph, &diff.add_to_inclusion, &diff.add_to_exclusion).await;
    assert_eq!(resolved, target);
}

#[tokio::test]
async fn test_overshoot_cluster_collapses_to_exclusion_ancestor() {
    let mut graph = diabetes_graph();
    // 4855003   - Retinopathy due to diabetes
    // 312903003 - Mild nonproliferative diabetic retinopathy
    // 312904009 - Moderate nonproliferative diabetic retinopathy
    graph.add_is_a("4855003", "73211009");
    graph.add_is_a("312903003", "4855003");
    graph.add_is_a("312904009", "4855003");
    let target = ids(&["46635009", "44054006", "11687002"]);

    let diff = shrink(&graph, &target).await;

    assert_eq!(diff.inclusion_texts(), ["< 73211009"].into_iter().collect());
    assert_eq!(diff.exclusion_texts(), ["<< 4855003"].into_iter().collect());

    let resolved =
        resolve_clauses(&graph, &diff.add_to_inclusion, &diff.add_to_exclusion).await;
    assert_eq!(resolved, target);
}

// ============================================================================
// Strategies
// ============================================================================

#[tokio::test]
async fn test_lossy_strategy_absorbs_bounded_false_positives() {
    let graph = diabetes_graph();
    let target = ids(&["73211009", "46635009", "44054006"]);

    let sets = EclConceptSetEvaluator::new(&graph);
    let config = OptimizerConfig::builder()
        .with_strategy(OptimizerStrategy::Lossy)
        .with_lossy_false_positive_rate(0.3)
        .build();
    let diff = QueryOptimizer::new(&graph, &sets)
        .with_config(config)
        .optimize(&target, Vec::new())
        .await;

    // One stray descendant out of four stays within the tolerated rate,
    // so no exclusion is raised for it.
    assert_eq!(diff.inclusion_texts(), ["<< 73211009"].into_iter().collect());
    assert!(diff.add_to_exclusion.is_empty());

    let resolved = resolve_clauses(&graph, &diff.add_to_inclusion, &[]).await;
    assert!(resolved.is_superset(&target));
    assert!(resolved.contains("11687002"));
}

#[tokio::test]
async fn test_default_strategy_corrects_the_same_overshoot() {
    let graph = diabetes_graph();
    let target = ids(&["73211009", "46635009", "44054006"]);

    let diff = shrink(&graph, &target).await;

    assert_eq!(diff.inclusion_texts(), ["<< 73211009"].into_iter().collect());
    assert_eq!(diff.exclusion_texts(), ["11687002"].into_iter().collect());

    let resolved =
        resolve_clauses(&graph, &diff.add_to_inclusion, &diff.add_to_exclusion).await;
    assert_eq!(resolved, target);
}

// ============================================================================
// Attribute Refinements
// ============================================================================

#[tokio::test]
async fn test_shared_attribute_becomes_refinement() {
    let mut graph = MemoryGraph::new();

    // 64572001  - Disease
    // 19829001  - Disorder of lung
    // 39607008  - Lung structure
    // 363698007 - Finding site
    graph.add_is_a("64572001", "138875005");
    graph.add_is_a("19829001", "64572001");
    graph.add_is_a("39607008", "138875005");
    graph.add_is_a("363698007", "138875005");

    // Twelve lung disorders, each with the same finding site.
    let mut target = BTreeSet::new();
    for i in 0..12 {
        let id = format!("23785{:02}", i);
        graph.add_is_a(id.as_str(), "19829001");
        graph.add_relationship(id.as_str(), "363698007", "39607008", 1);
        target.insert(ConceptId::new(id.as_str()));
    }

    let diff = shrink(&graph, &target).await;

    assert_eq!(
        diff.inclusion_texts(),
        ["* : 363698007 = 39607008"].into_iter().collect()
    );
    assert!(diff.add_to_exclusion.is_empty());

    let resolved = resolve_clauses(&graph, &diff.add_to_inclusion, &[]).await;
    assert_eq!(resolved, target);
}

// ============================================================================
// Safety Valves
// ============================================================================

#[tokio::test]
async fn test_exhausted_time_budget_falls_back_to_literals() {
    let graph = diabetes_graph();
    let target = ids(&["73211009", "46635009", "44054006", "11687002"]);

    let sets = EclConceptSetEvaluator::new(&graph);
    let config = OptimizerConfig::builder().with_time_budget(Duration::ZERO).build();
    let diff = QueryOptimizer::new(&graph, &sets)
        .with_config(config)
        .optimize(&target, Vec::new())
        .await;

    // No time for ancestor searches, but the result must still be correct.
    assert_eq!(
        diff.inclusion_texts(),
        ["73211009", "46635009", "44054006", "11687002"].into_iter().collect()
    );

    let resolved = resolve_clauses(&graph, &diff.add_to_inclusion, &[]).await;
    assert_eq!(resolved, target);
}

#[tokio::test]
async fn test_iteration_cap_disables_greedy_search() {
    let graph = diabetes_graph();
    let target = ids(&["73211009", "46635009", "44054006"]);

    let sets = EclConceptSetEvaluator::new(&graph);
    let config = OptimizerConfig::builder().with_max_iterations(0).build();
    let diff = QueryOptimizer::new(&graph, &sets)
        .with_config(config)
        .optimize(&target, Vec::new())
        .await;

    // The zero-false-positive pass rejects the imprecise ancestor and the
    // greedy search is never entered, so the literals survive.
    assert_eq!(
        diff.inclusion_texts(),
        ["73211009", "46635009", "44054006"].into_iter().collect()
    );
    assert!(diff.add_to_exclusion.is_empty());

    let resolved = resolve_clauses(&graph, &diff.add_to_inclusion, &[]).await;
    assert_eq!(resolved, target);
}

// ============================================================================
// Labeling
// ============================================================================

struct SuffixLabeler;

#[async_trait]
impl EclLabeler for SuffixLabeler {
    async fn labeled_expressions(&self, clauses: Vec<Clause>) -> Vec<Clause> {
        clauses
            .into_iter()
            .map(|clause| {
                let query_text = format!("{} |term|", clause.query_text);
                Clause { query_text, ..clause }
            })
            .collect()
    }
}

#[tokio::test]
async fn test_labeler_decorates_added_clauses_only() {
    let graph = diabetes_graph();
    let inclusions = vec![
        Clause::new("73211009"),
        Clause::new("46635009"),
        Clause::new("44054006"),
        Clause::new("11687002"),
        Clause::new("195967001"),
    ];

    let sets = EclConceptSetEvaluator::new(&graph);
    let labeler = SuffixLabeler;
    let diff = QueryOptimizer::new(&graph, &sets)
        .labeled(&labeler)
        .optimize_clauses(inclusions, Vec::new())
        .await;

    assert_eq!(
        diff.inclusion_texts(),
        ["<< 73211009 |term|"].into_iter().collect()
    );
    // Removed clauses keep the caller's original spelling.
    assert_eq!(
        diff.removed_texts(),
        ["73211009", "46635009", "44054006", "11687002"].into_iter().collect()
    );
}
