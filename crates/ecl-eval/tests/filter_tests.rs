//! Integration tests for ECL filter evaluation.
//!
//! These tests cover concept, description and member domain filters,
//! including the description search defaults and the projection of
//! description and member hits back to concept ids.

use std::collections::BTreeSet;

use ecl_ast::ConceptId;
use ecl_eval::{Description, EclEvaluator, EvalError, Member, MemoryGraph, Query};

/// Builds a graph with enough lexical and metadata variety for filters.
fn described_graph() -> MemoryGraph {
    let mut graph = MemoryGraph::new();

    // 138875005 - SNOMED CT Concept (root)
    // 404684003 - Clinical finding
    // 64572001  - Disease (fully defined)
    // 73211009  - Diabetes mellitus
    // 46635009  - Type 1 diabetes
    // 44054006  - Type 2 diabetes
    // 195967001 - Asthma
    // 386661006 - Fever (US module extension)
    // 271737000 - Anemia (inactive concept)
    graph.add_is_a("404684003", "138875005");
    graph.add_is_a("64572001", "404684003");
    graph.add_is_a("386661006", "404684003");
    graph.add_is_a("73211009", "64572001");
    graph.add_is_a("46635009", "73211009");
    graph.add_is_a("44054006", "73211009");
    graph.add_is_a("195967001", "64572001");
    graph.add_is_a("271737000", "64572001");

    graph.set_inactive("271737000");
    graph.set_primitive("64572001", false);
    graph.set_module("386661006", "731000124108");
    graph.set_effective_time("73211009", "20020131");
    graph.set_effective_time("46635009", "20200731");
    graph.set_effective_time("44054006", "20190131");

    // Descriptions; 900000000000509007 is the US English language refset.
    graph.add_description(Description::fsn("64572001", "Disease (disorder)"));
    graph.add_description(Description::fsn("73211009", "Diabetes mellitus (disorder)"));
    graph.add_description(
        Description::synonym("73211009", "Diabetes").preferred("900000000000509007"),
    );
    graph.add_description(Description::synonym("73211009", "Sugar sickness").inactive());
    graph.add_description(Description::fsn("46635009", "Diabetes mellitus type 1 (disorder)"));
    graph.add_description(
        Description::synonym("46635009", "Type 1 diabetes").acceptable("900000000000509007"),
    );
    graph.add_description(Description::fsn("44054006", "Diabetes mellitus type 2 (disorder)"));
    graph.add_description(
        Description::synonym("44054006", "Type 2 diabetes").preferred("900000000000509007"),
    );
    graph.add_description(Description::fsn("195967001", "Asthma (disorder)"));
    graph.add_description(Description::fsn("386661006", "Fever (finding)"));
    graph.add_description(Description::synonym("386661006", "Feber").in_language("da"));
    graph.add_description(Description::fsn("271737000", "Anemia (disorder)"));

    // 447562003 - ICD-10 complex map reference set
    graph.add_member(
        Member::new("447562003", "73211009").field("mapTarget", "E14").field("mapGroup", 1_i64),
    );
    graph.add_member(
        Member::new("447562003", "46635009").field("mapTarget", "E10").field("mapGroup", 2_i64),
    );
    graph.add_member(
        Member::new("447562003", "44054006").field("mapTarget", "E11").field("mapGroup", 2_i64),
    );

    graph
}

fn ids(raw: &[&str]) -> BTreeSet<ConceptId> {
    raw.iter().map(|id| ConceptId::new(*id)).collect()
}

async fn resolve(graph: &MemoryGraph, ecl: &str) -> BTreeSet<ConceptId> {
    let evaluator = EclEvaluator::new(graph);
    let query = evaluator.evaluate_ecl(ecl).await.unwrap();
    evaluator.resolve_ids(query).await.unwrap()
}

// ============================================================================
// Term Filters
// ============================================================================

#[tokio::test]
async fn test_term_filter_matches_word_prefixes() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "< 404684003 {{ term = \"diab\" }}").await,
        ids(&["73211009", "46635009", "44054006"])
    );
}

#[tokio::test]
async fn test_term_filter_requires_every_word() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "< 404684003 {{ term = \"diabetes type\" }}").await,
        ids(&["46635009", "44054006"])
    );
}

#[tokio::test]
async fn test_term_filter_wild() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "< 404684003 {{ term = wild:\"*mellitus*\" }}").await,
        ids(&["73211009", "46635009", "44054006"])
    );
}

#[tokio::test]
async fn test_term_filter_exact() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "< 404684003 {{ term = exact:\"Diabetes\" }}").await,
        ids(&["73211009"])
    );
}

#[tokio::test]
async fn test_inactive_descriptions_are_ignored_by_default() {
    let graph = described_graph();
    assert!(resolve(&graph, "< 404684003 {{ term = \"sugar\" }}").await.is_empty());
}

#[tokio::test]
async fn test_explicit_active_filter_overrides_the_default() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "< 404684003 {{ D term = \"sugar\", active = false }}").await,
        ids(&["73211009"])
    );
}

#[tokio::test]
async fn test_description_type_constrains_term_search() {
    let graph = described_graph();
    // "mellitus" appears only in fully specified names.
    assert!(resolve(
        &graph,
        "< 404684003 {{ D typeId = 900000000000013009, term = \"mellitus\" }}"
    )
    .await
    .is_empty());
    assert_eq!(
        resolve(&graph, "< 404684003 {{ D typeId = 900000000000003001, term = \"mellitus\" }}")
            .await,
        ids(&["73211009", "46635009", "44054006"])
    );
}

#[tokio::test]
async fn test_no_matching_description_compiles_to_match_none() {
    let graph = described_graph();
    let query = EclEvaluator::new(&graph)
        .evaluate_ecl("< 404684003 {{ term = \"zzz\" }}")
        .await
        .unwrap();
    assert_eq!(query, Query::MatchNone);
}

// ============================================================================
// Dialect and Language Filters
// ============================================================================

#[tokio::test]
async fn test_dialect_filter_with_acceptability() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "< 404684003 {{ D dialectId = 900000000000509007 }}").await,
        ids(&["73211009", "46635009", "44054006"])
    );
    assert_eq!(
        resolve(&graph, "< 404684003 {{ D dialectId = 900000000000509007 prefer }}").await,
        ids(&["73211009", "44054006"])
    );
    assert_eq!(
        resolve(&graph, "< 404684003 {{ D dialectId = 900000000000509007 accept }}").await,
        ids(&["46635009"])
    );
}

#[tokio::test]
async fn test_language_refset_filter_matches_any_acceptability() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "< 404684003 {{ D languageRefSetId = 900000000000509007 }}").await,
        resolve(&graph, "< 404684003 {{ D dialectId = 900000000000509007 }}").await
    );
}

#[tokio::test]
async fn test_language_filter() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "< 404684003 {{ D language = da }}").await,
        ids(&["386661006"])
    );
}

// ============================================================================
// Concept Metadata Filters
// ============================================================================

#[tokio::test]
async fn test_semantic_tag_is_derived_from_fsn() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "< 404684003 {{ C semanticTag = \"disorder\" }}").await,
        ids(&["64572001", "73211009", "46635009", "44054006", "195967001", "271737000"])
    );
    assert_eq!(
        resolve(&graph, "< 404684003 {{ C semanticTag = \"disorder\", active = true }}").await,
        ids(&["64572001", "73211009", "46635009", "44054006", "195967001"])
    );
}

#[tokio::test]
async fn test_definition_status_filter() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "< 404684003 {{ definitionStatus = defined }}").await,
        ids(&["64572001"])
    );
    let primitive = resolve(&graph, "< 404684003 {{ definitionStatus = primitive }}").await;
    assert!(primitive.contains("73211009"));
    assert!(!primitive.contains("64572001"));
}

#[tokio::test]
async fn test_module_filter() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "< 404684003 {{ moduleId = 731000124108 }}").await,
        ids(&["386661006"])
    );
    // A module set matches either module.
    let both = resolve(
        &graph,
        "< 404684003 {{ moduleId = (900000000000207008 731000124108) }}",
    )
    .await;
    assert_eq!(both, resolve(&graph, "< 404684003").await);
}

#[tokio::test]
async fn test_effective_time_comparisons() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "<< 73211009 {{ effectiveTime = \"20020131\" }}").await,
        ids(&["73211009"])
    );
    assert_eq!(
        resolve(&graph, "<< 73211009 {{ effectiveTime >= \"20190101\" }}").await,
        ids(&["46635009", "44054006"])
    );
    assert_eq!(
        resolve(&graph, "<< 73211009 {{ effectiveTime > \"20190131\" }}").await,
        ids(&["46635009"])
    );
}

#[tokio::test]
async fn test_malformed_effective_time_is_bad_request() {
    let graph = described_graph();
    let err = EclEvaluator::new(&graph)
        .evaluate_ecl("73211009 {{ effectiveTime = \"2020\" }}")
        .await
        .unwrap_err();
    assert!(matches!(err, EvalError::BadRequest(_)));
}

#[tokio::test]
async fn test_active_concept_filter() {
    let graph = described_graph();
    assert_eq!(resolve(&graph, "< 64572001 {{ active = false }}").await, ids(&["271737000"]));
    assert_eq!(
        resolve(&graph, "< 64572001 {{ active = true }}").await,
        ids(&["73211009", "46635009", "44054006", "195967001"])
    );
    // `active != true` is the same constraint as `active = false`.
    assert_eq!(
        resolve(&graph, "< 64572001 {{ active != true }}").await,
        resolve(&graph, "< 64572001 {{ active = false }}").await
    );
}

#[tokio::test]
async fn test_filter_blocks_intersect() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "< 404684003 {{ C semanticTag = \"disorder\" }} {{ term = \"asthma\" }}")
            .await,
        ids(&["195967001"])
    );
}

#[tokio::test]
async fn test_wildcard_base_with_filter() {
    let graph = described_graph();
    assert_eq!(resolve(&graph, "* {{ term = \"feber\" }}").await, ids(&["386661006"]));
}

// ============================================================================
// Member Filters
// ============================================================================

#[tokio::test]
async fn test_member_field_equality() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "^ 447562003").await,
        ids(&["73211009", "46635009", "44054006"])
    );
    assert_eq!(
        resolve(&graph, "^ 447562003 {{ M mapTarget = \"E10\" }}").await,
        ids(&["46635009"])
    );
}

#[tokio::test]
async fn test_member_field_negation() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "^ 447562003 {{ M mapTarget != \"E10\" }}").await,
        ids(&["73211009", "44054006"])
    );
}

#[tokio::test]
async fn test_member_field_numeric_range() {
    let graph = described_graph();
    assert_eq!(
        resolve(&graph, "^ 447562003 {{ M mapGroup >= 2 }}").await,
        ids(&["46635009", "44054006"])
    );
    assert_eq!(
        resolve(&graph, "^ 447562003 {{ M mapGroup < 2 }}").await,
        ids(&["73211009"])
    );
}
