//! Attribute co-occurrence statistics for a candidate concept set.
//!
//! For every `(attribute type, destination)` pair seen among a candidate
//! set's relationships, the table records how many candidate concepts
//! carry that attribute (`positive_sources`) and how many concepts in the
//! whole graph do (`total_sources`). Pairs whose two counts stay close
//! after filtering describe the candidate set well and become
//! `* : type = destination` refinement clauses.

use std::collections::{BTreeMap, BTreeSet};

use ecl_ast::ConceptId;
use ecl_eval::{Form, GraphReader};

use crate::clause::Clause;
use crate::error::OptimizerResult;

/// Source counts for one `(type, destination)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellCounts {
    /// Candidate-set concepts carrying the attribute.
    positive: usize,
    /// All concepts carrying the attribute.
    total: usize,
}

impl CellCounts {
    fn false_positives(&self) -> usize {
        self.total.saturating_sub(self.positive)
    }

    fn precision(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.positive as f64 / self.total as f64
    }
}

/// Attribute statistics over a candidate concept set.
///
/// Filters consume the table and return a smaller one; cells are never
/// added after construction.
#[derive(Debug, Clone)]
pub struct RelationshipStats {
    cells: BTreeMap<(ConceptId, ConceptId), CellCounts>,
}

impl RelationshipStats {
    /// Builds the table from the attribute relationships of `candidates`.
    ///
    /// Total counts are fetched for exactly the pairs the candidate set
    /// exhibits. Both counts are counts of distinct source concepts, so a
    /// concept stating the same attribute in several groups contributes
    /// once.
    pub async fn create<G: GraphReader + ?Sized>(
        graph: &G,
        candidates: &BTreeSet<ConceptId>,
        form: Form,
    ) -> OptimizerResult<Self> {
        let mut positive: BTreeMap<(ConceptId, ConceptId), BTreeSet<ConceptId>> = BTreeMap::new();
        for rel in graph.relationships_by_source(candidates, form).await? {
            positive.entry((rel.type_id, rel.destination)).or_default().insert(rel.source);
        }

        let mut total: BTreeMap<(ConceptId, ConceptId), BTreeSet<ConceptId>> = BTreeMap::new();
        if !positive.is_empty() {
            let types: BTreeSet<ConceptId> = positive.keys().map(|(t, _)| t.clone()).collect();
            let destinations: BTreeSet<ConceptId> =
                positive.keys().map(|(_, d)| d.clone()).collect();
            for rel in graph
                .relationships_by_type_and_destination(&types, &destinations, form)
                .await?
            {
                let key = (rel.type_id, rel.destination);
                if positive.contains_key(&key) {
                    total.entry(key).or_default().insert(rel.source);
                }
            }
        }

        let cells = positive
            .into_iter()
            .map(|(key, sources)| {
                // total can never be below positive
                let all = total.get(&key).map_or(0, BTreeSet::len).max(sources.len());
                (key, CellCounts { positive: sources.len(), total: all })
            })
            .collect();
        Ok(Self { cells })
    }

    /// Drops cells below the precision threshold.
    ///
    /// A threshold of `1.0` or more compares the two counts for equality
    /// instead of dividing, so full precision is never lost to rounding.
    pub fn filter_by_precision(mut self, min_precision: f64) -> Self {
        if min_precision >= 1.0 {
            self.cells.retain(|_, cell| cell.positive == cell.total);
        } else {
            self.cells.retain(|_, cell| cell.precision() >= min_precision);
        }
        self
    }

    /// Drops cells with fewer than `min` candidate-set sources.
    pub fn filter_by_min_true_positives(mut self, min: usize) -> Self {
        self.cells.retain(|_, cell| cell.positive >= min);
        self
    }

    /// Drops cells with more than `max` sources outside the candidate set.
    pub fn filter_by_max_false_positives(mut self, max: usize) -> Self {
        self.cells.retain(|_, cell| cell.false_positives() <= max);
        self
    }

    /// Turns every surviving cell into a `* : type = destination` clause,
    /// best-covering cells first.
    pub fn optimize_refinements(&self) -> Vec<Clause> {
        let mut cells: Vec<(&(ConceptId, ConceptId), &CellCounts)> = self.cells.iter().collect();
        cells.sort_by(|a, b| b.1.positive.cmp(&a.1.positive).then_with(|| a.0.cmp(b.0)));
        cells
            .into_iter()
            .map(|((type_id, destination), _)| {
                Clause::new(format!("* : {} = {}", type_id, destination))
            })
            .collect()
    }

    /// The counts for one pair, as `(positive, total)`.
    pub fn cell(&self, type_id: &ConceptId, destination: &ConceptId) -> Option<(usize, usize)> {
        self.cells
            .get(&(type_id.clone(), destination.clone()))
            .map(|cell| (cell.positive, cell.total))
    }

    /// Number of surviving pairs.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether any pair survives.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
