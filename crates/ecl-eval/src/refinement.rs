//! Attribute refinement matching.
//!
//! A refinement restricts a focus concept set by the attribute
//! relationships its members carry. The evaluator resolves the attribute
//! type and value expressions of each constraint to concrete id sets
//! (`None` meaning the wildcard, any id) and hands the per-concept
//! relationship lists to the matchers in this module.
//!
//! Ungrouped constraints see every relationship of a concept regardless of
//! its group number. Grouped constraints are checked per relationship
//! group; a group of the refinement is satisfied by a concept when the
//! number of relationship groups meeting all of its constraints falls
//! within the group cardinality.

use std::collections::{BTreeMap, BTreeSet};

use ecl_ast::{Cardinality, ConceptId, RefinementOperator};

use crate::reader::Relationship;

/// A single attribute constraint with its operand expressions resolved to
/// id sets.
#[derive(Debug, Clone)]
pub(crate) struct AttributeMatcher {
    /// Accepted attribute types; `None` accepts any type.
    pub types: Option<BTreeSet<ConceptId>>,
    /// Accepted destinations; `None` accepts any destination.
    pub destinations: Option<BTreeSet<ConceptId>>,
    /// Equality or inequality against the destination set.
    pub operator: RefinementOperator,
    /// How many relationships must match. Defaults to at least one.
    pub cardinality: Cardinality,
}

impl AttributeMatcher {
    fn matches_relationship(&self, rel: &Relationship) -> bool {
        let type_ok = match &self.types {
            Some(types) => types.contains(&rel.type_id),
            None => true,
        };
        if !type_ok {
            return false;
        }
        let in_destinations = match &self.destinations {
            Some(destinations) => destinations.contains(&rel.destination),
            None => true,
        };
        match self.operator {
            RefinementOperator::Equal => in_destinations,
            RefinementOperator::NotEqual => !in_destinations,
        }
    }

    /// Whether the matching relationship count satisfies the cardinality.
    pub fn satisfied_by<'a>(&self, rels: impl IntoIterator<Item = &'a Relationship>) -> bool {
        let count = rels.into_iter().filter(|r| self.matches_relationship(r)).count();
        self.cardinality.matches(count)
    }
}

/// An attribute group with resolved constraints.
#[derive(Debug, Clone)]
pub(crate) struct GroupMatcher {
    /// The constraints every satisfying relationship group must meet.
    pub constraints: Vec<AttributeMatcher>,
    /// How many relationship groups must satisfy the constraints.
    pub cardinality: Cardinality,
}

impl GroupMatcher {
    /// Whether the number of satisfying relationship groups falls within
    /// the group cardinality.
    pub fn satisfied_by(&self, groups: &BTreeMap<u16, Vec<&Relationship>>) -> bool {
        let satisfying = groups
            .values()
            .filter(|members| {
                self.constraints.iter().all(|c| c.satisfied_by(members.iter().copied()))
            })
            .count();
        self.cardinality.matches(satisfying)
    }
}

/// Checks one focus concept's relationships against a full refinement.
pub(crate) fn concept_matches(
    ungrouped: &[AttributeMatcher],
    groups: &[GroupMatcher],
    rels: &[Relationship],
) -> bool {
    if !ungrouped.iter().all(|m| m.satisfied_by(rels.iter())) {
        return false;
    }
    if groups.is_empty() {
        return true;
    }
    let mut by_group: BTreeMap<u16, Vec<&Relationship>> = BTreeMap::new();
    for rel in rels {
        by_group.entry(rel.group).or_default().push(rel);
    }
    groups.iter().all(|g| g.satisfied_by(&by_group))
}
