//! An in-memory concept graph.
//!
//! [`MemoryGraph`] is a [`GraphReader`] backed by plain maps and vectors.
//! Documents are scanned linearly and hierarchy closures are recomputed on
//! every call, so it is only suitable for tests and very small data sets;
//! its value is that it implements the full reader contract, including
//! description and member search, without an index behind it.
//!
//! Mutators create referenced concepts on demand, so fixtures can be
//! written top down:
//!
//! ```rust
//! use ecl_eval::MemoryGraph;
//!
//! let mut graph = MemoryGraph::new();
//! graph.add_is_a("22298006", "57809008");
//! graph.add_is_a("57809008", "404684003");
//! ```

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use ecl_ast::{ConceptId, TermMatchType};
use regex::Regex;

use crate::error::EvalResult;
use crate::query::{fields, FieldValue, Query};
use crate::reader::{ConceptRecord, Form, GraphReader, Relationship};
use crate::terminology;

// =============================================================================
// Documents
// =============================================================================

#[derive(Debug, Clone)]
struct ConceptData {
    active: bool,
    primitive: bool,
    module_id: ConceptId,
    effective_time: Option<String>,
    semantic_tag: Option<String>,
}

impl Default for ConceptData {
    fn default() -> Self {
        Self {
            active: true,
            primitive: true,
            module_id: ConceptId::new(terminology::CORE_MODULE),
            effective_time: None,
            semantic_tag: None,
        }
    }
}

/// A description document in a [`MemoryGraph`].
///
/// Constructors produce an active English description in the core module;
/// the builder methods adjust the rest.
#[derive(Debug, Clone)]
pub struct Description {
    /// The concept the description belongs to.
    pub concept_id: ConceptId,
    /// The description text.
    pub term: String,
    /// Description type (synonym, fully specified name, ...).
    pub type_id: ConceptId,
    /// ISO 639-1 language code.
    pub language: String,
    /// Whether the description is active.
    pub active: bool,
    /// The module the description belongs to.
    pub module_id: ConceptId,
    /// Effective time as yyyyMMdd, if versioned.
    pub effective_time: Option<String>,
    /// Language reference sets in which this description is preferred.
    pub preferred_in: Vec<ConceptId>,
    /// Language reference sets in which this description is acceptable.
    pub acceptable_in: Vec<ConceptId>,
}

impl Description {
    /// Creates an active description of the given type.
    pub fn of_type(
        concept_id: impl Into<ConceptId>,
        type_id: impl Into<ConceptId>,
        term: impl Into<String>,
    ) -> Self {
        Self {
            concept_id: concept_id.into(),
            term: term.into(),
            type_id: type_id.into(),
            language: "en".to_string(),
            active: true,
            module_id: ConceptId::new(terminology::CORE_MODULE),
            effective_time: None,
            preferred_in: Vec::new(),
            acceptable_in: Vec::new(),
        }
    }

    /// Creates a synonym.
    pub fn synonym(concept_id: impl Into<ConceptId>, term: impl Into<String>) -> Self {
        Self::of_type(concept_id, terminology::SYNONYM, term)
    }

    /// Creates a fully specified name.
    pub fn fsn(concept_id: impl Into<ConceptId>, term: impl Into<String>) -> Self {
        Self::of_type(concept_id, terminology::FULLY_SPECIFIED_NAME, term)
    }

    /// Marks the description preferred in a language reference set.
    pub fn preferred(mut self, refset_id: impl Into<ConceptId>) -> Self {
        self.preferred_in.push(refset_id.into());
        self
    }

    /// Marks the description acceptable in a language reference set.
    pub fn acceptable(mut self, refset_id: impl Into<ConceptId>) -> Self {
        self.acceptable_in.push(refset_id.into());
        self
    }

    /// Sets the language code.
    pub fn in_language(mut self, code: impl Into<String>) -> Self {
        self.language = code.into();
        self
    }

    /// Marks the description inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// A reference set member document in a [`MemoryGraph`].
#[derive(Debug, Clone)]
pub struct Member {
    /// The reference set the member belongs to.
    pub refset_id: ConceptId,
    /// The component the member annotates.
    pub referenced_component: ConceptId,
    /// Whether the member is active.
    pub active: bool,
    /// The module the member belongs to.
    pub module_id: ConceptId,
    /// Effective time as yyyyMMdd, if versioned.
    pub effective_time: Option<String>,
    /// Association target, for historical association members.
    pub target_component: Option<ConceptId>,
    /// Additional typed fields, keyed by document field name.
    pub fields: BTreeMap<String, FieldValue>,
}

impl Member {
    /// Creates an active member of a reference set.
    pub fn new(
        refset_id: impl Into<ConceptId>,
        referenced_component: impl Into<ConceptId>,
    ) -> Self {
        Self {
            refset_id: refset_id.into(),
            referenced_component: referenced_component.into(),
            active: true,
            module_id: ConceptId::new(terminology::CORE_MODULE),
            effective_time: None,
            target_component: None,
            fields: BTreeMap::new(),
        }
    }

    /// Creates an active association member pointing at a target
    /// component.
    pub fn targeting(
        refset_id: impl Into<ConceptId>,
        referenced_component: impl Into<ConceptId>,
        target_component: impl Into<ConceptId>,
    ) -> Self {
        let mut member = Self::new(refset_id, referenced_component);
        member.target_component = Some(target_component.into());
        member
    }

    /// Sets an additional typed field, such as `mapTarget`.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Marks the member inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

// =============================================================================
// Graph
// =============================================================================

/// An in-memory [`GraphReader`] built by hand.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    concepts: BTreeMap<ConceptId, ConceptData>,
    parents: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
    stated_parents: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
    descriptions: Vec<Description>,
    members: Vec<Member>,
    relationships: Vec<(Form, Relationship)>,
}

impl MemoryGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a concept with default metadata (active, primitive, core
    /// module). Adding an existing concept is a no-op.
    pub fn add_concept(&mut self, id: impl Into<ConceptId>) -> &mut Self {
        self.concepts.entry(id.into()).or_default();
        self
    }

    /// Adds an inferred IS A edge, creating both concepts if needed.
    pub fn add_is_a(
        &mut self,
        child: impl Into<ConceptId>,
        parent: impl Into<ConceptId>,
    ) -> &mut Self {
        let child = child.into();
        let parent = parent.into();
        self.add_concept(child.clone());
        self.add_concept(parent.clone());
        self.parents.entry(child).or_default().insert(parent);
        self
    }

    /// Adds a stated IS A edge, creating both concepts if needed.
    pub fn add_stated_is_a(
        &mut self,
        child: impl Into<ConceptId>,
        parent: impl Into<ConceptId>,
    ) -> &mut Self {
        let child = child.into();
        let parent = parent.into();
        self.add_concept(child.clone());
        self.add_concept(parent.clone());
        self.stated_parents.entry(child).or_default().insert(parent);
        self
    }

    /// Marks a concept inactive.
    pub fn set_inactive(&mut self, id: impl Into<ConceptId>) -> &mut Self {
        self.concepts.entry(id.into()).or_default().active = false;
        self
    }

    /// Sets whether a concept is primitive or fully defined.
    pub fn set_primitive(&mut self, id: impl Into<ConceptId>, primitive: bool) -> &mut Self {
        self.concepts.entry(id.into()).or_default().primitive = primitive;
        self
    }

    /// Sets the module of a concept.
    pub fn set_module(
        &mut self,
        id: impl Into<ConceptId>,
        module_id: impl Into<ConceptId>,
    ) -> &mut Self {
        self.concepts.entry(id.into()).or_default().module_id = module_id.into();
        self
    }

    /// Sets the effective time of a concept, as yyyyMMdd.
    pub fn set_effective_time(
        &mut self,
        id: impl Into<ConceptId>,
        effective_time: impl Into<String>,
    ) -> &mut Self {
        self.concepts.entry(id.into()).or_default().effective_time = Some(effective_time.into());
        self
    }

    /// Sets the semantic tag of a concept explicitly. Without this, the
    /// tag is derived from the active fully specified name, if any.
    pub fn set_semantic_tag(
        &mut self,
        id: impl Into<ConceptId>,
        tag: impl Into<String>,
    ) -> &mut Self {
        self.concepts.entry(id.into()).or_default().semantic_tag = Some(tag.into());
        self
    }

    /// Adds a description document.
    pub fn add_description(&mut self, description: Description) -> &mut Self {
        self.add_concept(description.concept_id.clone());
        self.descriptions.push(description);
        self
    }

    /// Adds a reference set member document.
    pub fn add_member(&mut self, member: Member) -> &mut Self {
        self.add_concept(member.refset_id.clone());
        self.add_concept(member.referenced_component.clone());
        self.members.push(member);
        self
    }

    /// Adds an inferred attribute relationship. Group 0 means ungrouped.
    pub fn add_relationship(
        &mut self,
        source: impl Into<ConceptId>,
        type_id: impl Into<ConceptId>,
        destination: impl Into<ConceptId>,
        group: u16,
    ) -> &mut Self {
        self.push_relationship(Form::Inferred, source, type_id, destination, group)
    }

    /// Adds a stated attribute relationship. Group 0 means ungrouped.
    pub fn add_stated_relationship(
        &mut self,
        source: impl Into<ConceptId>,
        type_id: impl Into<ConceptId>,
        destination: impl Into<ConceptId>,
        group: u16,
    ) -> &mut Self {
        self.push_relationship(Form::Stated, source, type_id, destination, group)
    }

    fn push_relationship(
        &mut self,
        form: Form,
        source: impl Into<ConceptId>,
        type_id: impl Into<ConceptId>,
        destination: impl Into<ConceptId>,
        group: u16,
    ) -> &mut Self {
        let rel = Relationship {
            source: source.into(),
            type_id: type_id.into(),
            destination: destination.into(),
            group,
        };
        self.add_concept(rel.source.clone());
        self.add_concept(rel.type_id.clone());
        self.add_concept(rel.destination.clone());
        self.relationships.push((form, rel));
        self
    }

    fn record(&self, id: &ConceptId) -> ConceptRecord {
        let data = self.concepts.get(id).cloned().unwrap_or_default();
        let (parents, ancestors) = self.hierarchy_fields(id, &self.parents);
        let (stated_parents, stated_ancestors) = self.hierarchy_fields(id, &self.stated_parents);
        let semantic_tag = data.semantic_tag.clone().or_else(|| self.fsn_tag(id));
        ConceptRecord {
            id: id.clone(),
            active: data.active,
            primitive: data.primitive,
            module_id: data.module_id,
            effective_time: data.effective_time,
            semantic_tag,
            parents,
            ancestors,
            stated_parents,
            stated_ancestors,
            active_member_of: self.active_member_of(id),
        }
    }

    /// Computes the direct parents and indirect ancestors of a concept in
    /// one edge map. Concepts without recorded parents are top level and
    /// carry the root sentinel; the sentinel also terminates every
    /// ancestor chain.
    fn hierarchy_fields(
        &self,
        id: &ConceptId,
        edges: &BTreeMap<ConceptId, BTreeSet<ConceptId>>,
    ) -> (Vec<ConceptId>, Vec<ConceptId>) {
        let root = ConceptId::new(terminology::ROOT_ID);
        let direct: Vec<ConceptId> = match edges.get(id) {
            Some(parents) if !parents.is_empty() => parents.iter().cloned().collect(),
            _ => vec![root.clone()],
        };

        let mut closure: BTreeSet<ConceptId> = BTreeSet::new();
        let mut pending: Vec<ConceptId> = direct.clone();
        while let Some(next) = pending.pop() {
            if !closure.insert(next.clone()) {
                continue;
            }
            match edges.get(&next) {
                Some(parents) if !parents.is_empty() => pending.extend(parents.iter().cloned()),
                _ if next != root => {
                    closure.insert(root.clone());
                }
                _ => {}
            }
        }

        let ancestors = closure.into_iter().filter(|a| !direct.contains(a)).collect();
        (direct, ancestors)
    }

    fn active_member_of(&self, id: &ConceptId) -> Vec<ConceptId> {
        let refsets: BTreeSet<ConceptId> = self
            .members
            .iter()
            .filter(|m| m.active && &m.referenced_component == id)
            .map(|m| m.refset_id.clone())
            .collect();
        refsets.into_iter().collect()
    }

    fn fsn_tag(&self, id: &ConceptId) -> Option<String> {
        self.descriptions
            .iter()
            .find(|d| {
                d.active
                    && &d.concept_id == id
                    && d.type_id.as_str() == terminology::FULLY_SPECIFIED_NAME
            })
            .and_then(|d| semantic_tag_of(&d.term))
    }
}

#[async_trait]
impl GraphReader for MemoryGraph {
    async fn search_concepts(&self, query: &Query) -> EvalResult<BTreeSet<ConceptId>> {
        Ok(self
            .concepts
            .keys()
            .filter(|id| {
                let record = self.record(id);
                doc_matches(query, &|field| concept_values(&record, field))
            })
            .cloned()
            .collect())
    }

    async fn concepts(&self, ids: &BTreeSet<ConceptId>) -> EvalResult<Vec<ConceptRecord>> {
        Ok(ids
            .iter()
            .filter(|id| self.concepts.contains_key(*id))
            .map(|id| self.record(id))
            .collect())
    }

    async fn search_descriptions(&self, query: &Query) -> EvalResult<BTreeSet<ConceptId>> {
        Ok(self
            .descriptions
            .iter()
            .filter(|d| doc_matches(query, &|field| description_values(d, field)))
            .map(|d| d.concept_id.clone())
            .collect())
    }

    async fn search_members(&self, query: &Query) -> EvalResult<BTreeSet<ConceptId>> {
        Ok(self
            .members
            .iter()
            .filter(|m| doc_matches(query, &|field| member_values(m, field)))
            .map(|m| m.referenced_component.clone())
            .collect())
    }

    async fn relationships_by_source(
        &self,
        sources: &BTreeSet<ConceptId>,
        form: Form,
    ) -> EvalResult<Vec<Relationship>> {
        Ok(self
            .relationships
            .iter()
            .filter(|(f, r)| *f == form && sources.contains(&r.source))
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn relationships_by_type_and_destination(
        &self,
        types: &BTreeSet<ConceptId>,
        destinations: &BTreeSet<ConceptId>,
        form: Form,
    ) -> EvalResult<Vec<Relationship>> {
        Ok(self
            .relationships
            .iter()
            .filter(|(f, r)| {
                *f == form && types.contains(&r.type_id) && destinations.contains(&r.destination)
            })
            .map(|(_, r)| r.clone())
            .collect())
    }
}

// =============================================================================
// Document matching
// =============================================================================

fn doc_matches<F: Fn(&str) -> Vec<FieldValue>>(query: &Query, values: &F) -> bool {
    match query {
        Query::MatchAll => true,
        Query::MatchNone => false,
        Query::Term { field, value } => values(field).iter().any(|v| v == value),
        Query::Terms { field, values: accepted } => {
            values(field).iter().any(|v| accepted.contains(v.to_string().as_str()))
        }
        Query::Exists { field } => !values(field).is_empty(),
        Query::Range { field, from, to, from_inclusive, to_inclusive } => values(field)
            .iter()
            .any(|v| in_range(v, from.as_ref(), to.as_ref(), *from_inclusive, *to_inclusive)),
        Query::Text { field, term, match_type } => {
            values(field).iter().any(|v| text_matches(&v.to_string(), term, *match_type))
        }
        Query::Bool { filter, should, must_not } => {
            filter.iter().all(|q| doc_matches(q, values))
                && (should.is_empty() || should.iter().any(|q| doc_matches(q, values)))
                && !must_not.iter().any(|q| doc_matches(q, values))
        }
    }
}

fn in_range(
    value: &FieldValue,
    from: Option<&FieldValue>,
    to: Option<&FieldValue>,
    from_inclusive: bool,
    to_inclusive: bool,
) -> bool {
    use std::cmp::Ordering;

    if let Some(from) = from {
        match value.compare(from) {
            Some(Ordering::Greater) => {}
            Some(Ordering::Equal) if from_inclusive => {}
            _ => return false,
        }
    }
    if let Some(to) = to {
        match value.compare(to) {
            Some(Ordering::Less) => {}
            Some(Ordering::Equal) if to_inclusive => {}
            _ => return false,
        }
    }
    true
}

fn text_matches(value: &str, term: &str, match_type: TermMatchType) -> bool {
    match match_type {
        TermMatchType::Match => {
            let value = value.to_lowercase();
            let words: Vec<&str> = value.split_whitespace().collect();
            term.to_lowercase()
                .split_whitespace()
                .all(|prefix| words.iter().any(|w| w.starts_with(prefix)))
        }
        TermMatchType::Wild => {
            let pattern = format!(
                "(?i)^{}$",
                term.split('*').map(regex::escape).collect::<Vec<_>>().join(".*")
            );
            Regex::new(&pattern).map(|re| re.is_match(value)).unwrap_or(false)
        }
        TermMatchType::Regex => {
            let pattern = format!("^(?:{})$", term);
            Regex::new(&pattern).map(|re| re.is_match(value)).unwrap_or(false)
        }
        TermMatchType::Exact => value == term,
    }
}

/// Extracts the parenthesized semantic tag from a fully specified name.
fn semantic_tag_of(term: &str) -> Option<String> {
    let term = term.trim_end();
    if !term.ends_with(')') {
        return None;
    }
    let open = term.rfind('(')?;
    let tag = &term[open + 1..term.len() - 1];
    (!tag.is_empty()).then(|| tag.to_string())
}

fn id_values(ids: &[ConceptId]) -> Vec<FieldValue> {
    ids.iter().map(FieldValue::from).collect()
}

fn concept_values(record: &ConceptRecord, field: &str) -> Vec<FieldValue> {
    use fields::concept as f;
    match field {
        f::ID => vec![FieldValue::from(&record.id)],
        f::ACTIVE => vec![FieldValue::Boolean(record.active)],
        f::PRIMITIVE => vec![FieldValue::Boolean(record.primitive)],
        f::MODULE_ID => vec![FieldValue::from(&record.module_id)],
        f::EFFECTIVE_TIME => {
            record.effective_time.iter().map(|t| FieldValue::String(t.clone())).collect()
        }
        f::SEMANTIC_TAG => {
            record.semantic_tag.iter().map(|t| FieldValue::String(t.clone())).collect()
        }
        f::PARENTS => id_values(&record.parents),
        f::ANCESTORS => id_values(&record.ancestors),
        f::STATED_PARENTS => id_values(&record.stated_parents),
        f::STATED_ANCESTORS => id_values(&record.stated_ancestors),
        f::ACTIVE_MEMBER_OF => id_values(&record.active_member_of),
        _ => Vec::new(),
    }
}

fn description_values(description: &Description, field: &str) -> Vec<FieldValue> {
    use fields::description as f;
    match field {
        f::CONCEPT_ID => vec![FieldValue::from(&description.concept_id)],
        f::TERM => vec![FieldValue::String(description.term.clone())],
        f::TYPE_ID => vec![FieldValue::from(&description.type_id)],
        f::LANGUAGE => vec![FieldValue::String(description.language.clone())],
        f::ACTIVE => vec![FieldValue::Boolean(description.active)],
        f::MODULE_ID => vec![FieldValue::from(&description.module_id)],
        f::EFFECTIVE_TIME => {
            description.effective_time.iter().map(|t| FieldValue::String(t.clone())).collect()
        }
        f::PREFERRED_IN => id_values(&description.preferred_in),
        f::ACCEPTABLE_IN => id_values(&description.acceptable_in),
        f::LANGUAGE_REFSET => {
            let mut values = id_values(&description.preferred_in);
            values.extend(id_values(&description.acceptable_in));
            values
        }
        _ => Vec::new(),
    }
}

fn member_values(member: &Member, field: &str) -> Vec<FieldValue> {
    use fields::member as f;
    match field {
        f::REFSET_ID => vec![FieldValue::from(&member.refset_id)],
        f::REFERENCED_COMPONENT => vec![FieldValue::from(&member.referenced_component)],
        f::TARGET_COMPONENT => {
            member.target_component.iter().map(FieldValue::from).collect()
        }
        f::ACTIVE => vec![FieldValue::Boolean(member.active)],
        f::MODULE_ID => vec![FieldValue::from(&member.module_id)],
        f::EFFECTIVE_TIME => {
            member.effective_time.iter().map(|t| FieldValue::String(t.clone())).collect()
        }
        other => member.fields.get(other).cloned().into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> BTreeSet<ConceptId> {
        raw.iter().map(|id| ConceptId::new(*id)).collect()
    }

    mod hierarchy {
        use super::*;

        #[test]
        fn test_top_level_concept_carries_sentinel_parent() {
            let mut graph = MemoryGraph::new();
            graph.add_concept("100");
            let record = graph.record(&ConceptId::new("100"));
            assert_eq!(record.parents, vec![ConceptId::new("-1")]);
            assert!(record.ancestors.is_empty());
        }

        #[test]
        fn test_sentinel_propagates_into_ancestors() {
            let mut graph = MemoryGraph::new();
            graph.add_is_a("child", "top");
            let record = graph.record(&ConceptId::new("child"));
            assert_eq!(record.parents, vec![ConceptId::new("top")]);
            assert_eq!(record.ancestors, vec![ConceptId::new("-1")]);
        }

        #[test]
        fn test_indirect_ancestors_exclude_direct_parents() {
            let mut graph = MemoryGraph::new();
            graph.add_is_a("c", "b");
            graph.add_is_a("b", "a");
            let record = graph.record(&ConceptId::new("c"));
            assert_eq!(record.parents, vec![ConceptId::new("b")]);
            assert_eq!(record.ancestors, vec![ConceptId::new("-1"), ConceptId::new("a")]);
        }

        #[test]
        fn test_diamond_ancestors_deduplicated() {
            let mut graph = MemoryGraph::new();
            graph.add_is_a("d", "b");
            graph.add_is_a("d", "c");
            graph.add_is_a("b", "a");
            graph.add_is_a("c", "a");
            let record = graph.record(&ConceptId::new("d"));
            assert_eq!(record.parents.len(), 2);
            assert_eq!(record.ancestors, vec![ConceptId::new("-1"), ConceptId::new("a")]);
        }

        #[test]
        fn test_stated_and_inferred_forms_are_independent() {
            let mut graph = MemoryGraph::new();
            graph.add_is_a("x", "inferred_parent");
            graph.add_stated_is_a("x", "stated_parent");
            let record = graph.record(&ConceptId::new("x"));
            assert_eq!(record.parents, vec![ConceptId::new("inferred_parent")]);
            assert_eq!(record.stated_parents, vec![ConceptId::new("stated_parent")]);
        }
    }

    mod semantic_tags {
        use super::*;

        #[test]
        fn test_tag_extracted_from_fsn() {
            assert_eq!(semantic_tag_of("Asthma (disorder)"), Some("disorder".to_string()));
            assert_eq!(
                semantic_tag_of("Heart structure (body structure)"),
                Some("body structure".to_string())
            );
        }

        #[test]
        fn test_terms_without_tag() {
            assert_eq!(semantic_tag_of("Asthma"), None);
            assert_eq!(semantic_tag_of("Asthma ()"), None);
            assert_eq!(semantic_tag_of("(disorder) Asthma"), None);
        }

        #[test]
        fn test_explicit_tag_wins_over_fsn() {
            let mut graph = MemoryGraph::new();
            graph.add_description(Description::fsn("100", "Asthma (disorder)"));
            graph.set_semantic_tag("100", "finding");
            let record = graph.record(&ConceptId::new("100"));
            assert_eq!(record.semantic_tag, Some("finding".to_string()));
        }
    }

    mod text_matching {
        use super::*;

        #[test]
        fn test_match_mode_is_word_prefix_search() {
            assert!(text_matches("Chronic asthma", "asth", TermMatchType::Match));
            assert!(text_matches("Chronic asthma", "chron asth", TermMatchType::Match));
            assert!(text_matches("Chronic asthma", "ASTHMA", TermMatchType::Match));
            assert!(!text_matches("Chronic asthma", "hma", TermMatchType::Match));
        }

        #[test]
        fn test_wild_mode() {
            assert!(text_matches("Pneumonia", "Pneu*", TermMatchType::Wild));
            assert!(text_matches("Pneumonia", "*monia", TermMatchType::Wild));
            assert!(text_matches("Pneumonia", "pneu*nia", TermMatchType::Wild));
            assert!(!text_matches("Pneumonia", "Pneu", TermMatchType::Wild));
        }

        #[test]
        fn test_wild_mode_escapes_regex_metacharacters() {
            assert!(text_matches("a(b)c", "a(b)*", TermMatchType::Wild));
            assert!(!text_matches("axc", "a.c", TermMatchType::Wild));
        }

        #[test]
        fn test_regex_mode_is_anchored() {
            assert!(text_matches("bronchitis", ".*itis", TermMatchType::Regex));
            assert!(!text_matches("bronchitis itself", ".*itis", TermMatchType::Regex));
        }

        #[test]
        fn test_exact_mode() {
            assert!(text_matches("Asthma", "Asthma", TermMatchType::Exact));
            assert!(!text_matches("Asthma", "asthma", TermMatchType::Exact));
        }
    }

    mod searching {
        use super::*;

        #[tokio::test]
        async fn test_search_concepts_by_parent() {
            let mut graph = MemoryGraph::new();
            graph.add_is_a("b", "a");
            graph.add_is_a("c", "a");
            graph.add_is_a("d", "b");

            let hits = graph
                .search_concepts(&Query::term(fields::concept::PARENTS, "a"))
                .await
                .unwrap();
            assert_eq!(hits, ids(&["b", "c"]));
        }

        #[tokio::test]
        async fn test_search_members_projects_referenced_components() {
            let mut graph = MemoryGraph::new();
            graph.add_member(Member::new("refset", "a"));
            graph.add_member(Member::new("refset", "b").inactive());
            graph.add_member(Member::new("other", "c"));

            let query = Query::term(fields::member::REFSET_ID, "refset")
                .and(Query::term(fields::member::ACTIVE, true));
            let hits = graph.search_members(&query).await.unwrap();
            assert_eq!(hits, ids(&["a"]));
        }

        #[tokio::test]
        async fn test_member_custom_field_range() {
            let mut graph = MemoryGraph::new();
            graph.add_member(Member::new("refset", "a").field("priority", 3_i64));
            graph.add_member(Member::new("refset", "b").field("priority", 7_i64));

            let query = Query::Range {
                field: "priority".to_string(),
                from: Some(FieldValue::Integer(5)),
                to: None,
                from_inclusive: true,
                to_inclusive: false,
            };
            let hits = graph.search_members(&query).await.unwrap();
            assert_eq!(hits, ids(&["b"]));
        }

        #[tokio::test]
        async fn test_unknown_concept_ids_are_skipped() {
            let mut graph = MemoryGraph::new();
            graph.add_concept("known");
            let records = graph.concepts(&ids(&["known", "unknown"])).await.unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].id, ConceptId::new("known"));
        }
    }
}
