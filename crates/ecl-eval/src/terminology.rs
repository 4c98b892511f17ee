//! Well-known terminology identifiers.
//!
//! Concept identifiers are opaque strings to the engine; the handful of
//! identifiers below have fixed meanings in the concept graph and are the
//! only ones the evaluator hard-codes.

/// Synthetic sentinel carried in the parent list of top-level concepts.
/// It is never a real concept and is stripped from ancestor results.
pub const ROOT_ID: &str = "-1";

/// The root concept of the SNOMED CT hierarchy.
pub const ROOT_CONCEPT: &str = "138875005";

/// |Is a (attribute)| - the hierarchy-defining relationship type.
pub const IS_A: &str = "116680003";

/// |SNOMED CT core module|, the default module for new components.
pub const CORE_MODULE: &str = "900000000000207008";

/// |Fully specified name (core metadata concept)|.
pub const FULLY_SPECIFIED_NAME: &str = "900000000000003001";

/// |Synonym (core metadata concept)|.
pub const SYNONYM: &str = "900000000000013009";

/// |Historical association reference set| - the ancestor of every
/// historical association reference set, used by the `MAX` history
/// profile.
pub const HISTORICAL_ASSOCIATION: &str = "900000000000522004";

/// |SAME AS association reference set|.
pub const SAME_AS: &str = "900000000000527005";

/// |REPLACED BY association reference set|.
pub const REPLACED_BY: &str = "900000000000526001";

/// |POSSIBLY EQUIVALENT TO association reference set|.
pub const POSSIBLY_EQUIVALENT_TO: &str = "900000000000523009";

/// |PARTIALLY EQUIVALENT TO association reference set|.
pub const PARTIALLY_EQUIVALENT_TO: &str = "1186924009";

/// Association reference sets consulted by the `MIN` history profile.
pub const MIN_HISTORY_ASSOCIATIONS: &[&str] = &[SAME_AS];

/// Association reference sets consulted by the `MOD` history profile.
pub const MOD_HISTORY_ASSOCIATIONS: &[&str] = &[
    SAME_AS,
    REPLACED_BY,
    POSSIBLY_EQUIVALENT_TO,
    PARTIALLY_EQUIVALENT_TO,
];
