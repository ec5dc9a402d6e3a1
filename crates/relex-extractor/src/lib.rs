//! Relex Extractor - Subject-predicate-object extraction
//!
//! Turns the dependency graph of one sentence into `Relation`s with a fixed
//! rule set, and optionally attaches entity-linking identifiers to their
//! subjects and objects.

use relex_core::{DependencyParser, ExtractionSettings, Result};
use relex_parser::DependencyGraph;

/// Parse `sentence` and extract its relations.
///
/// Parser failures are returned to the caller; extraction itself never
/// fails and yields an empty list for a graph without subject edges.
pub async fn extract_relations(
    sentence: &str,
    parser: &dyn DependencyParser,
    settings: &ExtractionSettings,
) -> Result<Vec<Relation>> {
    let graph = DependencyGraph::parse(sentence, parser).await?;
    graph.log_dep_triples();
    Ok(RelationExtractor::new(&graph, settings.clone()).extract())
}

pub mod extractor;
pub mod labels;
pub mod linking;
pub mod relation;
pub mod sequence;

#[cfg(test)]
pub(crate) mod test_support;

pub use extractor::{PrepPhrase, PredicateObject, RelationExtractor};
pub use labels::{Label, PosClass};
pub use linking::{attach_entity_links, linking_query, HttpEntityLinker};
pub use relation::Relation;
pub use sequence::{Predicate, WordUnitSequence};
