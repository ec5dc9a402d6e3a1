//! Hand-written parse fixtures

use relex_core::{ParsedDependency, ParsedSentence, ParsedToken};
use relex_parser::DependencyGraph;

/// Build a graph from `(word, lemma, pos)` tokens numbered from 1 and
/// `(relation, head, dependent)` edges
pub(crate) fn graph(
    tokens: &[(&str, &str, &str)],
    dependencies: &[(&str, usize, usize)],
) -> DependencyGraph {
    let parsed = ParsedSentence {
        tokens: tokens
            .iter()
            .enumerate()
            .map(|(i, (word, lemma, pos))| ParsedToken {
                index: i + 1,
                word: word.to_string(),
                lemma: lemma.to_string(),
                pos: pos.to_string(),
            })
            .collect(),
        dependencies: dependencies
            .iter()
            .map(|(relation, head, dependent)| ParsedDependency {
                relation: relation.to_string(),
                head_index: *head,
                dependent_index: *dependent,
            })
            .collect(),
    };

    let sentence = tokens
        .iter()
        .map(|(word, _, _)| *word)
        .collect::<Vec<_>>()
        .join(" ");
    DependencyGraph::from_parsed(sentence, parsed).unwrap()
}
