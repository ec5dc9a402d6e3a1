//! Evaluation dump: one `<n>\t<canonical form>` line per relation
//!
//! `n` numbers the sentences that parsed successfully, starting at 1.
//! Entity linking is never run here.

use std::path::Path;

use relex_core::{DependencyParser, ExtractionSettings, RelexError, Result};
use relex_extractor::extract_relations;

/// Evaluation lines for every non-empty line of `input`
pub async fn evaluation_lines(
    input: &str,
    parser: &dyn DependencyParser,
    settings: &ExtractionSettings,
) -> Vec<String> {
    let mut count = 0;
    let mut results = Vec::new();

    for line in input.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let relations = match extract_relations(line, parser, settings).await {
            Ok(relations) => relations,
            Err(e) => {
                tracing::error!(sentence = line, error = %e, "Failed to parse the sentence");
                continue;
            }
        };

        count += 1;
        for relation in relations {
            tracing::debug!("{}", relation.canonical_form());
            results.push(format!("{}\t{}", count, relation.canonical_form()));
        }
    }

    results
}

/// Read `input`, write the evaluation dump to `output`; returns the line count
pub async fn evaluate_file(
    input: &Path,
    output: &Path,
    parser: &dyn DependencyParser,
    settings: &ExtractionSettings,
) -> Result<usize> {
    let content = tokio::fs::read_to_string(input)
        .await
        .map_err(|source| RelexError::Io {
            path: input.to_path_buf(),
            source,
        })?;

    let lines = evaluation_lines(&content, parser, settings).await;
    let mut body = lines.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }

    tokio::fs::write(output, body)
        .await
        .map_err(|source| RelexError::Io {
            path: output.to_path_buf(),
            source,
        })?;

    Ok(lines.len())
}
