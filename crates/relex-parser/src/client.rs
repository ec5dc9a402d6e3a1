//! JSON-RPC client for a CoreNLP-style parser service
//!
//! The service exposes a `parse` method whose result is either a JSON object
//! or a JSON document encoded as a string:
//!
//! ```text
//! {"sentences": [{
//!     "words": [["Carbon", {"Lemma": "carbon", "PartOfSpeech": "NN"}], ...],
//!     "dependencies": [["nsubj", "displays", "2", "Carbon", "1"], ...]
//! }]}
//! ```
//!
//! Dependencies are `[relation, head_word, head_index, dependent_word,
//! dependent_index]` with 1-based indices (0 for the root). Only the first
//! sentence of a response is used.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use relex_core::{
    DependencyParser, ParsedDependency, ParsedSentence, ParsedToken, ParserConfig, RelexError,
    Result,
};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: [&'a str; 1],
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawParse {
    #[serde(default)]
    sentences: Vec<RawSentence>,
}

#[derive(Debug, Deserialize)]
struct RawSentence {
    #[serde(default)]
    words: Vec<(String, RawWordInfo)>,
    #[serde(default)]
    dependencies: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawWordInfo {
    #[serde(rename = "Lemma")]
    lemma: String,
    #[serde(rename = "PartOfSpeech")]
    pos: String,
}

fn malformed(message: impl std::fmt::Display) -> RelexError {
    RelexError::ParseFailure(format!("Malformed parser response: {message}"))
}

fn index_of(value: &Value) -> Result<usize> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| malformed(format!("bad index {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| malformed(format!("bad index {s:?}"))),
        other => Err(malformed(format!("bad index {other}"))),
    }
}

/// Decode the `result` of a `parse` call into the first parsed sentence
pub fn decode_parse_response(result: Value) -> Result<ParsedSentence> {
    let result = match result {
        Value::String(encoded) => serde_json::from_str::<Value>(&encoded).map_err(malformed)?,
        other => other,
    };

    let raw: RawParse = serde_json::from_value(result).map_err(malformed)?;
    let Some(first) = raw.sentences.into_iter().next() else {
        return Ok(ParsedSentence::default());
    };

    let tokens = first
        .words
        .into_iter()
        .enumerate()
        .map(|(i, (word, info))| ParsedToken {
            index: i + 1,
            word,
            lemma: info.lemma,
            pos: info.pos,
        })
        .collect();

    let dependencies = first
        .dependencies
        .iter()
        .map(|dep| match dep.as_slice() {
            [Value::String(relation), _head_word, head, _word, dependent] => {
                Ok(ParsedDependency {
                    relation: relation.clone(),
                    head_index: index_of(head)?,
                    dependent_index: index_of(dependent)?,
                })
            }
            _ => Err(malformed(format!("bad dependency entry {dep:?}"))),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedSentence {
        tokens,
        dependencies,
    })
}

/// Parser service client
pub struct CoreNlpClient {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl CoreNlpClient {
    /// Create a new client for one endpoint
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelexError::ConfigError(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// One client per configured endpoint
    pub fn from_config(config: &ParserConfig) -> Result<Vec<Self>> {
        let timeout = Duration::from_secs(config.timeout_secs);
        config
            .endpoints
            .iter()
            .map(|endpoint| Self::new(endpoint.clone(), timeout))
            .collect()
    }
}

#[async_trait]
impl DependencyParser for CoreNlpClient {
    async fn parse(&self, sentence: &str) -> Result<ParsedSentence> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "parse",
            params: [sentence],
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RelexError::ParseFailure(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RelexError::ParseFailure(format!(
                "Parser error {status}: {error_text}"
            )));
        }

        let rpc: RpcResponse = response
            .json()
            .await
            .map_err(|e| RelexError::ParseFailure(format!("Failed to parse response: {e}")))?;

        if let Some(error) = rpc.error.filter(|e| !e.is_null()) {
            return Err(RelexError::ParseFailure(format!("Parser error: {error}")));
        }

        let result = rpc
            .result
            .ok_or_else(|| RelexError::ParseFailure("No result in response".to_string()))?;

        decode_parse_response(result)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
