//! The LLM-backed relevance oracle: render → complete → parse.
//!
//! [`CompletionClient`] is the transport seam — the engine never talks to a
//! model API directly. [`LlmOracle`] implements [`RelevanceOracle`] on top
//! of any client, with hardened parsing of the free-text JSON the model
//! returns.

use std::sync::Arc;

use async_trait::async_trait;
use promptfit_core::error::OracleError;
use promptfit_core::message::Message;
use promptfit_core::oracle::{LineRange, RelevanceOracle, ScoredSnippet};

use crate::prompt::{self, RANGE_EXTRACTION, SNIPPET_SCORING};

/// Maximum number of ranges/snippets accepted from a single oracle response.
pub const MAX_ORACLE_ITEMS: usize = 4;

/// The minimal LLM transport seam: one prompt in, one completion out.
///
/// Implementations are remote calls and may fail; the engine owns all
/// degradation policy above this boundary.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}

/// A [`RelevanceOracle`] backed by a completion client.
pub struct LlmOracle {
    client: Arc<dyn CompletionClient>,
}

impl LlmOracle {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RelevanceOracle for LlmOracle {
    async fn extract_ranges(
        &self,
        conversation: &[Message],
        numbered_content: &str,
    ) -> Result<Vec<LineRange>, OracleError> {
        let rendered = prompt::render(
            &RANGE_EXTRACTION,
            &[
                ("content_with_lines", numbered_content),
                ("conversation", &prompt::render_conversation(conversation)),
            ],
        )?;
        let response = self.client.complete(&rendered).await?;
        parse_ranges(&response)
    }

    async fn extract_snippets(
        &self,
        conversation: &[Message],
        content: &str,
    ) -> Result<Vec<ScoredSnippet>, OracleError> {
        let rendered = prompt::render(
            &SNIPPET_SCORING,
            &[
                ("full_content", content),
                ("conversation", &prompt::render_conversation(conversation)),
            ],
        )?;
        let response = self.client.complete(&rendered).await?;
        parse_snippets(&response)
    }
}

// --- Response parsing ---

/// Strip markdown fences, control characters, and invalid JSON backslash
/// escapes from a model response.
fn clean_json_payload(raw: &str) -> String {
    let mut payload = raw.trim();
    if let Some(rest) = payload.strip_prefix("```json") {
        payload = rest;
    } else if let Some(rest) = payload.strip_prefix("```") {
        payload = rest;
    }
    if let Some(rest) = payload.strip_suffix("```") {
        payload = rest;
    }

    let without_controls: String = payload
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == '\n' || *c == '\t')
        .collect();

    escape_invalid_backslashes(&without_controls)
}

/// Models sometimes emit `\*`-style escapes that are not legal JSON;
/// double the backslash so the payload parses.
fn escape_invalid_backslashes(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len());
    let mut chars = payload.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(next) if matches!(next, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') => {
                out.push('\\');
                out.push(*next);
                chars.next();
            }
            Some(_) => {
                out.push('\\');
                out.push('\\');
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Parse a range-variant response into validated line ranges.
///
/// Accepts at most [`MAX_ORACLE_ITEMS`] ranges; an inverted range
/// (`start > end`) rejects the whole response — the caller degrades that
/// document, it never repairs the payload.
pub fn parse_ranges(raw: &str) -> Result<Vec<LineRange>, OracleError> {
    let cleaned = clean_json_payload(raw);
    let mut ranges: Vec<LineRange> = serde_json::from_str(&cleaned)
        .map_err(|e| OracleError::MalformedResponse(format!("range payload: {e}")))?;

    for range in &ranges {
        range.validate()?;
    }
    ranges.truncate(MAX_ORACLE_ITEMS);
    Ok(ranges)
}

/// Parse a scoring-variant response into scored snippets.
pub fn parse_snippets(raw: &str) -> Result<Vec<ScoredSnippet>, OracleError> {
    let cleaned = clean_json_payload(raw);
    let mut snippets: Vec<ScoredSnippet> = serde_json::from_str(&cleaned)
        .map_err(|e| OracleError::MalformedResponse(format!("snippet payload: {e}")))?;

    if let Some(bad) = snippets.iter().find(|s| s.score > 10) {
        return Err(OracleError::MalformedResponse(format!(
            "snippet score {} out of range 0-10",
            bad.score
        )));
    }
    snippets.truncate(MAX_ORACLE_ITEMS);
    Ok(snippets)
}
