//! Generative reviewer (detection layer 3) backed by an Ollama endpoint.
//!
//! The reviewer is a second-pass span proposer: it sees the original text
//! plus the substrings earlier layers already found, and names additional
//! PII substrings verbatim. Requests run at temperature zero behind a hard
//! timeout; every failure mode (unreachable endpoint, timeout, malformed
//! reply) degrades to "no additional spans".

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde_json::{json, Value};
use shroud_core::config::ReviewerConfig;
use shroud_core::traits::{IReviewer, ReviewCandidate};
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a PII (Personally Identifiable Information) detection expert. \
Your job is to find sensitive entities in text that automated tools may have missed.\n\
You look for ALL types of PII: names, ages, dates of birth, addresses, postal codes, \
phone numbers, email addresses, government IDs, financial data, medical data, \
usernames, and any identifier that could link back to a specific individual. \
You support all languages.\n\
Respond ONLY with a JSON array. Each element must have:\n\
- \"text\": the exact substring from the input\n\
- \"entity_type\": one of PERSON, LOCATION, ORGANIZATION, PHONE_NUMBER, EMAIL_ADDRESS, \
DATE_TIME, US_SSN, INSURANCE_ID, MEDICAL_CONDITION, DRUG_NAME, CREDIT_CARD, IBAN, \
IP_ADDRESS, USERNAME, or a descriptive ALL_CAPS type.\n\
If no additional PII is found, respond with: []";

static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("static regex"));

/// L3 reviewer speaking the Ollama chat API.
pub struct OllamaReviewer {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl OllamaReviewer {
    pub fn new(config: &ReviewerConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
        }
    }

    fn chat(&self, user_prompt: &str) -> Result<String, String> {
        let body = json!({
            "model": self.model,
            "stream": false,
            "options": { "temperature": 0 },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt },
            ],
        });
        let response: Value = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .map_err(|err| err.to_string())?
            .error_for_status()
            .map_err(|err| err.to_string())?
            .json()
            .map_err(|err| err.to_string())?;
        response
            .pointer("/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| "response missing message content".to_string())
    }
}

impl IReviewer for OllamaReviewer {
    fn review(&self, text: &str, already_found: &[String]) -> Vec<ReviewCandidate> {
        let already = if already_found.is_empty() {
            "none".to_string()
        } else {
            already_found
                .iter()
                .map(|v| format!("\"{v}\""))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let user_prompt = format!(
            "The following entities were already detected: [{already}]\n\n\
             Find any ADDITIONAL PII in this text that was missed:\n\n{text}"
        );

        match self.chat(&user_prompt) {
            Ok(content) => parse_review(&content, text),
            Err(reason) => {
                warn!(%reason, "generative review failed; continuing without it");
                Vec::new()
            }
        }
    }

    fn is_available(&self) -> bool {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .and_then(|r| r.error_for_status());
        let Ok(response) = response else {
            return false;
        };
        let Ok(tags) = response.json::<Value>() else {
            return false;
        };
        tags.pointer("/models")
            .and_then(Value::as_array)
            .is_some_and(|models| {
                models.iter().any(|m| {
                    m.pointer("/name")
                        .or_else(|| m.pointer("/model"))
                        .and_then(Value::as_str)
                        .is_some_and(|name| name.contains(&self.model))
                })
            })
    }
}

/// Parse the model's reply and locate each proposed substring in the input.
///
/// The model may wrap the array in markdown, so the first bracketed block
/// is extracted before JSON parsing. Candidates whose text does not occur
/// verbatim in the input are dropped; the first occurrence wins.
pub fn parse_review(content: &str, original_text: &str) -> Vec<ReviewCandidate> {
    let Some(raw) = JSON_ARRAY.find(content) else {
        return Vec::new();
    };
    let Ok(entries) = serde_json::from_str::<Vec<Value>>(raw.as_str()) else {
        debug!("generative reviewer reply was not a JSON array");
        return Vec::new();
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let Some(text) = entry.pointer("/text").and_then(Value::as_str) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        let entity_type = entry
            .pointer("/entity_type")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN");
        let Some(start) = original_text.find(text) else {
            continue;
        };
        candidates.push(ReviewCandidate {
            text: text.to_string(),
            entity_type: entity_type.to_string(),
            start,
            end: start + text.len(),
        });
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_array() {
        let content = r#"[{"text": "Jane Doe", "entity_type": "PERSON"}]"#;
        let found = parse_review(content, "Report by Jane Doe yesterday");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start, 10);
        assert_eq!(found[0].end, 18);
        assert_eq!(found[0].entity_type, "PERSON");
    }

    #[test]
    fn parses_markdown_wrapped_array() {
        let content = "Here you go:\n```json\n[{\"text\": \"221B Baker Street\", \"entity_type\": \"LOCATION\"}]\n```";
        let found = parse_review(content, "Lives at 221B Baker Street, London");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn drops_candidates_not_in_text() {
        let content = r#"[{"text": "hallucinated value", "entity_type": "PERSON"}]"#;
        assert!(parse_review(content, "nothing here").is_empty());
    }

    #[test]
    fn drops_entries_without_text() {
        let content = r#"[{"entity_type": "PERSON"}, {"text": "", "entity_type": "X"}]"#;
        assert!(parse_review(content, "whatever").is_empty());
    }

    #[test]
    fn non_array_reply_yields_nothing() {
        assert!(parse_review("I found no PII.", "whatever").is_empty());
    }
}
