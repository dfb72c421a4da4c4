//! Text-completion assistant.
//!
//! Talks to a Gemini-style `generateContent` endpoint. Each request carries a
//! user query, a system instruction and a JSON response schema; the model's
//! answer is the text of the first part of the first candidate, which is
//! itself a JSON document.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::fields::{parse_priority, Priority};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const AUTOFILL_SYSTEM: &str = "You are a professional project manager. Based on the task title, suggest a \
     professional 2-sentence description, appropriate priority level (low/medium/high/critical), and category. \
     Return ONLY valid JSON.";
const SUBTASKS_SYSTEM: &str = "You are a professional project manager. Generate structured subtasks as JSON only.";

/// Suggested details for a task, given only its title.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSuggestion {
    pub description: String,
    pub priority: Priority,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubtaskSuggestion {
    pub title: String,
    pub priority: Priority,
    /// One of design, dev, marketing, other.
    pub category: String,
}

#[derive(Deserialize)]
struct RawTaskSuggestion {
    desc: String,
    #[serde(default)]
    priority: String,
    #[serde(default)]
    category: String,
}

#[derive(Deserialize)]
struct RawSubtaskSuggestion {
    title: String,
    #[serde(default)]
    priority: String,
    #[serde(default)]
    category: String,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    system_instruction: Content<'a>,
    generation_config: Value,
}

pub struct Assistant {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl Assistant {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());
        Assistant::with_client(endpoint, model, api_key, client)
    }

    pub fn with_client(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        client: Client,
    ) -> Self {
        Assistant {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
        }
    }

    /// Suggest a description, priority and category for a title.
    pub fn autofill(&self, title: &str) -> Result<TaskSuggestion> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("title cannot be empty".into()));
        }
        let query = format!("Based on the task title \"{title}\", suggest appropriate details for this task.");
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "desc": { "type": "STRING" },
                "priority": { "type": "STRING", "enum": ["low", "medium", "high", "critical"] },
                "category": { "type": "STRING" }
            },
            "required": ["desc", "priority", "category"]
        });
        let text = self.generate(&query, AUTOFILL_SYSTEM, schema)?;
        parse_task_suggestion(&text)
    }

    /// Break a task down into suggested subtasks.
    pub fn suggest_subtasks(&self, title: &str, description: &str) -> Result<Vec<SubtaskSuggestion>> {
        let query = format!(
            "Break down this project into 3-7 actionable subtasks. Title: \"{}\". Description: \"{}\"",
            title.trim(),
            description.trim()
        );
        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "priority": { "type": "STRING", "enum": ["low", "medium", "high", "critical"] },
                    "category": { "type": "STRING", "enum": ["design", "dev", "marketing", "other"] }
                },
                "required": ["title", "priority", "category"]
            }
        });
        let text = self.generate(&query, SUBTASKS_SYSTEM, schema)?;
        parse_subtask_suggestions(&text)
    }

    fn generate(&self, query: &str, system: &str, schema: Value) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Assist("no API key configured (set GEMINI_API_KEY)".into()))?;
        let body = GenerateRequest {
            contents: [Content { parts: [Part { text: query }] }],
            system_instruction: Content { parts: [Part { text: system }] },
            generation_config: json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }),
        };
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        debug!(%url, "assistant request");
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .map_err(|e| Error::Assist(format!("request failed: {e}")))?;
        let status = resp.status();
        let payload: Value = resp
            .json()
            .map_err(|e| Error::Assist(format!("unreadable response ({status}): {e}")))?;
        if !status.is_success() {
            let message = payload
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("no details");
            return Err(Error::Assist(format!("service returned {status}: {message}")));
        }
        let text = extract_text(&payload)?;
        info!(model = %self.model, chars = text.len(), "assistant answered");
        Ok(text)
    }
}

/// Pull the model text out of a `generateContent` response.
pub fn extract_text(payload: &Value) -> Result<String> {
    payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::Assist("response was empty or could not be processed".into()))
}

/// Unknown priorities fall back to medium.
fn lenient_priority(s: &str) -> Priority {
    parse_priority(s).unwrap_or_default()
}

pub fn parse_task_suggestion(text: &str) -> Result<TaskSuggestion> {
    let raw: RawTaskSuggestion =
        serde_json::from_str(text).map_err(|e| Error::Assist(format!("failed to parse suggestion: {e}")))?;
    Ok(TaskSuggestion {
        description: raw.desc.trim().to_string(),
        priority: lenient_priority(&raw.priority),
        category: raw.category.trim().to_string(),
    })
}

/// Parse a subtask list, dropping entries with a blank title.
pub fn parse_subtask_suggestions(text: &str) -> Result<Vec<SubtaskSuggestion>> {
    let raw: Vec<RawSubtaskSuggestion> =
        serde_json::from_str(text).map_err(|e| Error::Assist(format!("failed to parse subtasks: {e}")))?;
    Ok(raw
        .into_iter()
        .filter(|r| !r.title.trim().is_empty())
        .map(|r| SubtaskSuggestion {
            title: r.title.trim().to_string(),
            priority: lenient_priority(&r.priority),
            category: match r.category.trim().to_lowercase().as_str() {
                c @ ("design" | "dev" | "marketing") => c.to_string(),
                _ => "other".to_string(),
            },
        })
        .collect())
}

/// Append suggested subtasks to a task, returning the new subtask IDs.
pub fn append_suggestions(db: &mut Database, task_id: u64, suggestions: &[SubtaskSuggestion]) -> Result<Vec<u64>> {
    if db.get(task_id).is_none() {
        return Err(Error::NotFound(task_id));
    }
    suggestions
        .iter()
        .map(|s| db.add_subtask(task_id, &s.title, None, None))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_stub::{direct_client, Stub};
    use crate::task::TaskDraft;

    fn response(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    #[test]
    fn test_extract_text() {
        assert_eq!(extract_text(&response(" {\"a\":1} ")).unwrap(), "{\"a\":1}");
        assert!(matches!(extract_text(&response("  ")), Err(Error::Assist(_))));
        assert!(matches!(extract_text(&json!({ "candidates": [] })), Err(Error::Assist(_))));
        assert!(matches!(extract_text(&json!({})), Err(Error::Assist(_))));
    }

    #[test]
    fn test_parse_task_suggestion() {
        let s = parse_task_suggestion(
            r#"{"desc":"Prepare the Q4 budget. Circulate to finance.","priority":"high","category":"Finance"}"#,
        )
        .unwrap();
        assert_eq!(s.description, "Prepare the Q4 budget. Circulate to finance.");
        assert_eq!(s.priority, Priority::High);
        assert_eq!(s.category, "Finance");

        let s = parse_task_suggestion(r#"{"desc":"x","priority":"urgent"}"#).unwrap();
        assert_eq!(s.priority, Priority::Medium);
        assert_eq!(s.category, "");

        assert!(matches!(parse_task_suggestion("not json"), Err(Error::Assist(_))));
        assert!(matches!(parse_task_suggestion(r#"{"priority":"low"}"#), Err(Error::Assist(_))));
    }

    #[test]
    fn test_parse_subtask_suggestions() {
        let list = parse_subtask_suggestions(
            r#"[{"title":"Draft layout","priority":"low","category":"design"},
                {"title":"  ","priority":"low","category":"dev"},
                {"title":"Ship","priority":"CRITICAL","category":"ops"}]"#,
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].category, "design");
        assert_eq!(list[1].priority, Priority::Critical);
        assert_eq!(list[1].category, "other");
        assert!(matches!(parse_subtask_suggestions(r#"{"title":"x"}"#), Err(Error::Assist(_))));
    }

    #[test]
    fn test_missing_key_fails_without_network() {
        let a = Assistant::new("http://127.0.0.1:9", DEFAULT_MODEL, Some("  ".into()));
        match a.autofill("Plan offsite") {
            Err(Error::Assist(msg)) => assert!(msg.contains("API key")),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(a.autofill(" "), Err(Error::Validation(_))));
    }

    fn stubbed(stub: &Stub) -> Assistant {
        Assistant::with_client(format!("{}/v1beta/", stub.base), "m", Some("k".into()), direct_client())
    }

    #[test]
    fn test_autofill_request_shape() {
        let stub = Stub::bind();
        let assistant = stubbed(&stub);
        let answer = r#"{"desc":"Book the venue. Send invites.","priority":"high","category":"Events"}"#;
        let server = stub.serve(vec![(200, response(answer).to_string())]);

        let s = assistant.autofill("  Plan offsite ").unwrap();
        assert_eq!(s.priority, Priority::High);
        assert_eq!(s.category, "Events");

        let seen = server.join().unwrap();
        assert_eq!(seen[0].method, "POST");
        assert_eq!(seen[0].target, "/v1beta/models/m:generateContent");
        assert!(seen[0].head.contains("x-goog-api-key: k"));
        let body: Value = serde_json::from_str(&seen[0].body).unwrap();
        assert!(body["contents"][0]["parts"][0]["text"].as_str().unwrap().contains("\"Plan offsite\""));
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], AUTOFILL_SYSTEM);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_service_error_carries_message() {
        let stub = Stub::bind();
        let assistant = stubbed(&stub);
        let server = stub.serve(vec![(429, json!({ "error": { "message": "quota exhausted" } }).to_string())]);
        match assistant.suggest_subtasks("Launch site", "") {
            Err(Error::Assist(msg)) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("quota exhausted"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_empty_candidates_is_assist_error() {
        let stub = Stub::bind();
        let assistant = stubbed(&stub);
        let server = stub.serve(vec![(200, json!({ "candidates": [] }).to_string())]);
        assert!(matches!(assistant.autofill("Plan offsite"), Err(Error::Assist(_))));
        server.join().unwrap();
    }

    #[test]
    fn test_suggest_subtasks_over_http() {
        let stub = Stub::bind();
        let assistant = stubbed(&stub);
        let answer = r#"[{"title":"Wireframes","priority":"low","category":"design"}]"#;
        let server = stub.serve(vec![(200, response(answer).to_string())]);
        let list = assistant.suggest_subtasks("Launch site", "New marketing site").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "Wireframes");

        let seen = server.join().unwrap();
        let body: Value = serde_json::from_str(&seen[0].body).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], SUBTASKS_SYSTEM);
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
    }

    #[test]
    fn test_append_suggestions() {
        let mut db = Database::default();
        let id = db.create(TaskDraft::new("Launch site")).unwrap();
        let suggestions = vec![
            SubtaskSuggestion { title: "Wireframes".into(), priority: Priority::Low, category: "design".into() },
            SubtaskSuggestion { title: "Deploy".into(), priority: Priority::High, category: "dev".into() },
        ];
        let ids = append_suggestions(&mut db, id, &suggestions).unwrap();
        assert_eq!(ids, vec![1, 2]);
        let titles: Vec<_> = db.get(id).unwrap().subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Wireframes", "Deploy"]);
        assert!(matches!(append_suggestions(&mut db, 99, &suggestions), Err(Error::NotFound(99))));
    }
}
