use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use workhub_config::AiSettings;
use workhub_db::models::{TaskPriority, TaskType};

const MAX_DRAFTS: usize = 20;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("AI task generation is not configured")]
    NotConfigured,
    #[error("Text generation request failed: {0}")]
    Request(String),
    #[error("Text generation service returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("Could not parse generated tasks: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

/// A suggested task, not yet persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub task_type: TaskType,
}

#[derive(Debug, Deserialize)]
struct DraftEnvelope {
    tasks: Vec<TaskDraft>,
}

const SYSTEM_PROMPT: &str = concat!(
    "You break project work into tracker tasks. ",
    "Respond with a JSON object of the form ",
    "{\"tasks\": [{\"title\": string, \"description\": string, ",
    "\"priority\": \"Low\"|\"Medium\"|\"High\"|\"Urgent\", ",
    "\"task_type\": \"Story\"|\"Bug\"|\"Task\"|\"Epic\"}]}. ",
    "Return ONLY the JSON, no markdown fences."
);

/// Turns a free-text brief into task drafts through a hosted text model.
#[derive(Debug, Clone)]
pub struct TaskGenerator {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl TaskGenerator {
    pub fn new(settings: &AiSettings) -> Self {
        Self {
            client: Client::new(),
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        }
    }

    pub async fn generate(
        &self,
        project_name: &str,
        prompt: &str,
    ) -> Result<Vec<TaskDraft>, GenerationError> {
        let api_key = self.api_key.as_ref().ok_or(GenerationError::NotConfigured)?;

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: SYSTEM_PROMPT.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: format!("Project: {project_name}\n\n{prompt}"),
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, "Task generation request rejected");
            return Err(GenerationError::Upstream { status, body });
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let text = body
            .content
            .iter()
            .find_map(|block| block.text.as_deref())
            .ok_or_else(|| GenerationError::Parse("empty response".to_string()))?;

        let drafts = parse_drafts(text)?;
        debug!(count = drafts.len(), "Generated task drafts");
        Ok(drafts)
    }
}

/// Extracts drafts from model output. Tolerates markdown fences and a bare
/// array instead of the `{"tasks": [...]}` envelope.
pub fn parse_drafts(text: &str) -> Result<Vec<TaskDraft>, GenerationError> {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let drafts = match serde_json::from_str::<DraftEnvelope>(trimmed) {
        Ok(envelope) => envelope.tasks,
        Err(_) => serde_json::from_str::<Vec<TaskDraft>>(trimmed)
            .map_err(|e| GenerationError::Parse(e.to_string()))?,
    };

    Ok(drafts
        .into_iter()
        .filter(|d| !d.title.trim().is_empty())
        .take(MAX_DRAFTS)
        .collect())
}
