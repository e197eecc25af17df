//! OpenAI-compatible chat-completions client with tool calling

use super::ChatModel;
use crate::error::{DocScoutError, Result};
use crate::tool::ToolDefinition;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Request timeout for model calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Function part of a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as produced by the model
    #[serde(default)]
    pub arguments: String,
}

/// Tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// System prompt message
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// Final assistant answer
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Assistant message requesting tool calls
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// Result of one tool call
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

/// Tool declaration in chat-completions format
#[derive(Debug, Clone, Serialize)]
struct ToolSpec<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: FunctionSpec<'a>,
}

#[derive(Debug, Clone, Serialize)]
struct FunctionSpec<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

impl<'a> From<&'a ToolDefinition> for ToolSpec<'a> {
    fn from(def: &'a ToolDefinition) -> Self {
        Self {
            tool_type: "function",
            function: FunctionSpec {
                name: &def.name,
                description: &def.description,
                parameters: &def.input_schema,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetails {
    message: String,
}

/// Chat-completions client
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    /// Create a client for `model` at `api_base`
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DocScoutError::ClientBuild)?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Model identifier sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatMessage> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            tools: tools.iter().map(ToolSpec::from).collect(),
            tool_choice: if tools.is_empty() { None } else { Some("auto") },
        };

        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| DocScoutError::Model("API key contains invalid characters".to_string()))?;

        let response = self
            .client
            .post(self.endpoint())
            .header(AUTHORIZATION, auth)
            .json(&request)
            .send()
            .await
            .map_err(DocScoutError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(DocScoutError::Model(format!(
                "API error ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| DocScoutError::Model(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| DocScoutError::Model("Response contained no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "hi"}));

        let json = serde_json::to_value(ChatMessage::tool_result("call_1", "42")).unwrap();
        assert_eq!(
            json,
            json!({"role": "tool", "content": "42", "tool_call_id": "call_1"})
        );
    }

    #[test]
    fn test_tool_call_message_deserialization() {
        let raw = json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_abc",
                "type": "function",
                "function": {"name": "count_word", "arguments": "{\"url\":\"https://x.io\",\"word\":\"data\"}"}
            }]
        });
        let msg: ChatMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.content.is_none());
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_calls[0].function.name, "count_word");

        // Round-trips with content explicitly null, as the API expects
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json["content"].is_null());
        assert_eq!(json["tool_calls"][0]["type"], "function");
    }

    #[test]
    fn test_request_includes_tools() {
        let def = crate::tool::ToolKind::FetchUrlContent.definition();
        let defs = vec![def];
        let messages = vec![ChatMessage::user("hello")];
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            tools: defs.iter().map(ToolSpec::from).collect(),
            tool_choice: Some("auto"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "fetch_url_content");
        assert_eq!(json["tool_choice"], "auto");
    }

    #[test]
    fn test_endpoint() {
        let chat = OpenAiChat::new("https://api.openai.com/v1/", "key", "gpt-4o-mini").unwrap();
        assert_eq!(chat.endpoint(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(chat.model(), "gpt-4o-mini");
    }
}
