//! LLM provider wire layer — OpenAI-compatible Chat Completions over reqwest.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::Config;
use crate::operations;
use crate::types::{LlmResponse, ToolCall};

/// Max chars of tool result content sent to the model.
const MAX_TOOL_CONTENT: usize = 16000;

/// Something that answers a conversation, possibly with tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// `input` holds role messages and `function_call_output` items.
    async fn chat(&self, instructions: &str, input: &[Value], use_tools: bool)
        -> Result<LlmResponse>;
}

// ── Input translation ──

/// Convert the session's input list to Chat Completions messages.
fn translate_input_to_messages(input_list: &[Value], instructions: Option<&str>) -> Vec<Value> {
    let mut messages = Vec::new();

    if let Some(inst) = instructions {
        messages.push(json!({"role": "system", "content": inst}));
    }

    for item in input_list {
        if item.get("type").and_then(|v| v.as_str()) == Some("function_call_output") {
            let mut content = match item.get("output") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            if content.len() > MAX_TOOL_CONTENT {
                let mut cut = MAX_TOOL_CONTENT;
                while !content.is_char_boundary(cut) {
                    cut -= 1;
                }
                content.truncate(cut);
                content.push_str("\n...(truncated)");
            }
            let mut tool_msg = json!({
                "role": "tool",
                "content": content,
            });
            if let Some(call_id) = item.get("call_id") {
                tool_msg["tool_call_id"] = call_id.clone();
            }
            messages.push(tool_msg);
        } else if item.get("role").is_some() {
            messages.push(item.clone());
        }
    }

    messages
}

// ── Response normalization ──

fn call_id_for(tc: &Value, index: usize) -> String {
    tc.get("id")
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| {
            format!(
                "call_{}_{}",
                tc["function"]
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown"),
                index
            )
        })
}

/// Normalize a Chat Completions response into our standard format.
fn normalize_completions_response(response: &Value) -> LlmResponse {
    let message = &response["choices"][0]["message"];
    let text = message
        .get("content")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from);

    let mut tool_calls = Vec::new();
    let mut output = Vec::new();

    if let Some(tcs) = message.get("tool_calls").and_then(|v| v.as_array()) {
        let mut tc_output = Vec::with_capacity(tcs.len());

        for (i, tc) in tcs.iter().enumerate() {
            let func = &tc["function"];
            let call_id = call_id_for(tc, i);

            let name = func
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            // Some providers send arguments as an object instead of a string
            let arguments: Value = match func.get("arguments") {
                Some(Value::String(s)) => serde_json::from_str(s).unwrap_or(json!({})),
                Some(obj @ Value::Object(_)) => obj.clone(),
                _ => json!({}),
            };

            // Synthetic assistant message for the follow-up input list
            tc_output.push(json!({
                "id": call_id,
                "type": "function",
                "function": {
                    "name": name,
                    "arguments": arguments.to_string(),
                }
            }));

            tool_calls.push(ToolCall {
                name,
                arguments,
                call_id,
            });
        }

        output.push(json!({
            "role": "assistant",
            "content": text,
            "tool_calls": tc_output,
        }));
    }

    LlmResponse {
        text,
        tool_calls,
        output,
    }
}

// ── API calls ──

/// OpenAI, OpenRouter, or any OpenAI-compatible server (Ollama).
pub struct OpenAiCompatible {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    provider: String,
    max_tokens: u32,
}

impl OpenAiCompatible {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com/v1");

        Ok(Self {
            client,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            // Ollama doesn't need a key
            api_key: config.api_key.clone().unwrap_or_else(|| "ollama".into()),
            model: config.model.clone(),
            provider: config.provider.clone(),
            max_tokens: config.max_output_tokens,
        })
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response> {
        self.client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .context("HTTP request failed")
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatible {
    async fn chat(&self, instructions: &str, input: &[Value], use_tools: bool) -> Result<LlmResponse> {
        let messages = translate_input_to_messages(input, Some(instructions));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
        });
        if use_tools {
            body["tools"] = json!(operations::tool_definitions());
            body["tool_choice"] = json!("auto");
        }

        info!(
            "chat_completions request: model={} provider={} msg_count={}",
            self.model,
            self.provider,
            messages.len()
        );

        let response = self.post(&body).await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(500).collect();
            error!("API HTTP {}: {} | url={}", status, snippet, self.url);

            // Retry once on 500 errors (transient local-server issues)
            if status.as_u16() == 500 {
                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                let retry = self.post(&body).await.context("Retry HTTP request failed")?;
                if !retry.status().is_success() {
                    anyhow::bail!("API call failed after retry: HTTP {}", retry.status());
                }
                let data: Value = retry.json().await.context("Failed to parse retry response")?;
                return Ok(normalize_completions_response(&data));
            }

            let short: String = snippet.chars().take(200).collect();
            anyhow::bail!("API call failed: HTTP {} — {}", status, short);
        }

        let data: Value = response
            .json()
            .await
            .context("Failed to parse API response")?;

        Ok(normalize_completions_response(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_only() {
        let resp = json!({"choices": [{"message": {"role": "assistant", "content": "Done."}}]});
        let out = normalize_completions_response(&resp);
        assert_eq!(out.text.as_deref(), Some("Done."));
        assert!(out.tool_calls.is_empty());
        assert!(out.output.is_empty());
    }

    #[test]
    fn test_normalize_tool_calls() {
        let resp = json!({"choices": [{"message": {
            "role": "assistant",
            "content": null,
            "tool_calls": [
                {"id": "call_a", "type": "function", "function": {
                    "name": "add_submodel",
                    "arguments": "{\"submodel_id\":\"sm\",\"id_short\":\"S\"}"
                }},
                {"type": "function", "function": {"name": "get_tree_view", "arguments": "not json"}}
            ]
        }}]});
        let out = normalize_completions_response(&resp);
        assert_eq!(out.text, None);
        assert_eq!(out.tool_calls.len(), 2);
        assert_eq!(out.tool_calls[0].call_id, "call_a");
        assert_eq!(out.tool_calls[0].arguments["id_short"], "S");
        // Missing id gets a synthetic one; bad arguments become {}
        assert_eq!(out.tool_calls[1].call_id, "call_get_tree_view_1");
        assert_eq!(out.tool_calls[1].arguments, json!({}));
        assert_eq!(out.output[0]["tool_calls"][1]["id"], "call_get_tree_view_1");
    }

    #[test]
    fn test_translate_input() {
        let input = vec![
            json!({"role": "user", "content": "make a motor"}),
            json!({"type": "function_call_output", "call_id": "c1", "output": "✅ ok"}),
            json!({"unrelated": true}),
        ];
        let messages = translate_input_to_messages(&input, Some("system text"));
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["role"], "tool");
        assert_eq!(messages[2]["content"], "✅ ok");
        assert_eq!(messages[2]["tool_call_id"], "c1");
    }

    #[test]
    fn test_translate_truncates_long_output() {
        let long = "é".repeat(MAX_TOOL_CONTENT);
        let input = vec![json!({"type": "function_call_output", "call_id": "c", "output": long})];
        let messages = translate_input_to_messages(&input, None);
        let content = messages[0]["content"].as_str().unwrap();
        assert!(content.ends_with("...(truncated)"));
        assert!(content.len() <= MAX_TOOL_CONTENT + 20);
    }

    #[test]
    fn test_client_url_from_config() {
        let config = Config {
            base_url: Some("http://localhost:11434/v1/".into()),
            ..Config::default()
        };
        let model = OpenAiCompatible::new(&config).unwrap();
        assert_eq!(model.url, "http://localhost:11434/v1/chat/completions");
        assert_eq!(model.api_key, "ollama");
    }
}
