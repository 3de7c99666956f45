//! Session: one chat's document, history, and the tool loop that drives the
//! model.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::document::Document;
use crate::prompts;
use crate::providers::ChatModel;
use crate::render;
use crate::storage::Storage;
use crate::types::ChatMessage;

pub struct Session {
    dispatcher: Dispatcher,
    history: VecDeque<ChatMessage>,
    model: Arc<dyn ChatModel>,
    max_history_messages: usize,
    max_tool_rounds: usize,
}

impl Session {
    pub fn new(config: &Config, model: Arc<dyn ChatModel>) -> Self {
        let storage = Storage::new(config.resolve_storage_dir());
        Self {
            dispatcher: Dispatcher::new(storage, config.duplicate_policy),
            history: VecDeque::new(),
            model,
            max_history_messages: config.max_history_messages.max(1),
            max_tool_rounds: config.max_tool_rounds,
        }
    }

    pub fn document(&self) -> &Document {
        self.dispatcher.document()
    }

    pub fn history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.history.iter()
    }

    pub fn state(&self) -> String {
        render::current_state(self.document())
    }

    pub fn tree(&self) -> String {
        render::tree_view(self.document())
    }

    /// Run one operation directly, bypassing the model.
    pub fn dispatch(&mut self, name: &str, args: &Value) -> String {
        self.dispatcher.dispatch(name, args)
    }

    /// Empty document and history.
    pub fn reset(&mut self) {
        self.dispatcher.reset();
        self.history.clear();
        info!("Session reset");
    }

    fn remember(&mut self, message: ChatMessage) {
        self.history.push_back(message);
        while self.history.len() > self.max_history_messages {
            self.history.pop_front();
        }
    }

    /// Answer one user message, running whatever operations the model asks for.
    pub async fn process_message(&mut self, text: &str) -> String {
        self.remember(ChatMessage::user(text));

        let mut input_list: Vec<Value> = self.history.iter().map(ChatMessage::to_json).collect();
        let instructions = prompts::system_prompt(self.document());

        let mut current_response = match self.model.chat(&instructions, &input_list, true).await {
            Ok(r) => r,
            Err(e) => {
                error!("LLM call failed: {:#}", e);
                return format!("❌ Error processing message: {}", e);
            }
        };

        let mut tool_round = 0;
        let mut last_result: Option<String> = None;

        while !current_response.tool_calls.is_empty() {
            tool_round += 1;
            if tool_round > self.max_tool_rounds {
                warn!("Hit max tool rounds ({}), stopping tool loop", self.max_tool_rounds);
                break;
            }

            // Append output to input_list
            input_list.extend(current_response.output.clone());

            for tc in &current_response.tool_calls {
                info!("Tool call: {} {}", tc.name, tc.arguments);
                let result = self.dispatcher.dispatch(&tc.name, &tc.arguments);
                input_list.push(json!({
                    "type": "function_call_output",
                    "call_id": &tc.call_id,
                    "name": &tc.name,
                    "output": &result,
                }));
                last_result = Some(result);
            }

            // Follow-up LLM call sees the updated state
            let instructions = prompts::system_prompt(self.document());
            current_response = match self.model.chat(&instructions, &input_list, true).await {
                Ok(r) => r,
                Err(e) => {
                    error!("LLM follow-up call failed: {:#}", e);
                    break;
                }
            };
        }

        let reply = current_response
            .text
            .filter(|t| !t.trim().is_empty())
            .or(last_result)
            .unwrap_or_else(|| "✅ Done.".to_string());

        self.remember(ChatMessage::assistant(reply.clone()));
        reply
    }
}
