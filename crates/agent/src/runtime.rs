use std::sync::Arc;

use stayfinder_core::config::{AgentConfig, DEFAULT_SYSTEM_PROMPT};
use stayfinder_core::{ApplicationError, BookingDesk};
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::conversation::Conversation;
use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmError, ToolCallRequest};
use crate::tools::{ToolError, ToolRegistry, ToolSpec};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSettings {
    pub system_prompt: String,
    /// Completions that offer the tool schema per turn. Once this many tool
    /// rounds have run, the next completion is plain and its reply is final.
    pub max_tool_rounds: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self { system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(), max_tool_rounds: 1 }
    }
}

impl AgentSettings {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            system_prompt: config.system_prompt.clone(),
            max_tool_rounds: config.max_tool_rounds,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error(transparent)]
    Completion(#[from] LlmError),
    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl TurnError {
    pub fn into_application(self) -> ApplicationError {
        match self {
            Self::Completion(error) => ApplicationError::Integration(error.to_string()),
            Self::Tool(ToolError::Domain(error)) => ApplicationError::Domain(error),
            Self::Tool(error) => ApplicationError::InvalidInput(error.to_string()),
        }
    }
}

pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    specs: Vec<ToolSpec>,
    desk: BookingDesk,
    settings: AgentSettings,
}

impl AgentRuntime {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: ToolRegistry,
        desk: BookingDesk,
        settings: AgentSettings,
    ) -> Self {
        let specs = tools.specs();
        Self { llm, tools, specs, desk, settings }
    }

    pub fn desk(&self) -> &BookingDesk {
        &self.desk
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Runs one user turn to completion and returns the assistant's final
    /// text. On error the conversation keeps every message appended so far.
    pub async fn handle_turn(
        &mut self,
        conversation: &mut Conversation,
        user_text: &str,
    ) -> Result<String, TurnError> {
        let correlation_id = Uuid::new_v4().to_string();
        self.handle_correlated_turn(conversation, user_text, &correlation_id).await
    }

    /// Same as [`Self::handle_turn`] with a caller-supplied correlation id, so
    /// the caller can tie its own reporting to the turn's log events.
    pub async fn handle_correlated_turn(
        &mut self,
        conversation: &mut Conversation,
        user_text: &str,
        correlation_id: &str,
    ) -> Result<String, TurnError> {
        let span = info_span!("agent_turn", correlation_id = %correlation_id);
        self.run_turn(conversation, user_text).instrument(span).await
    }

    async fn run_turn(
        &mut self,
        conversation: &mut Conversation,
        user_text: &str,
    ) -> Result<String, TurnError> {
        conversation.begin_turn(&self.settings.system_prompt, user_text);
        info!(
            event_name = "agent.turn.started",
            history_len = conversation.len(),
            "agent turn started"
        );

        let mut rounds = 0u32;
        loop {
            let offer_tools = rounds < self.settings.max_tool_rounds;
            let request = if offer_tools {
                CompletionRequest::with_tools(conversation.messages(), &self.specs)
            } else {
                CompletionRequest::plain(conversation.messages())
            };

            let reply = self.llm.complete(request).await.map_err(|error| {
                warn!(event_name = "agent.completion.failed", error = %error, "completion failed");
                error
            })?;
            let content = reply.content.clone().unwrap_or_default();
            let tool_calls = if offer_tools { reply.tool_calls.clone() } else { Vec::new() };
            conversation.push(reply);

            if tool_calls.is_empty() {
                info!(
                    event_name = "agent.turn.completed",
                    tool_rounds = rounds,
                    history_len = conversation.len(),
                    "agent turn completed"
                );
                return Ok(content);
            }

            rounds += 1;
            debug!(
                event_name = "agent.tool_round.started",
                round = rounds,
                calls = tool_calls.len(),
                "executing tool calls"
            );
            for call in &tool_calls {
                let result = self.execute_call(call)?;
                conversation.push(ChatMessage::tool_result(call.id.clone(), result));
            }
        }
    }

    fn execute_call(&mut self, call: &ToolCallRequest) -> Result<String, TurnError> {
        info!(
            event_name = "agent.tool.invoked",
            tool_name = %call.function.name,
            tool_call_id = %call.id,
            "dispatching tool call"
        );

        match self.tools.dispatch(&mut self.desk, &call.function) {
            Ok(result) => {
                debug!(
                    event_name = "agent.tool.completed",
                    tool_name = %call.function.name,
                    tool_call_id = %call.id,
                    "tool call completed"
                );
                Ok(result.to_string())
            }
            Err(error) => {
                warn!(
                    event_name = "agent.tool.failed",
                    tool_name = %call.function.name,
                    tool_call_id = %call.id,
                    error = %error,
                    "tool call failed"
                );
                Err(error.into())
            }
        }
    }
}
