//! Structured log events.
//!
//! Events are emitted through `tracing` on [`EVENT_TARGET`] and render as a
//! single JSON object, so a JSON subscriber can ship them as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{RequestUsage, StopSignal};

/// Target used for every structured event
pub const EVENT_TARGET: &str = "toolchat_core::events";

/// Event for logging endpoint calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub session_id: String,
    pub iteration: usize,
    pub turns_sent: usize,
    /// Tag of the active tool choice, absent when cleared
    pub tool_choice: Option<String>,
    pub stop_reason: StopSignal,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub timestamp: DateTime<Utc>,
}

impl LlmCallEvent {
    pub fn new(
        session_id: impl Into<String>,
        iteration: usize,
        turns_sent: usize,
        tool_choice: Option<&str>,
        stop_reason: StopSignal,
        usage: RequestUsage,
    ) -> Self {
        Self {
            event_type: "LLMCall".to_string(),
            session_id: session_id.into(),
            iteration,
            turns_sent,
            tool_choice: tool_choice.map(str::to_string),
            stop_reason,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            timestamp: Utc::now(),
        }
    }
}

impl std::fmt::Display for LlmCallEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "LlmCallEvent serialization error"),
        }
    }
}

/// Event for logging tool calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub session_id: String,
    pub tool_name: String,
    pub invocation_id: String,
    pub arguments: Value,
    pub result: String,
    pub is_error: bool,
    pub timestamp: DateTime<Utc>,
}

impl ToolCallEvent {
    pub fn new(
        session_id: impl Into<String>,
        tool_name: impl Into<String>,
        invocation_id: impl Into<String>,
        arguments: Value,
        result: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self {
            event_type: "ToolCall".to_string(),
            session_id: session_id.into(),
            tool_name: tool_name.into(),
            invocation_id: invocation_id.into(),
            arguments,
            result: result.into(),
            is_error,
            timestamp: Utc::now(),
        }
    }
}

impl std::fmt::Display for ToolCallEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "ToolCallEvent serialization error"),
        }
    }
}

/// Install a global `tracing` subscriber filtered by `filter`
/// (`RUST_LOG` syntax, e.g. `"toolchat_core=debug"`).
///
/// Fails if a global subscriber is already set.
#[cfg(feature = "logging")]
pub fn init_logging(filter: &str, json: bool) -> crate::Result<()> {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_new(filter).map_err(|e| {
        crate::ToolChatError::config(format!("invalid log filter '{}': {}", filter, e))
    })?;

    let result = if json {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .try_init()
    };

    result.map_err(|e| crate::ToolChatError::config(format!("failed to install subscriber: {}", e)))
}
