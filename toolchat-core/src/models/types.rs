use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::transcript::{ContentItem, Role, Turn};

/// Why the endpoint stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopSignal {
    #[serde(rename = "tool_use")]
    ToolRequested,
    #[serde(rename = "end_turn")]
    EndOfTurn,
    #[serde(rename = "max_tokens")]
    MaxTokensReached,
    #[serde(rename = "stop_sequence")]
    StopSequenceHit,
}

impl StopSignal {
    pub fn is_tool_requested(self) -> bool {
        matches!(self, StopSignal::ToolRequested)
    }
}

/// Token usage reported for a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl AddAssign for RequestUsage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

/// Sampling parameters forwarded untouched to the endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub model: String,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// System prompt sent next to the transcript
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl SamplingConfig {
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            temperature: None,
            top_p: None,
            top_k: None,
            system: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// One answer from the endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub content: Vec<ContentItem>,
    #[serde(rename = "stop_reason")]
    pub stop_signal: StopSignal,
    #[serde(default)]
    pub usage: RequestUsage,
}

impl EndpointResponse {
    pub fn new(content: Vec<ContentItem>, stop_signal: StopSignal) -> Self {
        Self {
            id: String::new(),
            model: String::new(),
            content,
            stop_signal,
            usage: RequestUsage::default(),
        }
    }

    pub fn with_usage(mut self, input_tokens: u32, output_tokens: u32) -> Self {
        self.usage = RequestUsage {
            input_tokens,
            output_tokens,
        };
        self
    }

    /// The response as an assistant turn, content kept verbatim
    pub fn to_turn(&self) -> Turn {
        Turn::new(Role::Assistant, self.content.clone())
    }

    /// Concatenated text of the response
    pub fn text(&self) -> String {
        self.to_turn().text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_decodes_from_wire() {
        let response: EndpointResponse = serde_json::from_value(json!({
            "id": "msg_01",
            "model": "claude-3-5-sonnet-20241022",
            "content": [
                {"type": "text", "text": "Let me check. "},
                {
                    "type": "tool_use",
                    "id": "toolu_01",
                    "name": "get_weather",
                    "input": {"location": "Paris"}
                }
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 12, "output_tokens": 7}
        }))
        .unwrap();

        assert!(response.stop_signal.is_tool_requested());
        assert_eq!(response.text(), "Let me check. ");
        assert_eq!(response.usage.output_tokens, 7);
        assert_eq!(response.to_turn().role, Role::Assistant);
    }

    #[test]
    fn test_usage_accumulates() {
        let mut total = RequestUsage::default();
        total += RequestUsage { input_tokens: 3, output_tokens: 4 };
        total += RequestUsage { input_tokens: 1, output_tokens: 1 };
        assert_eq!(total, RequestUsage { input_tokens: 4, output_tokens: 5 });
    }
}
