//! Conversation transcript.
//!
//! An ordered, append-only list of [`Turn`]s owned by exactly one session.
//! Turns are never edited or removed once appended.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TranscriptError;

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(name)
    }
}

/// A request from the endpoint to run a named tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    /// Opaque structured arguments; `Null` means the endpoint sent none.
    #[serde(rename = "input", default)]
    pub arguments: Value,
}

/// Outcome of running one [`ToolInvocation`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    #[serde(rename = "tool_use_id")]
    pub invocation_id: String,
    #[serde(rename = "content")]
    pub payload: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

/// One piece of a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolInvocation(ToolInvocation),
    ToolResult(ToolResult),
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }

    pub fn invocation(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        ContentItem::ToolInvocation(ToolInvocation {
            id: id.into(),
            name: name.into(),
            arguments,
        })
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: Vec<ContentItem>,
}

impl Turn {
    pub fn new(role: Role, content: Vec<ContentItem>) -> Self {
        Self { role, content }
    }

    /// A user turn holding a single text item
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentItem::text(text)])
    }

    /// A user turn carrying the results of one tool batch
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self::new(
            Role::User,
            results.into_iter().map(ContentItem::ToolResult).collect(),
        )
    }

    /// Concatenation of every text item, in order
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                ContentItem::Text { text } => Some(text.as_str()),
                ContentItem::ToolInvocation(_) | ContentItem::ToolResult(_) => None,
            })
            .collect()
    }
}

/// Append-only conversation history
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    invocation_ids: HashSet<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn.
    ///
    /// Rejects empty turns and tool results whose `invocation_id` does not
    /// match an invocation from an earlier turn. The transcript is left
    /// unchanged on error.
    pub fn append(&mut self, turn: Turn) -> Result<(), TranscriptError> {
        if turn.content.is_empty() {
            return Err(TranscriptError::EmptyTurn {
                role: turn.role.to_string(),
            });
        }

        for item in &turn.content {
            if let ContentItem::ToolResult(result) = item {
                if !self.invocation_ids.contains(&result.invocation_id) {
                    return Err(TranscriptError::UnknownInvocation {
                        invocation_id: result.invocation_id.clone(),
                    });
                }
            }
        }

        for item in &turn.content {
            if let ContentItem::ToolInvocation(invocation) = item {
                self.invocation_ids.insert(invocation.id.clone());
            }
        }
        self.turns.push(turn);
        Ok(())
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    /// Every tool result recorded so far, oldest first
    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.turns.iter().flat_map(|turn| {
            turn.content.iter().filter_map(|item| match item {
                ContentItem::ToolResult(result) => Some(result),
                ContentItem::Text { .. } | ContentItem::ToolInvocation(_) => None,
            })
        })
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_for(id: &str) -> ToolResult {
        ToolResult {
            invocation_id: id.to_string(),
            payload: "ok".to_string(),
            is_error: false,
        }
    }

    #[test]
    fn test_append_keeps_order() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::user_text("hello")).unwrap();
        transcript
            .append(Turn::new(Role::Assistant, vec![ContentItem::text("hi")]))
            .unwrap();

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.turns()[0].role, Role::User);
        assert_eq!(transcript.last().unwrap().text(), "hi");
    }

    #[test]
    fn test_result_requires_prior_invocation() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::user_text("weather?")).unwrap();

        let err = transcript
            .append(Turn::tool_results(vec![result_for("toolu_1")]))
            .unwrap_err();
        assert_eq!(
            err,
            TranscriptError::UnknownInvocation {
                invocation_id: "toolu_1".to_string()
            }
        );
        assert_eq!(transcript.len(), 1);

        let call = ContentItem::invocation("toolu_1", "get_weather", json!({"location": "Paris"}));
        transcript
            .append(Turn::new(Role::Assistant, vec![call]))
            .unwrap();
        transcript
            .append(Turn::tool_results(vec![result_for("toolu_1")]))
            .unwrap();
        assert_eq!(transcript.tool_results().count(), 1);
    }

    #[test]
    fn test_empty_turn_rejected() {
        let mut transcript = Transcript::new();
        let err = transcript.append(Turn::new(Role::Assistant, vec![])).unwrap_err();
        assert!(matches!(err, TranscriptError::EmptyTurn { .. }));
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_content_item_wire_shape() {
        let item = ContentItem::invocation("toolu_9", "get_weather", json!({"location": "Paris"}));
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "tool_use");
        assert_eq!(value["input"]["location"], "Paris");

        let result = ContentItem::ToolResult(ToolResult {
            invocation_id: "toolu_9".to_string(),
            payload: "Error executing tool: boom".to_string(),
            is_error: true,
        });
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "tool_result");
        assert_eq!(value["tool_use_id"], "toolu_9");
        assert_eq!(value["is_error"], true);

        let missing_input: ContentItem =
            serde_json::from_value(json!({"type": "tool_use", "id": "a", "name": "b"})).unwrap();
        match missing_input {
            ContentItem::ToolInvocation(invocation) => assert!(invocation.arguments.is_null()),
            other => panic!("unexpected item: {:?}", other),
        }
    }
}
