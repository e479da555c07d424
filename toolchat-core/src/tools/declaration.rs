//! Tool declarations and the tool-selection policy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::validation;
use crate::error::{Result, ValidationError};

/// Input schema of a tool (a JSON Schema object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    /// The type of the input (must be "object")
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Property name to JSON Schema fragment
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    /// Required property names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl InputSchema {
    /// An empty `object` schema, to be filled with [`InputSchema::property`]
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn property(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn required_property(mut self, name: impl Into<String>, schema: Value) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.properties.insert(name, schema);
        self
    }

    /// The schema as a JSON value
    pub fn to_value(&self) -> Value {
        let mut schema = serde_json::Map::new();
        schema.insert("type".to_string(), Value::String(self.schema_type.clone()));
        schema.insert(
            "properties".to_string(),
            Value::Object(self.properties.clone().into_iter().collect()),
        );
        if !self.required.is_empty() {
            schema.insert(
                "required".to_string(),
                Value::Array(self.required.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(schema)
    }
}

/// A tool the endpoint may ask the caller to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

impl ToolDeclaration {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// How freely the endpoint may pick tools
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToolChoice {
    /// The endpoint decides
    #[default]
    Automatic,
    /// The endpoint must not call tools
    None,
    /// The endpoint must call this tool
    Forced { tool_name: String },
}

/// Tool choice plus the parallel-call switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WirePolicy", into = "WirePolicy")]
pub struct ToolSelectionPolicy {
    pub choice: ToolChoice,
    pub allow_parallel_calls: bool,
}

impl Default for ToolSelectionPolicy {
    fn default() -> Self {
        Self::automatic()
    }
}

impl ToolSelectionPolicy {
    pub fn automatic() -> Self {
        Self {
            choice: ToolChoice::Automatic,
            allow_parallel_calls: true,
        }
    }

    pub fn none() -> Self {
        Self {
            choice: ToolChoice::None,
            allow_parallel_calls: true,
        }
    }

    pub fn forced(tool_name: impl Into<String>) -> Self {
        Self {
            choice: ToolChoice::Forced {
                tool_name: tool_name.into(),
            },
            allow_parallel_calls: true,
        }
    }

    pub fn with_parallel_calls(mut self, allow: bool) -> Self {
        self.allow_parallel_calls = allow;
        self
    }

    /// Decode the tagged representation used by endpoints and settings files
    pub fn from_parts(
        kind: &str,
        name: Option<String>,
        disable_parallel_tool_use: bool,
    ) -> std::result::Result<Self, ValidationError> {
        let choice = match kind {
            "auto" => ToolChoice::Automatic,
            "none" => ToolChoice::None,
            "tool" => ToolChoice::Forced {
                tool_name: name.unwrap_or_default(),
            },
            other => {
                return Err(ValidationError::UnknownPolicyType {
                    kind: other.to_string(),
                })
            }
        };
        Ok(Self {
            choice,
            allow_parallel_calls: !disable_parallel_tool_use,
        })
    }

    /// The tag of this policy in its tagged representation
    pub fn kind(&self) -> &'static str {
        match self.choice {
            ToolChoice::Automatic => "auto",
            ToolChoice::None => "none",
            ToolChoice::Forced { .. } => "tool",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WirePolicy {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    disable_parallel_tool_use: bool,
}

impl TryFrom<WirePolicy> for ToolSelectionPolicy {
    type Error = ValidationError;

    fn try_from(wire: WirePolicy) -> std::result::Result<Self, Self::Error> {
        Self::from_parts(&wire.kind, wire.name, wire.disable_parallel_tool_use)
    }
}

impl From<ToolSelectionPolicy> for WirePolicy {
    fn from(policy: ToolSelectionPolicy) -> Self {
        let kind = policy.kind().to_string();
        let name = match policy.choice {
            ToolChoice::Forced { tool_name } => Some(tool_name),
            ToolChoice::Automatic | ToolChoice::None => None,
        };
        Self {
            kind,
            name,
            disable_parallel_tool_use: !policy.allow_parallel_calls,
        }
    }
}

/// Catalogue as read from JSON, policy tag not yet checked
#[derive(Deserialize)]
struct RawCatalogue {
    #[serde(default)]
    tools: Vec<ToolDeclaration>,
    #[serde(default)]
    tool_choice: Option<WirePolicy>,
}

/// Declarations plus the caller's policy, as shared by every session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCatalogue {
    #[serde(default)]
    pub tools: Vec<ToolDeclaration>,
    #[serde(default, rename = "tool_choice", skip_serializing_if = "Option::is_none")]
    pub policy: Option<ToolSelectionPolicy>,
}

impl ToolCatalogue {
    pub fn new(tools: Vec<ToolDeclaration>, policy: Option<ToolSelectionPolicy>) -> Self {
        Self { tools, policy }
    }

    /// Parse a catalogue from JSON, e.g. `{"tools": [...], "tool_choice": {"type": "auto"}}`.
    ///
    /// Malformed JSON is a `Serialization` error; an unrecognised policy tag
    /// is `ValidationError::UnknownPolicyType`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawCatalogue = serde_json::from_str(json)?;
        let policy = raw
            .tool_choice
            .map(ToolSelectionPolicy::try_from)
            .transpose()?;
        Ok(Self::new(raw.tools, policy))
    }

    /// Fill in `Automatic` when tools are declared without a policy
    pub fn with_default_policy(mut self) -> Self {
        if !self.tools.is_empty() && self.policy.is_none() {
            self.policy = Some(ToolSelectionPolicy::automatic());
        }
        self
    }

    /// Run the catalogue validator over this catalogue
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        validation::validate(&self.tools, self.policy.as_ref())
    }

    pub fn get(&self, name: &str) -> Option<&ToolDeclaration> {
        self.tools.iter().find(|tool| tool.name == name)
    }
}
