//! Tool catalogue validation.
//!
//! Runs once per session before the first request; nothing is sent to the
//! endpoint for a catalogue that fails here.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use super::declaration::{ToolChoice, ToolDeclaration, ToolSelectionPolicy};
use crate::error::ValidationError;

/// Pattern every tool name must match
pub const TOOL_NAME_PATTERN: &str = "^[a-zA-Z0-9_-]{1,64}$";

fn tool_name_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(TOOL_NAME_PATTERN).expect("tool name pattern is a valid regex"))
}

/// Check a name against [`TOOL_NAME_PATTERN`]
pub fn is_valid_tool_name(name: &str) -> bool {
    tool_name_regex().is_match(name)
}

/// Validate declarations and the selection policy.
///
/// The first violation wins. An absent policy is only an error when at
/// least one tool is declared.
pub fn validate(
    declarations: &[ToolDeclaration],
    policy: Option<&ToolSelectionPolicy>,
) -> Result<(), ValidationError> {
    debug!(tool_count = declarations.len(), "Validating tool catalogue");

    for declaration in declarations {
        validate_declaration(declaration)?;
    }

    match policy {
        Some(policy) => validate_policy(policy, declarations)?,
        None if !declarations.is_empty() => return Err(ValidationError::PolicyRequired),
        None => {}
    }

    debug!("Tool catalogue validation successful");
    Ok(())
}

/// Validate a single declaration: name, description, then schema
pub fn validate_declaration(declaration: &ToolDeclaration) -> Result<(), ValidationError> {
    if !is_valid_tool_name(&declaration.name) {
        return Err(ValidationError::InvalidToolName {
            name: declaration.name.clone(),
            pattern: TOOL_NAME_PATTERN.to_string(),
        });
    }

    if declaration.description.is_empty() {
        return Err(ValidationError::MissingDescription {
            tool_name: declaration.name.clone(),
        });
    }

    let schema = &declaration.input_schema;
    if schema.schema_type != "object" {
        return Err(ValidationError::SchemaNotObject {
            tool_name: declaration.name.clone(),
            found: schema.schema_type.clone(),
        });
    }
    if schema.properties.is_empty() {
        return Err(ValidationError::SchemaWithoutProperties {
            tool_name: declaration.name.clone(),
        });
    }

    Ok(())
}

fn validate_policy(
    policy: &ToolSelectionPolicy,
    declarations: &[ToolDeclaration],
) -> Result<(), ValidationError> {
    match &policy.choice {
        ToolChoice::Automatic | ToolChoice::None => Ok(()),
        ToolChoice::Forced { tool_name } if tool_name.is_empty() => {
            Err(ValidationError::ForcedWithoutName)
        }
        ToolChoice::Forced { tool_name } => {
            if !declarations.iter().any(|tool| &tool.name == tool_name) {
                warn!(tool = %tool_name, "Forced tool choice names a tool that is not declared");
            }
            Ok(())
        }
    }
}
