//! Handler registry.
//!
//! Built once by the caller and then shared read-only (usually behind an
//! `Arc`) by every session; the loop only ever looks handlers up by name.

use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "validation")]
use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::{debug, warn};

use super::declaration::ToolDeclaration;
use super::handler::{FunctionHandler, HandlerResult, ToolContext, ToolHandler};
use crate::error::ConfigurationError;

/// Name-keyed table of tool handlers
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    #[cfg(feature = "validation")]
    schemas: HashMap<String, JSONSchema>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one with the same name
    pub fn register<H>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: ToolHandler + 'static,
    {
        self.insert(name, Arc::new(handler));
        self
    }

    /// Register an async closure as a handler
    pub fn register_fn<F, Fut>(self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(name, FunctionHandler::new(function))
    }

    pub fn insert(&mut self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        let name = name.into();
        if self.handlers.insert(name.clone(), handler).is_some() {
            warn!(tool = %name, "Replacing previously registered handler");
        }
    }

    /// Compile the input schema of every declaration so arguments can be
    /// checked before a handler runs. Schemas that fail to compile are
    /// skipped with a warning.
    #[cfg(feature = "validation")]
    pub fn with_declarations(mut self, declarations: &[ToolDeclaration]) -> Self {
        for declaration in declarations {
            let schema = declaration.input_schema.to_value();
            match JSONSchema::compile(&schema) {
                Ok(compiled) => {
                    self.schemas.insert(declaration.name.clone(), compiled);
                }
                Err(e) => {
                    warn!(
                        tool = %declaration.name,
                        error = %e,
                        "Input schema does not compile; arguments will not be checked"
                    );
                }
            }
        }
        self
    }

    #[cfg(not(feature = "validation"))]
    pub fn with_declarations(self, _declarations: &[ToolDeclaration]) -> Self {
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Fail if any declared tool lacks a handler
    pub fn ensure_covers(
        &self,
        declarations: &[ToolDeclaration],
    ) -> Result<(), ConfigurationError> {
        for declaration in declarations {
            if !self.contains(&declaration.name) {
                return Err(ConfigurationError::UnhandledDeclaration {
                    tool_name: declaration.name.clone(),
                });
            }
        }
        debug!(tools = declarations.len(), "Every declared tool has a handler");
        Ok(())
    }

    /// Check arguments against the compiled schema of `name`, if one exists
    #[cfg(feature = "validation")]
    pub fn check_arguments(&self, name: &str, arguments: &Value) -> Result<(), String> {
        let Some(schema) = self.schemas.get(name) else {
            return Ok(());
        };
        if let Err(errors) = schema.validate(arguments) {
            let messages: Vec<String> = errors
                .map(|e| format!("{}: {}", e.instance_path, e))
                .collect();
            return Err(messages.join("; "));
        }
        Ok(())
    }

    /// Without the `validation` feature every argument value is accepted
    #[cfg(not(feature = "validation"))]
    pub fn check_arguments(&self, _name: &str, _arguments: &Value) -> Result<(), String> {
        Ok(())
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::InputSchema;
    use serde_json::json;

    fn weather() -> ToolDeclaration {
        ToolDeclaration::new(
            "get_weather",
            "Gets current weather",
            InputSchema::object().required_property("location", json!({"type": "string"})),
        )
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = HandlerRegistry::new()
            .register_fn("get_weather", |_ctx, _args| async { Ok("sunny".to_string()) })
            .register_fn("get_stock_price", |_ctx, _args| async { Ok("42".to_string()) });

        assert_eq!(registry.len(), 2);
        assert!(registry.get("get_weather").is_some());
        assert!(registry.get("SearchInternet").is_none());
        assert_eq!(registry.names(), vec!["get_stock_price", "get_weather"]);
    }

    #[test]
    fn test_ensure_covers() {
        let registry = HandlerRegistry::new();
        assert_eq!(
            registry.ensure_covers(&[weather()]),
            Err(ConfigurationError::UnhandledDeclaration {
                tool_name: "get_weather".to_string()
            })
        );

        let registry =
            registry.register_fn("get_weather", |_ctx, _args| async { Ok(String::new()) });
        assert!(registry.ensure_covers(&[weather()]).is_ok());
    }

    #[cfg(feature = "validation")]
    #[test]
    fn test_check_arguments_against_schema() {
        let registry = HandlerRegistry::new()
            .register_fn("get_weather", |_ctx, _args| async { Ok(String::new()) })
            .with_declarations(&[weather()]);

        assert!(registry.check_arguments("get_weather", &json!({"location": "Paris"})).is_ok());
        let err = registry
            .check_arguments("get_weather", &json!({"location": 7}))
            .unwrap_err();
        assert!(err.contains("location"));
        assert!(registry.check_arguments("unknown", &json!(null)).is_ok());
    }
}
