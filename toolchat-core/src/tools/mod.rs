//! Tool system: declarations, catalogue validation and handlers.
//!
//! Declarations describe tools to the endpoint; handlers are the caller's
//! code behind them. The two meet in [`HandlerRegistry::ensure_covers`].

mod declaration;
mod handler;
mod registry;
pub mod validation;

pub use declaration::{InputSchema, ToolCatalogue, ToolChoice, ToolDeclaration, ToolSelectionPolicy};
pub use handler::{
    AsyncHandlerFunction, FunctionHandler, HandlerError, HandlerResult, ToolContext, ToolHandler,
};
pub use registry::HandlerRegistry;
pub use validation::{is_valid_tool_name, validate, TOOL_NAME_PATTERN};
