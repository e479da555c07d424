//! # toolchat-core
//!
//! A conversation loop between a remote chat endpoint and caller-supplied
//! tool handlers. The endpoint either answers or asks for tools to be run;
//! the loop runs them, reports the results back and repeats until it gets
//! a final answer.
//!
//! ## Features
//!
//! - **Validated catalogue**: tool names, descriptions, schemas and the
//!   tool-selection policy are checked before the first request
//! - **In-band tool failures**: a failing handler becomes an error result the
//!   endpoint can react to, not a session failure
//! - **Bounded**: a configurable cap on tool cycles per message
//! - **Cooperative cancellation** of both endpoint calls and handlers
//! - **Observability**: `tracing` spans and structured JSON events
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::json;
//! use toolchat_core::models::{
//!     ChatEndpoint, EndpointRequest, EndpointResponse, SamplingConfig, StopSignal,
//! };
//! use toolchat_core::tools::{HandlerRegistry, InputSchema, ToolDeclaration};
//! use toolchat_core::transcript::ContentItem;
//! use toolchat_core::{run_session, CancellationToken, LoopConfig, TransportError};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl ChatEndpoint for Echo {
//!     async fn send(
//!         &self,
//!         request: EndpointRequest<'_>,
//!     ) -> Result<EndpointResponse, TransportError> {
//!         let last = request.transcript.last().map(|turn| turn.text()).unwrap_or_default();
//!         Ok(EndpointResponse::new(vec![ContentItem::text(last)], StopSignal::EndOfTurn))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let weather = ToolDeclaration::new(
//!     "get_weather",
//!     "Gets current weather for a specified location",
//!     InputSchema::object().required_property("location", json!({"type": "string"})),
//! );
//! let registry = HandlerRegistry::new().register_fn("get_weather", |_ctx, _args| async {
//!     Ok("{\"temperature_c\":10}".to_string())
//! });
//!
//! let outcome = run_session(
//!     Echo,
//!     "hello",
//!     vec![weather],
//!     None,
//!     SamplingConfig::new("claude-3-5-sonnet-20241022", 1024),
//!     Arc::new(registry),
//!     LoopConfig::default(),
//!     &CancellationToken::new(),
//! )
//! .await
//! .unwrap();
//! assert_eq!(outcome.text(), "hello");
//! # });
//! ```

#![warn(clippy::all)]

// Error types (must be first for other modules to use)
pub mod error;

pub mod cancellation;
pub mod config;
pub mod logging;
pub mod models;
pub mod tool_loop;
pub mod tools;
pub mod transcript;

pub use cancellation::CancellationToken;
pub use config::LoopConfig;
pub use error::{
    ConfigurationError, Result, ToolChatError, TranscriptError, TransportError, ValidationError,
};
pub use models::{ChatEndpoint, EndpointRequest, EndpointResponse, SamplingConfig, StopSignal};
pub use tool_loop::{run_session, ChatSession, SessionOutcome, SessionState};
pub use tools::{HandlerRegistry, ToolCatalogue, ToolDeclaration, ToolSelectionPolicy};
pub use transcript::{ContentItem, Role, Transcript, Turn};

/// Current version of toolchat-core
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
