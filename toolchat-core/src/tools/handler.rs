//! Tool handlers: the caller-supplied code behind each declared tool.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde_json::Value;

use crate::cancellation::CancellationToken;

/// Error type handlers may fail with. Its `Display` text ends up in the transcript.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of one handler call
pub type HandlerResult = std::result::Result<String, HandlerError>;

/// Context handed to a handler for a single invocation
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Session running the loop
    pub session_id: String,
    /// Tool cycles completed before this batch
    pub iteration: usize,
    /// Identifier of the invocation being served
    pub invocation_id: String,
    /// Name of the invoked tool
    pub tool_name: String,
    /// Session cancellation token
    pub cancellation_token: CancellationToken,
}

impl ToolContext {
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}

/// Executable capability registered under a tool name
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool.
    ///
    /// `arguments` is passed through exactly as the endpoint produced it.
    /// An `Err` is not fatal for the session; it is reported back to the
    /// endpoint as an error result.
    async fn call(&self, ctx: &ToolContext, arguments: &Value) -> HandlerResult;
}

/// Type alias for async function that can back a handler
pub type AsyncHandlerFunction = Box<
    dyn Fn(ToolContext, Value) -> Pin<Box<dyn Future<Output = HandlerResult> + Send>> + Send + Sync,
>;

/// Wrap an async closure as a [`ToolHandler`].
///
/// # Example
///
/// ```rust
/// use toolchat_core::tools::{FunctionHandler, ToolContext, ToolHandler};
/// use toolchat_core::CancellationToken;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let handler = FunctionHandler::new(|_ctx, args| async move {
///     let location = args["location"].as_str().unwrap_or("nowhere").to_string();
///     Ok(format!("sunny in {}", location))
/// });
///
/// let ctx = ToolContext {
///     session_id: "doc".to_string(),
///     iteration: 0,
///     invocation_id: "toolu_1".to_string(),
///     tool_name: "get_weather".to_string(),
///     cancellation_token: CancellationToken::new(),
/// };
/// let output = handler.call(&ctx, &json!({"location": "Paris"})).await.unwrap();
/// assert_eq!(output, "sunny in Paris");
/// # });
/// ```
pub struct FunctionHandler {
    function: AsyncHandlerFunction,
}

impl FunctionHandler {
    pub fn new<F, Fut>(function: F) -> Self
    where
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            function: Box::new(move |ctx, args| Box::pin(function(ctx, args))),
        }
    }
}

impl std::fmt::Debug for FunctionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl ToolHandler for FunctionHandler {
    async fn call(&self, ctx: &ToolContext, arguments: &Value) -> HandlerResult {
        (self.function)(ctx.clone(), arguments.clone()).await
    }
}
