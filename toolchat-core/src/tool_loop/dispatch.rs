//! Handler dispatch.

use tracing::{debug, info, warn};

use crate::error::{ConfigurationError, Result, ToolChatError};
use crate::logging::{ToolCallEvent, EVENT_TARGET};
use crate::tools::{HandlerRegistry, ToolContext};
use crate::transcript::{ToolInvocation, ToolResult};

/// Prefix of every error payload written back to the endpoint
pub const TOOL_ERROR_PREFIX: &str = "Error executing tool: ";

/// Run one invocation and turn the outcome into a [`ToolResult`].
///
/// Handler failures and argument mismatches come back as `Ok` results with
/// `is_error` set. Only a missing handler or cancellation is an `Err`.
pub async fn dispatch(
    invocation: &ToolInvocation,
    registry: &HandlerRegistry,
    ctx: &ToolContext,
    check_arguments: bool,
) -> Result<ToolResult> {
    let handler = registry.get(&invocation.name).ok_or_else(|| {
        warn!(
            tool = %invocation.name,
            invocation_id = %invocation.id,
            "No handler registered for tool"
        );
        ToolChatError::Configuration(ConfigurationError::NoHandler {
            tool_name: invocation.name.clone(),
            invocation_id: invocation.id.clone(),
        })
    })?;

    if check_arguments {
        if let Err(reason) = registry.check_arguments(&invocation.name, &invocation.arguments) {
            debug!(tool = %invocation.name, %reason, "Arguments do not match input schema");
            return Ok(record(
                ctx,
                invocation,
                format!("{}invalid arguments: {}", TOOL_ERROR_PREFIX, reason),
                true,
            ));
        }
    }

    debug!(tool = %invocation.name, invocation_id = %invocation.id, "Executing tool");
    let outcome = ctx
        .cancellation_token
        .run_with_cancellation(handler.call(ctx, &invocation.arguments))
        .await
        .map_err(|_| ToolChatError::Cancelled {
            iteration: ctx.iteration,
        })?;

    let result = match outcome {
        Ok(output) => record(ctx, invocation, output, false),
        Err(e) => {
            warn!(
                tool = %invocation.name,
                invocation_id = %invocation.id,
                error = %e,
                "Tool execution failed"
            );
            record(ctx, invocation, format!("{}{}", TOOL_ERROR_PREFIX, e), true)
        }
    };
    Ok(result)
}

fn record(
    ctx: &ToolContext,
    invocation: &ToolInvocation,
    payload: String,
    is_error: bool,
) -> ToolResult {
    let event = ToolCallEvent::new(
        ctx.session_id.as_str(),
        invocation.name.as_str(),
        invocation.id.as_str(),
        invocation.arguments.clone(),
        payload.as_str(),
        is_error,
    );
    info!(target: EVENT_TARGET, "{}", event);

    ToolResult {
        invocation_id: invocation.id.clone(),
        payload,
        is_error,
    }
}
