//! Tool invocation extraction.

use tracing::debug;

use crate::models::EndpointResponse;
use crate::tools::is_valid_tool_name;
use crate::transcript::{ContentItem, ToolInvocation};

/// Collect the well-formed tool invocations of a response, in response order.
///
/// Malformed items are skipped, never reported. Whether an empty result is
/// acceptable is up to the caller.
pub fn extract_invocations(response: &EndpointResponse) -> Vec<ToolInvocation> {
    let invocations: Vec<ToolInvocation> = response
        .content
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            ContentItem::ToolInvocation(invocation) if is_usable_invocation(invocation) => {
                Some(invocation.clone())
            }
            ContentItem::ToolInvocation(invocation) => {
                debug!(
                    index,
                    id = %invocation.id,
                    name = %invocation.name,
                    "Skipping malformed tool invocation"
                );
                None
            }
            ContentItem::Text { .. } | ContentItem::ToolResult(_) => None,
        })
        .collect();

    debug!(count = invocations.len(), "Extracted tool invocations");
    invocations
}

/// An invocation is usable when it has an id, a valid tool name and
/// non-null arguments
pub fn is_usable_invocation(invocation: &ToolInvocation) -> bool {
    !invocation.id.is_empty()
        && !invocation.name.is_empty()
        && is_valid_tool_name(&invocation.name)
        && !invocation.arguments.is_null()
}
