//! Endpoint collaborator trait.

use async_trait::async_trait;

use super::types::{EndpointResponse, SamplingConfig};
use crate::cancellation::CancellationToken;
use crate::error::TransportError;
use crate::tools::{ToolDeclaration, ToolSelectionPolicy};
use crate::transcript::Turn;

/// Everything the endpoint needs for one request
#[derive(Debug, Clone, Copy)]
pub struct EndpointRequest<'a> {
    /// Full transcript, oldest turn first
    pub transcript: &'a [Turn],
    /// Declared tools
    pub tools: &'a [ToolDeclaration],
    /// Active policy; `None` means leave the choice to the endpoint
    pub tool_choice: Option<&'a ToolSelectionPolicy>,
    /// Sampling parameters
    pub sampling: &'a SamplingConfig,
    /// Session cancellation token
    pub cancellation_token: &'a CancellationToken,
}

/// Remote generative-text endpoint.
///
/// Implementations own transport, request signing and wire encoding, and
/// any retry policy. The loop surfaces a returned error immediately.
#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    /// Send one request and wait for the full response.
    ///
    /// The loop abandons this future if the session is cancelled, so
    /// implementations should not rely on running to completion.
    async fn send(&self, request: EndpointRequest<'_>) -> Result<EndpointResponse, TransportError>;
}

#[async_trait]
impl<T> ChatEndpoint for std::sync::Arc<T>
where
    T: ChatEndpoint + ?Sized,
{
    async fn send(&self, request: EndpointRequest<'_>) -> Result<EndpointResponse, TransportError> {
        (**self).send(request).await
    }
}
