//! Caller loop: drives request/response cycles between the endpoint and the
//! tool handlers until the endpoint stops asking for tools.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::dispatch::dispatch;
use super::extract::extract_invocations;
use crate::cancellation::CancellationToken;
use crate::config::LoopConfig;
use crate::error::{Result, ToolChatError};
use crate::logging::{LlmCallEvent, EVENT_TARGET};
use crate::models::{ChatEndpoint, EndpointRequest, EndpointResponse, RequestUsage, SamplingConfig};
use crate::tools::{
    HandlerRegistry, ToolCatalogue, ToolContext, ToolDeclaration, ToolSelectionPolicy,
};
use crate::transcript::{Transcript, Turn};

/// Where a session is in its request/response cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Waiting for the next user message
    AwaitingUserInput,
    /// A request is outstanding
    RequestSent,
    /// Tool invocations are being dispatched
    ToolsPending,
    /// The last message got a final answer
    Done,
    /// The session hit a fatal error and accepts no more messages
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Result of one user message
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    /// The final endpoint response
    pub response: EndpointResponse,
    /// Tool cycles run for this message
    pub iterations: usize,
    /// Tokens used by this message's requests
    pub usage: RequestUsage,
    /// Session that produced it
    pub session_id: String,
}

impl SessionOutcome {
    /// Text of the final answer
    pub fn text(&self) -> String {
        self.response.text()
    }
}

/// A conversation with one endpoint.
///
/// Owns its transcript exclusively. The catalogue and the handler registry
/// are shared read-only, so any number of sessions can run concurrently
/// against the same ones.
pub struct ChatSession<E: ChatEndpoint> {
    id: String,
    endpoint: E,
    catalogue: Arc<ToolCatalogue>,
    registry: Arc<HandlerRegistry>,
    sampling: SamplingConfig,
    config: LoopConfig,
    transcript: Transcript,
    state: SessionState,
    total_usage: RequestUsage,
    requests_sent: usize,
}

impl<E: ChatEndpoint> ChatSession<E> {
    /// Create a session.
    ///
    /// A catalogue with tools but no policy gets `Automatic`. The catalogue
    /// is validated and every declared tool must have a handler; nothing is
    /// sent to the endpoint when either check fails.
    pub fn new(
        endpoint: E,
        catalogue: Arc<ToolCatalogue>,
        registry: Arc<HandlerRegistry>,
        sampling: SamplingConfig,
        config: LoopConfig,
    ) -> Result<Self> {
        config.validate()?;

        let catalogue = if !catalogue.tools.is_empty() && catalogue.policy.is_none() {
            debug!("No tool choice supplied, defaulting to automatic");
            Arc::new((*catalogue).clone().with_default_policy())
        } else {
            catalogue
        };
        catalogue.validate()?;
        registry.ensure_covers(&catalogue.tools)?;

        let id = uuid::Uuid::new_v4().to_string();
        info!(
            session_id = %id,
            tools = catalogue.tools.len(),
            max_iterations = config.max_iterations,
            "Chat session created"
        );

        Ok(Self {
            id,
            endpoint,
            catalogue,
            registry,
            sampling,
            config,
            transcript: Transcript::new(),
            state: SessionState::AwaitingUserInput,
            total_usage: RequestUsage::default(),
            requests_sent: 0,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn catalogue(&self) -> &ToolCatalogue {
        &self.catalogue
    }

    /// Tokens used by every request of this session
    pub fn total_usage(&self) -> RequestUsage {
        self.total_usage
    }

    /// Requests that got a response from the endpoint
    pub fn requests_sent(&self) -> usize {
        self.requests_sent
    }

    /// Send a user message and run the tool loop until a final answer.
    ///
    /// Earlier turns stay in the transcript, so later messages continue the
    /// same conversation. Any error fails the session for good; the
    /// transcript keeps whatever was appended before the failure.
    pub async fn send(
        &mut self,
        user_message: impl Into<String>,
        cancellation_token: &CancellationToken,
    ) -> Result<SessionOutcome> {
        if self.state == SessionState::Failed {
            return Err(ToolChatError::SessionClosed {
                session_id: self.id.clone(),
            });
        }
        self.state = SessionState::AwaitingUserInput;

        let outcome = self.run_loop(user_message.into(), cancellation_token).await;
        match &outcome {
            Ok(result) => {
                self.state = SessionState::Done;
                info!(
                    session_id = %self.id,
                    iterations = result.iterations,
                    stop_reason = ?result.response.stop_signal,
                    "Tool interaction complete"
                );
            }
            Err(e) => {
                self.state = SessionState::Failed;
                warn!(session_id = %self.id, error = %e, "Session failed");
            }
        }
        outcome
    }

    async fn run_loop(
        &mut self,
        user_message: String,
        token: &CancellationToken,
    ) -> Result<SessionOutcome> {
        let original_policy: Option<ToolSelectionPolicy> = self.catalogue.policy.clone();
        let allow_parallel_calls = original_policy
            .as_ref()
            .map_or(true, |policy| policy.allow_parallel_calls);
        let mut active_policy = original_policy.clone();
        let mut iteration = 0usize;
        let mut usage = RequestUsage::default();

        self.transcript.append(Turn::user_text(user_message))?;

        loop {
            if iteration >= self.config.max_iterations {
                warn!(
                    session_id = %self.id,
                    iteration,
                    "Tool interaction loop exceeded maximum iterations"
                );
                return Err(ToolChatError::IterationLimitExceeded {
                    max_iterations: self.config.max_iterations,
                });
            }
            token
                .check_cancelled()
                .map_err(|_| ToolChatError::Cancelled { iteration })?;

            self.state = SessionState::RequestSent;
            debug!(
                session_id = %self.id,
                iteration,
                turns = self.transcript.len(),
                tool_choice = active_policy.as_ref().map(|p| p.kind()),
                "Sending request"
            );
            let request = EndpointRequest {
                transcript: self.transcript.turns(),
                tools: &self.catalogue.tools,
                tool_choice: active_policy.as_ref(),
                sampling: &self.sampling,
                cancellation_token: token,
            };
            let response = token
                .run_with_cancellation(self.endpoint.send(request))
                .await
                .map_err(|_| ToolChatError::Cancelled { iteration })?
                .map_err(|source| ToolChatError::Transport { iteration, source })?;

            self.requests_sent += 1;
            usage += response.usage;
            self.total_usage += response.usage;
            info!(
                target: EVENT_TARGET,
                "{}",
                LlmCallEvent::new(
                    self.id.as_str(),
                    iteration,
                    self.transcript.len(),
                    active_policy.as_ref().map(|p| p.kind()),
                    response.stop_signal,
                    response.usage,
                )
            );

            if !response.content.is_empty() {
                self.transcript.append(response.to_turn())?;
            }

            if !response.stop_signal.is_tool_requested() {
                return Ok(SessionOutcome {
                    response,
                    iterations: iteration,
                    usage,
                    session_id: self.id.clone(),
                });
            }

            self.state = SessionState::ToolsPending;
            let mut invocations = extract_invocations(&response);
            if invocations.is_empty() {
                return Err(ToolChatError::ProtocolViolation {
                    iteration,
                    detail: "tool use signaled but no valid invocation found".to_string(),
                });
            }
            if !allow_parallel_calls && invocations.len() > 1 {
                warn!(
                    session_id = %self.id,
                    received = invocations.len(),
                    "Multiple tool calls with parallel calls disabled, using only the first"
                );
                invocations.truncate(1);
            }

            let mut results = Vec::with_capacity(invocations.len());
            for invocation in &invocations {
                let ctx = ToolContext {
                    session_id: self.id.clone(),
                    iteration,
                    invocation_id: invocation.id.clone(),
                    tool_name: invocation.name.clone(),
                    cancellation_token: token.clone(),
                };
                let check = self.config.check_arguments;
                results.push(dispatch(invocation, &self.registry, &ctx, check).await?);
            }
            self.transcript.append(Turn::tool_results(results))?;

            // First tool turn frees the endpoint to answer; later ones restore the caller's choice.
            active_policy = if iteration == 0 {
                None
            } else {
                original_policy.clone()
            };
            iteration += 1;
        }
    }
}

impl<E: ChatEndpoint> fmt::Debug for ChatSession<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("turns", &self.transcript.len())
            .field("requests_sent", &self.requests_sent)
            .finish()
    }
}

/// One-shot session: validate, send `user_message`, return the final answer.
///
/// `policy` defaults to `Automatic` when tools are declared without one.
#[allow(clippy::too_many_arguments)]
pub async fn run_session<E: ChatEndpoint>(
    endpoint: E,
    user_message: impl Into<String>,
    declarations: Vec<ToolDeclaration>,
    policy: Option<ToolSelectionPolicy>,
    sampling: SamplingConfig,
    registry: Arc<HandlerRegistry>,
    config: LoopConfig,
    cancellation_token: &CancellationToken,
) -> Result<SessionOutcome> {
    let catalogue = Arc::new(ToolCatalogue::new(declarations, policy));
    let mut session = ChatSession::new(endpoint, catalogue, registry, sampling, config)?;
    session.send(user_message, cancellation_token).await
}
