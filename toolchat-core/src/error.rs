//! Error handling for toolchat-core
//!
//! Every loop-fatal condition is a variant of [`ToolChatError`]. A tool
//! handler failing is deliberately absent: it is recorded in the transcript
//! as a `ToolResult` with `is_error` set and the endpoint gets to react to it.

use thiserror::Error;

/// Result type alias for toolchat operations
pub type Result<T> = std::result::Result<T, ToolChatError>;

/// Main error type for the toolchat-core library
#[derive(Debug, Error)]
pub enum ToolChatError {
    /// Tool catalogue or selection policy is malformed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The endpoint could not be reached or rejected the request
    #[error("Transport error (iteration {iteration}): {source}")]
    Transport {
        /// Tool cycles completed when the request failed
        iteration: usize,
        #[source]
        source: TransportError,
    },

    /// The endpoint broke the tool-use protocol
    #[error("Protocol violation (iteration {iteration}): {detail}")]
    ProtocolViolation {
        /// Tool cycles completed when the violation was seen
        iteration: usize,
        /// What went wrong
        detail: String,
    },

    /// Caller wiring is wrong, e.g. a tool without a handler
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The endpoint kept asking for tools past the configured bound
    #[error("Exceeded maximum number of tool call iterations ({max_iterations})")]
    IterationLimitExceeded {
        /// The configured bound
        max_iterations: usize,
    },

    /// The session was cancelled through its token
    #[error("Session cancelled (iteration {iteration})")]
    Cancelled {
        /// Tool cycles completed when cancellation was observed
        iteration: usize,
    },

    /// A turn could not be appended to the transcript
    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    /// The session already failed and accepts no more messages
    #[error("Session {session_id} is closed after a failure")]
    SessionClosed {
        /// Identifier of the closed session
        session_id: String,
    },

    /// Loop settings could not be loaded or are out of range
    #[error("Settings error: {0}")]
    Config(String),

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Catalogue and policy validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Tool name does not match `^[A-Za-z0-9_-]{1,64}$`
    #[error("invalid tool name format: '{name}' - must match {pattern}")]
    InvalidToolName {
        /// The offending name
        name: String,
        /// The pattern it must match
        pattern: String,
    },
    /// Tool has an empty description
    #[error("tool '{tool_name}' missing required field 'description'")]
    MissingDescription {
        /// The offending tool
        tool_name: String,
    },
    /// Input schema type is not `object`
    #[error("invalid input schema for tool '{tool_name}': field 'type' must be 'object', found '{found}'")]
    SchemaNotObject {
        /// The offending tool
        tool_name: String,
        /// The type that was declared
        found: String,
    },
    /// Input schema declares no properties
    #[error("invalid input schema for tool '{tool_name}': field 'properties' must define at least one property")]
    SchemaWithoutProperties {
        /// The offending tool
        tool_name: String,
    },
    /// Tools were declared without a selection policy
    #[error("policy required when tools present")]
    PolicyRequired,
    /// Forced policy without a tool name
    #[error("forced tool choice requires a tool name")]
    ForcedWithoutName,
    /// Policy tag not recognised
    #[error("unknown policy type: '{kind}'")]
    UnknownPolicyType {
        /// The tag that was supplied
        kind: String,
    },
}

/// Failures reported by the endpoint collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Endpoint unreachable
    #[error("connection to '{endpoint}' failed: {reason}")]
    ConnectionFailed {
        /// Endpoint address
        endpoint: String,
        /// Failure reason
        reason: String,
    },
    /// Endpoint answered with an error status
    #[error("request rejected with status {status}: {message}")]
    Rejected {
        /// Status code returned by the endpoint
        status: u16,
        /// Error body
        message: String,
    },
    /// Endpoint answered with something that could not be decoded
    #[error("response parsing failed: {details}")]
    MalformedResponse {
        /// Decoder message
        details: String,
    },
}

impl TransportError {
    /// Whether the collaborator could reasonably retry this request
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. } => true,
            TransportError::Rejected { status, .. } => *status == 429 || *status >= 500,
            TransportError::MalformedResponse { .. } => false,
        }
    }
}

/// Caller configuration bugs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The endpoint invoked a tool the registry does not know
    #[error("no handler for tool: {tool_name} (invocation {invocation_id})")]
    NoHandler {
        /// Requested tool
        tool_name: String,
        /// Invocation that asked for it
        invocation_id: String,
    },
    /// A declared tool has no registered handler
    #[error("no handler for tool: {tool_name} (declared but not registered)")]
    UnhandledDeclaration {
        /// Declared tool
        tool_name: String,
    },
}

/// Transcript invariant violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    /// A tool result refers to an invocation the transcript never saw
    #[error("tool result refers to unknown invocation '{invocation_id}'")]
    UnknownInvocation {
        /// The dangling reference
        invocation_id: String,
    },
    /// A turn without content
    #[error("cannot append an empty {role} turn")]
    EmptyTurn {
        /// Role of the rejected turn
        role: String,
    },
}

impl ToolChatError {
    /// Create a settings error with a message
    pub fn config<S: Into<String>>(message: S) -> Self {
        ToolChatError::Config(message.into())
    }

    /// Check if this error came from cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ToolChatError::Cancelled { .. })
    }

    /// Check if retrying the whole session could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            ToolChatError::Transport { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
