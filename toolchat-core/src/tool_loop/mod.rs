//! The tool-calling loop.
//!
//! [`ChatSession`] sends the transcript to the endpoint, runs the tools it
//! asks for through the handler registry, feeds the results back, and stops
//! at the first response that does not request tools.

mod caller_loop;
mod dispatch;
mod extract;

pub use caller_loop::{run_session, ChatSession, SessionOutcome, SessionState};
pub use dispatch::{dispatch, TOOL_ERROR_PREFIX};
pub use extract::{extract_invocations, is_usable_invocation};
