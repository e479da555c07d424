//! Endpoint integration and response types.
//!
//! The transport itself lives outside this crate; it plugs in through
//! [`ChatEndpoint`].

mod model_client;
mod types;

pub use model_client::{ChatEndpoint, EndpointRequest};
pub use types::{EndpointResponse, RequestUsage, SamplingConfig, StopSignal};
