//! I/O primitives for relaying bytes between two endpoints.
//!
//! - [`Endpoint`] is the capability contract the relay needs from each side.
//! - [`StreamEndpoint`] implements it over any tokio stream.
//! - [`Relay`] wires two endpoints together with per-direction backpressure
//!   and coordinated teardown.

mod diag;
mod endpoint;
mod flow;
mod lifecycle;
mod relay;
mod stream;

pub use diag::{DiagnosticSink, Direction, RelayEvent, TracingSink};
pub use endpoint::Endpoint;
pub use lifecycle::{Termination, TerminationCause};
pub use relay::{FlowStats, NoOpMetrics, Relay, RelayBuilder, RelayMetrics, RelayReport};
pub use stream::StreamEndpoint;

pub use crate::error::Side;
