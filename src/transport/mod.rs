//! HTTP transport
//!
//! One typed GET against the configured base location and one binary
//! download per call. Both return to the caller immediately; I/O and
//! decoding run on the tokio runtime and outcomes are delivered through
//! `on_success` / `on_error` on whichever worker finished the request.
//!
//! Downloads are tracked in a [`RequestRegistry`] under a [`RequestHandle`]
//! so they can be cancelled. A cancelled download delivers nothing.

mod http;
pub mod registry;

pub use http::HttpTransport;
pub use registry::{InFlight, RequestHandle, RequestRegistry};
