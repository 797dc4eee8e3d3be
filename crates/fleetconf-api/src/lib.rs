//! Wire contract and transport for remote mconfig builders.
//!
//! Builders are deployed independently of the configuration store and are
//! reached over HTTP. This crate owns everything that crosses that boundary:
//!
//! - **[`types`]**: JSON request/response shapes for the `Build` call.
//!   Opaque config blobs travel as base64 strings via [`Blob`].
//! - **[`BuilderClient`]**: async `reqwest` client for one builder endpoint.
//! - **[`Error`]**: transport-level failures. `fleetconf-core` translates
//!   these into domain errors; consumers never see raw HTTP details.

pub mod client;
pub mod error;
pub mod types;

pub use client::BuilderClient;
pub use error::Error;
pub use types::{
    Blob, BuildRequest, BuildResponse, ErrorBody, WireEdge, WireEntity, WireEntityId, WireGraph,
    WireNetwork,
};
