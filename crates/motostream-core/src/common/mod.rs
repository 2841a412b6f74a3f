//! Shared types and wire definitions used by both the server and the client.
//!
//! ## Submodules
//!
//! - [`types`] - The motorcycle resource model and its JSON shape.
//! - [`routes`] - Route patterns, path builders and content types.
//! - [`codec`] - Newline-delimited JSON framing for the stream endpoint.
//!
//! Nothing here depends on a runtime or an HTTP stack, so the client and the
//! server can agree on the contract without sharing transport code.

pub mod codec;
pub mod routes;
pub mod types;
