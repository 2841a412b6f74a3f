//! HTTP-facing service logic.
//!
//! This module contains the motorcycle service and the route table that
//! exposes it. Handlers stay thin: they extract typed parameters, call the
//! service and map [`Error`](crate::error::Error) to a response.
//!
//! ## Structure
//!
//! - [`handler`] - Service entry point ([`MotorcycleService`]).
//! - [`routes`] - Explicit route table and the `serve` loop.

pub mod handler;
pub mod routes;

pub use handler::MotorcycleService;
pub use routes::{router, serve};
