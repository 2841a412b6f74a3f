//! Route patterns and content types of the HTTP surface.
//!
//! The `*_ROUTE` constants use the `{param}` capture syntax understood by the
//! server's router. Clients build concrete paths with [`motorcycle_path`] and
//! [`specification_path`].

use crate::types::MotorcycleId;

/// `GET` a single motorcycle as JSON.
pub const MOTORCYCLE_ROUTE: &str = "/motorcycle/{id}";

/// `GET` the specification of a single motorcycle as JSON.
pub const SPECIFICATION_ROUTE: &str = "/motorcycle/{id}/specification";

/// `GET` every motorcycle as a newline-delimited JSON stream.
pub const STREAM_ROUTE: &str = "/motorcycles/stream";

/// Content type of single-object responses.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type of the streaming endpoint. Each line of the body is one JSON
/// encoded [`Motorcycle`](crate::types::Motorcycle).
pub const STREAM_CONTENT_TYPE: &str = "application/json+stream";

pub fn motorcycle_path(id: &MotorcycleId) -> String {
    format!("/motorcycle/{id}")
}

pub fn specification_path(id: &MotorcycleId) -> String {
    format!("/motorcycle/{id}/specification")
}
