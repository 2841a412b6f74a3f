//! # Motorcycle resource model
//!
//! The types in this module are serialized verbatim onto the wire, so field
//! names and nesting are part of the public HTTP contract:
//!
//! ```json
//! {
//!   "id": "2",
//!   "make": "Suzuki",
//!   "model": "V-Strom 650",
//!   "specs": { "year": 2005, "colour": "black", "price": 15500.0 }
//! }
//! ```
//!
//! - [`MotorcycleId`] - Opaque string identifier, unique within a store.
//! - [`Motorcycle`] - The primary resource. Always owns its [`Specification`].
//! - [`Specification`] - Value object without identity of its own.
//! - [`ErrorBody`] - Payload of every non-2xx response.

use core::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

/// Identifier of a [`Motorcycle`].
///
/// Serialized as a bare JSON string and used directly as a path parameter,
/// e.g. `/motorcycle/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotorcycleId(String);

impl MotorcycleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MotorcycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MotorcycleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MotorcycleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<usize> for MotorcycleId {
    fn from(value: usize) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for MotorcycleId {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl AsRef<str> for MotorcycleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Technical data owned by a single [`Motorcycle`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub year: i32,
    pub colour: String,
    pub price: f64,
}

impl Specification {
    pub fn new(year: i32, colour: impl Into<String>, price: f64) -> Self {
        Self {
            year,
            colour: colour.into(),
            price,
        }
    }
}

/// A motorcycle record as stored by the server and returned to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Motorcycle {
    pub id: MotorcycleId,
    pub make: String,
    pub model: String,
    pub specs: Specification,
}

impl Motorcycle {
    pub fn new(
        id: impl Into<MotorcycleId>,
        make: impl Into<String>,
        model: impl Into<String>,
        specs: Specification,
    ) -> Self {
        Self {
            id: id.into(),
            make: make.into(),
            model: model.into(),
            specs,
        }
    }
}

/// JSON body attached to error responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
