#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod loader;
pub mod service;
pub mod store;
pub mod streaming;
pub mod telemetry;

pub use error::{Error, Result};
pub use service::MotorcycleService;
pub use store::MotorcycleStore;
