#![doc = include_str!("../README.md")]

pub mod client;
pub mod composer;
pub mod config;
pub mod error;
pub mod telemetry;

pub use client::{MotorcycleClient, MotorcycleStream};
pub use composer::{Composer, Strategy, StrategyReport};
pub use error::{Error, Result};
