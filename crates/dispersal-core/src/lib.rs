//! Core types and utilities for the habitat dispersal simulation.

pub mod types;
pub mod config;
pub mod error;
pub mod habitat;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use habitat::*;
