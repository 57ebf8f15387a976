//! oapigen core library
//!
//! Configuration, error types and naming helpers shared by every stage of
//! the generator.

pub mod config;
pub mod error;
pub mod utils;

pub use config::{ConfigFile, GeneratorConfig};
pub use error::{Error, GenerationFailure, Result};
