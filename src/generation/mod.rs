//! Generation domain module - turns schema documents into artifacts
//!
//! Documents are loaded and reduced to a [`GenerationContext`], an
//! [`OutputStrategy`] maps each context to compiled artifacts, and the
//! [`Generator`] writes them and runs post-processing. [`clear`] undoes a run.

pub mod cleanup;
pub mod context;
pub mod orchestrator;
pub mod paths;
pub mod strategy;
pub mod traits;
pub mod types;

pub use cleanup::clear;
pub use context::{ApiInfo, Component, GenerationContext, Import, Operation, RouteAccess};
pub use orchestrator::{Generator, generate};
pub use strategy::RouteContext;
pub use traits::*;
pub use types::*;
