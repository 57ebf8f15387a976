//! oapigen - generates typed TypeScript artifacts from OpenAPI schema documents
//!
//! ```no_run
//! use oapigen::core::GeneratorConfig;
//! use oapigen::infrastructure::templates::TemplateName;
//!
//! # async fn run() -> oapigen::core::Result<()> {
//! let config = GeneratorConfig::new(
//!     ".",
//!     "./api/**/*.schema.yaml",
//!     TemplateName::ZodOperationSchema,
//! );
//! let summary = oapigen::generation::generate(&config).await?;
//! println!("wrote {} files", summary.written.len());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod core;
pub mod generation;
pub mod infrastructure;
