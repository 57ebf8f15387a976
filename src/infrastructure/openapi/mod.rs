//! OpenAPI document loading

pub mod file_loader;
pub mod resolver;
pub mod types;

pub use file_loader::{FileDocumentLoader, discover_sources};
pub use resolver::RefResolver;
pub use types::{SourceDocument, pointer_segment};
