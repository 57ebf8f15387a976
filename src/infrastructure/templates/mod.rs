//! Template registry, template names and helper filters

pub mod helpers;
pub mod kind;
pub mod service;

pub use kind::TemplateName;
pub use service::TemplateService;
