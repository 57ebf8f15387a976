//! The closed set of templates the generator knows how to compile.
//!
//! # Examples
//!
//! ```
//! use oapigen::infrastructure::templates::TemplateName;
//! use std::str::FromStr;
//!
//! let template = TemplateName::from_str("route").unwrap();
//! assert_eq!(template, TemplateName::Route);
//! assert_eq!(template.as_str(), "route");
//! assert!(TemplateName::from_str("graphql").is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::core::error::Error;
use crate::generation::OutputStrategy;

/// Name of a template known to the template service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateName {
    /// zod schemas for components and operation requests/responses
    ZodOperationSchema,
    /// Versioned route registration for one operation
    Route,
    /// Request handler stub invoked by a generated route
    RouteHandlerFunction,
}

impl TemplateName {
    /// Every template, in registration order
    pub fn all() -> &'static [TemplateName] {
        &[
            TemplateName::ZodOperationSchema,
            TemplateName::Route,
            TemplateName::RouteHandlerFunction,
        ]
    }

    /// Every template name as accepted on the command line
    pub fn names() -> Vec<&'static str> {
        Self::all().iter().map(TemplateName::as_str).collect()
    }

    /// Returns the template identifier as a string slice
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZodOperationSchema => "zod_operation_schema",
            Self::Route => "route",
            Self::RouteHandlerFunction => "route_handler_function",
        }
    }

    /// File name of the template inside the template directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::ZodOperationSchema => "zod_operation_schema.ts.tera",
            Self::Route => "route.ts.tera",
            Self::RouteHandlerFunction => "route_handler_function.ts.tera",
        }
    }

    /// Whether the template renders a single operation rather than a document
    pub fn renders_operation(&self) -> bool {
        matches!(self, Self::Route | Self::RouteHandlerFunction)
    }

    /// Output strategy used when the configuration does not name one
    pub fn default_output_strategy(&self) -> OutputStrategy {
        if self.renders_operation() {
            OutputStrategy::PerOperation
        } else {
            OutputStrategy::SingleArtifact
        }
    }
}

impl FromStr for TemplateName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|template| template.as_str() == s)
            .ok_or_else(|| Error::UnknownTemplate(s.to_string()))
    }
}

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TemplateName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_every_name() {
        for template in TemplateName::all() {
            assert_eq!(
                TemplateName::from_str(template.as_str()).unwrap(),
                *template
            );
        }
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!(matches!(
            TemplateName::from_str("Route"),
            Err(Error::UnknownTemplate(name)) if name == "Route"
        ));
    }

    #[test]
    fn test_file_names_use_tera_suffix() {
        assert!(
            TemplateName::all()
                .iter()
                .all(|t| t.file_name().ends_with(".ts.tera"))
        );
    }

    #[test]
    fn test_operation_templates_default_to_per_operation() {
        assert_eq!(
            TemplateName::Route.default_output_strategy(),
            OutputStrategy::PerOperation
        );
        assert_eq!(
            TemplateName::RouteHandlerFunction.default_output_strategy(),
            OutputStrategy::PerOperation
        );
        assert_eq!(
            TemplateName::ZodOperationSchema.default_output_strategy(),
            OutputStrategy::SingleArtifact
        );
    }
}
