//! Mapping of generation contexts onto artifacts
//!
//! [`OutputStrategy::compile`] decides which templates run for a document
//! and where their output goes. Nothing is written here.

use std::path::Path;

use serde::Serialize;

use super::context::{ApiInfo, GenerationContext, Operation};
use super::paths::{generated_file_path, route_output_dir, types_import_path};
use super::types::{CompiledArtifact, OutputStrategy};
use crate::core::error::Result;
use crate::infrastructure::templates::{TemplateName, TemplateService};

/// Narrowed context of the per-operation templates
#[derive(Debug, Clone, Serialize)]
pub struct RouteContext<'a> {
    pub operation: &'a Operation,
    pub info: &'a ApiInfo,
    /// Module specifier of the document's bundle, relative to the route
    pub types_file_path: String,
    /// Module specifier of the request handler, relative to the route
    pub handler_module: String,
    /// Bundle types used to validate the request
    pub validation_types: Vec<String>,
    /// Every bundle type the operation owns
    pub imported_types: Vec<String>,
}

impl<'a> RouteContext<'a> {
    pub fn new(operation: &'a Operation, info: &'a ApiInfo, types_file_path: String) -> Self {
        let imported_types = operation.type_names();
        let validation_types = imported_types
            .iter()
            .filter(|name| !name.ends_with("Response"))
            .cloned()
            .collect();
        let handler_module = format!(
            "./{}",
            operation
                .handler_file_name()
                .strip_suffix(".ts")
                .unwrap_or_default()
        );

        Self {
            operation,
            info,
            types_file_path,
            handler_module,
            validation_types,
            imported_types,
        }
    }
}

impl OutputStrategy {
    /// Compile the artifacts of one document. An empty result means the
    /// document has nothing to generate.
    pub fn compile(
        &self,
        service: &TemplateService,
        template: TemplateName,
        context: &GenerationContext,
        source: &Path,
        root_dir: &Path,
    ) -> Result<Vec<CompiledArtifact>> {
        match self {
            Self::SingleArtifact => {
                if context.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(vec![CompiledArtifact {
                    path: generated_file_path(source),
                    content: service.compile(template, context)?,
                }])
            }
            Self::PerOperation => {
                let bundle = generated_file_path(source);
                let mut artifacts = Vec::with_capacity(context.operations.len() * 2);

                for operation in &context.operations {
                    let dir = route_output_dir(operation, source, root_dir);
                    let route = RouteContext::new(
                        operation,
                        &context.info,
                        types_import_path(&dir, &bundle),
                    );

                    artifacts.push(CompiledArtifact {
                        path: dir.join(operation.route_file_name()),
                        content: service.compile(TemplateName::Route, &route)?,
                    });
                    artifacts.push(CompiledArtifact {
                        path: dir.join(operation.handler_file_name()),
                        content: service.compile(TemplateName::RouteHandlerFunction, &route)?,
                    });
                }
                Ok(artifacts)
            }
        }
    }
}
