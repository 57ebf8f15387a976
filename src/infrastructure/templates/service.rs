//! Per-run template registry
//!
//! A [`TemplateService`] owns one tera instance holding the closed set of
//! templates, the shared partials and the helper filters. It is built once
//! per generation run and handed to every task explicitly.

use std::error::Error as StdError;
use std::path::Path;

use rust_embed::RustEmbed;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use super::helpers::register_helpers;
use super::kind::TemplateName;
use crate::core::error::{Error, Result};

/// Every file below `templates/`, compiled into the binary and keyed by its
/// path relative to that folder
#[derive(RustEmbed)]
#[folder = "templates/"]
pub struct EmbeddedTemplates;

/// Compiles generation contexts into source text
#[derive(Debug)]
pub struct TemplateService {
    tera: Tera,
}

impl TemplateService {
    /// Build a registry from the embedded templates, replacing any of them
    /// with a same-named file found in `template_dir`
    pub async fn new(template_dir: Option<&Path>) -> Result<Self> {
        let mut sources = Vec::new();
        for name in EmbeddedTemplates::iter() {
            let content = match template_dir {
                Some(dir) => load_override(dir, &name).await?,
                None => None,
            };
            let content = match content {
                Some(content) => content,
                None => embedded_source(&name)?,
            };
            sources.push((name.into_owned(), content));
        }

        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_templates(sources)?;
        register_helpers(&mut tera);

        Ok(Self { tera })
    }

    /// Render `template` against `context`
    pub fn compile<C: Serialize>(&self, template: TemplateName, context: &C) -> Result<String> {
        self.render(template.file_name(), context)
            .map_err(|message| Error::Render { template, message })
    }

    #[cfg(test)]
    fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    fn render<C: Serialize>(&self, name: &str, context: &C) -> std::result::Result<String, String> {
        let context = Context::from_serialize(context).map_err(|e| error_chain(&e))?;
        self.tera.render(name, &context).map_err(|e| error_chain(&e))
    }
}

fn embedded_source(name: &str) -> Result<String> {
    let file = EmbeddedTemplates::get(name).ok_or_else(|| {
        Error::Template(tera::Error::msg(format!(
            "Missing embedded template '{name}'"
        )))
    })?;
    String::from_utf8(file.data.into_owned()).map_err(|e| {
        Error::Template(tera::Error::msg(format!(
            "Embedded template '{name}' is not UTF-8: {e}"
        )))
    })
}

async fn load_override(dir: &Path, name: &str) -> Result<Option<String>> {
    let path = dir.join(name);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => {
            debug!(path = %path.display(), "Using template override");
            Ok(Some(content))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Tera nests the useful message in its source chain
fn error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
