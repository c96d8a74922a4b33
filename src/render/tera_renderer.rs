//! Tera-based section renderer

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value as JsonValue;
use tera::{Context, Tera};
use tracing::debug;

use crate::codegen::{File, Section, utils};
use crate::core::error::{Error, Result};
use crate::render::{Artifact, TemplateRenderer};

/// Renders sections with Tera, autoescaping disabled
#[derive(Debug, Clone, Default)]
pub struct TeraRenderer;

impl TeraRenderer {
    pub fn new() -> Self {
        Self
    }

    fn engine() -> Tera {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_filter("snake_case", string_filter(utils::to_snake_case));
        tera.register_filter("goify", string_filter(utils::goify));
        tera.register_filter("camel_case", string_filter(utils::to_camel_case));
        tera.register_filter("comment", string_filter(utils::comment));
        tera
    }

    /// Render a single section of the file at `path`
    pub fn render_section(&self, tera: &mut Tera, path: &str, section: &Section) -> Result<String> {
        let context = section_context(&section.data).map_err(|message| Error::Render {
            path: path.to_string(),
            section: section.name.clone(),
            message,
        })?;
        tera.render_str(&section.source, &context)
            .map_err(|e| Error::Render {
                path: path.to_string(),
                section: section.name.clone(),
                message: error_chain(&e),
            })
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render_file(&self, file: &File) -> Result<Artifact> {
        let mut tera = Self::engine();
        let mut content = String::new();
        for section in &file.sections {
            content.push_str(&self.render_section(&mut tera, file.path(), section)?);
        }
        debug!(path = %file.path(), sections = file.sections.len(), "Rendered file");
        Ok(Artifact {
            path: PathBuf::from(file.path()),
            content,
            permissions: None,
        })
    }
}

/// Object data becomes top level keys; anything else non-null is bound as `data`
fn section_context(data: &JsonValue) -> std::result::Result<Context, String> {
    match data {
        JsonValue::Null => Ok(Context::new()),
        JsonValue::Object(_) => Context::from_value(data.clone()).map_err(|e| e.to_string()),
        other => {
            let mut context = Context::new();
            context.insert("data", other);
            Ok(context)
        }
    }
}

fn string_filter(
    f: fn(&str) -> String,
) -> impl Fn(&tera::Value, &HashMap<String, tera::Value>) -> tera::Result<tera::Value> + Send + Sync {
    move |value, _args| match value.as_str() {
        Some(s) => Ok(tera::Value::String(f(s))),
        None => Err(tera::Error::msg(format!("expected a string, got {value}"))),
    }
}

fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{FileSet, ImportSpec, header};
    use serde_json::json;

    #[test]
    fn test_sections_render_in_order() {
        let file = File::new(
            "gen/calc/service.go",
            vec![
                header("calc service", "calc", vec![ImportSpec::new("context")]),
                Section::new("service", "type {{ name | goify }} interface{}\n")
                    .with_data(json!({"name": "calc_service"})),
            ],
        );
        let artifact = TeraRenderer::new().render_file(&file).unwrap();
        assert_eq!(artifact.path, PathBuf::from("gen/calc/service.go"));
        assert!(artifact.content.starts_with("// Code generated by layergen"));
        let pkg = artifact.content.find("package calc").unwrap();
        let import = artifact.content.find("\"context\"").unwrap();
        let iface = artifact.content.find("type CalcService interface{}").unwrap();
        assert!(pkg < import && import < iface);
    }

    #[test]
    fn test_scalar_data_bound_as_data() {
        let file = File::new(
            "README.md",
            vec![Section::new("title", "# {{ data }}").with_data(json!("calc"))],
        );
        let artifact = TeraRenderer::new().render_file(&file).unwrap();
        assert_eq!(artifact.content, "# calc");
    }

    #[test]
    fn test_no_autoescape_and_filters() {
        let file = File::new(
            "x.go",
            vec![
                Section::new("a", "{{ text }}|{{ name | snake_case }}|{{ name | camel_case }}")
                    .with_data(json!({"text": "<a & b>", "name": "AddPayload"})),
                Section::new("b", "\n{{ doc | comment }}").with_data(json!({"doc": "Add adds.\nTwo lines."})),
            ],
        );
        let artifact = TeraRenderer::new().render_file(&file).unwrap();
        assert_eq!(
            artifact.content,
            "<a & b>|add_payload|addPayload\n// Add adds.\n// Two lines."
        );
    }

    #[test]
    fn test_render_error_names_section() {
        let file = File::new("x.go", vec![Section::new("broken", "{% if %}")]);
        let err = TeraRenderer::new().render_file(&file).unwrap_err();
        assert!(matches!(err, Error::Render { path, section, .. } if path == "x.go" && section == "broken"));
    }

    #[test]
    fn test_render_set_keeps_file_order() {
        let files = FileSet::from_files(vec![
            File::new("b.txt", vec![Section::new("s", "b")]),
            File::new("a.txt", vec![Section::new("s", "a")]),
        ])
        .unwrap();
        let artifacts = TeraRenderer::new().render(&files).unwrap();
        let paths: Vec<_> = artifacts.iter().map(|a| a.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("b.txt"), PathBuf::from("a.txt")]);
    }
}
