//! Import tracking on header sections
//!
//! A header section keeps its imports as structured data (`imports` array of
//! `{path, name}` objects) rather than as text, so plugins can add imports
//! without re-parsing anything.

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::{debug, warn};

use crate::codegen::Section;

/// Name of the header section every generated source file starts with
pub const HEADER_SECTION: &str = "source-header";

const IMPORTS_KEY: &str = "imports";

/// A single import declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
        }
    }

    pub fn aliased(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: Some(name.into()),
        }
    }
}

/// Build a header section for a Go source file
pub fn header(title: &str, pkg: &str, imports: Vec<ImportSpec>) -> Section {
    Section::new(HEADER_SECTION, HEADER_T).with_data(json!({
        "title": title,
        "pkg": pkg,
        "imports": imports,
    }))
}

/// Imports currently recorded on `header`, in insertion order
pub fn imports(header: &Section) -> Vec<ImportSpec> {
    header
        .data
        .get(IMPORTS_KEY)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Add `spec` to the header's import list unless its path is already there.
///
/// Returns true when the import was appended. An existing entry for the same
/// path wins even if its alias differs; the conflict is logged. A header
/// whose data or import list has another shape is left untouched.
pub fn add_import(header: &mut Section, spec: &ImportSpec) -> bool {
    if header.data.is_null() {
        header.data = json!({});
    }
    let Some(obj) = header.data.as_object_mut() else {
        warn!(section = %header.name, path = %spec.path, "Header data is not an object, import not added");
        return false;
    };
    let entries = obj
        .entry(IMPORTS_KEY)
        .or_insert_with(|| JsonValue::Array(Vec::new()));
    let Some(list) = entries.as_array_mut() else {
        warn!(section = %header.name, path = %spec.path, "Header imports are not a list, import not added");
        return false;
    };

    if let Some(existing) = list.iter().find(|e| e["path"] == spec.path.as_str()) {
        let existing_name = existing.get("name").and_then(JsonValue::as_str);
        if existing_name != spec.name.as_deref() {
            warn!(
                section = %header.name,
                path = %spec.path,
                existing = ?existing_name,
                requested = ?spec.name,
                "Import already present with a different alias, keeping the existing one"
            );
        }
        return false;
    }

    debug!(section = %header.name, path = %spec.path, "Adding import");
    list.push(json!(spec));
    true
}

const HEADER_T: &str = r#"{%- if title %}// Code generated by layergen, DO NOT EDIT.
//
// {{ title }}
//
{% endif -%}
package {{ pkg }}
{% if imports | length > 0 %}
import (
{%- for imp in imports %}
	{% if imp.name %}{{ imp.name }} {% endif %}"{{ imp.path }}"
{%- endfor %}
)
{% endif %}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_header_records_imports_as_data() {
        let section = header(
            "calc service",
            "calcsvc",
            vec![ImportSpec::new("context"), ImportSpec::aliased("goa", "goa.design/goa")],
        );
        assert_eq!(section.name, HEADER_SECTION);
        assert_eq!(
            imports(&section),
            vec![ImportSpec::new("context"), ImportSpec::aliased("goa", "goa.design/goa")]
        );
    }

    #[test]
    fn test_add_import_is_idempotent() {
        let mut section = header("", "main", vec![]);
        let spec = ImportSpec::aliased("tracing", "calc/gen/tracing");
        assert!(add_import(&mut section, &spec));
        assert!(!add_import(&mut section, &spec));
        assert!(!add_import(&mut section, &spec));
        assert_eq!(imports(&section), vec![spec]);
    }

    #[test]
    fn test_add_import_preserves_insertion_order() {
        let mut section = header("", "main", vec![ImportSpec::new("fmt")]);
        add_import(&mut section, &ImportSpec::new("os"));
        add_import(&mut section, &ImportSpec::new("log"));
        let paths: Vec<String> = imports(&section).into_iter().map(|i| i.path).collect();
        assert_eq!(paths, vec!["fmt", "os", "log"]);
    }

    #[test]
    #[traced_test]
    fn test_same_path_different_alias_keeps_first() {
        let mut section = header("", "main", vec![]);
        assert!(add_import(&mut section, &ImportSpec::aliased("jaeger", "github.com/uber/jaeger-client-go")));
        assert!(!add_import(&mut section, &ImportSpec::aliased("jg", "github.com/uber/jaeger-client-go")));
        assert!(!add_import(&mut section, &ImportSpec::new("github.com/uber/jaeger-client-go")));
        assert_eq!(
            imports(&section),
            vec![ImportSpec::aliased("jaeger", "github.com/uber/jaeger-client-go")]
        );
        assert!(logs_contain("Import already present with a different alias"));
    }

    #[test]
    fn test_add_import_on_section_without_data() {
        let mut section = Section::new(HEADER_SECTION, "package x");
        assert!(add_import(&mut section, &ImportSpec::new("net/http")));
        assert_eq!(imports(&section), vec![ImportSpec::new("net/http")]);
    }

    #[test]
    #[traced_test]
    fn test_add_import_keeps_foreign_header_data() {
        let mut section = Section::new(HEADER_SECTION, "package {{ 0 }}").with_data(json!(["calc"]));
        assert!(!add_import(&mut section, &ImportSpec::new("net/http")));
        assert_eq!(section.data, json!(["calc"]));
        assert!(logs_contain("Header data is not an object"));

        let mut section = header("", "calc", vec![]);
        section.data["imports"] = json!("context");
        assert!(!add_import(&mut section, &ImportSpec::new("net/http")));
        assert_eq!(section.data["imports"], json!("context"));
    }
}
