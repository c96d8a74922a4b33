//! README describing the API methods and endpoints

use serde_json::json;
use tracing::debug;

use crate::codegen::{File, FileSet, Section};
use crate::core::error::Result;
use crate::design::{HttpRoot, Root, http_roots};
use crate::plugin::{GenContext, Plugin};

pub const NAME: &str = "readme";

pub const README_PATH: &str = "README.md";

const API_T: &str = r#"
# {{ title }}{% if version %} (v{{ version }}){% endif %}

{{ description }}

The service exposes the following methods and endpoints:
"#;

const ENDPOINT_T: &str = r#"
| Method        | Verb          | Path         | Description      |
| ------------- |---------------|--------------|------------------|
| {{ method }}           | {{ verb }}           | {{ path }} | {{ description }} |
"#;

pub struct Readme;

/// API section followed by one row section per endpoint route
fn readme_sections(root: &HttpRoot) -> Vec<Section> {
    let api = &root.api;
    let mut sections = vec![Section::new("readme-api", API_T).with_data(json!({
        "title": api.title.as_deref().unwrap_or(&api.name),
        "version": api.version,
        "description": api.description,
    }))];

    for service in &root.services {
        for endpoint in &service.endpoints {
            let Some(method) = service.method(&endpoint.method) else {
                continue;
            };
            for route in &endpoint.routes {
                sections.push(Section::new("readme-endpoint", ENDPOINT_T).with_data(json!({
                    "service": service.name,
                    "method": method.name,
                    "verb": route.verb,
                    "path": route.path,
                    "description": method.description,
                })));
            }
        }
    }
    sections
}

impl Plugin for Readme {
    fn name(&self) -> &str {
        NAME
    }

    fn generate(&self, _ctx: &GenContext, roots: &[Root], mut files: FileSet) -> Result<FileSet> {
        for root in http_roots(roots) {
            let sections = readme_sections(root);
            debug!(api = %root.api.name, sections = sections.len(), "Generated README sections");
            match files.get_mut(README_PATH) {
                Some(file) => file.sections.extend(sections),
                None => files.push(File::new(README_PATH, sections))?,
            }
        }
        Ok(files)
    }
}
