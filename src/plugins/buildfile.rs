//! Makefile and .gitignore for the example server

use serde_json::json;

use crate::codegen::{File, FileSet, Section};
use crate::core::error::Result;
use crate::design::{Root, http_roots};
use crate::plugin::{GenContext, Plugin};
use crate::plugins::company;

pub const NAME: &str = "buildfile";

pub const GITIGNORE_PATH: &str = ".gitignore";
pub const MAKEFILE_PATH: &str = "Makefile";

const GITIGNORE_T: &str = "# ignore build folder\nbuild/\n";

const MAKEFILE_T: &str = r#"#! /usr/bin/make
#
# Makefile for {{ api_name }}
#
# Targets:
# - "server" builds the micro-service server
# - "client" builds the micro-service client
# - "docker" builds the micro-service docker image

server:
	go build -a -o ./build/{{ server_name }} ./cmd/{{ server_name }}

client:
	go build -a -o ./build/{{ server_name }}-cli ./cmd/{{ server_name }}-cli

docker:
	docker build -t "{{ company }}/{{ api_name }}:{{ api_version }}" .
"#;

pub struct Buildfile {
    company: Option<String>,
}

impl Buildfile {
    pub fn new(company: Option<String>) -> Self {
        Self { company }
    }
}

impl Plugin for Buildfile {
    fn name(&self) -> &str {
        NAME
    }

    fn generate(&self, _ctx: &GenContext, roots: &[Root], mut files: FileSet) -> Result<FileSet> {
        let Some(root) = http_roots(roots).next() else {
            return Ok(files);
        };
        let data = json!({
            "api_name": root.api.name,
            "api_version": root.api.version,
            "server_name": root.primary_server().name,
            "company": company(self.company.as_deref(), root),
        });
        files.push(File::new(
            GITIGNORE_PATH,
            vec![Section::new("gitignore", GITIGNORE_T)],
        ))?;
        files.push(File::new(
            MAKEFILE_PATH,
            vec![Section::new("buildfile", MAKEFILE_T).with_data(data)],
        ))?;
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::HttpRoot;
    use crate::render::{TemplateRenderer, TeraRenderer, apply_permissions};

    const DESIGN: &str = r#"
api:
  name: calc
  version: "2.1"
  servers:
    - { name: calcsvr, services: [calc] }
services:
  - name: calc
"#;

    #[test]
    fn test_makefile_targets() {
        let roots = vec![Root::Http(HttpRoot::from_yaml(DESIGN).unwrap())];
        let files = Buildfile::new(Some("acme".to_string()))
            .generate(&GenContext::new("calc/gen"), &roots, FileSet::new())
            .unwrap();
        assert_eq!(files.paths(), vec![GITIGNORE_PATH, MAKEFILE_PATH]);

        let mut artifacts = TeraRenderer::new().render(&files).unwrap();
        assert_eq!(artifacts[0].content, "# ignore build folder\nbuild/\n");
        assert!(artifacts[1].content.contains("go build -a -o ./build/calcsvr ./cmd/calcsvr"));
        assert!(artifacts[1].content.contains("docker build -t \"acme/calc:2.1\" ."));

        apply_permissions(&mut artifacts);
        assert_eq!(artifacts[1].permissions, Some(0o755));
    }

    #[test]
    fn test_no_http_root_generates_nothing() {
        let files = Buildfile::new(None)
            .generate(&GenContext::new("calc/gen"), &[], FileSet::new())
            .unwrap();
        assert!(files.is_empty());
    }
}
