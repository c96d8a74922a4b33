//! Dockerfile for the example server

use serde_json::json;
use tracing::debug;

use crate::codegen::{File, FileSet, Section};
use crate::core::error::Result;
use crate::design::{HttpRoot, Root, http_roots};
use crate::plugin::{GenContext, Plugin};
use crate::plugins::company;

pub const NAME: &str = "dockerfile";

pub const DOCKERFILE_PATH: &str = "Dockerfile";

/// Builds the first declared server (or the default one) into a scratch image
pub struct Dockerfile {
    company: Option<String>,
}

impl Dockerfile {
    pub fn new(company: Option<String>) -> Self {
        Self { company }
    }

    fn dockerfile(&self, root: &HttpRoot) -> File {
        let server = root.primary_server();
        let ports = server
            .ports()
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let email = root.contact().map(|c| c.email.as_str()).unwrap_or_default();

        let data = json!({
            "api_name": root.api.name,
            "api_description": root.api.description,
            "api_version": root.api.version,
            "server_name": server.name,
            "company": company(self.company.as_deref(), root),
            "ports": ports,
            "contact_email": email,
        });
        File::new(
            DOCKERFILE_PATH,
            vec![Section::new("dockerfile", DOCKERFILE_T).with_data(data)],
        )
    }
}

impl Plugin for Dockerfile {
    fn name(&self) -> &str {
        NAME
    }

    fn generate(&self, _ctx: &GenContext, roots: &[Root], mut files: FileSet) -> Result<FileSet> {
        // One image per output tree
        if let Some(root) = http_roots(roots).next() {
            debug!(api = %root.api.name, "Generating Dockerfile");
            files.push(self.dockerfile(root))?;
        }
        Ok(files)
    }
}

const DOCKERFILE_T: &str = r#"# Dockerfile for {{ api_name }} micro-service
FROM golang:1.22-alpine AS builder

RUN apk add --no-cache git && \
    go version

COPY . /go/src/{{ company }}/{{ api_name }}

WORKDIR /go/src/{{ company }}/{{ api_name }}

RUN go mod download

RUN CGO_ENABLED=0 GOOS=linux GOARCH=amd64 go build -a -o ./{{ server_name }} ./cmd/{{ server_name }}

FROM scratch

ARG BUILD_DATE
ARG VCS_REF

LABEL org.label-schema.name="{{ api_name }}"
LABEL org.label-schema.description="{{ api_description }}"
LABEL org.label-schema.build-date=$BUILD_DATE
LABEL org.label-schema.vcs-ref=$VCS_REF
LABEL org.label-schema.vendor="{{ company }}"
LABEL org.label-schema.version="{{ api_version }}"
{%- if contact_email %}
LABEL maintainer="{{ contact_email }}"
{%- endif %}

WORKDIR /root/

COPY --from=builder /go/src/{{ company }}/{{ api_name }}/{{ server_name }} .
{% if ports %}
EXPOSE {{ ports }}
{%- endif %}
ENTRYPOINT ["./{{ server_name }}"]
"#;
