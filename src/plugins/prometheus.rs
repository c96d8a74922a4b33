//! Prometheus metrics endpoint
//!
//! Prepare adds a `metrics` method and a `GET /metrics` route to every HTTP
//! service, so the primary generator scaffolds the route for it. Generate then
//! mounts `promhttp.Handler()` on that route and hides the method everywhere
//! else: service interface, endpoints, client, handler constructors and
//! response encoders.

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::codegen::{
    FileSet, ImportSpec, Locator, PatchMode, RegexPatch, add_import, apply_patch,
};
use crate::core::error::Result;
use crate::design::{
    AttributeExpr, EndpointExpr, MethodExpr, ResponseExpr, Root, RouteExpr, ServiceExpr,
    http_roots, http_roots_mut,
};
use crate::plugin::{GenContext, Plugin};
use crate::scaffold;

pub const NAME: &str = "prometheus";

const METRICS: &str = "metrics";
const PROMHTTP: &str = "github.com/prometheus/client_golang/prometheus/promhttp";

const HANDLER_INIT: &str =
    "{{ e.method.var_name }}: {{ e.handler_init }}(e.{{ e.method.var_name }}, mux, dec, enc, eh),";

const SKIP_ENDPOINT: (&str, &str) = (r#"{% if method.name != "metrics" %}"#, "{% endif %}");
const SKIP_METHOD: (&str, &str) = (r#"{% if name != "metrics" %}"#, "{% endif %}");

pub struct Prometheus;

fn metrics_method() -> MethodExpr {
    MethodExpr {
        name: METRICS.to_string(),
        description: "Prometheus metrics endpoint.".to_string(),
        payload: Some(AttributeExpr::new("Empty")),
        result: Some(AttributeExpr::new("String")),
    }
}

fn metrics_endpoint() -> EndpointExpr {
    EndpointExpr {
        method: METRICS.to_string(),
        routes: vec![RouteExpr {
            verb: "GET".to_string(),
            path: "/metrics".to_string(),
        }],
        responses: vec![ResponseExpr {
            status: 200,
            body: Some("String".to_string()),
        }],
    }
}

/// Add the metrics method and route to `service`; a no-op when present
pub fn add_metrics_endpoint(service: &mut ServiceExpr) -> bool {
    let added_method = service.append_method(metrics_method());
    let added_endpoint = service.append_endpoint(metrics_endpoint());
    added_method || added_endpoint
}

fn is_metrics(item: &JsonValue) -> bool {
    item["name"] == METRICS
}

/// Drop the metrics method from the `methods` data of the named sections
fn hide_from_data(locator: &Locator, files: &mut FileSet, path: &str, names: &[&str]) -> Result<()> {
    let Some(file) = locator.file_mut(files, path)? else {
        return Ok(());
    };
    for name in names {
        for section in locator.sections_mut(file, name)? {
            let removed = section.retain_data_items("methods", |m| !is_metrics(m));
            debug!(path = %path, section = %name, removed, "Filtered metrics from section data");
        }
    }
    Ok(())
}

/// Wrap the sources of the named sections so they render nothing for metrics
fn hide_from_source(
    locator: &Locator,
    files: &mut FileSet,
    path: &str,
    name: &str,
    (prefix, suffix): (&str, &str),
) -> Result<()> {
    let Some(file) = locator.file_mut(files, path)? else {
        return Ok(());
    };
    for section in locator.sections_mut(file, name)? {
        section.wrap_source(prefix, suffix);
    }
    Ok(())
}

fn mount_handler(ctx: &GenContext, files: &mut FileSet, service: &str) -> Result<()> {
    let locator = ctx.locator();
    let path = scaffold::server_path(service);
    let Some(file) = locator.file_mut(files, &path)? else {
        return Ok(());
    };

    if let Some(header) = locator.header_mut(file)? {
        add_import(header, &ImportSpec::aliased("promhttp", PROMHTTP));
    }

    let patch = RegexPatch::literal(
        HANDLER_INIT,
        format!(
            r#"{{% if e.method.name == "{METRICS}" %}}{{{{ e.method.var_name }}}}: promhttp.Handler(),{{% else %}}{HANDLER_INIT}{{% endif %}}"#
        ),
        PatchMode::ReplaceFirst,
    )?;
    for section in locator.sections_mut(file, "server-init")? {
        apply_patch(section, &patch, ctx.strictness())?;
    }
    Ok(())
}

fn update_service(ctx: &GenContext, files: &mut FileSet, service: &str) -> Result<()> {
    let locator = ctx.locator();

    mount_handler(ctx, files, service)?;
    hide_from_source(
        &locator,
        files,
        &scaffold::server_path(service),
        "server-handler-init",
        SKIP_ENDPOINT,
    )?;
    hide_from_source(
        &locator,
        files,
        &scaffold::encode_decode_path(service),
        "response-encoder",
        SKIP_ENDPOINT,
    )?;

    hide_from_data(&locator, files, &scaffold::service_path(service), &["service"])?;
    hide_from_data(
        &locator,
        files,
        &scaffold::endpoints_path(service),
        &["endpoints-struct", "endpoints-init", "endpoints-use"],
    )?;
    hide_from_source(
        &locator,
        files,
        &scaffold::endpoints_path(service),
        "endpoint-method",
        SKIP_METHOD,
    )?;
    hide_from_data(
        &locator,
        files,
        &scaffold::client_path(service),
        &["client-struct", "client-init"],
    )?;
    hide_from_source(
        &locator,
        files,
        &scaffold::client_path(service),
        "client-method",
        SKIP_METHOD,
    )
}

impl Plugin for Prometheus {
    fn name(&self) -> &str {
        NAME
    }

    fn has_prepare(&self) -> bool {
        true
    }

    fn prepare(&self, _ctx: &GenContext, roots: &mut [Root]) -> Result<()> {
        for root in http_roots_mut(roots) {
            for service in &mut root.services {
                if add_metrics_endpoint(service) {
                    debug!(service = %service.name, "Added metrics endpoint");
                }
            }
        }
        Ok(())
    }

    fn generate(&self, ctx: &GenContext, roots: &[Root], mut files: FileSet) -> Result<FileSet> {
        for root in http_roots(roots) {
            let mut services: Vec<String> = Vec::new();
            for server in root.servers() {
                for service in server.services {
                    if !services.contains(&service) {
                        services.push(service);
                    }
                }
            }
            for service in &services {
                update_service(ctx, &mut files, service)?;
            }
        }
        Ok(files)
    }
}
