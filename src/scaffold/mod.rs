//! Reference primary generator
//!
//! Emits a goa-shaped Go service layout from HTTP design roots: service
//! interface, endpoints, client, HTTP server and encoders under `gen/`, plus
//! an example `cmd/<server>/main.go` and service implementations at the root.
//! Every file is a list of sections with structured data, so plugins can
//! locate and rewrite them before rendering.

pub mod templates;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::codegen::utils::{goify, import_path, package_dir, to_camel_case};
use crate::codegen::{File, FileSet, ImportSpec, Section, header};
use crate::core::error::Result;
use crate::design::{
    AttributeExpr, EndpointExpr, HttpRoot, MethodExpr, Root, RouteExpr, SchemeExpr, ServerExpr,
    ServiceExpr, http_roots,
};
use crate::plugin::PrimaryGenerator;

use templates::*;

const GOA_PKG: &str = "goa.design/goa/v3/pkg";
const GOA_HTTP: &str = "goa.design/goa/v3/http";
const GOA_MIDDLEWARE: &str = "goa.design/goa/v3/http/middleware";
const GOA_SECURITY: &str = "goa.design/goa/v3/security";

/// Path of the generated service interface
pub fn service_path(service: &str) -> String {
    format!("gen/{}/service.go", package_dir(service))
}

pub fn endpoints_path(service: &str) -> String {
    format!("gen/{}/endpoints.go", package_dir(service))
}

pub fn client_path(service: &str) -> String {
    format!("gen/{}/client.go", package_dir(service))
}

pub fn server_path(service: &str) -> String {
    format!("gen/http/{}/server/server.go", package_dir(service))
}

pub fn encode_decode_path(service: &str) -> String {
    format!("gen/http/{}/server/encode_decode.go", package_dir(service))
}

/// Path of the example main for a server
pub fn main_path(server: &str) -> String {
    format!("cmd/{}/main.go", package_dir(server))
}

/// Path of the example service implementation
pub fn impl_path(service: &str) -> String {
    format!("{}.go", package_dir(service))
}

pub const AUTH_PATH: &str = "auth.go";

/// Go package of the API root, derived from the API name
pub fn api_pkg(root: &HttpRoot) -> String {
    package_dir(&root.api.name).replace('_', "")
}

/// Module path owning the generated package
fn module_path(genpkg: &str) -> &str {
    genpkg.strip_suffix("/gen").unwrap_or(genpkg)
}

#[derive(Debug, Clone, Serialize)]
struct MethodData {
    name: String,
    var_name: String,
    description: String,
    service_name: String,
    payload_ref: Option<String>,
    payload_type: Option<String>,
    payload_pointer: bool,
    result_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceData {
    name: String,
    pkg: String,
    var_name: String,
    camel: String,
    description: String,
    methods: Vec<MethodData>,
}

#[derive(Debug, Clone, Serialize)]
struct EndpointData {
    service_name: String,
    method: MethodData,
    routes: Vec<RouteExpr>,
    handler_init: String,
    request_decoder: String,
    response_encoder: String,
    status: u16,
}

#[derive(Debug, Clone, Serialize)]
struct FieldData {
    name: String,
    var_name: String,
    go_type: String,
    required: bool,
}

/// Go type of a design primitive
fn primitive(type_name: &str) -> Option<&'static str> {
    match type_name {
        "Boolean" => Some("bool"),
        "Int" => Some("int"),
        "Int32" => Some("int32"),
        "Int64" => Some("int64"),
        "UInt" => Some("uint"),
        "UInt32" => Some("uint32"),
        "UInt64" => Some("uint64"),
        "Float32" => Some("float32"),
        "Float64" => Some("float64"),
        "String" => Some("string"),
        "Bytes" => Some("[]byte"),
        "Any" => Some("any"),
        _ => None,
    }
}

/// Value type and reference of an attribute, qualified with `pkg` when set.
///
/// User types are passed by pointer; `Empty` has no Go representation.
fn type_ref(attr: Option<&AttributeExpr>, pkg: Option<&str>) -> Option<(String, String, bool)> {
    let attr = attr.filter(|a| !a.is_empty_type())?;
    if let Some(go) = primitive(&attr.type_name) {
        return Some((go.to_string(), go.to_string(), false));
    }
    let name = goify(&attr.type_name);
    let value = match pkg {
        Some(pkg) => format!("{pkg}.{name}"),
        None => name,
    };
    Some((value.clone(), format!("*{value}"), true))
}

fn method_data(service: &ServiceExpr, method: &MethodExpr, pkg: Option<&str>) -> MethodData {
    let payload = type_ref(method.payload.as_ref(), pkg);
    MethodData {
        name: method.name.clone(),
        var_name: goify(&method.name),
        description: method.description.clone(),
        service_name: service.name.clone(),
        payload_ref: payload.as_ref().map(|(_, r, _)| r.clone()),
        payload_type: payload.as_ref().map(|(t, _, _)| t.clone()),
        payload_pointer: payload.as_ref().is_some_and(|(_, _, p)| *p),
        result_ref: type_ref(method.result.as_ref(), pkg).map(|(_, r, _)| r),
    }
}

fn service_data(service: &ServiceExpr, pkg: Option<&str>) -> ServiceData {
    ServiceData {
        name: service.name.clone(),
        pkg: package_dir(&service.name),
        var_name: goify(&service.name),
        camel: to_camel_case(&service.name),
        description: service.description.clone(),
        methods: service
            .methods
            .iter()
            .map(|m| method_data(service, m, pkg))
            .collect(),
    }
}

fn endpoint_data(service: &ServiceExpr, endpoint: &EndpointExpr) -> Option<EndpointData> {
    let pkg = package_dir(&service.name);
    let method = service.method(&endpoint.method)?;
    let data = method_data(service, method, Some(&pkg));
    Some(EndpointData {
        service_name: service.name.clone(),
        handler_init: format!("New{}Handler", data.var_name),
        request_decoder: format!("Decode{}Request", data.var_name),
        response_encoder: format!("Encode{}Response", data.var_name),
        status: endpoint.responses.first().map(|r| r.status).unwrap_or(200),
        routes: endpoint.routes.clone(),
        method: data,
    })
}

/// Distinct user types used as payload or result by the service methods
fn user_types(service: &ServiceExpr) -> Vec<&AttributeExpr> {
    let mut types: Vec<&AttributeExpr> = Vec::new();
    for method in &service.methods {
        for attr in [method.payload.as_ref(), method.result.as_ref()].into_iter().flatten() {
            let is_user = !attr.is_empty_type() && primitive(&attr.type_name).is_none();
            if is_user && !types.iter().any(|t| t.type_name == attr.type_name) {
                types.push(attr);
            }
        }
    }
    types
}

fn user_type_section(service: &ServiceExpr, attr: &AttributeExpr) -> Section {
    let fields: Vec<FieldData> = attr
        .fields
        .iter()
        .map(|f| FieldData {
            name: f.name.clone(),
            var_name: goify(&f.name),
            go_type: match primitive(&f.type_name) {
                Some(go) if f.required => go.to_string(),
                Some(go) => format!("*{go}"),
                None => format!("*{}", goify(&f.type_name)),
            },
            required: f.required,
        })
        .collect();
    Section::new("service-user-type", USER_TYPE_T).with_data(json!({
        "name": goify(&attr.type_name),
        "service_name": service.name,
        "fields": fields,
    }))
}

/// Which part of the layout a run emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Everything
    #[default]
    All,
    /// Generated packages under `gen/`
    Gen,
    /// Example main, service implementations and auth functions
    Example,
}

/// Generates the reference Go layout
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaffoldGenerator {
    layout: Layout,
}

impl ScaffoldGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: Layout) -> Self {
        Self { layout }
    }

    /// Generator emitting the files owned by `hook`; unknown hooks get everything
    pub fn for_hook(hook: &str) -> Self {
        let layout = match hook {
            "gen" => Layout::Gen,
            "example" => Layout::Example,
            _ => Layout::All,
        };
        Self::with_layout(layout)
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    fn service_file(&self, service: &ServiceExpr) -> File {
        let data = service_data(service, None);
        let mut sections = vec![
            header(
                &format!("{} service", service.name),
                &data.pkg,
                vec![ImportSpec::new("context")],
            ),
            Section::new("service", SERVICE_T).with_data(json!(data)),
            Section::new("service-name", SERVICE_NAME_T).with_data(json!(data)),
        ];
        sections.extend(user_types(service).into_iter().map(|t| user_type_section(service, t)));
        File::new(service_path(&service.name), sections)
    }

    fn endpoints_file(&self, service: &ServiceExpr) -> File {
        let data = service_data(service, None);
        let mut sections = vec![
            header(
                &format!("{} endpoints", service.name),
                &data.pkg,
                vec![ImportSpec::new("context"), ImportSpec::aliased("goa", GOA_PKG)],
            ),
            Section::new("endpoints-struct", ENDPOINTS_STRUCT_T).with_data(json!(data)),
            Section::new("endpoints-init", ENDPOINTS_INIT_T).with_data(json!(data)),
            Section::new("endpoints-use", ENDPOINTS_USE_T).with_data(json!(data)),
        ];
        sections.extend(
            data.methods
                .iter()
                .map(|m| Section::new("endpoint-method", ENDPOINT_METHOD_T).with_data(json!(m))),
        );
        File::new(endpoints_path(&service.name), sections)
    }

    fn client_file(&self, service: &ServiceExpr) -> File {
        let data = service_data(service, None);
        let mut sections = vec![
            header(
                &format!("{} client", service.name),
                &data.pkg,
                vec![ImportSpec::new("context"), ImportSpec::aliased("goa", GOA_PKG)],
            ),
            Section::new("client-struct", CLIENT_STRUCT_T).with_data(json!(data)),
            Section::new("client-init", CLIENT_INIT_T).with_data(json!(data)),
        ];
        sections.extend(
            data.methods
                .iter()
                .map(|m| Section::new("client-method", CLIENT_METHOD_T).with_data(json!(m))),
        );
        File::new(client_path(&service.name), sections)
    }

    fn server_imports(&self, genpkg: &str, pkg: &str) -> Vec<ImportSpec> {
        vec![
            ImportSpec::new("context"),
            ImportSpec::new("net/http"),
            ImportSpec::aliased("goahttp", GOA_HTTP),
            ImportSpec::aliased("goa", GOA_PKG),
            ImportSpec::aliased(pkg, import_path(genpkg, &[pkg])),
        ]
    }

    fn server_file(&self, genpkg: &str, service: &ServiceExpr) -> File {
        let pkg = package_dir(&service.name);
        let endpoints: Vec<EndpointData> = service
            .endpoints
            .iter()
            .filter_map(|e| endpoint_data(service, e))
            .collect();
        let data = json!({
            "service_name": service.name,
            "pkg": pkg,
            "endpoints": endpoints,
        });

        let mut sections = vec![
            header(
                &format!("{} HTTP server", service.name),
                "server",
                self.server_imports(genpkg, &pkg),
            ),
            Section::new("server-struct", SERVER_STRUCT_T).with_data(data.clone()),
            Section::new("server-init", SERVER_INIT_T).with_data(data.clone()),
            Section::new("server-service", SERVER_SERVICE_T).with_data(data.clone()),
            Section::new("server-mount", SERVER_MOUNT_T).with_data(data),
        ];
        for endpoint in &endpoints {
            sections.push(Section::new("server-handler", SERVER_HANDLER_T).with_data(json!(endpoint)));
            sections.push(
                Section::new("server-handler-init", SERVER_HANDLER_INIT_T).with_data(json!(endpoint)),
            );
        }
        File::new(server_path(&service.name), sections)
    }

    fn encode_decode_file(&self, genpkg: &str, service: &ServiceExpr) -> File {
        let pkg = package_dir(&service.name);
        let mut sections = vec![header(
            &format!("{} HTTP server encoders and decoders", service.name),
            "server",
            self.server_imports(genpkg, &pkg),
        )];
        for endpoint in service.endpoints.iter().filter_map(|e| endpoint_data(service, e)) {
            sections.push(Section::new("response-encoder", RESPONSE_ENCODER_T).with_data(json!(endpoint)));
            if endpoint.method.payload_ref.is_some() {
                sections.push(
                    Section::new("request-decoder", REQUEST_DECODER_T).with_data(json!(endpoint)),
                );
            }
        }
        File::new(encode_decode_path(&service.name), sections)
    }

    fn main_file(&self, genpkg: &str, root: &HttpRoot, server: &ServerExpr) -> File {
        let api_pkg = api_pkg(root);
        let services: Vec<ServiceData> = server
            .services
            .iter()
            .filter_map(|name| root.service(name))
            .map(|svc| service_data(svc, None))
            .collect();

        let mut imports = [
            "context",
            "flag",
            "fmt",
            "log",
            "net/http",
            "os",
            "os/signal",
            "syscall",
            "time",
        ]
        .iter()
        .map(|p| ImportSpec::new(*p))
        .collect::<Vec<_>>();
        imports.push(ImportSpec::aliased("goahttp", GOA_HTTP));
        imports.push(ImportSpec::aliased("middleware", GOA_MIDDLEWARE));
        imports.push(ImportSpec::aliased(&api_pkg, module_path(genpkg)));
        for svc in &services {
            imports.push(ImportSpec::aliased(
                format!("{}svc", svc.pkg),
                import_path(genpkg, &[svc.pkg.as_str()]),
            ));
            imports.push(ImportSpec::aliased(
                format!("{}svr", svc.pkg),
                import_path(genpkg, &["http", svc.pkg.as_str(), "server"]),
            ));
        }

        let data = json!({
            "api_pkg": api_pkg,
            "server_name": server.name,
            "addr": server.listen_addr(),
            "services": services,
        });
        File::new(
            main_path(&server.name),
            vec![
                header("", "main", imports),
                Section::new("server-main", SERVER_MAIN_T).with_data(data),
                Section::new("error-handler", ERROR_HANDLER_T),
            ],
        )
    }

    fn impl_file(&self, genpkg: &str, root: &HttpRoot, service: &ServiceExpr) -> File {
        let alias = format!("{}svc", package_dir(&service.name));
        let data = service_data(service, Some(&alias));
        let imports = vec![
            ImportSpec::new("context"),
            ImportSpec::new("log"),
            ImportSpec::aliased(&alias, import_path(genpkg, &[data.pkg.as_str()])),
        ];
        let mut sections = vec![
            header("", &api_pkg(root), imports),
            Section::new("basic-service-struct", BASIC_SERVICE_STRUCT_T).with_data(json!(data)),
        ];
        for method in &data.methods {
            sections.push(
                Section::new("basic-endpoint", BASIC_ENDPOINT_T)
                    .with_data(json!({ "service": data, "method": method })),
            );
        }
        File::new(impl_path(&service.name), sections)
    }

    fn auth_file(&self, root: &HttpRoot, schemes: &[SchemeExpr]) -> File {
        let imports = vec![
            ImportSpec::new("context"),
            ImportSpec::new("fmt"),
            ImportSpec::aliased("security", GOA_SECURITY),
        ];
        let mut sections = vec![header("", &api_pkg(root), imports)];
        for service in &root.services {
            let data = service_data(service, None);
            for scheme in schemes {
                sections.push(
                    Section::new("security-authfuncs", AUTH_FUNC_T)
                        .with_data(json!({ "service": data, "scheme": scheme })),
                );
            }
        }
        File::new(AUTH_PATH, sections)
    }

    /// Files generated for one HTTP root
    pub fn root_files(&self, genpkg: &str, root: &HttpRoot) -> Result<FileSet> {
        let mut files = FileSet::new();
        if self.layout != Layout::Example {
            for service in &root.services {
                files.push(self.service_file(service))?;
                files.push(self.endpoints_file(service))?;
                files.push(self.client_file(service))?;
                files.push(self.server_file(genpkg, service))?;
                files.push(self.encode_decode_file(genpkg, service))?;
            }
        }
        if self.layout != Layout::Gen {
            for server in root.servers() {
                files.push(self.main_file(genpkg, root, &server))?;
            }
            for service in &root.services {
                files.push(self.impl_file(genpkg, root, service))?;
            }
            if !root.schemes.is_empty() {
                files.push(self.auth_file(root, &root.schemes))?;
            }
        }
        debug!(api = %root.api.name, files = files.len(), "Scaffolded root");
        Ok(files)
    }
}

impl PrimaryGenerator for ScaffoldGenerator {
    fn generate(&self, genpkg: &str, roots: &[Root]) -> Result<FileSet> {
        let mut files = FileSet::new();
        for root in http_roots(roots) {
            files.extend(self.root_files(genpkg, root)?)?;
        }
        info!(genpkg = %genpkg, layout = ?self.layout, files = files.len(), "Scaffold generation complete");
        Ok(files)
    }
}
