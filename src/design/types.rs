//! Design expressions describing an HTTP API
//!
//! This is the narrow view of a design tree that plugins read and augment.
//! It deserializes from YAML and can be mutated in place during the prepare
//! phase.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;
use url::Url;

/// Top level HTTP design root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRoot {
    pub api: ApiExpr,
    #[serde(default)]
    pub services: Vec<ServiceExpr>,
    /// Security schemes declared by the API
    #[serde(default)]
    pub schemes: Vec<SchemeExpr>,
}

/// API level metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiExpr {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub contact: Option<ContactExpr>,
    #[serde(default)]
    pub servers: Vec<ServerExpr>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactExpr {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub url: String,
}

/// A server hosting one or more services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerExpr {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Names of the services hosted by this server
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub hosts: Vec<HostExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostExpr {
    pub name: String,
    #[serde(default)]
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceExpr {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub methods: Vec<MethodExpr>,
    #[serde(default)]
    pub endpoints: Vec<EndpointExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodExpr {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub payload: Option<AttributeExpr>,
    #[serde(default)]
    pub result: Option<AttributeExpr>,
}

/// A payload or result type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeExpr {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub fields: Vec<FieldExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldExpr {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub example: Option<JsonValue>,
}

/// HTTP transport mapping of a method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointExpr {
    /// Name of the service method this endpoint exposes
    pub method: String,
    #[serde(default)]
    pub routes: Vec<RouteExpr>,
    #[serde(default)]
    pub responses: Vec<ResponseExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteExpr {
    pub verb: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseExpr {
    pub status: u16,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeExpr {
    pub name: String,
    /// Basic, APIKey, JWT or OAuth2
    #[serde(rename = "type")]
    pub kind: String,
}

impl AttributeExpr {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Required fields, in declaration order
    pub fn required(&self) -> impl Iterator<Item = &FieldExpr> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn find(&self, name: &str) -> Option<&FieldExpr> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_empty_type(&self) -> bool {
        self.type_name == "Empty"
    }
}

impl ApiExpr {
    /// Server used when the design declares none: hosts every service on
    /// `http://localhost:80`.
    pub fn default_server(&self, services: &[ServiceExpr]) -> ServerExpr {
        ServerExpr {
            name: self.name.clone(),
            description: "Default server".to_string(),
            services: services.iter().map(|s| s.name.clone()).collect(),
            hosts: vec![HostExpr {
                name: "localhost".to_string(),
                uris: vec!["http://localhost:80".to_string()],
            }],
        }
    }
}

impl ServerExpr {
    /// Ports of every host URI, in declaration order and without duplicates.
    ///
    /// A URI without an explicit port contributes its scheme's default port;
    /// unparsable URIs are skipped.
    pub fn ports(&self) -> Vec<u16> {
        let mut ports = Vec::new();
        for uri in self.hosts.iter().flat_map(|h| h.uris.iter()) {
            match Url::parse(uri) {
                Ok(url) => {
                    if let Some(port) = url.port_or_known_default() {
                        if !ports.contains(&port) {
                            ports.push(port);
                        }
                    }
                }
                Err(e) => warn!(server = %self.name, uri = %uri, error = %e, "Skipping invalid host URI"),
            }
        }
        ports
    }

    /// `host:port` of the first host URI, `localhost:80` when there is none
    pub fn listen_addr(&self) -> String {
        self.hosts
            .iter()
            .flat_map(|h| h.uris.iter())
            .find_map(|uri| {
                let url = Url::parse(uri).ok()?;
                Some(format!("{}:{}", url.host_str()?, url.port_or_known_default()?))
            })
            .unwrap_or_else(|| "localhost:80".to_string())
    }
}

impl ServiceExpr {
    pub fn method(&self, name: &str) -> Option<&MethodExpr> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn endpoint(&self, method: &str) -> Option<&EndpointExpr> {
        self.endpoints.iter().find(|e| e.method == method)
    }

    /// Append a method unless one with the same name exists.
    ///
    /// Returns true when the method was added.
    pub fn append_method(&mut self, method: MethodExpr) -> bool {
        if self.method(&method.name).is_some() {
            return false;
        }
        self.methods.push(method);
        true
    }

    /// Append an endpoint unless the method already has one.
    pub fn append_endpoint(&mut self, endpoint: EndpointExpr) -> bool {
        if self.endpoint(&endpoint.method).is_some() {
            return false;
        }
        self.endpoints.push(endpoint);
        true
    }
}

impl HttpRoot {
    pub fn service(&self, name: &str) -> Option<&ServiceExpr> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn service_mut(&mut self, name: &str) -> Option<&mut ServiceExpr> {
        self.services.iter_mut().find(|s| s.name == name)
    }

    /// Declared servers, or the default server when none is declared
    pub fn servers(&self) -> Vec<ServerExpr> {
        if self.api.servers.is_empty() {
            vec![self.api.default_server(&self.services)]
        } else {
            self.api.servers.clone()
        }
    }

    /// First declared server, or the default one
    pub fn primary_server(&self) -> ServerExpr {
        self.api
            .servers
            .first()
            .cloned()
            .unwrap_or_else(|| self.api.default_server(&self.services))
    }

    pub fn contact(&self) -> Option<&ContactExpr> {
        self.api.contact.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ServiceExpr {
        ServiceExpr {
            name: "calc".to_string(),
            description: String::new(),
            methods: vec![MethodExpr {
                name: "add".to_string(),
                description: "Add adds.".to_string(),
                payload: None,
                result: Some(AttributeExpr::new("Int")),
            }],
            endpoints: vec![EndpointExpr {
                method: "add".to_string(),
                routes: vec![RouteExpr {
                    verb: "GET".to_string(),
                    path: "/add/{a}/{b}".to_string(),
                }],
                responses: vec![],
            }],
        }
    }

    #[test]
    fn test_append_method_is_idempotent_by_name() {
        let mut svc = service();
        let metrics = MethodExpr {
            name: "metrics".to_string(),
            description: String::new(),
            payload: None,
            result: None,
        };
        assert!(svc.append_method(metrics.clone()));
        assert!(!svc.append_method(metrics));
        assert_eq!(svc.methods.len(), 2);
    }

    #[test]
    fn test_append_endpoint_skips_existing_method() {
        let mut svc = service();
        let dup = svc.endpoints[0].clone();
        assert!(!svc.append_endpoint(dup));
        assert_eq!(svc.endpoints.len(), 1);
    }

    #[test]
    fn test_default_server_when_none_declared() {
        let root = HttpRoot {
            api: ApiExpr {
                name: "calc".to_string(),
                title: None,
                description: String::new(),
                version: String::new(),
                contact: None,
                servers: vec![],
            },
            services: vec![service()],
            schemes: vec![],
        };
        let servers = root.servers();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].name, "calc");
        assert_eq!(servers[0].services, vec!["calc"]);
        assert_eq!(root.primary_server(), servers[0]);
        assert_eq!(servers[0].ports(), vec![80]);
        assert_eq!(servers[0].listen_addr(), "localhost:80");
    }

    #[test]
    fn test_server_ports() {
        let server = ServerExpr {
            name: "calcsvr".to_string(),
            description: String::new(),
            services: vec![],
            hosts: vec![
                HostExpr {
                    name: "dev".to_string(),
                    uris: vec![
                        "http://localhost:8000".to_string(),
                        "https://localhost".to_string(),
                        "not a uri".to_string(),
                    ],
                },
                HostExpr {
                    name: "prod".to_string(),
                    uris: vec!["http://calc.example.com:8000".to_string()],
                },
            ],
        };
        assert_eq!(server.ports(), vec![8000, 443]);
        assert_eq!(server.listen_addr(), "localhost:8000");
    }
}
