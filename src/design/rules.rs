//! Consistency rules for loaded designs

use std::collections::{HashMap, HashSet};

use crate::codegen::utils::package_dir;
use crate::core::error::{Error, Result};
use crate::design::HttpRoot;
use crate::scaffold;

/// Validates an API or service name
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::design(format!("{kind} name cannot be empty")));
    }

    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == ' ')
    {
        return Err(Error::design(format!(
            "{kind} name '{name}' must contain only alphanumeric characters, spaces, dashes, and underscores"
        )));
    }

    if name.starts_with(['-', '_', ' ']) {
        return Err(Error::design(format!(
            "{kind} name '{name}' cannot start with a dash, underscore or space"
        )));
    }

    Ok(())
}

/// Rejects two distinct names sharing a Go package directory
fn claim_package<'a>(claimed: &mut HashMap<String, &'a str>, kind: &str, name: &'a str) -> Result<()> {
    let dir = package_dir(name);
    if let Some(other) = claimed.get(&dir).filter(|other| **other != name) {
        return Err(Error::design(format!(
            "{kind}s '{other}' and '{name}' both map to package '{dir}'"
        )));
    }
    claimed.insert(dir, name);
    Ok(())
}

/// Checks the cross references of a design
pub fn validate_design(root: &HttpRoot) -> Result<()> {
    validate_name("API", &root.api.name)?;

    let mut service_names = HashSet::new();
    let mut service_dirs = HashMap::new();
    for svc in &root.services {
        validate_name("Service", &svc.name)?;
        if !service_names.insert(svc.name.as_str()) {
            return Err(Error::design(format!("duplicate service '{}'", svc.name)));
        }
        claim_package(&mut service_dirs, "service", &svc.name)?;
        if !root.schemes.is_empty() && scaffold::impl_path(&svc.name) == scaffold::AUTH_PATH {
            return Err(Error::design(format!(
                "service '{}' and the security schemes both generate '{}'",
                svc.name,
                scaffold::AUTH_PATH
            )));
        }

        let mut method_names = HashSet::new();
        for method in &svc.methods {
            validate_name("Method", &method.name)?;
            if !method_names.insert(method.name.as_str()) {
                return Err(Error::design(format!(
                    "duplicate method '{}' in service '{}'",
                    method.name, svc.name
                )));
            }
        }

        for endpoint in &svc.endpoints {
            if !method_names.contains(endpoint.method.as_str()) {
                return Err(Error::design(format!(
                    "endpoint refers to unknown method '{}' in service '{}'",
                    endpoint.method, svc.name
                )));
            }
            if let Some(route) = endpoint.routes.iter().find(|r| !r.path.starts_with('/')) {
                return Err(Error::design(format!(
                    "route path '{}' of {}.{} must start with '/'",
                    route.path, svc.name, endpoint.method
                )));
            }
        }
    }

    let mut server_dirs = HashMap::new();
    for server in &root.api.servers {
        validate_name("Server", &server.name)?;
        claim_package(&mut server_dirs, "server", &server.name)?;
        if let Some(unknown) = server
            .services
            .iter()
            .find(|s| !service_names.contains(s.as_str()))
        {
            return Err(Error::design(format!(
                "server '{}' hosts unknown service '{unknown}'",
                server.name
            )));
        }
    }

    Ok(())
}
