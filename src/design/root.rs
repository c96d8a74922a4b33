//! Design roots handed to plugins
//!
//! A pipeline run receives a list of roots produced by the design evaluator.
//! Plugins act on the roots they understand (HTTP designs) and pass over the
//! rest.

use std::path::Path;

use tracing::debug;

use crate::core::error::Result;
use crate::design::{HttpRoot, rules};

/// One evaluated design root
#[derive(Debug, Clone, PartialEq)]
pub enum Root {
    /// HTTP service design
    Http(HttpRoot),
    /// A root produced by another evaluator; plugins ignore it
    Opaque(String),
}

impl Root {
    pub fn as_http(&self) -> Option<&HttpRoot> {
        match self {
            Root::Http(root) => Some(root),
            Root::Opaque(_) => None,
        }
    }

    pub fn as_http_mut(&mut self) -> Option<&mut HttpRoot> {
        match self {
            Root::Http(root) => Some(root),
            Root::Opaque(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Root::Http(root) => &root.api.name,
            Root::Opaque(name) => name,
        }
    }
}

impl From<HttpRoot> for Root {
    fn from(root: HttpRoot) -> Self {
        Root::Http(root)
    }
}

/// HTTP roots among `roots`, in order
pub fn http_roots(roots: &[Root]) -> impl Iterator<Item = &HttpRoot> {
    roots.iter().filter_map(Root::as_http)
}

/// Mutable variant of [`http_roots`]
pub fn http_roots_mut(roots: &mut [Root]) -> impl Iterator<Item = &mut HttpRoot> {
    roots.iter_mut().filter_map(Root::as_http_mut)
}

impl HttpRoot {
    /// Parse and validate a design from YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        let root: HttpRoot = serde_yaml::from_str(text)?;
        rules::validate_design(&root)?;
        Ok(root)
    }
}

/// Load the design file at `path` as a list of roots
pub fn load_design(path: &Path) -> Result<Vec<Root>> {
    debug!(path = %path.display(), "Loading design");
    let text = std::fs::read_to_string(path)?;
    let root = HttpRoot::from_yaml(&text)?;
    debug!(
        api = %root.api.name,
        services = root.services.len(),
        "Design loaded"
    );
    Ok(vec![Root::Http(root)])
}
