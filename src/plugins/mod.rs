//! Built-in plugins
//!
//! Each plugin layers one concern onto the files of the reference generator
//! (or any generator emitting the same paths and section names).

pub mod apitests;
pub mod buildfile;
pub mod cors;
pub mod dockerfile;
pub mod jaegertracer;
pub mod opentracing;
pub mod prometheus;
pub mod readme;

pub use apitests::ApiTests;
pub use buildfile::Buildfile;
pub use cors::{Cors, CorsExample};
pub use dockerfile::Dockerfile;
pub use jaegertracer::JaegerTracer;
pub use opentracing::{OpenTracing, OpenTracingExample};
pub use prometheus::Prometheus;
pub use readme::Readme;

use tracing::debug;

use crate::core::config::PipelineConfig;
use crate::design::HttpRoot;
use crate::plugin::{Phase, Plugin, Registry};

/// Middleware block of the example main, up to its closing brace
pub(crate) const DEBUG_BLOCK: &str = r"\s+if\s\*dbg\s\{[^}]+\}[^}]+";

/// Built-in registrations in execution order: name, hook, phase
const BUILTINS: &[(&str, &str, Phase)] = &[
    (prometheus::NAME, "gen", Phase::Normal),
    (opentracing::NAME, "gen", Phase::Normal),
    (cors::NAME, "gen", Phase::Normal),
    (apitests::NAME, "example", Phase::Normal),
    (readme::NAME, "example", Phase::Normal),
    (opentracing::NAME, "example", Phase::Normal),
    (cors::NAME, "example", Phase::Normal),
    (dockerfile::NAME, "example", Phase::Last),
    (buildfile::NAME, "example", Phase::Last),
    (jaegertracer::NAME, "example", Phase::Last),
];

/// Names of the built-in plugins, without duplicates
pub fn builtin_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for (name, _, _) in BUILTINS {
        if !names.contains(name) {
            names.push(*name);
        }
    }
    names
}

fn builtin(config: &PipelineConfig, name: &str, hook: &str) -> Option<Box<dyn Plugin>> {
    let plugin: Box<dyn Plugin> = match (name, hook) {
        (prometheus::NAME, _) => Box::new(Prometheus),
        (opentracing::NAME, "gen") => Box::new(OpenTracing),
        (opentracing::NAME, _) => Box::new(OpenTracingExample),
        (cors::NAME, "gen") => Box::new(Cors::new(config.cors.clone())),
        (cors::NAME, _) => Box::new(CorsExample),
        (apitests::NAME, _) => Box::new(ApiTests),
        (readme::NAME, _) => Box::new(Readme),
        (dockerfile::NAME, _) => Box::new(Dockerfile::new(config.company.clone())),
        (buildfile::NAME, _) => Box::new(Buildfile::new(config.company.clone())),
        (jaegertracer::NAME, _) => Box::new(JaegerTracer),
        _ => return None,
    };
    Some(plugin)
}

/// Registry holding the built-in plugins enabled by `config`
pub fn builtin_registry(config: &PipelineConfig) -> Registry {
    let mut registry = Registry::new();
    for &(name, hook, phase) in BUILTINS {
        if !config.is_enabled(name) {
            debug!(plugin = %name, hook = %hook, "Plugin disabled by configuration");
            continue;
        }
        if let Some(plugin) = builtin(config, name, hook) {
            registry.register_boxed(hook.to_string(), phase, plugin);
        }
    }
    registry
}

/// Vendor name: configured value, else the lowercased contact name, else the API name
pub(crate) fn company(configured: Option<&str>, root: &HttpRoot) -> String {
    if let Some(company) = configured.filter(|c| !c.trim().is_empty()) {
        return company.to_string();
    }
    root.contact()
        .map(|c| c.name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-"))
        .unwrap_or_else(|| root.api.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        assert_eq!(
            builtin_names(),
            vec![
                "prometheus",
                "opentracing",
                "cors",
                "apitests",
                "readme",
                "dockerfile",
                "buildfile",
                "jaegertracer"
            ]
        );
    }

    #[test]
    fn test_builtin_registry_order() {
        let registry = builtin_registry(&PipelineConfig::default());
        assert_eq!(registry.hooks(), vec!["gen", "example"]);

        let gen_plugins: Vec<String> = registry.plugins("gen").into_iter().map(|d| d.name).collect();
        assert_eq!(gen_plugins, vec!["prometheus", "opentracing", "cors"]);

        let example = registry.plugins("example");
        let names: Vec<&str> = example.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["apitests", "readme", "opentracing", "cors", "dockerfile", "buildfile", "jaegertracer"]
        );
        assert_eq!(example[4].phase, Phase::Last);
        assert!(registry.plugins("gen")[0].has_prepare);
    }

    #[test]
    fn test_disabled_plugins_are_not_registered() {
        let config = PipelineConfig {
            plugins: Some(vec!["readme".to_string(), "cors".to_string()]),
            ..PipelineConfig::default()
        };
        let registry = builtin_registry(&config);
        let names: Vec<String> = registry.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["cors", "readme", "cors"]);
    }

    #[test]
    fn test_company_fallbacks() {
        let mut root = HttpRoot::from_yaml("api:\n  name: calc\n").unwrap();
        assert_eq!(company(Some("acme"), &root), "acme");
        assert_eq!(company(None, &root), "calc");
        root.api.contact = Some(crate::design::ContactExpr {
            name: "Wiser Skills".to_string(),
            ..Default::default()
        });
        assert_eq!(company(Some(" "), &root), "wiser-skills");
    }
}
