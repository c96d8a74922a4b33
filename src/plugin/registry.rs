//! Plugin registry and pipeline execution
//!
//! Plugins register under a hook (a free-form stage name such as `gen` or
//! `example`) in one of two phases. Running a hook executes every prepare
//! callback of the hook, then the primary generator, then every generate
//! callback: normal-phase plugins in registration order followed by
//! last-phase plugins in registration order. The first error aborts the run
//! and no further callback executes.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info};

use crate::codegen::FileSet;
use crate::core::error::{Error, Result, Stage};
use crate::design::Root;
use crate::plugin::{FnPlugin, GenContext, Phase, Plugin, PrimaryGenerator};

struct Registration {
    hook: String,
    phase: Phase,
    plugin: Box<dyn Plugin>,
}

/// Describes a registered plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub name: String,
    pub hook: String,
    pub phase: Phase,
    pub has_prepare: bool,
}

/// Plugin registrations in registration order
#[derive(Default)]
pub struct Registry {
    registrations: Vec<Registration>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("plugins", &self.descriptors())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a normal-phase plugin under `hook`
    pub fn register(&mut self, hook: impl Into<String>, plugin: impl Plugin + 'static) -> &mut Self {
        self.register_boxed(hook.into(), Phase::Normal, Box::new(plugin))
    }

    /// Register a plugin that runs after every normal plugin of `hook`
    pub fn register_last(&mut self, hook: impl Into<String>, plugin: impl Plugin + 'static) -> &mut Self {
        self.register_boxed(hook.into(), Phase::Last, Box::new(plugin))
    }

    /// Register closures as a plugin
    pub fn register_fn<G>(
        &mut self,
        name: impl Into<String>,
        hook: impl Into<String>,
        phase: Phase,
        prepare: Option<Box<dyn Fn(&GenContext, &mut [Root]) -> Result<()> + Send + Sync>>,
        generate: G,
    ) -> &mut Self
    where
        G: Fn(&GenContext, &[Root], FileSet) -> Result<FileSet> + Send + Sync + 'static,
    {
        let mut plugin = FnPlugin::new(name, generate);
        if let Some(prepare) = prepare {
            plugin = plugin.with_prepare(prepare);
        }
        self.register_boxed(hook.into(), phase, Box::new(plugin))
    }

    pub fn register_boxed(&mut self, hook: String, phase: Phase, plugin: Box<dyn Plugin>) -> &mut Self {
        debug!(plugin = %plugin.name(), hook = %hook, phase = %phase, "Registering plugin");
        self.registrations.push(Registration { hook, phase, plugin });
        self
    }

    /// Registrations of `hook` in execution order
    fn ordered<'a>(&'a self, hook: &'a str) -> impl Iterator<Item = &'a Registration> + 'a {
        let in_phase = move |phase: Phase| {
            self.registrations
                .iter()
                .filter(move |r| r.hook == hook && r.phase == phase)
        };
        in_phase(Phase::Normal).chain(in_phase(Phase::Last))
    }

    /// Descriptors of the plugins registered under `hook`, in execution order
    pub fn plugins(&self, hook: &str) -> Vec<PluginDescriptor> {
        self.ordered(hook).map(Registration::descriptor).collect()
    }

    /// Every registration, in registration order
    pub fn descriptors(&self) -> Vec<PluginDescriptor> {
        self.registrations.iter().map(Registration::descriptor).collect()
    }

    /// Distinct hook names in first-registration order
    pub fn hooks(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.registrations
            .iter()
            .filter(|r| seen.insert(r.hook.as_str()))
            .map(|r| r.hook.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Run the prepare callbacks of `hook` in order
    pub fn prepare(&self, hook: &str, ctx: &GenContext, roots: &mut [Root]) -> Result<()> {
        for registration in self.ordered(hook) {
            let name = registration.plugin.name();
            debug!(plugin = %name, hook = %hook, "Running prepare");
            registration
                .plugin
                .prepare(ctx, roots)
                .map_err(|e| Error::plugin(name, Stage::Prepare, e))?;
        }
        Ok(())
    }

    /// Thread `files` through every generate callback of `hook`.
    ///
    /// Each callback owns the file set for the duration of its call. A
    /// callback that drops a file it received, or leaves two files sharing a
    /// path, aborts the run.
    pub fn generate(&self, hook: &str, ctx: &GenContext, roots: &[Root], files: FileSet) -> Result<FileSet> {
        let mut files = files;
        for registration in self.ordered(hook) {
            let name = registration.plugin.name();
            let before: Vec<String> = files.paths().into_iter().map(str::to_string).collect();
            info!(
                plugin = %name,
                hook = %hook,
                phase = %registration.phase,
                files = before.len(),
                "Running plugin"
            );

            files = registration
                .plugin
                .generate(ctx, roots, files)
                .map_err(|e| Error::plugin(name, Stage::Generate, e))?;

            if let Some(path) = before.iter().find(|p| !files.contains(p)) {
                return Err(Error::DroppedFile {
                    plugin: name.to_string(),
                    path: path.clone(),
                });
            }
            if let Some(path) = files.duplicate_path() {
                return Err(Error::plugin(name, Stage::Generate, Error::DuplicateFile(path.to_string())));
            }
            debug!(plugin = %name, added = files.len().saturating_sub(before.len()), "Plugin done");
        }
        Ok(files)
    }

    /// Prepare the roots, produce the base files, then run every generate
    /// callback of `hook`.
    pub fn run<G>(&self, hook: &str, ctx: &GenContext, roots: &mut [Root], primary: &G) -> Result<FileSet>
    where
        G: PrimaryGenerator + ?Sized,
    {
        self.prepare(hook, ctx, roots)?;
        let files = primary.generate(ctx.genpkg(), roots)?;
        info!(hook = %hook, files = files.len(), "Primary generation complete");
        self.generate(hook, ctx, roots, files)
    }
}

impl Registration {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor {
            name: self.plugin.name().to_string(),
            hook: self.hook.clone(),
            phase: self.phase,
            has_prepare: self.plugin.has_prepare(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::File;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, name: &str) -> FnPlugin {
        let gen_log = Arc::clone(log);
        let prep_log = Arc::clone(log);
        let gen_name = name.to_string();
        let prep_name = name.to_string();
        FnPlugin::new(name, move |_, _, files| {
            gen_log.lock().unwrap().push(format!("generate:{gen_name}"));
            Ok(files)
        })
        .with_prepare(move |_, _| {
            prep_log.lock().unwrap().push(format!("prepare:{prep_name}"));
            Ok(())
        })
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_last_phase_runs_after_normal_regardless_of_registration_order() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.register_last("example", recorder(&log, "dockerfile"));
        registry.register("example", recorder(&log, "readme"));
        registry.register_last("example", recorder(&log, "buildfile"));
        registry.register("example", recorder(&log, "apitests"));

        let ctx = GenContext::new("calc/gen");
        registry
            .generate("example", &ctx, &[], FileSet::new())
            .unwrap();

        assert_eq!(
            entries(&log),
            vec![
                "generate:readme",
                "generate:apitests",
                "generate:dockerfile",
                "generate:buildfile"
            ]
        );
    }

    #[test]
    fn test_all_prepares_complete_before_any_generate() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.register("gen", recorder(&log, "a"));
        registry.register_last("gen", recorder(&log, "b"));
        registry.register("gen", recorder(&log, "c"));

        let mut roots = vec![];
        let ctx = GenContext::new("calc/gen");
        let primary = |_: &str, _: &[Root]| -> Result<FileSet> { Ok(FileSet::new()) };
        registry.run("gen", &ctx, &mut roots, &primary).unwrap();

        assert_eq!(
            entries(&log),
            vec![
                "prepare:a",
                "prepare:c",
                "prepare:b",
                "generate:a",
                "generate:c",
                "generate:b"
            ]
        );
    }

    #[test]
    fn test_hooks_are_isolated() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.register("gen", recorder(&log, "prometheus"));
        registry.register("example", recorder(&log, "readme"));

        let ctx = GenContext::new("calc/gen");
        registry.generate("gen", &ctx, &[], FileSet::new()).unwrap();
        assert_eq!(entries(&log), vec!["generate:prometheus"]);
        assert_eq!(registry.hooks(), vec!["gen", "example"]);
    }

    #[test]
    fn test_generate_error_aborts_before_last_phase() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.register_last("example", recorder(&log, "dockerfile"));
        registry.register_fn("broken", "example", Phase::Normal, None, |_, _, _| {
            Err(Error::design("API has no servers"))
        });

        let ctx = GenContext::new("calc/gen");
        let err = registry
            .generate("example", &ctx, &[], FileSet::new())
            .unwrap_err();

        assert!(matches!(&err, Error::Plugin { plugin, stage: Stage::Generate, .. } if plugin == "broken"));
        assert!(err.to_string().contains("API has no servers"));
        assert!(entries(&log).is_empty());
    }

    #[test]
    fn test_prepare_error_aborts_whole_run() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.register("gen", recorder(&log, "a"));
        registry.register_fn(
            "bad",
            "gen",
            Phase::Normal,
            Some(Box::new(|_, _| Err(Error::design("bad root")))),
            |_, _, files| Ok(files),
        );

        let ctx = GenContext::new("calc/gen");
        let primary = |_: &str, _: &[Root]| -> Result<FileSet> { panic!("primary must not run") };
        let err = registry.run("gen", &ctx, &mut [], &primary).unwrap_err();
        assert!(matches!(err, Error::Plugin { stage: Stage::Prepare, .. }));
        assert_eq!(entries(&log), vec!["prepare:a"]);
    }

    #[test]
    fn test_dropping_a_file_aborts() {
        let mut registry = Registry::new();
        registry.register_fn("dropper", "gen", Phase::Normal, None, |_, _, _| Ok(FileSet::new()));

        let files = FileSet::from_files(vec![File::new("gen/calc/service.go", vec![])]).unwrap();
        let err = registry
            .generate("gen", &GenContext::new("calc/gen"), &[], files)
            .unwrap_err();
        assert!(matches!(err, Error::DroppedFile { plugin, path } if plugin == "dropper" && path == "gen/calc/service.go"));
    }

    #[test]
    fn test_duplicate_path_from_two_plugins_is_an_error() {
        let mut registry = Registry::new();
        for name in ["first", "second"] {
            registry.register_fn(name, "example", Phase::Normal, None, |_, _, mut files: FileSet| {
                files.push(File::new("README.md", vec![]))?;
                Ok(files)
            });
        }
        let err = registry
            .generate("example", &GenContext::new("calc/gen"), &[], FileSet::new())
            .unwrap_err();
        assert!(matches!(&err, Error::Plugin { plugin, source, .. }
            if plugin == "second" && matches!(**source, Error::DuplicateFile(_))));
    }

    #[test]
    fn test_replacing_a_file_with_a_taken_path_aborts() {
        let mut registry = Registry::new();
        registry.register_fn("renamer", "example", Phase::Normal, None, |_, _, mut files: FileSet| {
            files.push(File::new("README.md", vec![]))?;
            if let Some(file) = files.get_mut("README.md") {
                *file = File::new("calc.go", vec![]);
            }
            Ok(files)
        });

        let files = FileSet::from_files(vec![File::new("calc.go", vec![])]).unwrap();
        let err = registry
            .generate("example", &GenContext::new("calc/gen"), &[], files)
            .unwrap_err();
        assert!(matches!(&err, Error::Plugin { plugin, stage: Stage::Generate, source }
            if plugin == "renamer" && matches!(&**source, Error::DuplicateFile(path) if path == "calc.go")));
    }

    #[test]
    fn test_descriptors() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.register_last("example", recorder(&log, "dockerfile"));
        registry.register_fn("readme", "example", Phase::Normal, None, |_, _, files| Ok(files));

        let plugins = registry.plugins("example");
        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0].name, "readme");
        assert!(!plugins[0].has_prepare);
        assert_eq!(plugins[1].phase, Phase::Last);
        assert!(plugins[1].has_prepare);
    }
}
