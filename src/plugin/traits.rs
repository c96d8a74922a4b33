//! Plugin capability set and the collaborators a pipeline run needs

use std::fmt;

use crate::codegen::{FileSet, Locator, Strictness};
use crate::core::error::Result;
use crate::design::Root;

/// Relative execution order of a plugin within its hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs in registration order
    Normal,
    /// Runs after every normal plugin of the hook
    Last,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Normal => write!(f, "normal"),
            Phase::Last => write!(f, "last"),
        }
    }
}

/// Per-run context handed to every callback
#[derive(Debug, Clone)]
pub struct GenContext {
    genpkg: String,
    strictness: Strictness,
}

impl GenContext {
    /// Create a lenient context for the generated package `genpkg`
    pub fn new(genpkg: impl Into<String>) -> Self {
        Self {
            genpkg: genpkg.into(),
            strictness: Strictness::Lenient,
        }
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Import path of the generated package root
    pub fn genpkg(&self) -> &str {
        &self.genpkg
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Locator honoring this run's miss policy
    pub fn locator(&self) -> Locator {
        Locator::new(self.strictness)
    }
}

/// A generation plugin.
///
/// `prepare` may mutate the design roots before any file exists; `generate`
/// receives the whole file set, and must hand it back with its additions and
/// modifications.
pub trait Plugin: Send + Sync {
    /// Plugin name
    fn name(&self) -> &str;

    /// Augment the design before generation
    fn prepare(&self, _ctx: &GenContext, _roots: &mut [Root]) -> Result<()> {
        Ok(())
    }

    /// Whether [`Plugin::prepare`] does anything
    fn has_prepare(&self) -> bool {
        false
    }

    /// Add or rewrite generated files
    fn generate(&self, ctx: &GenContext, roots: &[Root], files: FileSet) -> Result<FileSet>;
}

type PrepareFn = dyn Fn(&GenContext, &mut [Root]) -> Result<()> + Send + Sync;
type GenerateFn = dyn Fn(&GenContext, &[Root], FileSet) -> Result<FileSet> + Send + Sync;

/// Plugin assembled from closures
pub struct FnPlugin {
    name: String,
    prepare: Option<Box<PrepareFn>>,
    generate: Box<GenerateFn>,
}

impl FnPlugin {
    pub fn new<G>(name: impl Into<String>, generate: G) -> Self
    where
        G: Fn(&GenContext, &[Root], FileSet) -> Result<FileSet> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            prepare: None,
            generate: Box::new(generate),
        }
    }

    pub fn with_prepare<P>(mut self, prepare: P) -> Self
    where
        P: Fn(&GenContext, &mut [Root]) -> Result<()> + Send + Sync + 'static,
    {
        self.prepare = Some(Box::new(prepare));
        self
    }
}

impl fmt::Debug for FnPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPlugin")
            .field("name", &self.name)
            .field("prepare", &self.prepare.is_some())
            .finish()
    }
}

impl Plugin for FnPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&self, ctx: &GenContext, roots: &mut [Root]) -> Result<()> {
        match &self.prepare {
            Some(prepare) => prepare(ctx, roots),
            None => Ok(()),
        }
    }

    fn has_prepare(&self) -> bool {
        self.prepare.is_some()
    }

    fn generate(&self, ctx: &GenContext, roots: &[Root], files: FileSet) -> Result<FileSet> {
        (self.generate)(ctx, roots, files)
    }
}

/// Produces the base file set plugins build on
pub trait PrimaryGenerator {
    fn generate(&self, genpkg: &str, roots: &[Root]) -> Result<FileSet>;
}

impl<F> PrimaryGenerator for F
where
    F: Fn(&str, &[Root]) -> Result<FileSet>,
{
    fn generate(&self, genpkg: &str, roots: &[Root]) -> Result<FileSet> {
        self(genpkg, roots)
    }
}

/// A file set produced ahead of time by an external generator
impl PrimaryGenerator for FileSet {
    fn generate(&self, _genpkg: &str, _roots: &[Root]) -> Result<FileSet> {
        Ok(self.clone())
    }
}
