//! File and section lookup
//!
//! The free functions never fail: a missing path or section name simply
//! yields nothing, and the caller decides whether absence matters. The
//! [`Locator`] wraps them with a [`Strictness`] policy so a pipeline can be
//! configured to fail fast when a plugin's target has disappeared upstream.

use tracing::{debug, warn};

use crate::codegen::{File, FileSet, Section};
use crate::core::error::{Error, Result};

/// What to do when a lookup or patch finds nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Skip the mutation silently (logged at warn level)
    #[default]
    Lenient,
    /// Turn the miss into an error
    Strict,
}

impl Strictness {
    pub fn from_flag(strict: bool) -> Self {
        if strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Strictness::Strict)
    }
}

/// Find a file by path
pub fn find_file<'a>(files: &'a FileSet, path: &str) -> Option<&'a File> {
    files.get(path)
}

/// Find a file by path for mutation
pub fn find_file_mut<'a>(files: &'a mut FileSet, path: &str) -> Option<&'a mut File> {
    files.get_mut(path)
}

/// Sections of `file` whose name satisfies `pred`; zero, one or many
pub fn find_sections<'a, P>(file: &'a File, pred: P) -> Vec<&'a Section>
where
    P: Fn(&str) -> bool,
{
    file.sections(pred)
}

/// Policy-aware lookup used by plugins
#[derive(Debug, Clone, Copy, Default)]
pub struct Locator {
    strictness: Strictness,
}

impl Locator {
    pub fn new(strictness: Strictness) -> Self {
        Self { strictness }
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Look up `path` for mutation.
    ///
    /// Lenient mode returns `Ok(None)` on a miss; strict mode returns
    /// [`Error::FileNotFound`].
    pub fn file_mut<'a>(&self, files: &'a mut FileSet, path: &str) -> Result<Option<&'a mut File>> {
        match find_file_mut(files, path) {
            Some(file) => {
                debug!(path = %path, "Located file");
                Ok(Some(file))
            }
            None if self.strictness.is_strict() => Err(Error::FileNotFound(path.to_string())),
            None => {
                warn!(path = %path, "File not found, skipping");
                Ok(None)
            }
        }
    }

    /// Sections of `file` named exactly `name`.
    ///
    /// An empty result is an error only in strict mode.
    pub fn sections_mut<'a>(&self, file: &'a mut File, name: &str) -> Result<Vec<&'a mut Section>> {
        let path = file.path().to_string();
        let found = file.sections_mut(|n| n == name);
        if found.is_empty() {
            if self.strictness.is_strict() {
                return Err(Error::SectionNotFound {
                    path,
                    name: name.to_string(),
                });
            }
            warn!(path = %path, section = %name, "Section not found, skipping");
        }
        Ok(found)
    }

    /// The header section of `file`
    pub fn header_mut<'a>(&self, file: &'a mut File) -> Result<Option<&'a mut Section>> {
        let path = file.path().to_string();
        match file.header_mut() {
            Some(header) => Ok(Some(header)),
            None if self.strictness.is_strict() => Err(Error::SectionNotFound {
                path,
                name: "source-header".to_string(),
            }),
            None => {
                warn!(path = %path, "File has no header section, skipping");
                Ok(None)
            }
        }
    }
}
