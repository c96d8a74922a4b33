//! Pattern-anchored rewriting of section template sources
//!
//! Patches run against a section's raw template text, before rendering. A
//! pattern that matches nothing leaves the source byte-identical; whether
//! that is acceptable is decided by the caller's [`Strictness`].

use regex::{NoExpand, Regex};
use tracing::{debug, warn};

use crate::codegen::{File, Section, Strictness};
use crate::core::error::{Error, Result};

/// How a matched span is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchMode {
    /// Replace every non-overlapping match
    ReplaceAll,
    /// Replace only the first match
    ReplaceFirst,
    /// Keep the first match and splice the replacement right after it
    InsertAfterFirst,
}

/// A source-to-source rewrite.
///
/// Returning `None` means the patcher found nothing to change.
pub trait Patcher {
    fn patch_source(&self, source: &str) -> Option<String>;

    /// Human readable anchor, used in logs and errors
    fn describe(&self) -> String;
}

/// Regex-anchored patch
#[derive(Debug, Clone)]
pub struct RegexPatch {
    pattern: Regex,
    replacement: String,
    mode: PatchMode,
}

impl RegexPatch {
    /// Compile `pattern`; the replacement is inserted literally, `$` included.
    pub fn new(pattern: &str, replacement: impl Into<String>, mode: PatchMode) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
            mode,
        })
    }

    /// Patch anchored on an exact piece of text
    pub fn literal(text: &str, replacement: impl Into<String>, mode: PatchMode) -> Result<Self> {
        Self::new(&regex::escape(text), replacement, mode)
    }

    pub fn mode(&self) -> PatchMode {
        self.mode
    }
}

impl Patcher for RegexPatch {
    fn patch_source(&self, source: &str) -> Option<String> {
        let first = self.pattern.find(source)?;
        let patched = match self.mode {
            PatchMode::ReplaceAll => self
                .pattern
                .replace_all(source, NoExpand(&self.replacement))
                .into_owned(),
            PatchMode::ReplaceFirst => {
                let mut out = String::with_capacity(source.len() + self.replacement.len());
                out.push_str(&source[..first.start()]);
                out.push_str(&self.replacement);
                out.push_str(&source[first.end()..]);
                out
            }
            PatchMode::InsertAfterFirst => {
                let mut out = String::with_capacity(source.len() + self.replacement.len());
                out.push_str(&source[..first.end()]);
                out.push_str(&self.replacement);
                out.push_str(&source[first.end()..]);
                out
            }
        };
        Some(patched)
    }

    fn describe(&self) -> String {
        self.pattern.as_str().to_string()
    }
}

/// Apply `patcher` to `section`, honoring `strictness` on a miss.
///
/// Returns whether the source changed.
pub fn apply_patch(section: &mut Section, patcher: &dyn Patcher, strictness: Strictness) -> Result<bool> {
    match patcher.patch_source(&section.source) {
        Some(patched) => {
            debug!(section = %section.name, pattern = %patcher.describe(), "Patched section source");
            section.source = patched;
            Ok(true)
        }
        None if strictness.is_strict() => Err(Error::PatternNotMatched {
            pattern: patcher.describe(),
            section: section.name.clone(),
        }),
        None => {
            warn!(section = %section.name, pattern = %patcher.describe(), "Pattern did not match, section unchanged");
            Ok(false)
        }
    }
}

/// Apply `patcher` to every section of `file` it matches.
///
/// Returns the number of sections changed. A file where nothing matched is an
/// error in strict mode only.
pub fn patch_file(file: &mut File, patcher: &dyn Patcher, strictness: Strictness) -> Result<usize> {
    let mut changed = 0;
    for section in &mut file.sections {
        if let Some(patched) = patcher.patch_source(&section.source) {
            section.source = patched;
            changed += 1;
        }
    }

    if changed == 0 {
        if strictness.is_strict() {
            return Err(Error::PatternNotMatched {
                pattern: patcher.describe(),
                section: format!("{}:*", file.path()),
            });
        }
        warn!(path = %file.path(), pattern = %patcher.describe(), "Pattern matched no section, file unchanged");
    } else {
        debug!(path = %file.path(), pattern = %patcher.describe(), sections = changed, "Patched file");
    }
    Ok(changed)
}

/// Match `pattern` against the section source and rewrite it per `mode`.
///
/// Zero matches is not an error: the source is left unchanged and `false`
/// is returned. Only an invalid pattern fails.
pub fn patch(section: &mut Section, pattern: &str, replacement: &str, mode: PatchMode) -> Result<bool> {
    let patcher = RegexPatch::new(pattern, replacement, mode)?;
    apply_patch(section, &patcher, Strictness::Lenient)
}
