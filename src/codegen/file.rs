//! File and section intermediate representation
//!
//! Generated output is held as files made of named sections. Each section
//! pairs a template source with the data bound to it, so later plugins can
//! locate a section by name and rewrite its source or data before anything
//! is rendered.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::core::error::{Error, Result};

/// An atomic, named unit of generated text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Lookup key, not required to be unique within a file
    pub name: String,
    /// Template text
    pub source: String,
    /// Value bound to the template at render time
    #[serde(default)]
    pub data: JsonValue,
}

impl Section {
    /// Create a section with no bound data
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            data: JsonValue::Null,
        }
    }

    /// Bind data to the section
    pub fn with_data(mut self, data: JsonValue) -> Self {
        self.data = data;
        self
    }

    /// Surround the template source with `prefix` and `suffix`
    pub fn wrap_source(&mut self, prefix: &str, suffix: &str) {
        self.source = format!("{prefix}{}{suffix}", self.source);
    }

    /// Mutable access to an array stored under `key` in the section data
    pub fn data_array_mut(&mut self, key: &str) -> Option<&mut Vec<JsonValue>> {
        self.data.get_mut(key).and_then(JsonValue::as_array_mut)
    }

    /// Keep only the items of the data array under `key` matching `keep`.
    ///
    /// Returns how many items were removed. A missing key or a non-array
    /// value removes nothing.
    pub fn retain_data_items<F>(&mut self, key: &str, mut keep: F) -> usize
    where
        F: FnMut(&JsonValue) -> bool,
    {
        match self.data_array_mut(key) {
            Some(items) => {
                let before = items.len();
                items.retain(|item| keep(item));
                before - items.len()
            }
            None => 0,
        }
    }
}

/// An ordered sequence of sections written to one output path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    path: String,
    /// Sections in render order
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl File {
    pub fn new(path: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            path: path.into(),
            sections,
        }
    }

    /// Output path, the file's identity within a file set
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The header section, by convention the first one
    pub fn header(&self) -> Option<&Section> {
        self.sections.first()
    }

    pub fn header_mut(&mut self) -> Option<&mut Section> {
        self.sections.first_mut()
    }

    /// All sections whose name satisfies `pred`, in file order
    pub fn sections<P>(&self, pred: P) -> Vec<&Section>
    where
        P: Fn(&str) -> bool,
    {
        self.sections.iter().filter(|s| pred(&s.name)).collect()
    }

    /// Mutable variant of [`File::sections`]
    pub fn sections_mut<P>(&mut self, pred: P) -> Vec<&mut Section>
    where
        P: Fn(&str) -> bool,
    {
        self.sections.iter_mut().filter(|s| pred(&s.name)).collect()
    }

    /// Append a section at the end of the file
    pub fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Splice `new` immediately before the first section matching `pred`.
    ///
    /// Returns false and leaves the file untouched when nothing matches.
    pub fn insert_before<P>(&mut self, pred: P, new: Vec<Section>) -> bool
    where
        P: Fn(&str) -> bool,
    {
        match self.sections.iter().position(|s| pred(&s.name)) {
            Some(idx) => {
                self.sections.splice(idx..idx, new);
                true
            }
            None => false,
        }
    }

    /// Splice `new` immediately after the first section matching `pred`.
    pub fn insert_after<P>(&mut self, pred: P, new: Vec<Section>) -> bool
    where
        P: Fn(&str) -> bool,
    {
        match self.sections.iter().position(|s| pred(&s.name)) {
            Some(idx) => {
                self.sections.splice(idx + 1..idx + 1, new);
                true
            }
            None => false,
        }
    }
}

/// Ordered collection of files, unique by path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<File>", into = "Vec<File>")]
pub struct FileSet {
    files: Vec<File>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a file set, rejecting duplicate paths
    pub fn from_files(files: Vec<File>) -> Result<Self> {
        let mut set = Self::new();
        set.extend(files)?;
        Ok(set)
    }

    /// Append a file at the end of the set.
    ///
    /// A file whose path is already present is rejected with
    /// [`Error::DuplicateFile`].
    pub fn push(&mut self, file: File) -> Result<()> {
        if self.contains(file.path()) {
            return Err(Error::DuplicateFile(file.path().to_string()));
        }
        self.files.push(file);
        Ok(())
    }

    pub fn extend<I>(&mut self, files: I) -> Result<()>
    where
        I: IntoIterator<Item = File>,
    {
        for file in files {
            self.push(file)?;
        }
        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path() == path)
    }

    pub fn get(&self, path: &str) -> Option<&File> {
        self.files.iter().find(|f| f.path() == path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut File> {
        self.files.iter_mut().find(|f| f.path() == path)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, File> {
        self.files.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, File> {
        self.files.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Paths in set order
    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(File::path).collect()
    }

    /// First path held by more than one file.
    ///
    /// Only a caller replacing a whole file through [`FileSet::get_mut`] or
    /// [`FileSet::iter_mut`] can produce one.
    pub fn duplicate_path(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.files.iter().map(File::path).find(|path| !seen.insert(*path))
    }

    pub fn into_files(self) -> Vec<File> {
        self.files
    }
}

impl TryFrom<Vec<File>> for FileSet {
    type Error = Error;

    fn try_from(files: Vec<File>) -> Result<Self> {
        Self::from_files(files)
    }
}

impl From<FileSet> for Vec<File> {
    fn from(set: FileSet) -> Self {
        set.files
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a File;
    type IntoIter = std::slice::Iter<'a, File>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

impl IntoIterator for FileSet {
    type Item = File;
    type IntoIter = std::vec::IntoIter<File>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service_file() -> File {
        File::new(
            "gen/calc/service.go",
            vec![
                Section::new("source-header", "package calcsvc"),
                Section::new("service", "type Service interface {}"),
                Section::new("endpoint-method", "func A() {}"),
                Section::new("endpoint-method", "func B() {}"),
            ],
        )
    }

    #[test]
    fn test_sections_returns_every_match_in_order() {
        let file = service_file();
        let methods = file.sections(|n| n == "endpoint-method");
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].source, "func A() {}");
        assert_eq!(methods[1].source, "func B() {}");
        assert!(file.sections(|n| n == "missing").is_empty());
    }

    #[test]
    fn test_insert_before_and_after_first_match() {
        let mut file = service_file();
        assert!(file.insert_after(|n| n == "endpoint-method", vec![Section::new("x", "")]));
        assert!(file.insert_before(|n| n == "service", vec![Section::new("y", "")]));
        let names: Vec<&str> = file.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["source-header", "y", "service", "endpoint-method", "x", "endpoint-method"]
        );
    }

    #[test]
    fn test_insert_without_match_leaves_file_untouched() {
        let mut file = service_file();
        let before = file.clone();
        assert!(!file.insert_after(|n| n == "nope", vec![Section::new("x", "")]));
        assert_eq!(file, before);
    }

    #[test]
    fn test_retain_data_items_filters_by_name() {
        let mut section = Section::new("service", "").with_data(json!({
            "methods": [{"name": "add"}, {"name": "metrics"}, {"name": "div"}]
        }));
        let removed = section.retain_data_items("methods", |m| m["name"] != "metrics");
        assert_eq!(removed, 1);
        assert_eq!(section.data["methods"], json!([{"name": "add"}, {"name": "div"}]));
        assert_eq!(section.retain_data_items("absent", |_| false), 0);
    }

    #[test]
    fn test_wrap_source() {
        let mut section = Section::new("s", "body");
        section.wrap_source("<", ">");
        assert_eq!(section.source, "<body>");
    }

    #[test]
    fn test_file_set_rejects_duplicate_paths() {
        let mut set = FileSet::new();
        set.push(File::new("README.md", vec![])).unwrap();
        let err = set.push(File::new("README.md", vec![])).unwrap_err();
        assert!(matches!(err, Error::DuplicateFile(p) if p == "README.md"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_duplicate_path_after_replacing_a_file() {
        let mut set = FileSet::from_files(vec![
            File::new("calc.go", vec![]),
            File::new("README.md", vec![]),
        ])
        .unwrap();
        assert_eq!(set.duplicate_path(), None);

        *set.get_mut("README.md").unwrap() = File::new("calc.go", vec![]);
        assert_eq!(set.duplicate_path(), Some("calc.go"));
    }

    #[test]
    fn test_file_set_preserves_insertion_order() {
        let set = FileSet::from_files(vec![
            File::new("b.go", vec![]),
            File::new("a.go", vec![]),
        ])
        .unwrap();
        assert_eq!(set.paths(), vec!["b.go", "a.go"]);
    }

    #[test]
    fn test_file_set_deserialization_checks_duplicates() {
        let yaml = "- path: a.go\n- path: a.go\n";
        assert!(serde_yaml::from_str::<FileSet>(yaml).is_err());

        let yaml = "- path: a.go\n  sections:\n    - name: source-header\n      source: package a\n";
        let set: FileSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(set.get("a.go").unwrap().sections[0].data, JsonValue::Null);
    }
}
