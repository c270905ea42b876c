use super::provider::JsonModelProvider;
use crate::domain::ports::{ProjectSource, SourceModelProvider};
use crate::domain::source::{CompilationUnit, Descriptor, LibraryType, ParseFailure, ParsedRevision};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const LIBRARY_SUFFIX: &str = ".library.json";
const DESCRIPTOR_SUFFIX: &str = ".descriptor.json";
const UNIT_SUFFIX: &str = ".json";

/// Project source reading a pre-parsed source model from a directory tree.
///
/// Layout: `<rel>/File.java.json` holds the compilation unit `<rel>/File.java`,
/// `*.library.json` files hold external types and `*.descriptor.json` files hold framework
/// configuration. The unit identifier is always taken from the file location.
pub struct JsonProjectSource {
    source_dir: PathBuf,
    snapshot_dir: PathBuf,
}

impl JsonProjectSource {
    pub fn new(source_dir: impl Into<PathBuf>, snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            snapshot_dir: snapshot_dir.into(),
        }
    }

    /// Every `*.json` file under the source directory, sorted, skipping the snapshot
    /// directory and hidden directories.
    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![self.source_dir.clone()];
        while let Some(dir) = pending.pop() {
            let entries = fs::read_dir(&dir)
                .with_context(|| format!("Failed to list source directory: {}", dir.display()))?;
            for entry in entries {
                let path = entry?.path();
                let hidden = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with('.'));
                if path.is_dir() {
                    if !hidden && path != self.snapshot_dir {
                        pending.push(path);
                    }
                } else if !hidden && file_name(&path).ends_with(UNIT_SUFFIX) {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Unit identifier of a unit file: its path relative to the source directory, `/`
    /// separated, without the `.json` suffix.
    fn unit_path(&self, file: &Path) -> String {
        let relative = file.strip_prefix(&self.source_dir).unwrap_or(file);
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        joined.strip_suffix(UNIT_SUFFIX).unwrap_or(&joined).to_string()
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|name| name.to_str()).unwrap_or_default()
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

impl ProjectSource for JsonProjectSource {
    fn libraries(&self) -> Result<Vec<LibraryType>> {
        let mut libraries = Vec::new();
        for path in self.files()? {
            if !file_name(&path).ends_with(LIBRARY_SUFFIX) {
                continue;
            }
            let types: Vec<LibraryType> = serde_json::from_str(&read(&path)?)
                .with_context(|| format!("Invalid library file: {}", path.display()))?;
            libraries.extend(types);
        }
        debug!(count = libraries.len(), "library types loaded");
        Ok(libraries)
    }

    fn parse(&self) -> Result<ParsedRevision> {
        let mut revision = ParsedRevision::default();
        for path in self.files()? {
            let name = file_name(&path);
            if name.ends_with(LIBRARY_SUFFIX) {
                continue;
            }
            if name.ends_with(DESCRIPTOR_SUFFIX) {
                let descriptor: Descriptor = serde_json::from_str(&read(&path)?)
                    .with_context(|| format!("Invalid descriptor file: {}", path.display()))?;
                revision.descriptor.spring_beans.extend(descriptor.spring_beans);
                revision.descriptor.cdi_alternatives.extend(descriptor.cdi_alternatives);
                continue;
            }

            let unit_path = self.unit_path(&path);
            match serde_json::from_str::<CompilationUnit>(&read(&path)?) {
                Ok(mut unit) => {
                    if unit.path != unit_path {
                        debug!(declared = %unit.path, path = %unit_path, "unit path taken from file location");
                        unit.path = unit_path;
                    }
                    revision.units.push(unit);
                }
                Err(e) => {
                    warn!(path = %unit_path, error = %e, "compilation unit could not be parsed");
                    revision.failures.push(ParseFailure {
                        path: unit_path,
                        message: e.to_string(),
                    });
                }
            }
        }
        revision.descriptor.spring_beans.sort();
        revision.descriptor.spring_beans.dedup();
        revision.descriptor.cdi_alternatives.sort();
        revision.descriptor.cdi_alternatives.dedup();
        Ok(revision)
    }

    fn provider(&self, revision: &ParsedRevision, libraries: &[LibraryType]) -> Box<dyn SourceModelProvider> {
        Box::new(JsonModelProvider::new(revision, libraries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_parse_splits_units_descriptors_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "src/org/acme/A.java.json",
            r#"{ "path": "ignored", "package": "org.acme", "types": [{ "name": "A" }] }"#,
        );
        write(root, "src/org/acme/Broken.java.json", "{ not json");
        write(
            root,
            "beans.descriptor.json",
            r#"{ "spring_beans": [{ "id": "clock", "class": "org.acme.A" }] }"#,
        );
        write(root, "jdk.library.json", r#"[{ "name": "java.util.List" }]"#);
        write(root, ".dirts/graph_methodL.json", "{}");

        let source = JsonProjectSource::new(root, root.join(".dirts"));
        let revision = source.parse().unwrap();

        assert_eq!(revision.units.len(), 1);
        assert_eq!(revision.units[0].path, "src/org/acme/A.java");
        assert_eq!(revision.failures.len(), 1);
        assert_eq!(revision.failures[0].path, "src/org/acme/Broken.java");
        assert_eq!(revision.descriptor.spring_beans[0].id, "clock");

        let libraries = source.libraries().unwrap();
        assert_eq!(libraries.len(), 1);
        assert_eq!(libraries[0].name, "java.util.List");
    }

    #[test]
    fn test_invalid_library_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.library.json", "[{");
        let source = JsonProjectSource::new(dir.path(), dir.path().join(".dirts"));
        assert!(source.libraries().is_err());
    }
}
