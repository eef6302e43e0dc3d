//! Manifest parsing and writing for `spack.yaml`.

use crate::error::StackError;
use crate::merge::{find_named, merge, merge_mappings, strip_override_markers, MergeStrategy};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Top-level key of every environment manifest.
pub const ROOT_KEY: &str = "spack";

/// Key holding the list of included configuration directories.
pub const INCLUDE_KEY: &str = "include";

/// Configuration sections whose values are snapshotted and restored around
/// the named overrides.
pub const CONFIG_SECTIONS: &[&str] = &[
    "bootstrap",
    "cdash",
    "ci",
    "compilers",
    "concretizer",
    "config",
    "container",
    "definitions",
    "develop",
    "mirrors",
    "modules",
    "packages",
    "repos",
    "upstreams",
];

/// A parsed environment manifest.
///
/// Paths passed to [`Manifest::get`] and [`Manifest::set`] are
/// colon-separated and relative to the `spack` mapping, e.g.
/// `packages:all:compiler`.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Contents of the `spack` mapping.
    body: Mapping,
    /// Any other top-level keys, kept as-is.
    extra: Mapping,
}

impl Manifest {
    /// An empty manifest (`spack: {}`).
    pub fn empty() -> Self {
        Self {
            body: Mapping::new(),
            extra: Mapping::new(),
        }
    }

    /// Load a manifest from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StackError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| StackError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str(&contents)
    }

    /// Parse a manifest from a YAML string.
    pub fn from_str(s: &str) -> Result<Self, StackError> {
        let value: Value = serde_yaml::from_str(s)?;
        let Value::Mapping(mut extra) = value else {
            return Err(StackError::InvalidManifest(
                "expected a mapping at the top level".to_string(),
            ));
        };

        let body = match extra.remove(ROOT_KEY) {
            Some(Value::Mapping(body)) => body,
            Some(Value::Null) => Mapping::new(),
            Some(_) => {
                return Err(StackError::InvalidManifest(format!(
                    "'{ROOT_KEY}' must be a mapping"
                )));
            }
            None => {
                return Err(StackError::InvalidManifest(format!(
                    "missing top-level '{ROOT_KEY}' section"
                )));
            }
        };

        Ok(Self { body, extra })
    }

    /// The `spack` mapping.
    pub fn body(&self) -> &Mapping {
        &self.body
    }

    /// Look up a value by colon-separated path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = split_path(path);
        let first = segments.next()?;
        let (_, mut current) = find_named(&self.body, first)?;
        for segment in segments {
            let map = current.as_mapping()?;
            let (_, value) = find_named(map, segment)?;
            current = value;
        }
        Some(current)
    }

    /// Assign a value at a colon-separated path, replacing whatever was
    /// there. Missing intermediate mappings are created; non-mapping
    /// intermediates are replaced by mappings.
    pub fn set(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = split_path(path).collect();
        set_in(&mut self.body, &segments, value);
    }

    /// Merge another manifest into this one.
    pub fn merge(&mut self, other: &Manifest, strategy: MergeStrategy) {
        self.body = merge_mappings(&self.body, &other.body, strategy);
        self.extra = merge_mappings(&self.extra, &other.extra, strategy);
    }

    /// Merge a value into one section, creating the section if needed.
    pub fn merge_section(&mut self, section: &str, value: &Value, strategy: MergeStrategy) {
        let merged = match self.get(section) {
            Some(existing) => merge(existing, value, strategy),
            None => value.clone(),
        };
        self.set(section, merged);
    }

    /// Names in the `include` list.
    pub fn includes(&self) -> Vec<String> {
        self.get(INCLUDE_KEY)
            .and_then(Value::as_sequence)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace the `include` list.
    pub fn set_includes(&mut self, names: &[String]) {
        let items = names.iter().cloned().map(Value::String).collect();
        self.set(INCLUDE_KEY, Value::Sequence(items));
    }

    /// Copy of every configuration section present, keyed by section name.
    pub fn config_sections(&self) -> Mapping {
        CONFIG_SECTIONS
            .iter()
            .filter_map(|name| {
                self.get(name)
                    .filter(|v| !is_empty(v))
                    .map(|v| (Value::String((*name).to_string()), v.clone()))
            })
            .collect()
    }

    /// Merge snapshotted sections back on top so they win every conflict.
    ///
    /// Sections no longer present are left out, matching what was there
    /// before the snapshot was taken.
    pub fn restore_sections(&mut self, snapshot: &Mapping) {
        for (key, original) in snapshot {
            let Some(name) = key.as_str() else { continue };
            if let Some(existing) = self.get(name) {
                let restored = merge(existing, original, MergeStrategy::RESTORE);
                self.set(name, restored);
            }
        }
    }

    /// Remove `::` override markers from every key.
    pub fn strip_override_markers(&mut self) {
        let mut body = Value::Mapping(std::mem::take(&mut self.body));
        strip_override_markers(&mut body);
        if let Value::Mapping(body) = body {
            self.body = body;
        }
    }

    /// The whole document as a YAML value.
    pub fn to_value(&self) -> Value {
        let mut doc = Mapping::new();
        doc.insert(
            Value::String(ROOT_KEY.to_string()),
            Value::Mapping(self.body.clone()),
        );
        for (key, value) in &self.extra {
            doc.insert(key.clone(), value.clone());
        }
        Value::Mapping(doc)
    }

    /// Serialize to YAML, optionally prefixed with a comment header.
    pub fn render(&self, header: Option<&str>) -> Result<String, StackError> {
        let yaml = serde_yaml::to_string(&self.to_value()).map_err(StackError::Serialize)?;
        let mut out = String::new();
        if let Some(header) = header {
            for line in header.lines() {
                out.push_str("# ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str(&yaml);
        Ok(out)
    }

    /// Write the manifest to `path` in a single transaction.
    pub fn write(&self, path: &Path, header: Option<&str>) -> Result<(), StackError> {
        let contents = self.render(header)?;
        write_atomic(path, &contents)
    }
}

/// Load a plain YAML document (e.g. a `packages.yaml` pin file) with
/// override markers stripped.
pub fn load_document(path: &Path) -> Result<Value, StackError> {
    let contents = fs::read_to_string(path).map_err(|source| StackError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let mut value: Value = serde_yaml::from_str(&contents)?;
    strip_override_markers(&mut value);
    Ok(value)
}

/// Write `contents` to `path` via a temporary file in the same directory,
/// renamed into place once complete.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), StackError> {
    let write_err = |source| StackError::Write {
        path: path.display().to_string(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split(':').filter(|s| !s.is_empty())
}

fn set_in(map: &mut Mapping, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let key = find_named(map, first)
        .map(|(k, _)| k.clone())
        .unwrap_or_else(|| Value::String((*first).to_string()));

    if rest.is_empty() {
        map.insert(key, value);
        return;
    }

    if !map.get(&key).is_some_and(Value::is_mapping) {
        map.insert(key.clone(), Value::Mapping(Mapping::new()));
    }
    if let Some(Value::Mapping(child)) = map.get_mut(&key) {
        set_in(child, rest, value);
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Mapping(m) => m.is_empty(),
        Value::Sequence(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEMPLATE: &str = r#"
spack:
  view: false
  specs: [ufs-weather-model-env]
  packages:
    all:
      compiler: [gcc@12.2.0]
    zlib:
      version: ['1.2.13']
"#;

    #[test]
    fn parse_minimal_manifest() {
        let manifest = Manifest::from_str("spack:\n  view: false\n").unwrap();
        assert_eq!(manifest.get("view"), Some(&Value::Bool(false)));
        assert!(manifest.includes().is_empty());
    }

    #[test]
    fn null_body_is_empty() {
        let manifest = Manifest::from_str("spack:\n").unwrap();
        assert!(manifest.body().is_empty());
    }

    #[test]
    fn missing_spack_section() {
        let err = Manifest::from_str("packages: {}\n").unwrap_err();
        assert!(matches!(err, StackError::InvalidManifest(_)));

        let err = Manifest::from_str("- a\n- b\n").unwrap_err();
        assert!(matches!(err, StackError::InvalidManifest(_)));
    }

    #[test]
    fn get_nested_path() {
        let manifest = Manifest::from_str(TEMPLATE).unwrap();
        let compiler = manifest.get("packages:all:compiler").unwrap();
        assert_eq!(compiler, &serde_yaml::from_str::<Value>("[gcc@12.2.0]").unwrap());
        assert!(manifest.get("packages:all:providers").is_none());
        assert!(manifest.get("view:nested").is_none());
    }

    #[test]
    fn get_ignores_override_marker() {
        let manifest = Manifest::from_str("spack:\n  packages::\n    all:\n      target: [x86_64]\n").unwrap();
        assert!(manifest.get("packages:all:target").is_some());
    }

    #[test]
    fn set_creates_intermediates() {
        let mut manifest = Manifest::empty();
        manifest.set("modules:default:roots:lmod", Value::String("/opt/mod".into()));
        assert_eq!(
            manifest.get("modules:default:roots:lmod"),
            Some(&Value::String("/opt/mod".into()))
        );
    }

    #[test]
    fn set_replaces_subtree() {
        let mut manifest = Manifest::from_str(TEMPLATE).unwrap();
        manifest.set("packages:zlib", Value::String("replaced".into()));
        manifest.set("view:root", Value::String("/views".into()));

        assert_eq!(manifest.get("packages:zlib"), Some(&Value::String("replaced".into())));
        assert_eq!(manifest.get("view:root"), Some(&Value::String("/views".into())));
        assert!(manifest.get("packages:all:compiler").is_some());
    }

    #[test]
    fn snapshot_and_restore() {
        let mut manifest = Manifest::from_str(TEMPLATE).unwrap();
        let snapshot = manifest.config_sections();
        assert_eq!(snapshot.len(), 1);

        manifest.set(
            "packages:all:compiler",
            serde_yaml::from_str("[intel@2021.6.0]").unwrap(),
        );
        manifest.set("packages:all:providers:mpi", serde_yaml::from_str("[openmpi]").unwrap());
        manifest.restore_sections(&snapshot);

        assert_eq!(
            manifest.get("packages:all:compiler"),
            Some(&serde_yaml::from_str::<Value>("[gcc@12.2.0]").unwrap())
        );
        assert!(manifest.get("packages:all:providers:mpi").is_some());
    }

    #[test]
    fn includes_roundtrip() {
        let mut manifest = Manifest::empty();
        manifest.set_includes(&["site".to_string(), "common".to_string()]);
        assert_eq!(manifest.includes(), ["site", "common"]);
    }

    #[test]
    fn render_with_header() {
        let manifest = Manifest::from_str("spack:\n  view: false\n").unwrap();
        let text = manifest
            .render(Some("spack-stack hash: abc1234\nspack hash: def5678"))
            .unwrap();
        assert!(text.starts_with("# spack-stack hash: abc1234\n# spack hash: def5678\nspack:\n"));

        let back = Manifest::from_str(&text).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn write_replaces_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("spack.yaml");
        fs::write(&path, "old").unwrap();

        let manifest = Manifest::from_str(TEMPLATE).unwrap();
        manifest.write(&path, None).unwrap();

        assert_eq!(Manifest::from_path(&path).unwrap(), manifest);
        let leftovers = fs::read_dir(temp.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn load_pin_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("packages.yaml");
        fs::write(&path, "packages::\n  hdf5:\n    version: ['1.14.0']\n").unwrap();

        let doc = load_document(&path).unwrap();
        assert!(doc.get("packages").and_then(|p| p.get("hdf5")).is_some());
    }
}
