//! Per-file import metadata.
//!
//! The file metainfo format stores imports as a list of single-key maps,
//! `{"<bound name>": [{"alias"|"what": ..., "from": ...}]}`. They are read into
//! [`ImportEntry`] values keyed by the bound local name.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// What an import binds a local name to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ImportTarget {
    /// `import X as Y` / `from X import Y as Z`
    Aliased { alias: String, from: String },
    /// `from X import Y`
    Plain { what: String, from: String },
}

impl ImportTarget {
    pub fn from_path(&self) -> &str {
        match self {
            ImportTarget::Aliased { from, .. } | ImportTarget::Plain { from, .. } => from,
        }
    }

    /// First dotted segment of the `from` path: `pandas.tseries` -> `pandas`
    pub fn root_module(&self) -> &str {
        let from = self.from_path();
        from.split('.').next().unwrap_or(from)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportEntry {
    pub bound_name: String,
    pub targets: Vec<ImportTarget>,
}

impl ImportEntry {
    pub fn new(bound_name: impl Into<String>, target: ImportTarget) -> Self {
        Self {
            bound_name: bound_name.into(),
            targets: vec![target],
        }
    }

    /// Root module of the first recorded target, if any
    pub fn root_module(&self) -> Option<&str> {
        self.targets.first().map(ImportTarget::root_module)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Default)]
pub struct FileImportTable {
    pub file_path: String,
    #[serde(rename = "_import", deserialize_with = "deserialize_entries")]
    pub imports: Vec<ImportEntry>,
    #[serde(rename = "_import_from", deserialize_with = "deserialize_entries")]
    pub import_froms: Vec<ImportEntry>,
}

impl FileImportTable {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    /// Plain imports first, then `from` imports
    pub fn entries(&self) -> impl Iterator<Item = &ImportEntry> {
        self.imports.iter().chain(self.import_froms.iter())
    }

    /// Find the entry binding `name` locally
    pub fn lookup(&self, name: &str) -> Option<&ImportEntry> {
        self.entries().find(|entry| entry.bound_name == name)
    }
}

fn deserialize_entries<'de, D>(deserializer: D) -> Result<Vec<ImportEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<BTreeMap<String, Vec<ImportTarget>>> = Vec::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .flat_map(|map| {
            map.into_iter()
                .map(|(bound_name, targets)| ImportEntry {
                    bound_name,
                    targets,
                })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_file_metainfo() {
        let json = r#"{
            "file_path": "pkg/util.py",
            "_import": [
                {"np": [{"alias": "np", "from": "numpy"}]},
                {"os": [{"what": "os", "from": "os"}]}
            ],
            "_import_from": [
                {"OrderedDict": [{"what": "OrderedDict", "from": "collections"}]},
                {"offsets": [{"alias": "offsets", "from": "pandas.tseries.offsets"}]},
                {"empty": []}
            ]
        }"#;
        let table: FileImportTable = serde_json::from_str(json).unwrap();

        assert_eq!(table.imports.len(), 2);
        assert_eq!(table.import_froms.len(), 3);
        assert_eq!(table.lookup("np").and_then(ImportEntry::root_module), Some("numpy"));
        assert_eq!(
            table.lookup("offsets").and_then(ImportEntry::root_module),
            Some("pandas")
        );
        assert_eq!(table.lookup("empty").and_then(ImportEntry::root_module), None);
        assert!(table.lookup("missing").is_none());
    }

    #[test]
    fn test_target_requires_from() {
        let json = r#"{"file_path": "a.py", "_import": [{"np": [{"alias": "np"}]}], "_import_from": []}"#;
        assert!(serde_json::from_str::<FileImportTable>(json).is_err());
    }

    #[test]
    fn test_aliased_wins_over_plain() {
        let target: ImportTarget =
            serde_json::from_str(r#"{"alias": "pd", "what": "pandas", "from": "pandas"}"#).unwrap();
        assert_eq!(
            target,
            ImportTarget::Aliased {
                alias: "pd".into(),
                from: "pandas".into()
            }
        );
    }
}
