pub mod imports;

pub use imports::{FileImportTable, ImportEntry, ImportTarget};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One analyzed function, as produced by the external source parser.
///
/// Field names on the wire follow the method metainfo format (`uris`,
/// `original_string`, `arg_nums`, `file`). The five wire fields are required;
/// line spans and the class name are optional.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionRecord {
    #[serde(rename = "uris")]
    pub uri: String,
    #[serde(rename = "original_string")]
    pub source: String,
    pub params: Vec<String>,
    #[serde(rename = "file")]
    pub file_path: String,
    #[serde(rename = "arg_nums")]
    pub arity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
}

impl FunctionRecord {
    pub fn new(uri: impl Into<String>, source: impl Into<String>, params: Vec<String>) -> Self {
        let arity = params.len();
        Self {
            uri: uri.into(),
            source: source.into(),
            params,
            file_path: String::new(),
            arity,
            class_name: None,
            start_line: None,
            end_line: None,
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = file_path.into();
        self
    }

    pub fn with_lines(mut self, start_line: usize, end_line: usize) -> Self {
        self.start_line = Some(start_line);
        self.end_line = Some(end_line);
        self
    }

    /// Methods whose first parameter is `self` or `cls`
    pub fn is_instance_method(&self) -> bool {
        matches!(
            self.params.first().map(String::as_str),
            Some("self") | Some("cls")
        )
    }

    /// Declared `[start_line, end_line]` span, when the parser recorded one
    pub fn line_span(&self) -> Option<(usize, usize)> {
        self.start_line.zip(self.end_line)
    }
}

/// Outcome of classifying one function. Exactly one variant applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContainmentResult {
    FullySelfContained,
    /// Every unresolved reference is explained by an allowed library. The set
    /// holds the local bound names that were attributed, not library names.
    WeaklySelfContained {
        attributed_libraries: BTreeSet<String>,
    },
    Rejected,
}

impl ContainmentResult {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, ContainmentResult::Rejected)
    }
}

/// Output bucket tag, serialized as the record's `type` field.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    Function,
    ClassMethod,
    WeaklySelfContained,
}

/// An accepted function as written to the stage files.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectedFunction {
    #[serde(rename = "type")]
    pub kind: SelectionKind,
    #[serde(rename = "uris")]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(rename = "arg_nums")]
    pub arity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_libraries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func_call: Option<Box<SelectedFunction>>,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cyclomatic_complexity: Option<u32>,
}

impl SelectedFunction {
    pub fn from_record(kind: SelectionKind, record: &FunctionRecord) -> Self {
        Self {
            kind,
            uri: record.uri.clone(),
            level: None,
            arity: record.arity,
            allowed_libraries: None,
            func_call: None,
            code: record.source.clone(),
            cyclomatic_complexity: None,
        }
    }

    pub fn with_libraries<I>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.allowed_libraries = Some(libraries.into_iter().collect());
        self
    }

    pub fn with_level(mut self, level: u32, func_call: &SelectedFunction) -> Self {
        self.level = Some(level);
        self.func_call = Some(Box::new(func_call.clone()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_instance_method_detection() {
        let method = FunctionRecord::new("m.C.f.2", "def f(self, x): return x", vec![
            "self".into(),
            "x".into(),
        ]);
        let class_method = FunctionRecord::new("m.C.g.1", "def g(cls): return cls", vec![
            "cls".into(),
        ]);
        let free = FunctionRecord::new("m.global.h.1", "def h(x): return x", vec!["x".into()]);
        let no_params = FunctionRecord::new("m.global.k.0", "def k(): return 1", vec![]);

        assert!(method.is_instance_method());
        assert!(class_method.is_instance_method());
        assert!(!free.is_instance_method());
        assert!(!no_params.is_instance_method());
    }

    #[test]
    fn test_record_requires_wire_fields() {
        let missing_source = r#"{"uris": "a.global.f.0", "params": [], "file": "a.py", "arg_nums": 0}"#;
        assert!(serde_json::from_str::<FunctionRecord>(missing_source).is_err());

        let complete = r#"{
            "uris": "a.global.f.0",
            "original_string": "def f():\n    return 1",
            "params": [],
            "file": "a.py",
            "arg_nums": 0,
            "start_line": 3,
            "end_line": 4
        }"#;
        let record: FunctionRecord = serde_json::from_str(complete).unwrap();
        assert_eq!(record.line_span(), Some((3, 4)));
        assert_eq!(record.class_name, None);
    }

    #[test]
    fn test_selected_function_wire_format() {
        let record = FunctionRecord::new("a.global.f.1", "def f(x): return x", vec!["x".into()]);
        let helper = SelectedFunction::from_record(SelectionKind::Function, &record);
        let selected = SelectedFunction::from_record(SelectionKind::Function, &record)
            .with_libraries(vec!["np".to_string()])
            .with_level(1, &helper);

        let value = serde_json::to_value(&selected).unwrap();
        assert_eq!(value["type"], "function");
        assert_eq!(value["uris"], "a.global.f.1");
        assert_eq!(value["arg_nums"], 1);
        assert_eq!(value["level"], 1);
        assert_eq!(value["allowed_libraries"][0], "np");
        assert_eq!(value["func_call"]["uris"], "a.global.f.1");
        assert!(value.get("cyclomatic_complexity").is_none());
    }
}
