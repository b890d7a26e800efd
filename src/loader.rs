use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Diagnostic, GenerateError};
use crate::ir::{SchemaDocument, SchemaModel};
use crate::settings::{Settings, FORMAT_VERSION};

pub const SETTINGS_SUFFIX: &str = ".settings.toml";
pub const SCHEMA_SUFFIX: &str = ".schema.toml";

/// Settings plus the merged schema of one generation pass.
#[derive(Debug, Clone)]
pub struct Documents {
    pub settings: Settings,
    pub schema: SchemaModel,
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(suffix))
}

fn read(path: &Path) -> Result<String, GenerateError> {
    fs::read_to_string(path).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), GenerateError> {
    let entries = fs::read_dir(dir).map_err(|source| GenerateError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let path = entry
            .map_err(|source| GenerateError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_dir() {
            walk(&path, out)?;
        } else if has_suffix(&path, SETTINGS_SUFFIX) || has_suffix(&path, SCHEMA_SUFFIX) {
            out.push(path);
        }
    }
    Ok(())
}

/// Expands directories into the documents they contain. Files named
/// explicitly must carry a document suffix. The result is sorted so every
/// pass reads documents in the same order.
pub fn collect_documents(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, GenerateError> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            walk(input, &mut paths)?;
        } else if has_suffix(input, SETTINGS_SUFFIX) || has_suffix(input, SCHEMA_SUFFIX) {
            paths.push(input.clone());
        } else {
            return Err(GenerateError::UnrecognizedDocument(input.clone()));
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// Rejects documents written for another format version before their
/// content is interpreted.
fn check_version(path: &Path, text: &str) -> Result<(), GenerateError> {
    let table: toml::Table = toml::from_str(text)
        .map_err(|e| GenerateError::Parse(Diagnostic::from_toml(path.to_path_buf(), text, &e)))?;
    match table.get("format_version").and_then(|v| v.as_integer()) {
        Some(v) if v == i64::from(FORMAT_VERSION) => Ok(()),
        Some(v) => Err(GenerateError::UnsupportedVersion(Diagnostic::at_key(
            path.to_path_buf(),
            text,
            "format_version",
            format!("unsupported format version {}, expected {}", v, FORMAT_VERSION),
        ))),
        None => Err(GenerateError::Parse(Diagnostic {
            path: path.to_path_buf(),
            line: None,
            column: None,
            field: Some("format_version".to_string()),
            reason: "missing integer field `format_version`".to_string(),
        })),
    }
}

pub fn parse_settings(path: &Path, text: &str) -> Result<Settings, GenerateError> {
    check_version(path, text)?;
    toml::from_str(text).map_err(|e| GenerateError::Parse(Diagnostic::from_toml(path.to_path_buf(), text, &e)))
}

pub fn parse_schema(path: &Path, text: &str) -> Result<SchemaDocument, GenerateError> {
    check_version(path, text)?;
    toml::from_str(text).map_err(|e| GenerateError::Parse(Diagnostic::from_toml(path.to_path_buf(), text, &e)))
}

fn merge_unique<T>(
    target: &mut Vec<T>,
    items: Vec<T>,
    kind: &'static str,
    name: impl Fn(&T) -> &str,
) -> Result<(), GenerateError> {
    for item in items {
        if target.iter().any(|t| name(t) == name(&item)) {
            return Err(GenerateError::DuplicateDefinition {
                kind,
                name: name(&item).to_string(),
            });
        }
        target.push(item);
    }
    Ok(())
}

/// Adds one schema document to the pass model.
pub fn merge(model: &mut SchemaModel, doc: SchemaDocument) -> Result<(), GenerateError> {
    merge_unique(&mut model.entities, doc.entities, "entity", |e| e.name.as_str())?;
    merge_unique(&mut model.summaries, doc.summaries, "summary", |s| s.name.as_str())?;
    merge_unique(&mut model.enums, doc.enums, "enum", |e| e.name.as_str())?;
    merge_unique(&mut model.custom_requests, doc.custom_requests, "custom request", |r| r.name.as_str())?;
    merge_unique(&mut model.custom_responses, doc.custom_responses, "custom response", |r| r.name.as_str())?;
    Ok(())
}

/// Loads the documents reachable from `inputs`. Exactly one settings
/// document must be present.
pub fn load_documents(inputs: &[PathBuf]) -> Result<Documents, GenerateError> {
    let paths = collect_documents(inputs)?;
    let (settings_paths, schema_paths): (Vec<PathBuf>, Vec<PathBuf>) =
        paths.into_iter().partition(|p| has_suffix(p, SETTINGS_SUFFIX));

    if settings_paths.len() != 1 {
        return Err(GenerateError::Settings {
            found: settings_paths.len(),
        });
    }
    let settings_path = &settings_paths[0];
    tracing::debug!(path = %settings_path.display(), "loading settings");
    let settings = parse_settings(settings_path, &read(settings_path)?)?;

    let mut schema = SchemaModel::default();
    for path in &schema_paths {
        tracing::debug!(path = %path.display(), "loading schema document");
        let doc = parse_schema(path, &read(path)?)?;
        merge(&mut schema, doc)?;
    }
    tracing::info!(
        documents = schema_paths.len() + 1,
        entities = schema.entities.len(),
        summaries = schema.summaries.len(),
        enums = schema.enums.len(),
        "documents loaded"
    );
    Ok(Documents { settings, schema })
}
