pub mod codegen;
pub mod emit;
pub mod error;
pub mod ir;
pub mod lint;
pub mod loader;
pub mod naming;
pub mod runtime;
pub mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use codegen::Artifact;
pub use error::{Diagnostic, GenerateError};
pub use lint::lint_schema;
pub use loader::load_documents;

/// Loads, validates and renders every document reachable from `inputs`.
/// Nothing is written; callers decide what to do with the artifacts.
pub fn generate_from_paths(inputs: &[PathBuf]) -> std::result::Result<Vec<Artifact>, GenerateError> {
    let docs = loader::load_documents(inputs)?;
    let errors = lint::lint_schema(&docs.schema, &docs.settings);
    if !errors.is_empty() {
        return Err(GenerateError::InvalidSchema(errors));
    }
    codegen::generate(&docs.schema, &docs.settings)
}

/// Lints the documents reachable from `inputs` without generating.
pub fn lint_paths(inputs: &[PathBuf]) -> std::result::Result<Vec<String>, GenerateError> {
    let docs = loader::load_documents(inputs)?;
    Ok(lint::lint_schema(&docs.schema, &docs.settings))
}

/// Writes artifacts below `out_dir`, creating the target directories.
/// Files whose content is unchanged are left alone.
pub fn write_artifacts(artifacts: &[Artifact], out_dir: &Path) -> Result<usize> {
    let mut written = 0;
    for artifact in artifacts {
        let path = out_dir.join(artifact.path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
        }
        if fs::read_to_string(&path).ok().as_deref() == Some(artifact.content.as_str()) {
            continue;
        }
        fs::write(&path, &artifact.content).with_context(|| format!("failed to write {}", path.display()))?;
        written += 1;
    }
    tracing::info!(written, total = artifacts.len(), out = %out_dir.display(), "artifacts written");
    Ok(written)
}

/// Returns the artifact paths under `out_dir` that are missing or differ
/// from what a pass would write.
pub fn check_artifacts(artifacts: &[Artifact], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut stale = Vec::new();
    for artifact in artifacts {
        let path = out_dir.join(artifact.path());
        match fs::read_to_string(&path) {
            Ok(existing) if existing == artifact.content => {}
            Ok(_) => stale.push(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => stale.push(path),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }
    Ok(stale)
}
