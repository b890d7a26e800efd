use std::collections::HashSet;
use std::path::PathBuf;

use crate::emit::TypeWriter;
use crate::error::GenerateError;
use crate::ir::{SchemaModel, Target};
use crate::naming;
use crate::settings::Settings;

pub mod client;
pub mod contract;
pub mod directives;
pub mod endpoints;
pub mod entities;
pub mod enums;
pub mod fields;
pub mod persistence;
pub mod requests;
pub mod services;

/// One rendered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub target: Target,
    pub type_name: String,
    pub content: String,
}

impl Artifact {
    /// Output path relative to the output directory.
    pub fn path(&self) -> PathBuf {
        PathBuf::from(self.target.dir_name()).join(naming::file_name(&self.type_name))
    }
}

/// Artifacts of one pass. Registering a name twice is an error.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
    seen: HashSet<(Target, String)>,
}

impl ArtifactSet {
    pub fn push(&mut self, target: Target, writer: &TypeWriter) -> Result<(), GenerateError> {
        let content = writer.render()?;
        let key = (target, writer.name().to_string());
        if !self.seen.insert(key) {
            return Err(GenerateError::DuplicateArtifact(format!(
                "{}/{}",
                target.dir_name(),
                writer.name()
            )));
        }
        self.artifacts.push(Artifact {
            target,
            type_name: writer.name().to_string(),
            content,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn into_vec(self) -> Vec<Artifact> {
        self.artifacts
    }
}

type Stage = fn(&SchemaModel, &Settings, &mut ArtifactSet) -> Result<(), GenerateError>;

/// Writers in dependency order: later stages reference names derived by
/// earlier ones.
const STAGES: [(&str, Stage); 8] = [
    ("enums", enums::generate),
    ("persistence", persistence::generate),
    ("entities", entities::generate),
    ("requests", requests::generate),
    ("custom requests", requests::generate_custom),
    ("services", services::generate),
    ("endpoints", endpoints::generate),
    ("clients", client::generate),
];

/// Runs every writer and returns the rendered artifacts of the pass.
pub fn generate(schema: &SchemaModel, settings: &Settings) -> Result<Vec<Artifact>, GenerateError> {
    let mut set = ArtifactSet::default();
    for (stage, writer) in STAGES {
        let before = set.len();
        writer(schema, settings, &mut set)?;
        tracing::info!(stage, artifacts = set.len() - before, "generated");
    }
    Ok(set.into_vec())
}
