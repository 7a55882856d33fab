use serde::{Deserialize, Serialize};

use crate::Id;

/// What kind of content an [`Artifact`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Code,
    Test,
    Review,
    Diff,
    Backup,
}

/// A piece of output attached to a run: generated code, a test manifest, a
/// review verdict, a diff, or a pre-patch backup. Immutable once the run
/// that produced it has terminated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Id,
    pub run_id: Id,
    pub name: String,
    pub artifact_type: ArtifactType,
    pub content: Vec<u8>,
}

impl Artifact {
    pub fn new(run_id: Id, name: impl Into<String>, artifact_type: ArtifactType, content: impl Into<Vec<u8>>) -> Self {
        Artifact {
            id: crate::new_id(),
            run_id,
            name: name.into(),
            artifact_type,
            content: content.into(),
        }
    }
}
