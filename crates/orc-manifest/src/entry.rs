/// What the executor should do with a parsed entry once it reaches the
/// patch writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Create,
    Modify,
    Delete,
}

impl FileOperation {
    /// FILE-block manifests carry no explicit operation tag in their
    /// grammar; an empty body is treated as a delete marker (the Implementer
    /// emits an empty block to signal "remove this file" in patch mode),
    /// everything else defaults to create. `modify` is assigned later by the
    /// patch writer, which is the only component that knows whether a path
    /// already exists on disk.
    pub fn infer(content: &str) -> Self {
        if content.trim().is_empty() {
            FileOperation::Delete
        } else {
            FileOperation::Create
        }
    }
}

/// One file described by a FILE-block manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: String,
    pub content: String,
    pub operation: FileOperation,
    pub language: Option<String>,
}
