//! Serialization for documents and their history.
//!
//! A [`DocumentSnapshot`] is the complete persistent state of a document:
//! layers, the object arena and the id counters, plus optionally the undo
//! and redo stacks. [`DocumentFile`] wraps it with metadata for saving to
//! disk as pretty JSON.

use anyhow::{Context, Result as AnyResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use diagramkit_core::{Error, ModelError, ObjectId, Result};

use crate::document::{DocLayer, Document, DocumentStore};
use crate::history::{HistorySnapshot, UndoManager};
use crate::model::CanvasObject;

/// Document file format version
pub const FILE_FORMAT_VERSION: &str = "1.0";

/// Persistent state of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub name: String,
    pub layers: Vec<DocLayer>,
    /// Every object, sorted by id.
    pub objects: Vec<CanvasObject>,
    pub next_object: u64,
    pub next_layer: u64,
    #[serde(default)]
    pub history: Option<HistorySnapshot>,
}

/// Document file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            modified: now,
            author: String::new(),
            description: String::new(),
        }
    }
}

/// On-disk document file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFile {
    pub version: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    pub document: DocumentSnapshot,
}

impl DocumentFile {
    pub fn new(document: DocumentSnapshot) -> Self {
        Self {
            version: FILE_FORMAT_VERSION.to_string(),
            metadata: DocumentMetadata::default(),
            document,
        }
    }

    /// Save to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> AnyResult<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize document")?;
        std::fs::write(path.as_ref(), json).context("Failed to write document file")?;
        tracing::info!("Saved document '{}' to {}", self.document.name, path.as_ref().display());
        Ok(())
    }

    /// Load from file
    pub fn load_from_file(path: impl AsRef<Path>) -> AnyResult<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read document file")?;
        let file: DocumentFile =
            serde_json::from_str(&content).context("Failed to parse document file")?;
        if file.version != FILE_FORMAT_VERSION {
            tracing::warn!(
                "Document file version {} differs from {}",
                file.version,
                FILE_FORMAT_VERSION
            );
        }
        Ok(file)
    }
}

impl Document {
    /// Captures the document; `with_history` also captures both stacks.
    ///
    /// Fails while a transaction is open.
    pub fn to_snapshot(&self, with_history: bool) -> Result<DocumentSnapshot> {
        if self.history().in_transaction() {
            return Err(diagramkit_core::HistoryError::TransactionOpen {
                name: "snapshot".to_string(),
            }
            .into());
        }
        let mut objects: Vec<CanvasObject> = self.store.objects.values().cloned().collect();
        objects.sort_by_key(|o| o.id);
        Ok(DocumentSnapshot {
            name: self.name().to_string(),
            layers: self.store.layers.clone(),
            objects,
            next_object: self.store.next_object,
            next_layer: self.store.next_layer,
            history: with_history.then(|| self.history().snapshot()),
        })
    }

    /// Rebuilds a document, checking that the tree is consistent: every
    /// object is reachable exactly once, parent links match the owning
    /// lists, and the id counters are ahead of every id in use.
    pub fn from_snapshot(snapshot: DocumentSnapshot, max_undo_depth: usize) -> Result<Document> {
        let mut store = DocumentStore::default();
        if snapshot.layers.is_empty() {
            return Err(ModelError::LastLayer.into());
        }
        for object in snapshot.objects {
            if object.id.0 == 0 || object.id.0 > snapshot.next_object {
                return Err(Error::other(format!(
                    "{} is outside the allocated id range",
                    object.id
                )));
            }
            if store.objects.insert(object.id, object.clone()).is_some() {
                return Err(ModelError::DuplicateObject { id: object.id }.into());
            }
        }
        store.layers = snapshot.layers;
        store.next_object = snapshot.next_object;
        store.next_layer = snapshot.next_layer;

        let mut seen = HashSet::new();
        for layer in &store.layers {
            if layer.id.0 == 0 || layer.id.0 > store.next_layer {
                return Err(Error::other(format!(
                    "{} is outside the allocated id range",
                    layer.id
                )));
            }
            for &top in layer.objects() {
                check_subtree(&store, layer, top, None, &mut seen)?;
            }
        }
        if let Some(orphan) = store.objects.keys().find(|id| !seen.contains(*id)) {
            return Err(Error::other(format!("{} is not reachable from any layer", orphan)));
        }

        let mut history = UndoManager::with_depth(max_undo_depth);
        if let Some(h) = snapshot.history {
            history.restore(h)?;
        }
        tracing::debug!(
            "Restored document '{}' ({} objects)",
            snapshot.name,
            store.objects.len()
        );
        Ok(Document::from_parts(snapshot.name, store, history))
    }

    pub fn to_json(&self, with_history: bool) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot(with_history)?)?)
    }

    pub fn from_json(json: &str, max_undo_depth: usize) -> Result<Document> {
        let snapshot: DocumentSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot, max_undo_depth)
    }
}

fn check_subtree(
    store: &DocumentStore,
    layer: &DocLayer,
    id: ObjectId,
    parent: Option<ObjectId>,
    seen: &mut HashSet<ObjectId>,
) -> Result<()> {
    let object = store.object(id)?;
    if !seen.insert(id) {
        return Err(ModelError::DuplicateObject { id }.into());
    }
    if object.parent != parent || object.layer != layer.id() {
        return Err(Error::other(format!("{} has inconsistent tree links", id)));
    }
    for &child in object.children() {
        check_subtree(store, layer, child, Some(id), seen)?;
    }
    Ok(())
}
