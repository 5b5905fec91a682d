//! The de-duplicated attachment collection behind the drop zone and file
//! picker, and the rows it renders into.

use anyhow::{anyhow, Context, Result};
use shared::domain::{Attachment, AttachmentKey, AttachmentSource, DroppedFile};

pub const EMPTY_ATTACHMENTS_PLACEHOLDER: &str = "Drag and drop files here or click Add Files";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRow {
    pub key: AttachmentKey,
    pub display_name: String,
    pub size_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentListView {
    Placeholder(&'static str),
    Rows(Vec<AttachmentRow>),
}

/// Attachments in insertion order, at most one per `(name, size)`.
#[derive(Debug, Default, Clone)]
pub struct AttachmentSet {
    entries: Vec<Attachment>,
}

impl AttachmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts every candidate whose identity is not held yet and returns how
    /// many were inserted. Duplicates are skipped without notice.
    pub fn add(&mut self, files: impl IntoIterator<Item = Attachment>) -> usize {
        let mut added = 0;
        for file in files {
            let key = file.key();
            if self.contains(&key) {
                tracing::debug!(name = %key.name, size = key.size, "skipping duplicate attachment");
                continue;
            }
            self.entries.push(file);
            added += 1;
        }
        added
    }

    pub fn remove(&mut self, key: &AttachmentKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.matches(key));
        before != self.entries.len()
    }

    pub fn contains(&self, key: &AttachmentKey) -> bool {
        self.entries.iter().any(|entry| entry.matches(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Attachment> {
        self.entries.clone()
    }

    pub fn render(&self) -> AttachmentListView {
        if self.entries.is_empty() {
            return AttachmentListView::Placeholder(EMPTY_ATTACHMENTS_PLACEHOLDER);
        }
        AttachmentListView::Rows(
            self.entries
                .iter()
                .map(|entry| AttachmentRow {
                    key: entry.key(),
                    display_name: entry.name.clone(),
                    size_label: human_readable_bytes(entry.size),
                })
                .collect(),
        )
    }
}

/// Turns a dropped or picked file into an attachment. Path-backed files only
/// have their metadata read here; their bytes are read at submission time.
pub fn attachment_from_dropped(file: &DroppedFile) -> Result<Attachment> {
    let mime_type = file.content_type();
    if let Some(bytes) = &file.bytes {
        return Ok(Attachment {
            name: file.name.clone(),
            size: bytes.len() as u64,
            mime_type,
            source: AttachmentSource::Memory(bytes.clone()),
        });
    }

    let path = file
        .path
        .as_ref()
        .ok_or_else(|| anyhow!("dropped file '{}' has neither path nor bytes", file.name))?;
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("failed to stat '{}'", path.display()))?;
    if metadata.is_dir() {
        return Err(anyhow!("'{}' is a directory", path.display()));
    }

    Ok(Attachment {
        name: file.name.clone(),
        size: metadata.len(),
        mime_type,
        source: AttachmentSource::Path(path.clone()),
    })
}

/// Reads the full content of an attachment.
pub async fn read_attachment_bytes(attachment: &Attachment) -> std::io::Result<Vec<u8>> {
    match &attachment.source {
        AttachmentSource::Memory(bytes) => Ok(bytes.to_vec()),
        AttachmentSource::Path(path) => tokio::fs::read(path).await,
    }
}

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Size label for an attachment row in 1024-based units with at most one
/// decimal: `1536` is `1.5 KB`. A value that would round to 1024 moves up a
/// unit, so `1048575` is `1 MB` rather than `1024 KB`.
pub fn human_readable_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while unit + 1 < SIZE_UNITS.len() && (value * 10.0).round() >= 10240.0 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        return format!("{bytes} B");
    }
    let text = format!("{value:.1}");
    let compact = text.strip_suffix(".0").unwrap_or(&text);
    format!("{compact} {}", SIZE_UNITS[unit])
}

#[cfg(test)]
#[path = "tests/attachments_tests.rs"]
mod tests;
