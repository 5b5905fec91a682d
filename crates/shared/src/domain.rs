use std::{path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Identity of an attachment for de-duplication: two files with the same
/// name and byte size are the same logical attachment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentKey {
    pub name: String,
    pub size: u64,
}

impl AttachmentKey {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Where an attachment's bytes come from. Paths are read when the request
/// is built, not when the file is added.
#[derive(Debug, Clone)]
pub enum AttachmentSource {
    Memory(Arc<[u8]>),
    Path(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub name: String,
    pub size: u64,
    pub mime_type: Option<String>,
    pub source: AttachmentSource,
}

impl Attachment {
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: Option<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            mime_type,
            source: AttachmentSource::Memory(bytes),
        }
    }

    pub fn key(&self) -> AttachmentKey {
        AttachmentKey::new(self.name.clone(), self.size)
    }

    pub fn matches(&self, key: &AttachmentKey) -> bool {
        self.name == key.name && self.size == key.size
    }

    pub fn content_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// A file handed over by a drop or browse gesture, before it is accepted as
/// an attachment or as plan text.
#[derive(Debug, Clone, Default)]
pub struct DroppedFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub path: Option<PathBuf>,
    pub bytes: Option<Arc<[u8]>>,
}

impl DroppedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            mime_type: None,
            path: Some(path),
            bytes: None,
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            path: None,
            bytes: Some(bytes.into()),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Declared content type, falling back to a guess from the file name.
    pub fn content_type(&self) -> Option<String> {
        match self.mime_type.as_deref() {
            Some(mime) if !mime.trim().is_empty() => Some(mime.to_string()),
            _ => mime_guess::from_path(&self.name)
                .first_raw()
                .map(str::to_string),
        }
    }

    pub fn is_text(&self) -> bool {
        self.content_type()
            .map(|mime| mime.starts_with("text/"))
            .unwrap_or(false)
    }
}
