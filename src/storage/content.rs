//! Content-addressed blob storage
//!
//! Payloads are stored in a flat directory under a name derived from their
//! bytes: the hex SHA-256 digest plus an extension (`txt` for page text, a
//! sniffed image format for images). Identical bytes always map to the same
//! file, and an existing file is never written again.

use crate::storage::traits::{ContentStore, StorageError, StorageResult};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Kind of payload handed to the content store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Extracted page text (UTF-8)
    Text,
    /// Raw image bytes
    Image,
}

/// Opaque, deterministic handle of a stored payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentRef(String);

impl ContentRef {
    /// Derives the handle for a payload without storing it
    ///
    /// # Examples
    ///
    /// ```
    /// use site_harvester::storage::{ContentKind, ContentRef};
    ///
    /// let r = ContentRef::for_content(b"hello", ContentKind::Text);
    /// assert_eq!(
    ///     r.as_str(),
    ///     "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824.txt"
    /// );
    /// ```
    pub fn for_content(bytes: &[u8], kind: ContentKind) -> Self {
        let digest = hex::encode(Sha256::digest(bytes));
        let extension = match kind {
            ContentKind::Text => "txt",
            ContentKind::Image => sniff_image_extension(bytes),
        };
        Self(format!("{}.{}", digest, extension))
    }

    /// Wraps a handle read back from the record store
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Infers an image file extension from the payload's magic number
///
/// Falls back to `bin` when the format is not recognized.
pub fn sniff_image_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else if bytes.len() >= 12 && &bytes[4..12] == b"ftypavif" {
        "avif"
    } else if bytes.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        "ico"
    } else if bytes.starts_with(b"BM") {
        "bmp"
    } else if looks_like_svg(bytes) {
        "svg"
    } else {
        "bin"
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Filesystem-backed content store
///
/// All payloads live directly under `root`. Writes use create-new semantics,
/// so two writers racing on identical bytes leave exactly one file behind.
#[derive(Debug)]
pub struct FsContentStore {
    root: PathBuf,
    writes: AtomicU64,
}

impl FsContentStore {
    /// Opens a content store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StorageError::Write {
            path: root.display().to_string(),
            source,
        })?;

        Ok(Self {
            root,
            writes: AtomicU64::new(0),
        })
    }

    /// Directory holding the stored payloads
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing a content handle
    pub fn path_for(&self, content_ref: &ContentRef) -> PathBuf {
        self.root.join(content_ref.as_str())
    }

    /// Number of physical writes performed by this store instance
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl ContentStore for FsContentStore {
    fn put(&self, bytes: &[u8], kind: ContentKind) -> StorageResult<ContentRef> {
        let content_ref = ContentRef::for_content(bytes, kind);
        let path = self.path_for(&content_ref);

        if path.exists() {
            tracing::trace!("Content {} already stored, skipping write", content_ref);
            return Ok(content_ref);
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(content_ref),
            Err(source) => {
                return Err(StorageError::Write {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        if let Err(source) = file.write_all(bytes) {
            // A truncated file would be mistaken for stored content later
            drop(file);
            let _ = std::fs::remove_file(&path);
            return Err(StorageError::Write {
                path: path.display().to_string(),
                source,
            });
        }

        self.writes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Stored {} ({} bytes)", content_ref, bytes.len());

        Ok(content_ref)
    }

    fn contains(&self, content_ref: &ContentRef) -> StorageResult<bool> {
        Ok(self.path_for(content_ref).try_exists()?)
    }
}
