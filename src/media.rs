//! Transient media store.
//!
//! Downloaded message content is published into a scratch directory under
//! the static tree and served back over HTTP. Names embed a UUID so
//! concurrent webhook deliveries can never collide; content is written to a
//! temporary file first and renamed into place, so readers never observe a
//! partial file. Stored files are never deleted here; cleanup is an ops
//! concern.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use uuid::Uuid;

const MAX_MEDIA_SIZE: usize = 20 * 1024 * 1024; // 20MB

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Open the store, creating the scratch directory if needed. Creation is
    /// idempotent; a pre-existing directory is fine.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create media directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store content under a generated name with the given extension, e.g.
    /// `jpg-550e8400e29b41d4a716446655440000.jpg`. Returns the published
    /// file name.
    pub fn save_with_extension(&self, bytes: &[u8], extension: &str) -> Result<String> {
        let name = format!("{}-{}.{}", extension, Uuid::new_v4().simple(), extension);
        self.publish(bytes, &name)
    }

    /// Store content under a generated name suffixed with the sender-supplied
    /// file name, e.g. `file-550e8400…-report.pdf`.
    pub fn save_with_suffix(&self, bytes: &[u8], file_name: &str) -> Result<String> {
        let name = format!(
            "file-{}-{}",
            Uuid::new_v4().simple(),
            sanitize_file_name(file_name)
        );
        self.publish(bytes, &name)
    }

    fn publish(&self, bytes: &[u8], name: &str) -> Result<String> {
        if bytes.is_empty() {
            bail!("empty media content");
        }
        if bytes.len() > MAX_MEDIA_SIZE {
            bail!(
                "media too large: {} bytes (max {})",
                bytes.len(),
                MAX_MEDIA_SIZE
            );
        }

        // The temp file is removed on drop if any step below fails.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)
            .with_context(|| format!("failed to create temp file in {}", self.root.display()))?;
        tmp.write_all(bytes).context("failed to write media content")?;
        let target = self.root.join(name);
        tmp.persist(&target)
            .with_context(|| format!("failed to publish {}", target.display()))?;
        Ok(name.to_string())
    }
}

/// Keep only the final path component; the name is sender-controlled and
/// must not traverse out of the store.
fn sanitize_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .unwrap_or("file")
        .to_string()
}
