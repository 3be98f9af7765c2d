use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::traits::{BlobFile, ContentStore};
use crate::types::Cid;

/// Content store kept on the local filesystem.
///
/// Blobs land in `<root>/blobs/<cid>`; a directory is a listing file in
/// `<root>/dirs/<cid>` naming the blobs it contains.
#[derive(Clone, Debug)]
pub struct LocalContentStore {
    root: PathBuf,
}

impl LocalContentStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(self.root.join("blobs"))?;
        std::fs::create_dir_all(self.root.join("dirs"))?;
        Ok(())
    }

    pub fn reset_all(&self) -> Result<()> {
        if !self.root.exists() {
            return Ok(());
        }
        std::fs::remove_dir_all(&self.root)?;
        Ok(())
    }

    pub fn blob_path(&self, cid: &Cid) -> PathBuf {
        self.root.join("blobs").join(cid.as_str())
    }

    pub fn directory_path(&self, cid: &Cid) -> PathBuf {
        self.root.join("dirs").join(cid.as_str())
    }

    fn put(&self, content: &[u8]) -> Result<Cid> {
        let cid = Cid::for_blob(content);
        let path = self.blob_path(&cid);
        if !path.exists() {
            std::fs::write(&path, content)
                .with_context(|| format!("writing blob {}", path.display()))?;
        }
        Ok(cid)
    }
}

impl ContentStore for LocalContentStore {
    fn store_blob(&self, file: &BlobFile) -> Result<Cid> {
        let cid = self.put(&file.content)?;
        log::debug!("stored blob {} as {}", file.name, cid);
        Ok(cid)
    }

    fn store_directory(&self, files: &[BlobFile]) -> Result<Cid> {
        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            entries.push((file.name.clone(), self.put(&file.content)?));
        }
        let cid = Cid::for_directory(&entries);

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let listing: String = entries
            .iter()
            .map(|(name, blob)| format!("{name} {blob}\n"))
            .collect();
        let path = self.directory_path(&cid);
        std::fs::write(&path, listing)
            .with_context(|| format!("writing directory listing {}", path.display()))?;

        log::debug!("stored directory of {} files as {}", files.len(), cid);
        Ok(cid)
    }
}
