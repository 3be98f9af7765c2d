use std::path::Path;

use anyhow::{Context, Result};

use crate::types::Cid;

/// A named file ready to be uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl BlobFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", path.display()))?;
        Ok(Self { name, content })
    }
}

/// Content-addressed storage: the same bytes always yield the same address.
pub trait ContentStore {
    fn store_blob(&self, file: &BlobFile) -> Result<Cid>;
    fn store_directory(&self, files: &[BlobFile]) -> Result<Cid>;
}
