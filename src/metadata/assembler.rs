use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::storage::{BlobFile, ContentStore};
use crate::types::{Cid, Descriptor, MetadataRecord};

/// How an uploaded image is referenced from its descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ImageUri {
    /// `ipfs://{cid}`
    Ipfs,
    /// `https://{cid}.ipfs.nftstorage.link/`
    Gateway,
}

impl ImageUri {
    pub fn render(&self, cid: &Cid) -> String {
        match self {
            ImageUri::Ipfs => format!("ipfs://{cid}"),
            ImageUri::Gateway => gateway_url(cid),
        }
    }
}

pub fn gateway_url(cid: &Cid) -> String {
    format!("https://{cid}.ipfs.nftstorage.link/")
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("descriptor name `{0}` is not a numeric id")]
    InvalidId(String),
    #[error("error uploading image for {id}: {reason:#}")]
    Upload { id: u64, reason: anyhow::Error },
    #[error("error reading file in metadata directory: {id}: {source}")]
    Read { id: u64, source: std::io::Error },
    #[error("error parsing metadata file: {id}: {source}")]
    Parse { id: u64, source: serde_json::Error },
    #[error("metadata file {0} is not a JSON object")]
    NotAnObject(u64),
    #[error("error writing file in metadata directory: {id}: {source}")]
    Write { id: u64, source: std::io::Error },
}

/// Descriptor files of `dir` in directory-walk order. Hidden files and
/// sub-directories are skipped.
pub fn list_descriptors(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !entry.file_type()?.is_file() {
            continue;
        }
        out.push(entry.path());
    }
    Ok(out)
}

pub struct Assembler<'a, S: ContentStore + ?Sized> {
    store: &'a S,
    image_uri: ImageUri,
}

impl<'a, S: ContentStore + ?Sized> Assembler<'a, S> {
    pub fn new(store: &'a S, image_uri: ImageUri) -> Self {
        Self { store, image_uri }
    }

    /// Uploads each descriptor's `{id}.jpeg`, rewrites its `image` field in
    /// place and returns the records in listing order. A descriptor that
    /// fails at any step is logged and left out.
    pub fn assemble(&self, metadata_dir: &Path, images_dir: &Path) -> Result<Vec<MetadataRecord>> {
        let descriptors = list_descriptors(metadata_dir)?;
        let mut records = Vec::with_capacity(descriptors.len());
        for path in descriptors {
            match self.assemble_one(&path, images_dir) {
                Ok(record) => {
                    log::info!("📄 Prepared metadata {} ({})", record.id, record.image);
                    records.push(record);
                }
                Err(e) => log::error!("⚠️ Skipping {}: {}", path.display(), e),
            }
        }
        Ok(records)
    }

    fn assemble_one(&self, path: &Path, images_dir: &Path) -> Result<MetadataRecord, AssembleError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id: u64 = name
            .parse()
            .map_err(|_| AssembleError::InvalidId(name.clone()))?;

        let image = BlobFile::from_path(&images_dir.join(format!("{name}.jpeg")))
            .map_err(|reason| AssembleError::Upload { id, reason })?;
        let cid = self
            .store
            .store_blob(&image)
            .map_err(|reason| AssembleError::Upload { id, reason })?;

        let raw = std::fs::read(path).map_err(|source| AssembleError::Read { id, source })?;
        let mut json: serde_json::Value =
            serde_json::from_slice(&raw).map_err(|source| AssembleError::Parse { id, source })?;
        json.as_object_mut()
            .ok_or(AssembleError::NotAnObject(id))?
            .insert("image".to_string(), self.image_uri.render(&cid).into());

        let descriptor: Descriptor = serde_json::from_value(json.clone())
            .map_err(|source| AssembleError::Parse { id, source })?;

        let rewritten =
            serde_json::to_vec(&json).map_err(|source| AssembleError::Parse { id, source })?;
        std::fs::write(path, rewritten).map_err(|source| AssembleError::Write { id, source })?;

        Ok(MetadataRecord::from_descriptor(id, descriptor))
    }

    /// Stores every descriptor file of `metadata_dir` as one directory and
    /// returns its address.
    pub fn upload_directory(&self, metadata_dir: &Path) -> Result<Cid> {
        let files = list_descriptors(metadata_dir)?
            .iter()
            .map(|path| BlobFile::from_path(path))
            .collect::<Result<Vec<_>>>()?;
        self.store
            .store_directory(&files)
            .context("uploading metadata directory")
    }
}
