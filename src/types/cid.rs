use std::fmt;

use sha2::{Digest, Sha256};

/// Base16 multibase CIDv1 prefix for the `raw` codec with a sha2-256 multihash.
const RAW_PREFIX: &str = "f01551220";
/// Same, with the `dag-pb` codec used for directories.
const DIRECTORY_PREFIX: &str = "f01701220";

/// Content address of a blob or a directory of blobs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid(String);

impl Cid {
    pub fn for_blob(content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        Self(format!("{RAW_PREFIX}{}", hex::encode(digest)))
    }

    /// Address of a directory, computed over its `name -> cid` listing sorted by name.
    pub fn for_directory(entries: &[(String, Cid)]) -> Self {
        let mut sorted: Vec<&(String, Cid)> = entries.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = Sha256::new();
        for (name, cid) in sorted {
            hasher.update(name.as_bytes());
            hasher.update(b" ");
            hasher.update(cid.0.as_bytes());
            hasher.update(b"\n");
        }
        Self(format!("{DIRECTORY_PREFIX}{}", hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
