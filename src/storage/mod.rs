pub mod local;
pub mod traits;

pub use local::LocalContentStore;
pub use traits::{BlobFile, ContentStore};
