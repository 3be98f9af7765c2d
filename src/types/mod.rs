mod cid;
mod metadata_record;
mod table;

pub use cid::Cid;
pub use metadata_record::{Attribute, Descriptor, MetadataRecord};
pub use table::{Receipt, TableHandle, WriteResult};
