pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteTableService;
pub use traits::{QueryError, Row, TableReader, TableService};
