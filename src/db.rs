//! Connection handling shared by the SQLite-backed services.

use rusqlite::Connection;

/// Layout of one database file: the version it is stamped with and the DDL
/// that creates it from an empty file.
pub struct Schema {
    pub label: &'static str,
    pub version: i64,
    pub create: &'static str,
}

/// Opens `path` with WAL journaling and a short busy timeout, creating the
/// schema on first use.
pub fn open(path: &str, schema: &Schema) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(std::time::Duration::from_millis(500))?;
    migrate(&conn, schema)?;
    Ok(conn)
}

fn migrate(conn: &Connection, schema: &Schema) -> rusqlite::Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version == schema.version {
        return Ok(());
    }

    if version == 0 {
        log::info!(
            "SQLite {} migration: {} -> {}",
            schema.label,
            version,
            schema.version
        );
        conn.execute_batch(schema.create)?;
        conn.pragma_update(None, "user_version", schema.version)?;
        return Ok(());
    }

    Err(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
        Some(format!(
            "{} schema version mismatch; please run with --reset option",
            schema.label
        )),
    ))
}
