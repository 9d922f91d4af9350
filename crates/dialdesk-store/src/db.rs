use crate::error::{Result, StoreError};
use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::Path;

const BUSY_TIMEOUT_MS: i64 = 5000;

/// Opens (or creates) the local store database.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    restrict_db_permissions(path)?;
    apply_local_pragmas(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    apply_local_pragmas(&conn)?;
    Ok(conn)
}

/// Opens a database owned by another program. The file must already exist
/// and the connection refuses writes.
pub fn open_read_only(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.display().to_string()));
    }
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
        | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(path, flags)?;
    conn.pragma_update(None, "query_only", "ON")?;
    conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)?;
    Ok(conn)
}

fn apply_local_pragmas(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_db_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if path.exists() {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn restrict_db_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
