use anyhow::Result;
use std::path::PathBuf;

const FLOWBOARD_DIR: &str = ".flowboard";
const DB_FILE: &str = "flowboard.db";

/// Environment variable to override the Flowboard directory.
const FLOWBOARD_DIR_ENV: &str = "FLOWBOARD_DIR";

/// Resolve the Flowboard data directory.
/// Priority: FLOWBOARD_DIR env var > ~/.flowboard/
pub fn resolve_flowboard_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(FLOWBOARD_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(FLOWBOARD_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the Flowboard directory exists and return its path.
pub fn ensure_flowboard_dir() -> Result<PathBuf> {
    let dir = resolve_flowboard_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the database path: ~/.flowboard/flowboard.db
pub fn database_path() -> Result<PathBuf> {
    Ok(resolve_flowboard_dir()?.join(DB_FILE))
}

/// Ensure the parent directory exists and return the database path.
pub fn ensure_database_path() -> Result<PathBuf> {
    Ok(ensure_flowboard_dir()?.join(DB_FILE))
}

/// Convenience helper returning the database path as a UTF-8 string.
pub fn ensure_database_path_string() -> Result<String> {
    Ok(ensure_database_path()?.to_string_lossy().into_owned())
}
