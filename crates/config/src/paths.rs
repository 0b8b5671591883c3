//! Path helpers for session file locations.
//!
//! Responsibilities:
//! - Determine the platform-appropriate default session file path.
//! - Use `directories` crate for platform-appropriate paths.
//!
//! Does NOT handle:
//! - File I/O operations (see the client crate's file token store).

use std::path::PathBuf;

use anyhow::Context;

use crate::constants::{APP_DIR_NAME, SESSION_FILE_NAME};

/// Returns the default path to the persisted session document.
///
/// - Linux/macOS: `~/.config/blog-session/session.json`
/// - Windows: `%AppData%\blog-session\session.json`
pub fn default_session_path() -> Result<PathBuf, anyhow::Error> {
    let proj_dirs = directories::ProjectDirs::from("", "", APP_DIR_NAME)
        .context("Failed to determine project directories")?;

    Ok(proj_dirs.config_dir().join(SESSION_FILE_NAME))
}
