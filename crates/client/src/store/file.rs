//! File-backed token store.
//!
//! The document is a flat JSON object of string values under the
//! `blog_session.*` key namespace: the access token, the refresh token, and
//! the user snapshot serialized as a JSON string. Writes go to a temporary
//! file that is renamed over the target.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use blog_config::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
use tracing::{debug, warn};

use super::{TokenStore, holds};
use crate::auth::{Credential, UserSnapshot};

type Document = BTreeMap<String, String>;

/// Token store persisting the session to a JSON file.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Option<Document> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(document) => Some(document),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Session file is not valid JSON");
                None
            }
        }
    }

    fn write_document(&self, document: &Document) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(document)?;
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, content)?;
        restrict_permissions(&temp_path)?;
        std::fs::rename(&temp_path, &self.path)?;

        debug!(path = %self.path.display(), "Saved session file");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn credential_in(document: &Document) -> Option<Credential> {
        let access = document.get(ACCESS_TOKEN_KEY)?;
        Credential::new(access.clone(), document.get(REFRESH_TOKEN_KEY).cloned()).ok()
    }

    /// Apply `edit` to the current document and persist it; failures are logged.
    fn update(&self, edit: impl FnOnce(&mut Document)) {
        let _guard = self.lock();
        let mut document = self.read_document().unwrap_or_default();
        edit(&mut document);
        self.persist(&document);
    }

    fn persist(&self, document: &Document) {
        if let Err(e) = self.write_document(document) {
            warn!(path = %self.path.display(), error = %e, "Failed to write session file");
        }
    }

    // Caller holds the write lock.
    fn remove_file(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed session file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove session file")
            }
        }
    }
}

fn write_credential(document: &mut Document, credential: &Credential) {
    document.insert(
        ACCESS_TOKEN_KEY.to_string(),
        credential.access_token().to_string(),
    );
    match credential.refresh_token() {
        Some(refresh) => {
            document.insert(REFRESH_TOKEN_KEY.to_string(), refresh.to_string());
        }
        None => {
            document.remove(REFRESH_TOKEN_KEY);
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<Credential> {
        Self::credential_in(&self.read_document()?)
    }

    fn set(&self, credential: &Credential) {
        self.update(|document| write_credential(document, credential));
    }

    fn user(&self) -> Option<UserSnapshot> {
        let document = self.read_document()?;
        let raw = document.get(USER_KEY)?;
        match serde_json::from_str(raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Stored user snapshot is not valid JSON");
                None
            }
        }
    }

    fn set_user(&self, user: &UserSnapshot) {
        let encoded = match serde_json::to_string(user) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Failed to serialize user snapshot");
                return;
            }
        };
        self.update(|document| {
            document.insert(USER_KEY.to_string(), encoded);
        });
    }

    fn clear(&self) {
        let _guard = self.lock();
        self.remove_file();
    }

    fn replace_if(&self, expected: &str, credential: &Credential) -> bool {
        let _guard = self.lock();
        let Some(mut document) = self.read_document() else {
            return false;
        };
        if !holds(Self::credential_in(&document).as_ref(), expected) {
            return false;
        }
        write_credential(&mut document, credential);
        self.persist(&document);
        true
    }

    fn clear_if(&self, expected: &str) -> bool {
        let _guard = self.lock();
        let current = self
            .read_document()
            .and_then(|document| Self::credential_in(&document));
        if !holds(current.as_ref(), expected) {
            return false;
        }
        self.remove_file();
        true
    }
}
