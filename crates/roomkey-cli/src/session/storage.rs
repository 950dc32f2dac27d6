//! Session storage for persisting login state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use roomkey_core::{AccessToken, ApiUrl, RefreshToken, TokenListener};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Stored session data.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredSession {
    pub api: String,
    pub access_token: String,
    pub refresh_token: String,
    pub saved_at: DateTime<Utc>,
}

/// Get the session file path.
pub fn session_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "roomkey").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join("session.json"))
}

/// The on-disk session, kept in step with the SDK's tokens.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
    api: ApiUrl,
}

impl SessionFile {
    pub fn new(path: PathBuf, api: ApiUrl) -> Self {
        Self { path, api }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session, if any.
    pub fn load(&self) -> Result<Option<StoredSession>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read session file"),
        };

        let stored = serde_json::from_str(&json).context("Invalid session file")?;
        Ok(Some(stored))
    }

    /// Write a token pair to disk.
    pub fn save(&self, access: &AccessToken, refresh: &RefreshToken) -> Result<()> {
        let stored = StoredSession {
            api: self.api.to_string(),
            access_token: access.as_str().to_string(),
            refresh_token: refresh.as_str().to_string(),
            saved_at: Utc::now(),
        };

        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, &json).context("Failed to write session file")?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }

    /// Remove the stored session. Missing files are not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove session file"),
        }
    }
}

impl TokenListener for SessionFile {
    fn tokens_changed(&self, access: Option<&AccessToken>, refresh: Option<&RefreshToken>) {
        let result = match (access, refresh) {
            (Some(access), Some(refresh)) => self.save(access, refresh),
            _ => self.clear(),
        };

        match result {
            Ok(()) => debug!(path = %self.path.display(), "session file updated"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to update session file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_file(dir: &tempfile::TempDir) -> SessionFile {
        SessionFile::new(
            dir.path().join("session.json"),
            ApiUrl::new("https://api.example.com").unwrap(),
        )
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(session_file(&dir).load().unwrap().is_none());
    }

    #[test]
    fn listener_saves_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let file = session_file(&dir);

        file.tokens_changed(
            Some(&AccessToken::new("T1")),
            Some(&RefreshToken::new("R1")),
        );
        let stored = file.load().unwrap().unwrap();
        assert_eq!(stored.api, "https://api.example.com");
        assert_eq!(stored.access_token, "T1");
        assert_eq!(stored.refresh_token, "R1");

        file.tokens_changed(None, None);
        assert!(!file.path().exists());

        // Clearing twice is harmless.
        file.tokens_changed(None, None);
        assert!(file.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private() {
        let dir = tempfile::tempdir().unwrap();
        let file = session_file(&dir);
        file.save(&AccessToken::new("T1"), &RefreshToken::new("R1"))
            .unwrap();

        let mode = fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = session_file(&dir);
        fs::write(file.path(), "not json").unwrap();
        assert!(file.load().is_err());
    }
}
