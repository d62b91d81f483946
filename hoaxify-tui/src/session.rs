use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// The logged-in identity, or the anonymous default.
///
/// The session is owned by the `App` and only ever mutated through
/// [`Session::reduce`], so every write is an explicit, enumerable event
/// rather than ambient global access. The raw password is kept because the
/// backend authenticates every request with HTTP basic auth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub username: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub image: String,
    pub password: String,
    #[serde(rename = "isLoggedIn")]
    pub is_logged_in: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            id: 0,
            username: String::new(),
            display_name: String::new(),
            image: String::new(),
            password: String::new(),
            is_logged_in: false,
        }
    }
}

/// Every mutation of the session state.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    LoginSuccess {
        id: i64,
        username: String,
        display_name: String,
        image: Option<String>,
        password: String,
    },
    LogoutSuccess,
    /// A successful profile update propagates the new display name and
    /// avatar into the shared session.
    ProfileUpdated {
        display_name: String,
        image: Option<String>,
    },
}

impl Session {
    /// Single reducer over session events.
    pub fn reduce(&self, event: SessionEvent) -> Session {
        match event {
            SessionEvent::LoginSuccess {
                id,
                username,
                display_name,
                image,
                password,
            } => Session {
                id,
                username,
                display_name,
                image: image.unwrap_or_default(),
                password,
                is_logged_in: true,
            },
            SessionEvent::LogoutSuccess => Session::default(),
            SessionEvent::ProfileUpdated {
                display_name,
                image,
            } => Session {
                display_name,
                image: image.unwrap_or_default(),
                ..self.clone()
            },
        }
    }
}

/// Manages session persistence in the user's home directory.
///
/// The session record is stored as JSON in `~/.hoaxify/session` with 0600
/// permissions so only the owner can read the credential material.
#[derive(Debug, Clone)]
pub struct SessionStore {
    file_path: PathBuf,
}

impl SessionStore {
    /// Creates a new SessionStore with the default path `~/.hoaxify/session`.
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        let file_path = home_dir.join(".hoaxify").join("session");
        Ok(Self { file_path })
    }

    #[cfg(test)]
    pub fn with_path(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    /// Loads the persisted session, if any.
    ///
    /// A missing, empty, or corrupted file is treated as no session rather
    /// than an error so startup never fails on a bad record.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&self.file_path).context("Failed to read session file")?;

        if content.trim().is_empty() {
            log::warn!("Session file is empty, treating as no session");
            return Ok(None);
        }

        match serde_json::from_str::<Session>(&content) {
            Ok(session) if session.is_logged_in => {
                log::debug!(
                    "Loaded session for {} from {}",
                    session.username,
                    self.file_path.display()
                );
                Ok(Some(session))
            }
            Ok(_) => {
                log::debug!("Persisted session is anonymous, ignoring");
                Ok(None)
            }
            Err(e) => {
                log::warn!("Session file is corrupted ({}), treating as no session", e);
                Ok(None)
            }
        }
    }

    /// Saves the session with 0600 permissions using an atomic
    /// write-then-rename so a crash never leaves a partial record.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).context("Failed to create .hoaxify directory")?;
        }

        let content = serde_json::to_string(session).context("Failed to serialize session")?;
        let temp_path = self.file_path.with_extension("tmp");

        let mut file =
            fs::File::create(&temp_path).context("Failed to create temporary session file")?;
        file.write_all(content.as_bytes())
            .context("Failed to write session record")?;
        file.sync_all()
            .context("Failed to sync session file to disk")?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&temp_path, permissions)
                .context("Failed to set session file permissions")?;
        }

        fs::rename(&temp_path, &self.file_path)
            .context("Failed to rename temporary session file")?;

        log::info!("Saved session to {}", self.file_path.display());
        Ok(())
    }

    /// Deletes the session file. Succeeds even if the file doesn't exist.
    pub fn delete(&self) -> Result<()> {
        if self.file_path.exists() {
            fs::remove_file(&self.file_path).context("Failed to delete session file")?;
            log::info!("Deleted session file at {}", self.file_path.display());
        } else {
            log::debug!("Session file does not exist, nothing to delete");
        }
        Ok(())
    }
}
