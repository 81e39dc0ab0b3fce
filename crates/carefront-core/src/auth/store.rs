//! Persistent session storage shared by every portal.
//!
//! Credentials live in a flat string key/value map persisted as
//! `session.json` in the data directory. The key names are fixed and
//! shared with the web portals, so existing sessions survive upgrades.
//!
//! The store is written through on every mutation. Storage writes never
//! fail user-visibly; failures are logged and the in-memory state wins.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Storage key for the bearer access token
pub const KEY_ACCESS_TOKEN: &str = "accessToken";

/// Storage key for the refresh token
pub const KEY_REFRESH_TOKEN: &str = "refreshToken";

/// Storage key for the session flag, `"true"` while signed in
pub const KEY_IS_LOGIN: &str = "isLogin";

/// Storage key for the signed-in role (patient, doctor, pharmacist, admin)
pub const KEY_CURRENT_USER: &str = "currentUser";

/// Broadcast to the portals so they can route between the signed-in
/// shell and the sign-in screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    SignedIn,
    SignedOut,
}

pub struct SessionStore {
    data_dir: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Open the store, loading any session persisted by a previous run.
    /// A corrupt session file is discarded and the user signs in again.
    pub fn open(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let path = data_dir.join(SESSION_FILE);
        let values: BTreeMap<String, String> = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read session file")?;
            match serde_json::from_str(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!(error = %e, "Discarding unparseable session file");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        let initial = if values.get(KEY_IS_LOGIN).map(String::as_str) == Some("true")
            && values.contains_key(KEY_ACCESS_TOKEN)
        {
            SessionState::SignedIn
        } else {
            SessionState::SignedOut
        };
        let (state_tx, _) = watch::channel(initial);

        Ok(Self {
            data_dir,
            values: RwLock::new(values),
            state_tx,
        })
    }

    /// Subscribe to sign-in/sign-out transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    // ===== Generic key/value access =====

    pub fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }

    pub fn remove(&self, key: &str) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        self.persist(&values);
    }

    // ===== Session accessors =====

    pub fn access_token(&self) -> Option<String> {
        self.get(KEY_ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(KEY_REFRESH_TOKEN)
    }

    /// The session flag. The client only attaches bearer credentials when
    /// this is set and an access token is present.
    pub fn is_logged_in(&self) -> bool {
        self.get(KEY_IS_LOGIN).as_deref() == Some("true")
    }

    pub fn current_user(&self) -> Option<String> {
        self.get(KEY_CURRENT_USER)
    }

    // ===== Session transitions =====

    /// Record a successful sign-in and broadcast the transition.
    pub fn sign_in(&self, access_token: &str, refresh_token: &str, role: &str) {
        {
            let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
            values.insert(KEY_ACCESS_TOKEN.to_string(), access_token.to_string());
            values.insert(KEY_REFRESH_TOKEN.to_string(), refresh_token.to_string());
            values.insert(KEY_IS_LOGIN.to_string(), "true".to_string());
            values.insert(KEY_CURRENT_USER.to_string(), role.to_string());
            self.persist(&values);
        }
        self.state_tx.send_replace(SessionState::SignedIn);
        debug!(role, "Session opened");
    }

    pub fn set_access_token(&self, token: &str) {
        self.set(KEY_ACCESS_TOKEN, token);
    }

    pub fn set_refresh_token(&self, token: &str) {
        self.set(KEY_REFRESH_TOKEN, token);
    }

    /// Clear every session key, delete the session file and broadcast
    /// the sign-out so the portals route back to the sign-in screen.
    pub fn end_session(&self) {
        {
            let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
            values.clear();
            let path = self.session_path();
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!(error = %e, "Failed to remove session file");
                }
            }
        }
        self.state_tx.send_replace(SessionState::SignedOut);
        debug!("Session ended");
    }

    // ===== Persistence =====

    fn persist(&self, values: &BTreeMap<String, String>) {
        if let Err(e) = self.write_session_file(values) {
            warn!(error = %e, "Failed to save session file");
        }
    }

    fn write_session_file(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let path = self.session_path();
        let contents = serde_json::to_string_pretty(values)?;
        std::fs::write(&path, contents).context("Failed to write session file")?;

        // Tokens on disk are readable by the owning user only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set session file permissions")?;
        }
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}
