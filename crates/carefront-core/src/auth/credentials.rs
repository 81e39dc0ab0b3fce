//! Remember-me support backed by the OS keychain.
//!
//! Only the sign-in password lives here. Session tokens go through
//! `SessionStore`; the keychain is for pre-filling the sign-in form.

use anyhow::{Context, Result};
use keyring::Entry;

/// Keychain service name shared by all Carefront portals
const KEYCHAIN_SERVICE: &str = "carefront";

/// The keychain slot for one username, held open across calls.
pub struct CredentialStore {
    entry: Entry,
}

impl CredentialStore {
    /// Open the keychain slot for a username
    pub fn for_user(username: &str) -> Result<Self> {
        let entry = Entry::new(KEYCHAIN_SERVICE, username)
            .context("Failed to create keyring entry")?;
        Ok(Self { entry })
    }

    /// Save the password in the OS keychain
    pub fn remember(&self, password: &str) -> Result<()> {
        self.entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Look up the saved password
    pub fn lookup(&self) -> Result<String> {
        self.entry
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Remove the saved password
    pub fn forget(&self) -> Result<()> {
        self.entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    /// Whether a password is saved for this username
    pub fn has_saved(&self) -> bool {
        self.entry.get_password().is_ok()
    }
}
