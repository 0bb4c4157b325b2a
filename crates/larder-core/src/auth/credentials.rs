use anyhow::{Context, Result};
use keyring::Entry;

use super::SessionData;

const SERVICE_NAME: &str = "larder";

/// Keeps the last session in the OS keychain so the CLI can resume without
/// asking for the password again.
pub struct CredentialStore;

impl CredentialStore {
    /// Store the session for an email in the OS keychain
    pub fn store_session(email: &str, session: &SessionData) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        let json = serde_json::to_string(session)?;
        entry
            .set_password(&json)
            .context("Failed to store session in keychain")?;
        Ok(())
    }

    /// Load a stored session, `None` when nothing was stored for this email
    pub fn load_session(email: &str) -> Result<Option<SessionData>> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        match entry.get_password() {
            Ok(json) => {
                let session = serde_json::from_str(&json).context("Failed to parse stored session")?;
                Ok(Some(session))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve session from keychain"),
        }
    }

    /// Delete the stored session for an email. Missing entries are fine.
    pub fn delete(email: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session from keychain"),
        }
    }
}
