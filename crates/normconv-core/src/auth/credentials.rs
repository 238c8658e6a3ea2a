use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

const SERVICE_NAME: &str = "normconv";

/// Keychain account the API key is stored under.
pub const DEFAULT_ACCOUNT: &str = "api-key";

/// The long-lived API key slot, backed by the OS keychain.
pub struct CredentialStore {
    account: String,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNT)
    }
}

impl CredentialStore {
    pub fn new(account: &str) -> Self {
        Self {
            account: account.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }

    /// Store the API key in the OS keychain
    pub fn store(&self, api_key: &str) -> Result<()> {
        self.entry()?
            .set_password(api_key)
            .context("Failed to store API key in keychain")?;
        debug!(account = %self.account, "API key stored");
        Ok(())
    }

    /// The stored API key, or `None` when nothing is stored.
    pub fn get(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(key) => Ok(Some(key)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve API key from keychain"),
        }
    }

    /// Delete the stored API key. Deleting a missing key is not an error.
    pub fn delete(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete API key from keychain"),
        }
    }
}
