/// Start-up routing for the terminal: OS keychain vault, password check and
/// the onboarding / login prompts behind each route.
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Context, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use ember_wallet_core::error::{Error, Result as CoreResult};
use ember_wallet_core::{
    CredentialVault, Credentials, EntryRouter, Keyring, Navigator, Preferences, Route, Session,
    EXISTING_USER_KEY,
};
use tracing::{debug, warn};
use zeroize::Zeroizing;

const KEYCHAIN_SERVICE: &str = "ember-wallet";
const KEYCHAIN_USER: &str = "wallet";
/// Preferences key holding the argon2 PHC string of the wallet password.
pub const PASSWORD_HASH_KEY: &str = "passwordHash";
const LOGIN_ATTEMPTS: usize = 3;

/// Saved password in the platform keychain.
pub struct KeychainVault {
    service: String,
    user: String,
}

impl Default for KeychainVault {
    fn default() -> Self {
        Self {
            service: KEYCHAIN_SERVICE.to_string(),
            user: KEYCHAIN_USER.to_string(),
        }
    }
}

impl KeychainVault {
    fn entry(&self) -> CoreResult<keyring::Entry> {
        keyring::Entry::new(&self.service, &self.user).map_err(|e| Error::Vault(e.to_string()))
    }

    /// Remember the password for the next start.
    pub async fn store(&self, password: &str) -> CoreResult<()> {
        let entry = self.entry()?;
        let password = Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || entry.set_password(&password))
            .await
            .map_err(|e| Error::Vault(e.to_string()))?
            .map_err(|e| Error::Vault(e.to_string()))
    }

    /// Forget the saved password. Missing entries are not an error.
    pub async fn clear(&self) -> CoreResult<()> {
        let entry = self.entry()?;
        let result = tokio::task::spawn_blocking(move || entry.delete_credential())
            .await
            .map_err(|e| Error::Vault(e.to_string()))?;
        match result {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::Vault(e.to_string())),
        }
    }
}

#[async_trait]
impl CredentialVault for KeychainVault {
    async fn get_credentials(&self) -> CoreResult<Option<Credentials>> {
        let entry = self.entry()?;
        let result = tokio::task::spawn_blocking(move || entry.get_password())
            .await
            .map_err(|e| Error::Vault(e.to_string()))?;
        match result {
            Ok(password) => Ok(Some(Credentials {
                username: self.user.clone(),
                password,
            })),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Vault(e.to_string())),
        }
    }
}

/// Checks passwords against the argon2 hash written during onboarding.
pub struct PasswordKeyring {
    prefs: Arc<Preferences>,
}

impl PasswordKeyring {
    pub fn new(prefs: Arc<Preferences>) -> Self {
        Self { prefs }
    }

    /// Hash and persist a new wallet password.
    pub fn set_password(&self, password: &str) -> Result<()> {
        let salt = SaltString::generate(&mut rand_core::OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?
            .to_string();
        self.prefs.set(PASSWORD_HASH_KEY, &hash)?;
        Ok(())
    }
}

#[async_trait]
impl Keyring for PasswordKeyring {
    async fn submit_password(&self, password: &str) -> CoreResult<()> {
        let stored = self
            .prefs
            .get(PASSWORD_HASH_KEY)?
            .ok_or_else(|| Error::Keyring("No wallet password has been set.".into()))?;
        let parsed = PasswordHash::new(&stored)
            .map_err(|e| Error::Keyring(format!("Corrupt password hash: {e}")))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| Error::Keyring("Invalid password.".into()))
    }
}

/// Remembers where the router sent us.
#[derive(Default)]
pub struct TerminalNavigator {
    route: Mutex<Option<Route>>,
}

impl TerminalNavigator {
    pub fn route(&self) -> Option<Route> {
        *self.route.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        debug!(%route, "navigate");
        *self.route.lock().unwrap_or_else(PoisonError::into_inner) = Some(route);
    }
}

/// Route the session and run whatever prompt the route needs. Returns once
/// the wallet is unlocked. Onboarding needs a terminal; with
/// `interactive == false` it is refused.
pub async fn enter(prefs: Arc<Preferences>, interactive: bool) -> Result<()> {
    let vault = Arc::new(KeychainVault::default());
    let keyring = Arc::new(PasswordKeyring::new(prefs.clone()));
    let navigator = Arc::new(TerminalNavigator::default());

    let mut router = EntryRouter::new(
        prefs.clone(),
        vault.clone(),
        keyring.clone(),
        navigator.clone(),
        Session::new(),
    );
    router.run().await;

    match navigator.route() {
        Some(Route::Home) => {
            println!("Wallet unlocked.");
            Ok(())
        }
        Some(Route::Login) => login(&vault, &keyring).await,
        Some(Route::Onboarding) if interactive => onboard(&prefs, &vault, &keyring).await,
        Some(Route::Onboarding) => {
            bail!("No wallet set up yet. Run ember-wallet without --cmd to create one.")
        }
        None => bail!("Start-up was interrupted before a screen was chosen."),
    }
}

async fn login(vault: &KeychainVault, keyring: &PasswordKeyring) -> Result<()> {
    for attempt in 1..=LOGIN_ATTEMPTS {
        let password = Zeroizing::new(
            rpassword::prompt_password("Password: ").context("Failed to read password")?,
        );
        match keyring.submit_password(&password).await {
            Ok(()) => {
                if prompt_confirm("Remember password in the OS keychain?") {
                    if let Err(e) = vault.store(&password).await {
                        warn!("Could not save password to keychain: {e}");
                        eprintln!("Warning: password not saved: {e}");
                    }
                }
                println!("Wallet unlocked.");
                return Ok(());
            }
            Err(e) if attempt < LOGIN_ATTEMPTS => eprintln!("{e} Try again."),
            Err(e) => return Err(e.into()),
        }
    }
    bail!("Too many failed attempts.")
}

async fn onboard(
    prefs: &Preferences,
    vault: &KeychainVault,
    keyring: &PasswordKeyring,
) -> Result<()> {
    println!("Welcome to Ember. Choose a password to protect this wallet.");
    let password = prompt_new_password()?;
    keyring.set_password(&password)?;

    // A stale entry from an earlier install must not unlock the new wallet.
    if let Err(e) = vault.clear().await {
        warn!("Could not clear old keychain entry: {e}");
    }
    if prompt_confirm("Remember password in the OS keychain?") {
        if let Err(e) = vault.store(&password).await {
            warn!("Could not save password to keychain: {e}");
            eprintln!("Warning: password not saved: {e}");
        }
    }

    prefs.set(EXISTING_USER_KEY, "true")?;
    println!("Wallet ready.");
    Ok(())
}

fn prompt_new_password() -> Result<Zeroizing<String>> {
    loop {
        let pass1 = Zeroizing::new(
            rpassword::prompt_password("New password: ").context("Failed to read password")?,
        );
        let pass2 = Zeroizing::new(
            rpassword::prompt_password("Confirm password: ").context("Failed to read password")?,
        );
        if *pass1 != *pass2 {
            println!("Passwords do not match. Try again.");
            continue;
        }
        if pass1.is_empty() {
            println!("Password cannot be empty.");
            continue;
        }
        if pass1.len() < 8 {
            eprintln!("WARNING: This password is very short.");
        }
        return Ok(pass1);
    }
}

pub(crate) fn prompt_confirm(prompt: &str) -> bool {
    use std::io::Write;
    print!("{prompt} [y/N]: ");
    std::io::stdout().flush().ok();
    let mut input = String::new();
    std::io::stdin().read_line(&mut input).is_ok() && input.trim().eq_ignore_ascii_case("y")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyring() -> PasswordKeyring {
        PasswordKeyring::new(Arc::new(Preferences::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn password_round_trip() {
        let keyring = keyring();
        keyring.set_password("correct horse").unwrap();
        assert!(keyring.submit_password("correct horse").await.is_ok());
        assert!(matches!(
            keyring.submit_password("wrong").await,
            Err(Error::Keyring(_))
        ));
    }

    #[tokio::test]
    async fn no_password_set_is_rejected() {
        assert!(keyring().submit_password("anything").await.is_err());
    }

    #[test]
    fn navigator_keeps_last_route() {
        let nav = TerminalNavigator::default();
        assert_eq!(nav.route(), None);
        nav.navigate(Route::Login);
        assert_eq!(nav.route(), Some(Route::Login));
    }
}
