//! Start-up routing: onboarding, wallet or login.
//!
//! Reads the "existing user" marker first and only then consults the
//! credential vault. Vault and keyring failures never surface as errors;
//! they are logged and the user lands on the login screen.
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Result;
use crate::session::Session;

/// Key of the marker written once onboarding completes.
pub const EXISTING_USER_KEY: &str = "existingUser";

/// Durable key-value storage.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
}

/// Credentials saved by a previous unlock.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Platform secure storage holding the saved credentials.
#[async_trait]
pub trait CredentialVault: Send + Sync {
    async fn get_credentials(&self) -> Result<Option<Credentials>>;
}

/// Wallet keyring unlocked with the user's password.
#[async_trait]
pub trait Keyring: Send + Sync {
    async fn submit_password(&self, password: &str) -> Result<()>;
}

/// Screens the entry router can hand over to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Onboarding,
    Home,
    Login,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Onboarding => write!(f, "onboarding"),
            Route::Home => write!(f, "home"),
            Route::Login => write!(f, "login"),
        }
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Checking,
    Onboarding,
    Unlocking,
    Wallet,
    Login,
}

impl EntryState {
    /// Destination for terminal states.
    pub fn route(self) -> Option<Route> {
        match self {
            EntryState::Onboarding => Some(Route::Onboarding),
            EntryState::Wallet => Some(Route::Home),
            EntryState::Login => Some(Route::Login),
            EntryState::Checking | EntryState::Unlocking => None,
        }
    }
}

pub struct EntryRouter {
    storage: Arc<dyn PersistentStore>,
    vault: Arc<dyn CredentialVault>,
    keyring: Arc<dyn Keyring>,
    navigator: Arc<dyn Navigator>,
    session: Session,
    state: EntryState,
    transitions: Vec<EntryState>,
}

impl EntryRouter {
    pub fn new(
        storage: Arc<dyn PersistentStore>,
        vault: Arc<dyn CredentialVault>,
        keyring: Arc<dyn Keyring>,
        navigator: Arc<dyn Navigator>,
        session: Session,
    ) -> Self {
        Self {
            storage,
            vault,
            keyring,
            navigator,
            session,
            state: EntryState::Checking,
            transitions: vec![EntryState::Checking],
        }
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    /// Every state visited so far, starting with `Checking`.
    pub fn transitions(&self) -> &[EntryState] {
        &self.transitions
    }

    /// Decide the first screen and navigate to it. Returns the state reached;
    /// if the session is torn down mid-way, no navigation happens and the
    /// last non-terminal state is returned.
    pub async fn run(&mut self) -> EntryState {
        if self.state != EntryState::Checking {
            return self.state;
        }

        let marker = match self.storage.get_item(EXISTING_USER_KEY).await {
            Ok(marker) => marker,
            Err(e) => {
                warn!("Failed to read {EXISTING_USER_KEY} marker: {e}");
                None
            }
        };
        if !self.session.is_open() {
            return self.state;
        }
        if marker.is_none() {
            return self.finish(EntryState::Onboarding);
        }

        self.transition(EntryState::Unlocking);
        let next = self.unlock().await;
        if !self.session.is_open() {
            return self.state;
        }
        self.finish(next)
    }

    async fn unlock(&self) -> EntryState {
        let credentials = match self.vault.get_credentials().await {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                info!("no stored credentials");
                return EntryState::Login;
            }
            Err(e) => {
                warn!("Keychain couldn't be accessed: {e}");
                return EntryState::Login;
            }
        };
        if !self.session.is_open() {
            return EntryState::Unlocking;
        }
        match self.keyring.submit_password(&credentials.password).await {
            Ok(()) => EntryState::Wallet,
            Err(e) => {
                warn!("Keyring unlock failed: {e}");
                EntryState::Login
            }
        }
    }

    fn transition(&mut self, next: EntryState) {
        self.state = next;
        self.transitions.push(next);
    }

    fn finish(&mut self, terminal: EntryState) -> EntryState {
        self.transition(terminal);
        if let Some(route) = terminal.route() {
            info!(%route, "entry routed");
            self.navigator.navigate(route);
        }
        terminal
    }
}
