use std::path::PathBuf;

use anyhow::Context;

pub mod commands;
pub mod draft;
pub mod entry;
pub mod error;
pub mod form;
pub mod preferences;
pub mod provider;
pub mod recipient;
pub mod session;
pub mod store;
pub mod units;

pub use commands::Command;
pub use draft::{Asset, AssetType, TransactionDraft};
pub use entry::{
    CredentialVault, Credentials, EntryRouter, EntryState, Keyring, Navigator, PersistentStore,
    Route, EXISTING_USER_KEY,
};
pub use error::Error;
pub use form::{FormUIState, NavigationHost, Phase, TransactionFormController};
pub use preferences::Preferences;
pub use provider::{AccountProvider, AssetBalanceProvider, BalanceSheet};
pub use recipient::Recipient;
pub use session::Session;
pub use store::{DraftStore, TransactionStateStore};

/// XDG-compliant data directory for preferences and balance snapshots.
/// Linux: `~/.local/share/ember-wallet/`, macOS: `~/Library/Application Support/ember-wallet/`
pub fn data_dir() -> anyhow::Result<PathBuf> {
    let dir = dirs::data_dir()
        .context("Cannot determine data directory")?
        .join("ember-wallet");
    Ok(dir)
}
