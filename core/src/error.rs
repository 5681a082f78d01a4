//! Domain error type for the send form and entry routing.

use thiserror::Error;

/// Failures of the form controller, the entry router and the stores.
///
/// Bad user input never ends up here: invalid amounts are committed as
/// "undefined" and validation messages travel as field strings.
#[derive(Debug, Error)]
pub enum Error {
    /// The sending account has no known balance.
    #[error("No balance known for account '{0}'")]
    UnknownAccount(String),

    /// A token operation was requested without a selected asset.
    #[error("No asset selected")]
    MissingAsset,

    /// The selected token has no balance entry for the sender.
    #[error("No balance for token {asset} held by {owner}")]
    MissingBalance { owner: String, asset: String },

    /// The operation does not apply to the current asset type.
    #[error("{0}")]
    NotApplicable(String),

    /// The draft has no sender to act on.
    #[error("{0}")]
    InvalidState(String),

    /// Persisted key-value storage failure.
    #[error("{0}")]
    Storage(String),

    /// Credential vault could not be read.
    #[error("{0}")]
    Vault(String),

    /// Keyring rejected the credentials.
    #[error("{0}")]
    Keyring(String),

    /// Unexpected error from internal subsystems.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

/// Alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
