use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::draft::{Asset, AssetType, TransactionDraft};
use crate::provider::{AccountProvider, AssetBalanceProvider};
use crate::recipient::parse_address;

/// Owner of the transaction draft.
///
/// The form controller reads snapshots through `draft()` and changes the
/// draft only through the `commit_*` calls. Validators return a
/// human-readable message, or `None` when the field is valid.
#[async_trait]
pub trait TransactionStateStore: Send + Sync {
    fn draft(&self) -> TransactionDraft;

    async fn commit_amount(&self, amount: Option<u128>);
    async fn commit_readable_amount(&self, readable: String);
    async fn commit_gas(&self, gas: u128, gas_price: u128);
    async fn commit_hex_data(&self, data: String);
    async fn commit_from_address(&self, from: String);
    async fn commit_to_address(&self, to: String, resolved_name: Option<String>);
    async fn commit_selected_asset(&self, asset: Option<Asset>, asset_type: AssetType);

    /// `strict` rejects an amount that was never entered; the lenient pass
    /// treats it as zero.
    async fn validate_amount(&self, strict: bool) -> Option<String>;
    fn validate_gas(&self) -> Option<String>;
    fn validate_to_address(&self) -> Option<String>;
}

/// In-memory draft owner with balance-aware validators.
pub struct DraftStore {
    draft: Mutex<TransactionDraft>,
    accounts: Arc<dyn AccountProvider>,
    assets: Arc<dyn AssetBalanceProvider>,
}

impl DraftStore {
    pub fn new(
        draft: TransactionDraft,
        accounts: Arc<dyn AccountProvider>,
        assets: Arc<dyn AssetBalanceProvider>,
    ) -> Self {
        Self {
            draft: Mutex::new(draft),
            accounts,
            assets,
        }
    }

    /// Replace the whole draft, as an external writer would.
    pub fn replace(&self, draft: TransactionDraft) {
        *self.lock() = draft;
    }

    fn lock(&self) -> MutexGuard<'_, TransactionDraft> {
        self.draft.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_amount(&self, draft: &TransactionDraft, strict: bool) -> Option<String> {
        let amount = match draft.amount {
            Some(a) => a,
            None => {
                let typed = draft
                    .readable_amount
                    .as_deref()
                    .map(|s| !s.trim().is_empty())
                    .unwrap_or(false);
                if typed {
                    return Some("Invalid amount".to_string());
                }
                if strict {
                    return Some("Amount is required".to_string());
                }
                0
            }
        };
        let from = draft.from.as_deref()?;

        match draft.asset_type {
            AssetType::Native => {
                let balance = self.accounts.balance(from).unwrap_or(0);
                let needed = amount.saturating_add(draft.total_gas_cost());
                (needed > balance).then(|| "Insufficient funds".to_string())
            }
            AssetType::FungibleToken => {
                let asset = match &draft.selected_asset {
                    Some(a) => a,
                    None => return Some("No token selected".to_string()),
                };
                let balance = self.assets.asset_balance(from, &asset.address).unwrap_or(0);
                (amount > balance).then(|| format!("Insufficient {} balance", asset.symbol))
            }
            AssetType::NonFungibleToken => None,
        }
    }
}

#[async_trait]
impl TransactionStateStore for DraftStore {
    fn draft(&self) -> TransactionDraft {
        self.lock().clone()
    }

    async fn commit_amount(&self, amount: Option<u128>) {
        debug!(?amount, "commit amount");
        self.lock().amount = amount;
    }

    async fn commit_readable_amount(&self, readable: String) {
        self.lock().readable_amount = Some(readable);
    }

    async fn commit_gas(&self, gas: u128, gas_price: u128) {
        debug!(gas, gas_price, "commit gas");
        let mut draft = self.lock();
        draft.gas = Some(gas);
        draft.gas_price = Some(gas_price);
    }

    async fn commit_hex_data(&self, data: String) {
        self.lock().hex_data = Some(data);
    }

    async fn commit_from_address(&self, from: String) {
        self.lock().from = Some(from);
    }

    async fn commit_to_address(&self, to: String, resolved_name: Option<String>) {
        debug!(%to, ?resolved_name, "commit recipient");
        let mut draft = self.lock();
        draft.to = Some(to);
        draft.ens_recipient = resolved_name;
    }

    async fn commit_selected_asset(&self, asset: Option<Asset>, asset_type: AssetType) {
        let mut draft = self.lock();
        draft.selected_asset = asset;
        draft.asset_type = asset_type;
    }

    async fn validate_amount(&self, strict: bool) -> Option<String> {
        let draft = self.draft();
        self.check_amount(&draft, strict)
    }

    fn validate_gas(&self) -> Option<String> {
        let draft = self.lock();
        match (draft.gas, draft.gas_price) {
            (Some(0), _) => Some("Gas limit must be greater than zero".to_string()),
            (Some(_), Some(_)) => None,
            _ => Some("Gas fee is required".to_string()),
        }
    }

    fn validate_to_address(&self) -> Option<String> {
        let draft = self.lock();
        match draft.to.as_deref().map(str::trim) {
            None | Some("") => Some("Recipient address is required".to_string()),
            Some(to) => parse_address(to)
                .err()
                .map(|_| "Invalid recipient address".to_string()),
        }
    }
}
