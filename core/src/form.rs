//! Transaction edit form: input events in, draft commits and validation out.
//!
//! The controller owns only transient UI state ([`FormUIState`]). The draft
//! itself lives in a [`TransactionStateStore`] and is changed exclusively
//! through its commit calls. Moving to the review phase is gated on a clean
//! validation pass.
use std::sync::Arc;

use tracing::{debug, info};

use crate::draft::{Asset, AssetType, TransactionDraft};
use crate::error::{Error, Result};
use crate::provider::{AccountProvider, AssetBalanceProvider};
use crate::session::Session;
use crate::store::TransactionStateStore;
use crate::units::{self, NATIVE_DECIMALS};

/// Edit vs. review mode of the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Edit,
    Review,
}

/// The screen hosting the form.
pub trait NavigationHost: Send + Sync {
    fn on_mode_change(&self, phase: Phase);
    fn on_cancel(&self);
}

/// Per-session UI state. Error fields hold the last message reported for
/// each field; `None` means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormUIState {
    pub to_field_focused: bool,
    pub amount_error: Option<String>,
    pub to_address_error: Option<String>,
    pub gas_error: Option<String>,
    pub fill_max_requested: bool,
    pub pending_hex_data: Option<String>,
    pub ens_recipient: Option<String>,
    pub phase: Phase,
}

impl FormUIState {
    /// Messages currently shown, in field order.
    pub fn errors(&self) -> Vec<&str> {
        [&self.amount_error, &self.gas_error, &self.to_address_error]
            .into_iter()
            .filter_map(|e| e.as_deref())
            .collect()
    }
}

pub struct TransactionFormController {
    store: Arc<dyn TransactionStateStore>,
    accounts: Arc<dyn AccountProvider>,
    assets: Arc<dyn AssetBalanceProvider>,
    host: Arc<dyn NavigationHost>,
    session: Session,
    state: FormUIState,
    /// Hex data last seen on the draft, for external change detection.
    observed_hex_data: Option<String>,
}

impl TransactionFormController {
    pub fn new(
        store: Arc<dyn TransactionStateStore>,
        accounts: Arc<dyn AccountProvider>,
        assets: Arc<dyn AssetBalanceProvider>,
        host: Arc<dyn NavigationHost>,
        session: Session,
    ) -> Self {
        Self {
            store,
            accounts,
            assets,
            host,
            session,
            state: FormUIState::default(),
            observed_hex_data: None,
        }
    }

    pub fn state(&self) -> &FormUIState {
        &self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current draft as seen by the store.
    pub fn draft(&self) -> TransactionDraft {
        self.store.draft()
    }

    fn is_live(&self) -> bool {
        self.session.is_open()
    }

    /// Mount: push the draft's amount back through the store and seed the
    /// hex data buffer.
    pub async fn initialize(&mut self, draft: &TransactionDraft) {
        if !self.is_live() {
            return;
        }
        if let Some(amount) = draft.amount {
            self.store.commit_amount(Some(amount)).await;
            if draft.asset_type == AssetType::Native {
                self.store
                    .commit_readable_amount(units::from_minimal_unit(amount, NATIVE_DECIMALS))
                    .await;
            }
        }
        if !self.is_live() {
            return;
        }
        if let Some(data) = &draft.hex_data {
            self.state.pending_hex_data = Some(data.clone());
        }
        self.observed_hex_data = draft.hex_data.clone();
    }

    /// Sync the hex data buffer when the draft's payload was changed by
    /// someone else. Returns true if the buffer was overwritten.
    pub fn on_draft_hex_data_changed(&mut self, hex_data: Option<String>) -> bool {
        if !self.is_live() || hex_data == self.observed_hex_data {
            return false;
        }
        self.observed_hex_data = hex_data.clone();
        self.state.pending_hex_data = hex_data;
        true
    }

    /// Fill the amount with the largest spendable value and return it.
    ///
    /// Native: balance minus the gas fee, floored at zero. Token: the whole
    /// token balance. Collectibles have no amount.
    pub async fn fill_to_maximum(&mut self) -> Result<u128> {
        if !self.is_live() {
            return Err(Error::InvalidState("Edit session is closed.".into()));
        }
        let draft = self.store.draft();
        let (value, readable) = match draft.asset_type {
            AssetType::Native => {
                let from = sender(&draft)?;
                let balance = self
                    .accounts
                    .balance(from)
                    .ok_or_else(|| Error::UnknownAccount(from.to_string()))?;
                let value = balance.saturating_sub(draft.total_gas_cost());
                (value, units::from_minimal_unit(value, NATIVE_DECIMALS))
            }
            AssetType::FungibleToken => {
                let asset = draft.selected_asset.as_ref().ok_or(Error::MissingAsset)?;
                let from = sender(&draft)?;
                let value = self
                    .assets
                    .asset_balance(from, &asset.address)
                    .ok_or_else(|| Error::MissingBalance {
                        owner: from.to_string(),
                        asset: asset.address.clone(),
                    })?;
                (value, units::from_minimal_unit(value, asset.decimals))
            }
            AssetType::NonFungibleToken => {
                return Err(Error::NotApplicable(
                    "Collectibles have no amount to fill.".into(),
                ))
            }
        };

        debug!(value, "fill to maximum");
        self.store.commit_amount(Some(value)).await;
        self.store.commit_readable_amount(readable).await;
        if self.is_live() {
            self.state.fill_max_requested = true;
        }
        Ok(value)
    }

    pub fn set_fill_max_requested(&mut self, requested: bool) {
        if self.is_live() {
            self.state.fill_max_requested = requested;
        }
    }

    /// Amount typed by the user. Input that is not a decimal, or that cannot
    /// be converted for the current asset, is committed as `None`.
    /// Returns the committed minimal-unit amount.
    pub async fn update_amount(&mut self, input: &str) -> Option<u128> {
        if !self.is_live() {
            return None;
        }
        let draft = self.store.draft();
        let amount = if units::is_decimal(input) {
            draft
                .amount_decimals()
                .and_then(|decimals| units::to_minimal_unit(input, decimals).ok())
        } else {
            None
        };

        self.store.commit_amount(amount).await;
        self.store.commit_readable_amount(input.to_string()).await;
        let error = non_empty(self.store.validate_amount(true).await);
        if self.is_live() {
            self.state.amount_error = error;
        }
        amount
    }

    pub async fn update_gas_selection(&mut self, gas: u128, gas_price: u128) {
        if !self.is_live() {
            return;
        }
        self.store.commit_gas(gas, gas_price).await;
        let error = non_empty(self.store.validate_gas());
        if self.is_live() {
            self.state.gas_error = error;
        }
    }

    /// Recipient edited in place. Any shown error is cleared until the field
    /// loses focus.
    pub async fn update_recipient(&mut self, address: &str) {
        if !self.is_live() {
            return;
        }
        self.store.commit_to_address(address.to_string(), None).await;
        if self.is_live() {
            self.state.to_address_error = None;
        }
    }

    /// Recipient field lost focus. A clean validation result does not clear
    /// an error reported earlier by another source.
    pub async fn update_recipient_on_blur(&mut self, address: &str, resolved_name: Option<&str>) {
        if !self.is_live() {
            return;
        }
        let name = resolved_name.map(str::to_string);
        self.store
            .commit_to_address(address.to_string(), name.clone())
            .await;
        let fresh = non_empty(self.store.validate_to_address());
        if !self.is_live() {
            return;
        }
        if fresh.is_some() {
            self.state.to_address_error = fresh;
        }
        self.state.ens_recipient = name;
    }

    pub fn on_focus_recipient(&mut self) {
        if self.is_live() {
            self.state.to_field_focused = true;
        }
    }

    /// Error pushed by the recipient input itself (e.g. a failed name lookup).
    pub fn report_recipient_error(&mut self, error: Option<String>) {
        if self.is_live() {
            self.state.to_address_error = non_empty(error);
        }
    }

    pub async fn update_hex_data(&mut self, data: &str) {
        if !self.is_live() {
            return;
        }
        self.state.pending_hex_data = Some(data.to_string());
        self.observed_hex_data = Some(data.to_string());
        self.store.commit_hex_data(data.to_string()).await;
    }

    pub async fn update_from_address(&mut self, from: &str) {
        if self.is_live() {
            self.store.commit_from_address(from.to_string()).await;
        }
    }

    pub async fn update_asset(&mut self, asset: Option<Asset>, asset_type: AssetType) {
        if self.is_live() {
            self.store.commit_selected_asset(asset, asset_type).await;
        }
    }

    /// Run every validator, store the messages, and return the non-empty ones
    /// in the order amount, gas, recipient.
    pub async fn validate_all(&mut self) -> Vec<String> {
        let amount_error = non_empty(self.store.validate_amount(false).await);
        let gas_error = non_empty(self.store.validate_gas());
        let to_address_error = non_empty(self.store.validate_to_address());

        if self.is_live() {
            self.state.amount_error = amount_error.clone();
            self.state.gas_error = gas_error.clone();
            self.state.to_address_error = to_address_error.clone();
        }

        [amount_error, gas_error, to_address_error]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Try to move to review. Returns true when the phase changed.
    pub async fn request_review(&mut self) -> bool {
        if !self.is_live() {
            return false;
        }
        self.state.to_field_focused = true;

        let errors = self.validate_all().await;
        if !self.is_live() {
            return false;
        }
        if !errors.is_empty() {
            debug!(?errors, "review blocked");
            return false;
        }

        let pending = self
            .state
            .pending_hex_data
            .clone()
            .filter(|d| !d.trim().is_empty());
        if let Some(data) = pending {
            self.update_hex_data(&units::add_hex_prefix(&data)).await;
            if !self.is_live() {
                return false;
            }
        }

        info!("transaction ready for review");
        self.state.phase = Phase::Review;
        self.host.on_mode_change(Phase::Review);
        true
    }

    /// Leave review and continue editing.
    pub fn return_to_edit(&mut self) {
        if self.is_live() && self.state.phase == Phase::Review {
            self.state.phase = Phase::Edit;
            self.host.on_mode_change(Phase::Edit);
        }
    }

    /// Abandon the edit session.
    pub fn cancel(&mut self) {
        if self.is_live() {
            self.host.on_cancel();
            self.session.close();
        }
    }
}

fn sender(draft: &TransactionDraft) -> Result<&str> {
    draft
        .from
        .as_deref()
        .ok_or_else(|| Error::InvalidState("No sending account selected.".into()))
}

/// Validators may report "valid" as an empty string.
fn non_empty(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::provider::BalanceSheet;
    use crate::store::DraftStore;

    const FROM: &str = "0x52908400098527886e0f7030069857d2e4169ee7";
    const TO: &str = "0x8617e340b3d01fa5f11f306f4090fd50e238070d";
    const ONE_ETH: u128 = 1_000_000_000_000_000_000;

    #[derive(Default)]
    struct Host {
        modes: Mutex<Vec<Phase>>,
        cancelled: Mutex<bool>,
    }

    impl NavigationHost for Host {
        fn on_mode_change(&self, phase: Phase) {
            self.modes.lock().unwrap().push(phase);
        }
        fn on_cancel(&self) {
            *self.cancelled.lock().unwrap() = true;
        }
    }

    fn usdt() -> Asset {
        Asset {
            address: "0xdac1".into(),
            symbol: "USDT".into(),
            decimals: 6,
        }
    }

    fn setup(draft: TransactionDraft) -> (TransactionFormController, Arc<DraftStore>, Arc<Host>) {
        let mut sheet = BalanceSheet::default();
        sheet.set_balance(FROM, ONE_ETH);
        sheet.set_asset_balance(FROM, &usdt(), 12_500_000);
        let sheet = Arc::new(sheet);
        let store = Arc::new(DraftStore::new(draft, sheet.clone(), sheet.clone()));
        let host = Arc::new(Host::default());
        let form = TransactionFormController::new(
            store.clone(),
            sheet.clone(),
            sheet,
            host.clone(),
            Session::new(),
        );
        (form, store, host)
    }

    fn ready_draft() -> TransactionDraft {
        TransactionDraft {
            to: Some(TO.into()),
            gas: Some(21_000),
            gas_price: Some(1_000_000_000),
            ..TransactionDraft::native(FROM)
        }
    }

    #[tokio::test]
    async fn initialize_propagates_native_amount() {
        let draft = TransactionDraft {
            amount: Some(ONE_ETH / 4),
            hex_data: Some("abcd".into()),
            ..TransactionDraft::native(FROM)
        };
        let (mut form, store, _) = setup(TransactionDraft::native(FROM));
        form.initialize(&draft).await;
        let stored = store.draft();
        assert_eq!(stored.amount, Some(ONE_ETH / 4));
        assert_eq!(stored.readable_amount.as_deref(), Some("0.25"));
        assert_eq!(form.state().pending_hex_data.as_deref(), Some("abcd"));
    }

    #[tokio::test]
    async fn initialize_after_teardown_commits_nothing() {
        let draft = TransactionDraft {
            amount: Some(ONE_ETH),
            hex_data: Some("0x01".into()),
            ..TransactionDraft::native(FROM)
        };
        let (mut form, store, _) = setup(TransactionDraft::native(FROM));
        form.session().close();
        form.initialize(&draft).await;
        assert_eq!(store.draft().amount, None);
        assert_eq!(store.draft().readable_amount, None);
        assert_eq!(form.state().pending_hex_data, None);
    }

    #[tokio::test]
    async fn initialize_skips_readable_for_tokens() {
        let draft = TransactionDraft {
            amount: Some(7),
            asset_type: AssetType::FungibleToken,
            selected_asset: Some(usdt()),
            ..TransactionDraft::native(FROM)
        };
        let (mut form, store, _) = setup(TransactionDraft::native(FROM));
        form.initialize(&draft).await;
        assert_eq!(store.draft().amount, Some(7));
        assert_eq!(store.draft().readable_amount, None);
    }

    #[tokio::test]
    async fn fill_max_native_scenario() {
        let (mut form, store, _) = setup(ready_draft());
        let value = form.fill_to_maximum().await.unwrap();
        assert_eq!(value, 999_999_979_000_000_000);
        assert_eq!(store.draft().amount, Some(999_999_979_000_000_000));
        assert_eq!(store.draft().readable_amount.as_deref(), Some("0.999999979"));
        assert!(form.state().fill_max_requested);
    }

    #[tokio::test]
    async fn fill_max_native_never_negative() {
        let draft = TransactionDraft {
            gas: Some(21_000),
            gas_price: Some(ONE_ETH),
            ..TransactionDraft::native(FROM)
        };
        let (mut form, store, _) = setup(draft);
        assert_eq!(form.fill_to_maximum().await.unwrap(), 0);
        assert_eq!(store.draft().readable_amount.as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn fill_max_ignores_half_set_gas() {
        let draft = TransactionDraft {
            gas: Some(21_000),
            ..TransactionDraft::native(FROM)
        };
        let (mut form, _, _) = setup(draft);
        assert_eq!(form.fill_to_maximum().await.unwrap(), ONE_ETH);
    }

    #[tokio::test]
    async fn fill_max_token_uses_token_balance() {
        let draft = TransactionDraft {
            asset_type: AssetType::FungibleToken,
            selected_asset: Some(usdt()),
            ..ready_draft()
        };
        let (mut form, store, _) = setup(draft);
        assert_eq!(form.fill_to_maximum().await.unwrap(), 12_500_000);
        assert_eq!(store.draft().readable_amount.as_deref(), Some("12.5"));
    }

    #[tokio::test]
    async fn fill_max_collectible_not_applicable() {
        let draft = TransactionDraft {
            asset_type: AssetType::NonFungibleToken,
            ..ready_draft()
        };
        let (mut form, store, _) = setup(draft);
        assert!(matches!(
            form.fill_to_maximum().await,
            Err(Error::NotApplicable(_))
        ));
        assert!(!form.state().fill_max_requested);
        assert_eq!(store.draft().amount, None);
    }

    #[tokio::test]
    async fn fill_max_unknown_account() {
        let (mut form, _, _) = setup(TransactionDraft::native("0xunknown"));
        assert!(matches!(
            form.fill_to_maximum().await,
            Err(Error::UnknownAccount(_))
        ));
    }

    #[tokio::test]
    async fn invalid_amount_commits_none() {
        let (mut form, store, _) = setup(ready_draft());
        form.update_amount("0.5").await;
        assert_eq!(store.draft().amount, Some(ONE_ETH / 2));

        for input in ["abc", "1.2.3", "-1", "", "1e3"] {
            assert_eq!(form.update_amount(input).await, None);
            assert_eq!(store.draft().amount, None);
            assert_eq!(store.draft().readable_amount.as_deref(), Some(input));
            assert!(form.state().amount_error.is_some(), "input {input:?}");
        }
    }

    #[tokio::test]
    async fn token_amount_without_asset_is_undefined() {
        let draft = TransactionDraft {
            asset_type: AssetType::FungibleToken,
            ..ready_draft()
        };
        let (mut form, store, _) = setup(draft);
        assert_eq!(form.update_amount("1").await, None);
        assert_eq!(store.draft().amount, None);
    }

    #[tokio::test]
    async fn token_amount_uses_asset_decimals() {
        let draft = TransactionDraft {
            asset_type: AssetType::FungibleToken,
            selected_asset: Some(usdt()),
            ..ready_draft()
        };
        let (mut form, _, _) = setup(draft);
        assert_eq!(form.update_amount("1.5").await, Some(1_500_000));
        assert_eq!(form.state().amount_error, None);
    }

    #[tokio::test]
    async fn gas_selection_revalidates() {
        let (mut form, store, _) = setup(TransactionDraft::native(FROM));
        form.update_gas_selection(0, 1).await;
        assert!(form.state().gas_error.is_some());
        form.update_gas_selection(21_000, 2_000_000_000).await;
        assert_eq!(form.state().gas_error, None);
        assert_eq!(store.draft().total_gas_cost(), 42_000_000_000_000);
    }

    #[tokio::test]
    async fn recipient_update_clears_error_without_validating() {
        let (mut form, store, _) = setup(TransactionDraft::native(FROM));
        form.report_recipient_error(Some("Name not found".into()));
        form.update_recipient("0x12").await;
        assert_eq!(form.state().to_address_error, None);
        assert_eq!(store.draft().to.as_deref(), Some("0x12"));
    }

    #[tokio::test]
    async fn blur_reports_fresh_error() {
        let (mut form, _, _) = setup(TransactionDraft::native(FROM));
        form.update_recipient_on_blur("0x12", None).await;
        assert_eq!(
            form.state().to_address_error.as_deref(),
            Some("Invalid recipient address")
        );
    }

    #[tokio::test]
    async fn blur_preserves_external_error() {
        let (mut form, store, _) = setup(TransactionDraft::native(FROM));
        form.report_recipient_error(Some("Name not found".into()));
        form.update_recipient_on_blur(TO, Some("bob.eth")).await;
        assert_eq!(
            form.state().to_address_error.as_deref(),
            Some("Name not found")
        );
        assert_eq!(form.state().ens_recipient.as_deref(), Some("bob.eth"));
        assert_eq!(store.draft().ens_recipient.as_deref(), Some("bob.eth"));
    }

    #[tokio::test]
    async fn review_blocked_by_errors() {
        let (mut form, _, host) = setup(TransactionDraft::native(FROM));
        assert!(!form.request_review().await);
        assert!(form.state().to_field_focused);
        assert_eq!(form.state().phase, Phase::Edit);
        assert!(host.modes.lock().unwrap().is_empty());
        assert_eq!(form.state().errors().len(), 2);
    }

    #[tokio::test]
    async fn review_commits_prefixed_hex_data() {
        let (mut form, store, host) = setup(ready_draft());
        form.update_amount("0.1").await;
        form.update_hex_data("deadbeef").await;
        assert!(form.request_review().await);
        assert_eq!(store.draft().hex_data.as_deref(), Some("0xdeadbeef"));
        assert_eq!(form.state().phase, Phase::Review);
        assert_eq!(*host.modes.lock().unwrap(), vec![Phase::Review]);

        form.return_to_edit();
        assert_eq!(form.state().phase, Phase::Edit);
        assert_eq!(*host.modes.lock().unwrap(), vec![Phase::Review, Phase::Edit]);
    }

    #[tokio::test]
    async fn validate_all_is_idempotent() {
        let (mut form, _, _) = setup(TransactionDraft::native(FROM));
        let first = form.validate_all().await;
        let state = form.state().clone();
        let second = form.validate_all().await;
        assert_eq!(first, second);
        assert_eq!(&state, form.state());
    }

    #[tokio::test]
    async fn external_hex_change_overwrites_buffer() {
        let (mut form, _, _) = setup(TransactionDraft::native(FROM));
        form.initialize(&TransactionDraft::native(FROM)).await;
        form.update_hex_data("01").await;
        // our own commit echoed back by the store
        assert!(!form.on_draft_hex_data_changed(Some("01".into())));
        assert_eq!(form.state().pending_hex_data.as_deref(), Some("01"));
        assert!(form.on_draft_hex_data_changed(Some("0xff".into())));
        assert_eq!(form.state().pending_hex_data.as_deref(), Some("0xff"));
        assert!(!form.on_draft_hex_data_changed(Some("0xff".into())));
    }

    #[tokio::test]
    async fn cancel_closes_session() {
        let (mut form, store, host) = setup(ready_draft());
        form.cancel();
        assert!(*host.cancelled.lock().unwrap());
        assert!(!form.session().is_open());
        form.update_amount("1").await;
        assert_eq!(store.draft().amount, None);
        assert!(!form.request_review().await);
    }
}
