use std::fmt;

use serde::{Deserialize, Serialize};

use crate::units::{self, NATIVE_DECIMALS};

/// Kind of asset a draft transfers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    #[default]
    Native,
    FungibleToken,
    NonFungibleToken,
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetType::Native => write!(f, "native"),
            AssetType::FungibleToken => write!(f, "token"),
            AssetType::NonFungibleToken => write!(f, "collectible"),
        }
    }
}

/// A non-native asset: contract address plus its decimal count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

/// The in-progress transaction being edited before review.
///
/// Owned by the state store; the form controller only changes it through
/// the store's commit calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    /// Amount in minimal units. `None` means "no valid amount".
    pub amount: Option<u128>,
    pub readable_amount: Option<String>,
    pub asset_type: AssetType,
    pub selected_asset: Option<Asset>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub gas: Option<u128>,
    pub gas_price: Option<u128>,
    pub hex_data: Option<String>,
    pub ens_recipient: Option<String>,
}

impl TransactionDraft {
    /// Empty native-asset draft sent from `from`.
    pub fn native(from: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            ..Self::default()
        }
    }

    /// `gas * gas_price` when both are set, otherwise zero.
    #[must_use]
    pub fn total_gas_cost(&self) -> u128 {
        match (self.gas, self.gas_price) {
            (Some(gas), Some(price)) => gas.saturating_mul(price),
            _ => 0,
        }
    }

    /// Decimals used to convert amounts for the current asset type.
    /// `None` when a non-native asset is not resolvable.
    #[must_use]
    pub fn amount_decimals(&self) -> Option<u8> {
        match self.asset_type {
            AssetType::Native => Some(NATIVE_DECIMALS),
            _ => self.selected_asset.as_ref().map(|a| a.decimals),
        }
    }

    /// Ticker shown next to amounts.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match (&self.asset_type, &self.selected_asset) {
            (AssetType::Native, _) => "ETH",
            (_, Some(asset)) => asset.symbol.as_str(),
            (_, None) => "?",
        }
    }

    /// Short multi-line summary for terminal output.
    #[must_use]
    pub fn summary(&self) -> String {
        let amount = match (self.amount, self.amount_decimals()) {
            (Some(a), Some(d)) => units::format_amount(a, d, self.symbol()),
            _ => "-".to_string(),
        };
        let to = match (&self.to, &self.ens_recipient) {
            (Some(to), Some(name)) => format!("{name} ({to})"),
            (Some(to), None) => to.clone(),
            (None, _) => "-".to_string(),
        };
        let mut lines = vec![
            format!("  Asset:     {}", self.asset_type),
            format!("  From:      {}", self.from.as_deref().unwrap_or("-")),
            format!("  To:        {to}"),
            format!("  Amount:    {amount}"),
            format!(
                "  Gas:       {} x {}",
                opt_num(self.gas),
                opt_num(self.gas_price)
            ),
            format!(
                "  Gas fee:   {}",
                units::format_amount(self.total_gas_cost(), NATIVE_DECIMALS, "ETH")
            ),
        ];
        if let Some(data) = &self.hex_data {
            lines.push(format!("  Data:      {data}"));
        }
        lines.join("\n")
    }
}

fn opt_num(v: Option<u128>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_cost_needs_both_values() {
        let mut draft = TransactionDraft::native("0xabc");
        assert_eq!(draft.total_gas_cost(), 0);
        draft.gas = Some(21_000);
        assert_eq!(draft.total_gas_cost(), 0);
        draft.gas_price = Some(1_000_000_000);
        assert_eq!(draft.total_gas_cost(), 21_000_000_000_000);
    }

    #[test]
    fn gas_cost_saturates() {
        let draft = TransactionDraft {
            gas: Some(u128::MAX),
            gas_price: Some(2),
            ..Default::default()
        };
        assert_eq!(draft.total_gas_cost(), u128::MAX);
    }

    #[test]
    fn token_decimals_require_asset() {
        let mut draft = TransactionDraft {
            asset_type: AssetType::FungibleToken,
            ..Default::default()
        };
        assert_eq!(draft.amount_decimals(), None);
        draft.selected_asset = Some(Asset {
            address: "0xdac17f958d2ee523a2206206994597c13d831ec7".into(),
            symbol: "USDT".into(),
            decimals: 6,
        });
        assert_eq!(draft.amount_decimals(), Some(6));
        assert_eq!(draft.symbol(), "USDT");
    }

    #[test]
    fn summary_shows_recipient_name() {
        let draft = TransactionDraft {
            to: Some("0x1234".into()),
            ens_recipient: Some("alice.eth".into()),
            amount: Some(500_000_000_000_000_000),
            ..TransactionDraft::native("0xabc")
        };
        let out = draft.summary();
        assert!(out.contains("alice.eth (0x1234)"));
        assert!(out.contains("0.5 ETH"));
        assert!(!out.contains("Data:"));
    }

    #[test]
    fn serializes_asset_type_snake_case() {
        let json = serde_json::to_value(AssetType::NonFungibleToken).unwrap();
        assert_eq!(json, "non_fungible_token");
    }
}
