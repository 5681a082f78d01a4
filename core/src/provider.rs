//! Balance lookups the send form reads but never writes.
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::draft::Asset;
use crate::recipient::parse_address;

/// Native-asset balances by account address.
pub trait AccountProvider: Send + Sync {
    /// Balance in minimal units, or `None` for an unknown account.
    fn balance(&self, address: &str) -> Option<u128>;
}

/// Token balances by (owner, token contract).
pub trait AssetBalanceProvider: Send + Sync {
    fn asset_balance(&self, owner: &str, asset: &str) -> Option<u128>;
}

/// Holdings of one token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenHoldings {
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub balances: HashMap<String, u128>,
}

/// Snapshot of account and token balances, stored as unencrypted JSON.
///
/// Path: `data_dir()/balances.json`. Keys are lowercased on load so lookups
/// are case-insensitive; account keys that are not addresses are skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceSheet {
    #[serde(default)]
    pub accounts: HashMap<String, u128>,
    /// Keyed by token contract address.
    #[serde(default)]
    pub tokens: HashMap<String, TokenHoldings>,
}

impl BalanceSheet {
    /// Load a sheet from `path`. A missing file yields an empty sheet.
    pub fn open_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&data)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let sheet: Self = serde_json::from_str(json).context("Invalid balance sheet JSON")?;
        Ok(sheet.normalized())
    }

    pub fn set_balance(&mut self, address: &str, balance: u128) {
        self.accounts.insert(address.to_lowercase(), balance);
    }

    pub fn set_asset_balance(&mut self, owner: &str, asset: &Asset, balance: u128) {
        let holdings = self
            .tokens
            .entry(asset.address.to_lowercase())
            .or_insert_with(|| TokenHoldings {
                symbol: asset.symbol.clone(),
                decimals: asset.decimals,
                balances: HashMap::new(),
            });
        holdings.balances.insert(owner.to_lowercase(), balance);
    }

    /// Find a token by contract address or symbol (case-insensitive).
    pub fn find_asset(&self, query: &str) -> Option<Asset> {
        let lower = query.to_lowercase();
        if let Some(h) = self.tokens.get(&lower) {
            return Some(asset_of(&lower, h));
        }
        let mut matches = self
            .tokens
            .iter()
            .filter(|(_, h)| h.symbol.eq_ignore_ascii_case(query));
        match (matches.next(), matches.next()) {
            (Some((addr, h)), None) => Some(asset_of(addr, h)),
            _ => None,
        }
    }

    /// All known tokens, sorted by symbol.
    pub fn assets(&self) -> Vec<Asset> {
        let mut assets: Vec<Asset> = self
            .tokens
            .iter()
            .map(|(addr, h)| asset_of(addr, h))
            .collect();
        assets.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        assets
    }

    /// Lowercase every key and drop account entries that are not addresses.
    fn normalized(self) -> Self {
        let accounts = valid_accounts(self.accounts);
        let tokens = self
            .tokens
            .into_iter()
            .map(|(k, mut h)| {
                h.balances = valid_accounts(h.balances);
                (k.to_lowercase(), h)
            })
            .collect();
        Self { accounts, tokens }
    }
}

fn valid_accounts(balances: HashMap<String, u128>) -> HashMap<String, u128> {
    balances
        .into_iter()
        .filter_map(|(account, balance)| match parse_address(&account) {
            Ok(address) => Some((address, balance)),
            Err(e) => {
                warn!("Skipping balance sheet entry: {e}");
                None
            }
        })
        .collect()
}

fn asset_of(address: &str, holdings: &TokenHoldings) -> Asset {
    Asset {
        address: address.to_string(),
        symbol: holdings.symbol.clone(),
        decimals: holdings.decimals,
    }
}

impl AccountProvider for BalanceSheet {
    fn balance(&self, address: &str) -> Option<u128> {
        self.accounts.get(&address.to_lowercase()).copied()
    }
}

impl AssetBalanceProvider for BalanceSheet {
    fn asset_balance(&self, owner: &str, asset: &str) -> Option<u128> {
        self.tokens
            .get(&asset.to_lowercase())
            .and_then(|h| h.balances.get(&owner.to_lowercase()))
            .copied()
    }
}
