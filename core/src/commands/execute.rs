use anyhow::{anyhow, Result};

use super::help::help_text;
use super::{AssetSelection, Command};
use crate::draft::{Asset, AssetType, TransactionDraft};
use crate::form::{FormUIState, TransactionFormController};
use crate::provider::BalanceSheet;
use crate::units::{self, NATIVE_DECIMALS};

impl Command {
    /// Execute a command against the form and return the output string.
    pub async fn execute(
        &self,
        form: &mut TransactionFormController,
        balances: &BalanceSheet,
        json_output: bool,
    ) -> Result<String> {
        match self {
            Command::Amount { input } => {
                form.set_fill_max_requested(false);
                let amount = form.update_amount(input).await;
                let draft = form.draft();
                Ok(field_status(
                    form.state().amount_error.as_deref(),
                    || match (amount, draft.amount_decimals()) {
                        (Some(a), Some(d)) => {
                            format!("Amount: {}", units::format_amount(a, d, draft.symbol()))
                        }
                        _ => "Amount cleared.".to_string(),
                    },
                ))
            }

            Command::Max => {
                let value = form.fill_to_maximum().await?;
                let draft = form.draft();
                let decimals = draft.amount_decimals().unwrap_or(NATIVE_DECIMALS);
                Ok(format!(
                    "Amount set to maximum: {}",
                    units::format_amount(value, decimals, draft.symbol())
                ))
            }

            Command::To { address, name } => {
                form.on_focus_recipient();
                form.update_recipient(address).await;
                form.update_recipient_on_blur(address, name.as_deref()).await;
                Ok(field_status(form.state().to_address_error.as_deref(), || {
                    match name {
                        Some(name) => format!("Recipient: {name} ({address})"),
                        None => format!("Recipient: {address}"),
                    }
                }))
            }

            Command::Gas { gas, gas_price } => {
                form.update_gas_selection(*gas, *gas_price).await;
                let fee = gas.saturating_mul(*gas_price);
                Ok(field_status(form.state().gas_error.as_deref(), || {
                    format!(
                        "Gas fee: {}",
                        units::format_amount(fee, NATIVE_DECIMALS, "ETH")
                    )
                }))
            }

            Command::Data { hex } => {
                form.update_hex_data(hex).await;
                Ok("Data updated.".to_string())
            }

            Command::From { address } => {
                form.update_from_address(address).await;
                Ok(format!("Sender: {address}"))
            }

            Command::Asset { selection } => {
                let (asset, asset_type) = match selection {
                    AssetSelection::Native => (None, AssetType::Native),
                    AssetSelection::Token(query) => {
                        let asset = balances.find_asset(query).ok_or_else(|| {
                            anyhow!("No token matching '{query}' in the balance sheet.")
                        })?;
                        (Some(asset), AssetType::FungibleToken)
                    }
                    AssetSelection::Collectible(address) => (
                        Some(Asset {
                            address: address.clone(),
                            symbol: "NFT".to_string(),
                            decimals: 0,
                        }),
                        AssetType::NonFungibleToken,
                    ),
                };
                let label = asset
                    .as_ref()
                    .map(|a| format!("{} ({})", a.symbol, a.address))
                    .unwrap_or_else(|| "ETH".to_string());
                form.update_asset(asset, asset_type).await;
                Ok(format!("Asset: {label}"))
            }

            Command::Review => {
                if form.request_review().await {
                    Ok(format!("Ready for review:\n{}", form.draft().summary()))
                } else {
                    let errors = form.state().errors();
                    let mut lines = vec!["Cannot review yet:".to_string()];
                    lines.extend(errors.iter().map(|e| format!("  - {e}")));
                    Ok(lines.join("\n"))
                }
            }

            Command::Edit => {
                form.return_to_edit();
                Ok("Editing.".to_string())
            }

            Command::Show => {
                let draft = form.draft();
                if json_output {
                    Ok(format_draft_json(&draft, form.state()))
                } else {
                    Ok(format_draft(&draft, form.state()))
                }
            }

            Command::Help { command } => Ok(help_text(command.as_deref())),

            Command::Cancel => {
                form.cancel();
                Ok("Transaction discarded.".to_string())
            }

            Command::Exit => Ok(String::new()),
        }
    }
}

fn field_status(error: Option<&str>, ok: impl FnOnce() -> String) -> String {
    match error {
        Some(e) => format!("Error: {e}"),
        None => ok(),
    }
}

/// Draft summary followed by the field errors currently shown.
#[must_use]
pub fn format_draft(draft: &TransactionDraft, state: &FormUIState) -> String {
    let mut out = draft.summary();
    let errors = state.errors();
    if !errors.is_empty() {
        out.push_str("\n  Errors:");
        for e in errors {
            out.push_str(&format!("\n    - {e}"));
        }
    }
    out
}

/// Draft plus form state as JSON.
#[must_use]
pub fn format_draft_json(draft: &TransactionDraft, state: &FormUIState) -> String {
    serde_json::json!({
        "draft": draft,
        "phase": format!("{:?}", state.phase).to_lowercase(),
        "errors": {
            "amount": state.amount_error,
            "gas": state.gas_error,
            "to": state.to_address_error,
        },
        "fill_max": state.fill_max_requested,
    })
    .to_string()
}
