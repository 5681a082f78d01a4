use anyhow::{anyhow, bail, Context, Result};

use super::{AssetSelection, Command};
use crate::recipient::Recipient;
use crate::units;

const GWEI_DECIMALS: u8 = 9;
const ASSET_USAGE: &str = "Usage: asset eth | <symbol> | nft <address>";
const COLLECTIBLE_USAGE: &str = "Usage: asset nft <address>";

impl Command {
    /// Parse a command from a raw input string.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            bail!("No command entered. Type 'help' for a list of commands.");
        }

        let mut parts = input.splitn(3, char::is_whitespace);
        let cmd = parts.next().unwrap_or_default().to_lowercase();
        let arg1 = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());
        let arg2 = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

        match cmd.as_str() {
            "amount" | "amt" => {
                // Kept raw: invalid input is still committed and flagged.
                let input = arg1.ok_or_else(|| anyhow!("Missing amount. Usage: amount <value>"))?;
                Ok(Command::Amount {
                    input: input.to_string(),
                })
            }

            "max" => Ok(Command::Max),

            "to" => {
                let address = arg1
                    .ok_or_else(|| anyhow!("Missing recipient. Usage: to <address> [name.eth]"))?;
                let name = match arg2 {
                    Some(raw) => match Recipient::parse(raw)? {
                        Recipient::Name(name) => Some(name),
                        Recipient::Address(_) => {
                            bail!("Expected a .eth name after the address, got '{raw}'.")
                        }
                    },
                    None => None,
                };
                Ok(Command::To {
                    address: address.to_string(),
                    name,
                })
            }

            "gas" => {
                let limit = arg1
                    .ok_or_else(|| anyhow!("Missing gas limit. Usage: gas <limit> <price>"))?;
                let price = arg2
                    .ok_or_else(|| anyhow!("Missing gas price. Usage: gas <limit> <price>"))?;
                let gas = limit
                    .parse::<u128>()
                    .with_context(|| format!("Invalid gas limit '{limit}'"))?;
                let gas_price = parse_gas_price(price)?;
                Ok(Command::Gas { gas, gas_price })
            }

            "data" => {
                let hex = arg1.ok_or_else(|| anyhow!("Missing data. Usage: data <hex>"))?;
                let digits = hex
                    .strip_prefix("0x")
                    .or_else(|| hex.strip_prefix("0X"))
                    .unwrap_or(hex);
                if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                    bail!("Invalid hex data '{hex}'");
                }
                Ok(Command::Data {
                    hex: hex.to_string(),
                })
            }

            "from" => {
                let address = arg1.ok_or_else(|| anyhow!("Missing sender. Usage: from <address>"))?;
                Ok(Command::From {
                    address: crate::recipient::parse_address(address)?,
                })
            }

            "asset" => {
                let kind = arg1.ok_or_else(|| anyhow!("Missing asset. {ASSET_USAGE}"))?;
                let selection = match kind.to_lowercase().as_str() {
                    "eth" | "native" => AssetSelection::Native,
                    "nft" | "collectible" => {
                        let addr = arg2.ok_or_else(|| {
                            anyhow!("Missing collectible address. {COLLECTIBLE_USAGE}")
                        })?;
                        AssetSelection::Collectible(crate::recipient::parse_address(addr)?)
                    }
                    _ => AssetSelection::Token(kind.to_string()),
                };
                Ok(Command::Asset { selection })
            }

            "review" | "next" => Ok(Command::Review),

            "edit" | "back" => Ok(Command::Edit),

            "show" | "draft" => Ok(Command::Show),

            "help" | "h" | "?" => Ok(Command::Help {
                command: arg1.map(|s| s.to_lowercase()),
            }),

            "cancel" => Ok(Command::Cancel),

            "exit" | "quit" | "q" => Ok(Command::Exit),

            other => bail!("Unknown command '{other}'. Type 'help' for a list of commands."),
        }
    }
}

/// Gas price in wei, or gwei with a `gwei` suffix ("20gwei", "1.5gwei").
fn parse_gas_price(input: &str) -> Result<u128> {
    let lower = input.to_lowercase();
    match lower.strip_suffix("gwei") {
        Some(gwei) => units::to_minimal_unit(gwei.trim(), GWEI_DECIMALS)
            .map_err(|e| anyhow!("Invalid gas price '{input}': {e}")),
        None => lower
            .parse::<u128>()
            .with_context(|| format!("Invalid gas price '{input}'")),
    }
}
