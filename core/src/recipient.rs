use std::fmt;

use anyhow::{anyhow, bail};

/// Length of an account address in bytes.
const ADDRESS_LEN: usize = 20;

/// A recipient that may be a raw address or an ENS-style name (e.g. `alice.eth`).
/// Name resolution belongs to an external resolver; the form only records the
/// resolved name next to the address.
#[derive(Debug, Clone, PartialEq)]
pub enum Recipient {
    Address(String),
    Name(String),
}

impl Recipient {
    /// Parse user input as either a `0x` hex address or a `.eth` name.
    /// Addresses are normalized to lowercase.
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            bail!("Recipient cannot be empty.");
        }

        if input.starts_with("0x") || input.starts_with("0X") {
            return parse_address(input).map(Recipient::Address);
        }

        let lower = input.to_lowercase();
        if lower.ends_with(".eth") && lower.len() > 4 {
            let name_part = &lower[..lower.len() - 4];
            if name_part.contains(' ') || name_part.ends_with('.') {
                bail!("Invalid name '{input}'.");
            }
            return Ok(Recipient::Name(lower));
        }

        bail!("Invalid recipient '{input}'. Expected a 0x address or a .eth name.");
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Address(addr) => write!(f, "{addr}"),
            Recipient::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Validate a `0x`-prefixed 20-byte hex address and return it lowercased.
pub fn parse_address(input: &str) -> anyhow::Result<String> {
    let input = input.trim();
    let hex_part = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or_else(|| anyhow!("Address '{input}' must start with 0x."))?;
    let bytes = hex::decode(hex_part).map_err(|e| anyhow!("Invalid address '{input}': {e}"))?;
    if bytes.len() != ADDRESS_LEN {
        bail!(
            "Invalid address '{input}': expected {ADDRESS_LEN} bytes, got {}.",
            bytes.len()
        );
    }
    Ok(format!("0x{}", hex_part.to_lowercase()))
}
