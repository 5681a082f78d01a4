/// Command definitions and parsing for the send-form REPL and one-shot mode.
mod execute;
mod help;
mod parse;

pub use help::help_text;

/// Asset picked with the `asset` command.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetSelection {
    Native,
    /// Token symbol or contract address, looked up in the balance sheet.
    Token(String),
    /// Collectible contract address.
    Collectible(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set the amount: amount <decimal>
    Amount { input: String },
    /// Fill the largest spendable amount
    Max,
    /// Set the recipient: to <address> [name.eth]
    To {
        address: String,
        name: Option<String>,
    },
    /// Set gas limit and gas price: gas <limit> <price[gwei]>
    Gas { gas: u128, gas_price: u128 },
    /// Set the hex payload: data <hex>
    Data { hex: String },
    /// Set the sending account: from <address>
    From { address: String },
    /// Pick the asset: asset eth | asset <symbol|address> | asset nft <address>
    Asset { selection: AssetSelection },
    /// Validate and move to review
    Review,
    /// Back from review to editing
    Edit,
    /// Show the draft and current field errors
    Show,
    /// Print help
    Help { command: Option<String> },
    /// Discard the draft and start over
    Cancel,
    /// Exit the wallet
    Exit,
}

impl Command {
    /// Returns a confirmation prompt if this command should ask before executing.
    pub fn confirmation_prompt(&self) -> Option<String> {
        match self {
            Command::Cancel => Some("Discard this transaction?".to_string()),
            _ => None,
        }
    }
}
