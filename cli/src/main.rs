mod entry;
mod repl;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ember_wallet_core::commands::Command;
use ember_wallet_core::recipient::parse_address;
use ember_wallet_core::{BalanceSheet, Preferences};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ember-wallet", about = "Ember Wallet: send-form REPL", version)]
pub(crate) struct Cli {
    /// Data directory (default: platform data dir + ember-wallet)
    #[arg(long, env = "EMBER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Balance sheet JSON (default: <data dir>/balances.json)
    #[arg(long)]
    balances: Option<PathBuf>,

    /// Sending account (default: first account in the balance sheet)
    #[arg(long)]
    from: Option<String>,

    /// Run commands and exit. Separate several with ';'
    #[arg(long)]
    cmd: Option<String>,

    /// Output in JSON format (applies to `show`)
    #[arg(long)]
    json: bool,

    /// Skip start-up routing (no password prompt)
    #[arg(long)]
    skip_entry: bool,
}

impl Cli {
    fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => ember_wallet_core::data_dir(),
        }
    }

    fn balances_path(&self) -> Result<PathBuf> {
        match &self.balances {
            Some(path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join("balances.json")),
        }
    }

    /// Explicit `--from`, else the lowest account in the sheet.
    fn sender(&self, balances: &BalanceSheet) -> Result<String> {
        if let Some(from) = &self.from {
            return parse_address(from);
        }
        let mut accounts: Vec<&String> = balances.accounts.keys().collect();
        accounts.sort();
        match accounts.first() {
            Some(account) => parse_address(account),
            None => bail!(
                "No sending account. Pass --from <address> or add accounts to {}.",
                self.balances_path()?.display()
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let balances_path = cli.balances_path()?;
    let balances = Arc::new(
        BalanceSheet::open_at(&balances_path)
            .with_context(|| format!("Failed to load {}", balances_path.display()))?,
    );
    let from = cli.sender(&balances)?;

    if !cli.skip_entry {
        let prefs = Arc::new(Preferences::open_at(
            &cli.data_dir()?.join("preferences.db"),
        )?);
        entry::enter(prefs, cli.cmd.is_none()).await?;
    }

    if let Some(cmd_str) = &cli.cmd {
        // One-shot mode
        run_oneshot(&cli, cmd_str, balances, from).await
    } else {
        // REPL mode
        repl::run_repl(&cli, balances, from).await
    }
}

async fn run_oneshot(
    cli: &Cli,
    cmd_str: &str,
    balances: Arc<BalanceSheet>,
    from: String,
) -> Result<()> {
    let commands = cmd_str
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Command::parse)
        .collect::<Result<Vec<_>>>()?;

    let mut session = repl::FormSession::new(balances, from).await;
    for command in commands {
        if command == Command::Exit {
            break;
        }
        let output = session.run(&command, cli.json).await?;
        if !output.is_empty() {
            println!("{output}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "0x52908400098527886e0f7030069857d2e4169ee7";
    const B: &str = "0x8617e340b3d01fa5f11f306f4090fd50e238070d";

    #[test]
    fn sender_defaults_to_lowest_account() {
        let cli = Cli::parse_from(["ember-wallet", "--data-dir", "/tmp/ember"]);
        let mut sheet = BalanceSheet::default();
        sheet.set_balance(B, 1);
        sheet.set_balance(A, 2);
        assert_eq!(cli.sender(&sheet).unwrap(), A);
    }

    #[test]
    fn explicit_sender_is_normalized() {
        let upper = A.to_uppercase().replacen("0X", "0x", 1);
        let cli = Cli::parse_from(["ember-wallet", "--from", upper.as_str()]);
        assert_eq!(cli.sender(&BalanceSheet::default()).unwrap(), A);
    }

    #[test]
    fn malformed_sheet_account_is_rejected() {
        let cli = Cli::parse_from(["ember-wallet", "--data-dir", "/tmp/ember"]);
        let mut sheet = BalanceSheet::default();
        sheet.set_balance("aéééééééééééé", 1);
        assert!(cli.sender(&sheet).is_err());
    }

    #[test]
    fn missing_sender_is_error() {
        let cli = Cli::parse_from(["ember-wallet", "--data-dir", "/tmp/ember"]);
        assert!(cli.sender(&BalanceSheet::default()).is_err());
    }

    #[test]
    fn balances_default_under_data_dir() {
        let cli = Cli::parse_from(["ember-wallet", "--data-dir", "/tmp/ember"]);
        assert_eq!(
            cli.balances_path().unwrap(),
            PathBuf::from("/tmp/ember/balances.json")
        );
    }
}
