use crate::entry::prompt_confirm;
use crate::Cli;
/// REPL shell: Reedline-based interactive send-form session.
use anyhow::Result;
use ember_wallet_core::commands::Command;
use ember_wallet_core::{
    units, BalanceSheet, DraftStore, NavigationHost, Phase, Session, TransactionDraft,
    TransactionFormController,
};
use reedline::{DefaultCompleter, DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use std::sync::Arc;
use tracing::debug;

/// Terminal host for the form. Phase changes are shown through the prompt.
struct TerminalHost;

impl NavigationHost for TerminalHost {
    fn on_mode_change(&self, phase: Phase) {
        debug!(?phase, "mode change");
    }

    fn on_cancel(&self) {
        debug!("draft discarded");
    }
}

/// One send form bound to a balance sheet. `reset` starts a fresh draft after
/// the previous session was cancelled.
pub(crate) struct FormSession {
    pub(crate) form: TransactionFormController,
    pub(crate) balances: Arc<BalanceSheet>,
    store: Arc<DraftStore>,
    from: String,
}

impl FormSession {
    pub(crate) async fn new(balances: Arc<BalanceSheet>, from: String) -> Self {
        let draft = TransactionDraft::native(from.clone());
        let store = Arc::new(DraftStore::new(
            draft.clone(),
            balances.clone(),
            balances.clone(),
        ));
        let mut form = new_form(&store, &balances);
        form.initialize(&draft).await;
        Self {
            form,
            balances,
            store,
            from,
        }
    }

    pub(crate) async fn reset(&mut self) {
        let draft = TransactionDraft::native(self.from.clone());
        self.store.replace(draft.clone());
        self.form = new_form(&self.store, &self.balances);
        self.form.initialize(&draft).await;
    }

    /// Run one parsed command, replacing the form if it closed itself.
    pub(crate) async fn run(&mut self, cmd: &Command, json: bool) -> Result<String> {
        let output = cmd.execute(&mut self.form, &self.balances, json).await?;
        if !self.form.session().is_open() {
            self.reset().await;
        }
        Ok(output)
    }

    fn prompt(&self) -> DefaultPrompt {
        let draft = self.form.draft();
        let from = draft.from.as_deref().unwrap_or("no sender");
        let mode = match self.form.state().phase {
            Phase::Edit => "edit",
            Phase::Review => "review",
        };
        DefaultPrompt::new(
            DefaultPromptSegment::Basic(format!("[ember {} {mode}]", short_address(from))),
            DefaultPromptSegment::Empty,
        )
    }
}

fn new_form(store: &Arc<DraftStore>, balances: &Arc<BalanceSheet>) -> TransactionFormController {
    TransactionFormController::new(
        store.clone(),
        balances.clone(),
        balances.clone(),
        Arc::new(TerminalHost),
        Session::new(),
    )
}

fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    } else {
        address.to_string()
    }
}

pub async fn run_repl(cli: &Cli, balances: Arc<BalanceSheet>, from: String) -> Result<()> {
    println!("Ember Wallet v{}", env!("CARGO_PKG_VERSION"));
    match balances.accounts.get(&from) {
        Some(balance) => println!(
            "Sending from {from} ({})",
            units::format_amount(*balance, units::NATIVE_DECIMALS, "ETH")
        ),
        None => println!("Sending from {from} (no known balance)"),
    }
    let tokens = balances.assets();
    if !tokens.is_empty() {
        let symbols: Vec<&str> = tokens.iter().map(|a| a.symbol.as_str()).collect();
        println!("Tokens: {}", symbols.join(", "));
    }
    println!("Type 'help' for a list of commands.");
    println!();

    let mut session = FormSession::new(balances, from).await;

    let commands: Vec<String> = [
        "amount", "amt", "max", "to", "gas", "data", "from", "asset", "review", "next", "edit",
        "back", "show", "draft", "cancel", "help", "exit", "quit", "q",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let completer = Box::new(DefaultCompleter::new(commands));
    let mut line_editor = Reedline::create().with_completer(completer);

    loop {
        let prompt = session.prompt();
        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match Command::parse(line) {
                    Ok(Command::Exit) => {
                        println!("Goodbye.");
                        break;
                    }
                    Ok(cmd) => {
                        if let Some(prompt_msg) = cmd.confirmation_prompt() {
                            if !prompt_confirm(&prompt_msg) {
                                println!("Kept.");
                                continue;
                            }
                        }
                        match session.run(&cmd, cli.json).await {
                            Ok(output) => {
                                if !output.is_empty() {
                                    println!("{output}");
                                }
                            }
                            Err(e) => eprintln!("Error: {e}"),
                        }
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => {
                println!("Goodbye.");
                break;
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }
    }

    Ok(())
}
