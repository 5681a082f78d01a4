#[must_use]
pub fn help_text(command: Option<&str>) -> String {
    match command {
        Some("amount") | Some("amt") => {
            "amount <value>\n  Set the amount in whole units of the selected asset.\n  Invalid input leaves the amount undefined and shows an error.\n  Examples: amount 1.5\n           amount .25\n  Alias: amt".to_string()
        }
        Some("max") => {
            "max\n  Fill the largest spendable amount.\n  For ETH this is the balance minus the gas fee.\n  For tokens it is the full token balance.".to_string()
        }
        Some("to") => {
            "to <address> [name.eth]\n  Set the recipient. An optional resolved name is shown next\n  to the address.\n  Example: to 0x8617e340b3d01fa5f11f306f4090fd50e238070d bob.eth".to_string()
        }
        Some("gas") => {
            "gas <limit> <price>\n  Set the gas limit and gas price. The price is in wei, or in\n  gwei with a 'gwei' suffix.\n  Example: gas 21000 20gwei".to_string()
        }
        Some("data") => {
            "data <hex>\n  Set the optional hex payload. A 0x prefix is added when the\n  transaction moves to review.".to_string()
        }
        Some("from") => {
            "from <address>\n  Set the sending account.".to_string()
        }
        Some("asset") => {
            "asset eth | asset <symbol|address> | asset nft <address>\n  Select the asset to send. Tokens are looked up in the\n  balance sheet by symbol or contract address.".to_string()
        }
        Some("review") | Some("next") => {
            "review\n  Validate every field and move to review if all pass.\n  Alias: next".to_string()
        }
        Some("edit") | Some("back") => {
            "edit\n  Leave review and continue editing.\n  Alias: back".to_string()
        }
        Some("show") | Some("draft") => {
            "show\n  Show the draft and current field errors.\n  Alias: draft".to_string()
        }
        Some("cancel") => {
            "cancel\n  Discard the draft and start a new one.".to_string()
        }
        Some("exit") | Some("quit") | Some("q") => {
            "exit\n  Exit the wallet.\n  Aliases: quit, q".to_string()
        }
        Some(other) => format!("Unknown command: {other}"),
        None => [
            "Commands:",
            "  amount <value>             Set the amount",
            "  max                        Fill the largest spendable amount",
            "  to <address> [name.eth]    Set the recipient",
            "  gas <limit> <price>        Set gas limit and price",
            "  data <hex>                 Set the hex payload",
            "  from <address>             Set the sending account",
            "  asset <eth|symbol|nft ..>  Select the asset",
            "  review                     Validate and move to review",
            "  edit                       Back to editing",
            "  show                       Show the draft",
            "  cancel                     Discard the draft",
            "  help [command]             Show help",
            "  exit                       Exit",
        ]
        .join("\n"),
    }
}
