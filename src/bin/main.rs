//! Beeconnect CLI - chain tables and a scripted wallet session
//!
//!   beeconnect network <chain-id>              → {"chainId", "network", "explorer"}
//!   beeconnect explorer <hash> [--chain <id>]  → {"url"}
//!   beeconnect demo [flags]                    → connect + self-transfer against an in-memory wallet
//!
//! Demo flags:
//!   --chain <id>   chain the wallet reports (default 1)
//!   --no-wallet    no provider in the environment
//!   --locked       user declines the connection prompt
//!   --reject       user declines the transaction
//!   --revert       transaction is mined but reverts
//!
//! Output format:
//!   --pretty   Pretty-print JSON (default for tty)
//!   --verbose  Debug logging on stderr

use anyhow::{anyhow, bail, Context, Result};
use beeconnect::core::format::short_hash;
use beeconnect::core::networks::{explorer_base, explorer_url, network_label, DEFAULT_CHAIN_ID};
use beeconnect::logging::{init_logging_with, LogFormat};
use beeconnect::{ClientConfig, MemoryProvider, ProviderError, TransactionRequest, WalletClient};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::rc::Rc;
use tracing::debug;

const DEMO_ACCOUNT: &str = "0x52908400098527886E0F7030069857D2E4169EE7";
const DEMO_VALUE_WEI: u128 = 1_000_000_000_000_000;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = match ParsedArgs::parse(&args[1..]) {
        Ok(opts) => opts,
        Err(e) => fail(&e.to_string(), false),
    };
    init_logging_with(LogFormat::from_env(), if opts.verbose { "debug" } else { "info" });

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("beeconnect {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("network") => cmd_network(&opts),
        Some("explorer") => cmd_explorer(&opts),
        Some("demo") => cmd_demo(&opts).await,
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || std::io::stdout().is_terminal();
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => fail(&format!("{:#}", e), pretty),
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

fn fail(message: &str, pretty: bool) -> ! {
    eprintln!("{}", render(&json!({"error": message}), pretty));
    std::process::exit(1);
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    positional: Vec<String>,
    chain: Option<u64>,
    // Demo options
    no_wallet: bool,
    locked: bool,
    reject: bool,
    revert: bool,
    // Output options
    pretty: bool,
    verbose: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let mut opts = ParsedArgs::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--chain" | "-c" => {
                    let value = iter.next().context("--chain needs a value")?;
                    opts.chain = Some(parse_chain(value)?);
                }
                "--no-wallet" => opts.no_wallet = true,
                "--locked" => opts.locked = true,
                "--reject" => opts.reject = true,
                "--revert" => opts.revert = true,
                "--pretty" => opts.pretty = true,
                "--verbose" | "-v" => opts.verbose = true,
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                flag if flag.starts_with("--") => bail!("Unknown flag: {}", flag),
                _ if opts.command.is_none() => opts.command = Some(arg.clone()),
                _ => opts.positional.push(arg.clone()),
            }
        }
        Ok(opts)
    }
}

/// Decimal or `0x`-prefixed hex.
fn parse_chain(value: &str) -> Result<u64> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse::<u64>(),
    };
    parsed.with_context(|| format!("invalid chain id: {}", value))
}

fn cmd_network(opts: &ParsedArgs) -> Result<Value> {
    let raw = opts.positional.first().context("usage: beeconnect network <chain-id>")?;
    let chain_id = parse_chain(raw)?;
    Ok(json!({
        "chainId": chain_id,
        "network": network_label(chain_id),
        "explorer": explorer_base(chain_id),
    }))
}

fn cmd_explorer(opts: &ParsedArgs) -> Result<Value> {
    let hash = opts.positional.first().context("usage: beeconnect explorer <hash> [--chain <id>]")?;
    Ok(json!({"url": explorer_url(hash, opts.chain.unwrap_or(DEFAULT_CHAIN_ID))}))
}

async fn cmd_demo(opts: &ParsedArgs) -> Result<Value> {
    let provider = if opts.no_wallet {
        MemoryProvider::absent()
    } else {
        MemoryProvider::new()
            .with_accounts([DEMO_ACCOUNT])
            .with_chain(opts.chain.unwrap_or(DEFAULT_CHAIN_ID))
    };
    if opts.locked {
        provider.fail_next_request_accounts(ProviderError::user_rejected());
    }
    if opts.reject {
        provider.fail_next_send(ProviderError::user_rejected());
    }
    if opts.revert {
        provider.set_receipt_status(0);
    }

    let client = WalletClient::start(Rc::new(provider.clone()), ClientConfig::new("beeconnect-demo")).await;
    client.connect().await;
    let session = client.session();
    debug!(status = session.status.as_str(), "demo session");

    let receipt = client
        .submit(TransactionRequest::transfer(DEMO_ACCOUNT, DEMO_VALUE_WEI))
        .await;
    let transaction = client.transaction();
    let calls = provider.calls();
    client.close();

    Ok(json!({
        "session": session,
        "sessionMessage": session.status_message(),
        "networkMessage": session.network_message(),
        "transaction": transaction,
        "transactionMessage": transaction.status_message(),
        "shortHash": transaction.hash.as_deref().map(short_hash),
        "receipt": receipt,
        "explorer": client.transaction_url(),
        "providerCalls": {
            "requestAccounts": calls.request_accounts,
            "sendTransaction": calls.send_transaction,
        },
    }))
}

fn print_usage() {
    println!(
        r#"beeconnect - wallet session toolkit

USAGE:
    beeconnect <command> [args] [flags]

COMMANDS:
    network <chain-id>          Network label and explorer for a chain
    explorer <hash>             Explorer URL for a transaction hash
    demo                        Scripted connect + transfer against an in-memory wallet

FLAGS:
    -c, --chain <id>            Chain id (decimal or 0x-hex)
        --no-wallet             Demo: no provider installed
        --locked                Demo: user declines the connection
        --reject                Demo: user declines the transaction
        --revert                Demo: transaction reverts on chain
        --pretty                Pretty-print JSON
    -v, --verbose               Debug logging
    -h, --help                  Show this help
    -V, --version               Show version

ENVIRONMENT:
    RUST_LOG                    Log filter (default: info)
    BEECONNECT_LOG_FORMAT       pretty | compact | json"#
    );
}
