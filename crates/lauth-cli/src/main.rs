//! # lauth: License Authority Admin CLI
//!
//! ```bash
//! export LAUTH_SERVER=https://licenses.internal:8080
//! export LAUTH_ADMIN_TOKEN=...
//! lauth create --expires 2026-01-01T00:00:00Z
//! lauth extend <KEY> 2027-01-01T00:00:00Z
//! lauth -v revoke <KEY>
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lauth_cli::client::HttpAdminClient;
use lauth_cli::license::{run_license, LicenseCommand};
use lauth_crypto::SecretToken;

/// License authority admin CLI.
#[derive(Parser, Debug)]
#[command(name = "lauth", version, about = "Issue, extend, revoke and inspect licenses")]
struct Cli {
    /// Base URL of the license authority.
    #[arg(long, env = "LAUTH_SERVER", default_value = "http://127.0.0.1:8080", global = true)]
    server: String,

    /// Admin bearer token.
    #[arg(long, env = "LAUTH_ADMIN_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30, global = true)]
    timeout: u64,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: LicenseCommand,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let token = cli.token.as_deref().map(SecretToken::new);
    let client = HttpAdminClient::new(
        &cli.server,
        token.as_ref(),
        Duration::from_secs(cli.timeout),
    )?;
    tracing::debug!(server = client.base_url(), "using license authority");

    let stdout = std::io::stdout();
    run_license(&cli.command, &client, &mut stdout.lock())
}
