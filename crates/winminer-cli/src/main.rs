//! # winminer
//!
//! Command-line front end for the WinMiner API: prints REST resources as
//! JSON and follows device status over the live API.

#![deny(unsafe_code)]

mod live;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use winminer::ApiClient;

/// WinMiner API client.
#[derive(Parser, Debug)]
#[command(name = "winminer", about = "WinMiner API client")]
struct Cli {
    /// Account email.
    #[arg(long, env = "WINMINER_EMAIL")]
    email: String,

    /// Account password.
    #[arg(long, env = "WINMINER_PASSWORD", hide_env_values = true)]
    password: String,

    /// Log every request, response and frame.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Historical statistics.
    Stats,
    /// Machines and devices as listed by the REST API.
    Machines,
    /// Past withdrawals.
    WithdrawHistory,
    /// Withdraw options, fees and exchange rates.
    WithdrawData,
    /// Balance as seen by the mining client.
    Exchange {
        /// Mining token of the client.
        #[arg(long)]
        mining_token: String,
        /// Balance token of the client.
        #[arg(long)]
        balance_token: String,
    },
    /// Follow live device status.
    Live {
        /// Stop after this many relevant envelopes.
        #[arg(long)]
        envelopes: Option<usize>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = winminer_settings::load_settings().context("Failed to load settings")?;
    logging::init_subscriber(&settings.logging, cli.debug);
    tracing::debug!(base_url = %settings.api.base_url, "settings loaded");

    let client = ApiClient::login(&cli.email, &cli.password, settings)
        .await
        .context("unable to login")?;

    match cli.command {
        Command::Stats => print_json(&client.get_stats().await.context("unable to get stats")?),
        Command::Machines => {
            print_json(&client.get_machines().await.context("unable to get machines")?)
        }
        Command::WithdrawHistory => print_json(
            &client
                .get_withdraw_history()
                .await
                .context("unable to get withdraw history")?,
        ),
        Command::WithdrawData => print_json(
            &client
                .get_withdraw_data()
                .await
                .context("unable to get withdraw data")?,
        ),
        Command::Exchange {
            mining_token,
            balance_token,
        } => print_json(
            &client
                .get_exchange_balance(&mining_token, &balance_token)
                .await
                .context("unable to get exchange balance")?,
        ),
        Command::Live { envelopes } => live::follow(&client, envelopes).await,
    }
}
