//! Data availability light client.
//!
//! This binary serves the DA bridge over JSON-RPC:
//! - block submission to the DA network
//! - availability checks by rollup or DA height
//! - block retrieval by namespace

#![warn(missing_docs)]

mod cli;
mod config;
mod node;
mod server;

use clap::Parser;
use eyre::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cli.log_level()))?;
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    cli.run().await
}
