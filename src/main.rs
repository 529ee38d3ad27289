use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod error;
mod extract;
mod handlers;
mod middleware;
mod policy;
mod router;
mod schemas;
mod services;
mod uploads;

#[cfg(test)]
mod openapi_tests;
#[cfg(test)]
mod test_utils;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.run().await?;

    Ok(())
}
