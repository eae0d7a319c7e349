//! lireddit-cli: a terminal client for the LiReddit GraphQL API.
//! Queries go through a normalized local cache; mutations update it.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod print;
mod session;
mod shell;
#[cfg(test)]
mod tests;

use clap::Parser;
use lireddit_api_types::PostsArgs;
use tracing_subscriber::EnvFilter;

use args::{Cli, Commands};
use client::{CliError, Transport};
use session::ForumSession;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let transport = Transport::new(&cli.endpoint)?;
    let mut session = ForumSession::new(transport, cli.page_size);

    match cli.command {
        Commands::Posts { limit, cursor } => {
            let args = PostsArgs {
                limit: limit.unwrap_or(cli.page_size),
                cursor,
            };
            let page = session.posts(&args).await?;
            if cli.json {
                print::print_json(&page)?;
            } else {
                print::posts(&page);
            }
        }
        Commands::Shell => shell::run(&mut session).await?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
