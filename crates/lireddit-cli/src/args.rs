//! Command-line surface for `lireddit-cli`.

#![deny(clippy::all, clippy::pedantic)]

use clap::{Parser, Subcommand};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/graphql";

/// Page size the web client uses for the front page.
pub const DEFAULT_PAGE_SIZE: i32 = 15;

#[derive(Parser, Debug)]
#[command(name = "lireddit-cli", version, about = "LiReddit forum client", long_about = None)]
pub struct Cli {
    /// GraphQL endpoint, e.g. <http://localhost:4000/graphql>
    #[arg(long, env = "LIREDDIT_GRAPHQL_URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Posts fetched per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(i32).range(1..=50))]
    pub page_size: i32,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Log cache and transport activity to stderr
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List posts, newest first
    Posts {
        #[arg(long)]
        limit: Option<i32>,
        /// `createdAt` of the last post already seen
        #[arg(long)]
        cursor: Option<String>,
    },
    /// Interactive session that keeps the login cookie and the cache
    Shell,
}
