//! CLI module for the semantic cache server
//!
//! Provides subcommands:
//! - `serve`: run the HTTP API

pub mod serve;

use clap::{Parser, Subcommand};

/// LLM Semantic Cache - embedding-similarity response cache for LLM traffic
#[derive(Parser)]
#[command(name = "llm-semantic-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the cache API server
    Serve(serve::ServeArgs),
}
