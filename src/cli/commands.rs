//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

use crate::rag::FilterParams;

#[derive(Parser)]
#[command(name = "wooverzicht")]
#[command(about = "Cited question answering over Woo government-disclosure documents")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: configured level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the configured host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
        /// Disable CORS regardless of configuration
        #[arg(long)]
        no_cors: bool,
    },
    /// Ask a question and stream the cited answer to stdout
    Ask {
        /// The question
        question: String,
        /// Session id, to continue an earlier conversation
        #[arg(short, long, default_value = "cli")]
        session: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List matching passages and documents without generating an answer
    Documents {
        /// Search text
        query: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
    /// Validate the configuration and probe the vector store
    CheckConfig {
        /// Skip contacting the vector store
        #[arg(long)]
        offline: bool,
    },
}

/// Metadata constraints shared by `ask` and `documents`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Province to include (repeatable)
    #[arg(long = "province")]
    pub provinces: Vec<String>,
    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,
    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,
}

impl FilterArgs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty() && self.start_date.is_none() && self.end_date.is_none()
    }

    #[must_use]
    pub fn to_params(&self) -> FilterParams {
        FilterParams {
            provinces: (!self.provinces.is_empty()).then(|| self.provinces.clone()),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }
}
