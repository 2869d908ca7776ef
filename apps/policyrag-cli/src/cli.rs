use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "policyrag", version, about = "Question answering over HR policy documents")]
pub struct Cli {
    /// Directory holding config.toml and config.<env>.toml
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,

    /// Config environment (dev, prod, test)
    #[arg(long, global = true, env = "RUST_ENV", default_value = "dev")]
    pub env: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rebuild a domain's collection from PDF or text files
    Ingest {
        /// Domain key from the `[domains]` table, e.g. leave
        domain: String,
        /// Files or directories to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Answer one question from the command line
    Ask {
        question: String,
        /// Let the agent pick among all domain collections
        #[arg(long)]
        routed: bool,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the row count of the default collection
    Health,
}
