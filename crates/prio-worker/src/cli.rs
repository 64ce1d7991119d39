use clap::{Parser, Subcommand};

/// `prio` command line interface, mirroring the original's `cobra` root
/// command with a single `worker` subcommand.
#[derive(Debug, Parser)]
#[command(name = "prio", version, about = "Distributed priority job queue")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Starts a prio worker: joins the namespace, participates in leader
    /// election, and serves the HTTP API.
    Worker {
        /// Env file to load before reading `PRIO_*` environment variables.
        #[arg(short = 'e', long = "envfile", default_value = ".env")]
        envfile: String,
    },
}
