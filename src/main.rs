use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use slife::cli;
use slife::cli::commands::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli_args = Cli::parse();
    let json_output = cli_args.json;

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(json_output),
        Commands::User(cmd) => cli::user::run(cmd, json_output),
        Commands::Catalog(cmd) => cli::catalog::run(cmd, json_output),
        Commands::Task(cmd) => cli::task::run(cmd, json_output),
        Commands::Invite(cmd) => cli::invite::run(cmd, json_output),
        Commands::Device(cmd) => cli::device::run(cmd, json_output),
        Commands::Post(cmd) => cli::social::run(cmd, json_output),
    };

    process::exit(exit_code);
}
