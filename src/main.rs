//! The main entry point for the program.
use anyhow::Result;
use clap::Parser;
use fueleq::commands::{Cli, Commands, handle_run_command, handle_template_command};
use human_panic::setup_panic;

fn main() -> Result<()> {
    setup_panic!();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { model_dir } => handle_run_command(&model_dir),
        Commands::Template { directory } => handle_template_command(&directory),
    }
}
