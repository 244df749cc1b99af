use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

/// Plow - Describe, it runs
#[derive(Parser)]
#[command(name = "plow")]
#[command(about = "A simple declarative command executor")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Name of the config file to run (matched against discovered files)
    name: Option<String>,

    /// Run all tasks in the config file
    #[arg(short, long)]
    all: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new config file
    New {
        /// Name for the new config (prompted for when omitted)
        name: Option<String>,
        /// Add sample runs to the generated file
        #[arg(short, long)]
        example: bool,
        /// Add an options object to the generated file
        #[arg(short, long)]
        options: bool,
        /// Add both the sample runs and the options object
        #[arg(long)]
        example_options: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::New {
            name,
            example,
            options,
            example_options,
        }) => commands::new::execute(name, example || example_options, options || example_options),
        None => commands::run::execute(cli.name, cli.all).await,
    }
}
