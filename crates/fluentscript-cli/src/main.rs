//! FluentScript command-line interface.
//!
//! `fluent run` evaluates a script, `fluent tokens` dumps the token stream
//! (optionally as JSON), `fluent parse` prints the AST.

use clap::{Parser, Subcommand};

mod commands;
mod diagnostics;

#[derive(Parser)]
#[command(name = "fluent")]
#[command(about = "FluentScript interpreter", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a FluentScript file
    Run {
        /// Input file
        file: String,
    },

    /// Lex a file and print its token stream
    Tokens {
        /// Input file
        file: String,
        /// Emit tokens as JSON, one object per line
        #[arg(long)]
        json: bool,
    },

    /// Parse a file and print its syntax tree
    Parse {
        /// Input file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { file } => commands::run::execute(&file),
        Commands::Tokens { file, json } => commands::tokens::execute(&file, json),
        Commands::Parse { file } => commands::parse::execute(&file),
    };
    if let Err(err) = result {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
