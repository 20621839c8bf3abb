pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "deckhand",
    about = "Deckhand operator CLI",
    long_about = "Build slide decks locally, chat with the configured agent, and inspect runtime readiness.",
    after_help = "Examples:\n  deckhand deck --topic \"AI trends\" --content-file notes.txt\n  deckhand chat\n  deckhand doctor --json\n  deckhand config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Build a PPTX locally from a topic and a content file")]
    Deck {
        #[arg(long, help = "Deck topic; also derives the output file name")]
        topic: String,
        #[arg(long, help = "Path to the content file (blank lines split slides)")]
        content_file: PathBuf,
        #[arg(long, help = "Output path; defaults to the derived file name in the current directory")]
        out: Option<PathBuf>,
    },
    #[command(about = "Chat with the configured agent from the terminal")]
    Chat,
    #[command(about = "Inspect effective configuration values with secret redaction")]
    Config,
    #[command(about = "Validate config and collaborator readiness checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Deck { topic, content_file, out } => {
            commands::deck::run(&topic, &content_file, out.as_deref())
        }
        Command::Chat => commands::chat::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
