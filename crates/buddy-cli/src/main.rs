use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "studybuddy")]
#[command(about = "Study Buddy - persona-driven learning chat with spoken replies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the learner profile (topic, education level, grade)
    Setup,
    /// List the available conversation personalities
    Personalities,
    /// Start a chat session
    Chat {
        /// Personality key (see `studybuddy personalities`)
        #[arg(short, long)]
        personality: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Setup => commands::setup::run()?,
        Commands::Personalities => commands::personalities::run(),
        Commands::Chat { personality } => commands::chat::run(personality.as_deref()).await?,
    }

    Ok(())
}
