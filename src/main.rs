use clap::{Parser, Subcommand};
use rss_reader::{
    ConsoleInteraction, FetchConfig, Fetcher, LogDelivery, ReaderConfig, ReaderSession,
    WatermarkStore,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "rss-reader",
    about = "Incremental RSS/Atom reader with per-feed read watermarks"
)]
struct Cli {
    /// Path to the feeds configuration file
    #[arg(long, default_value = "feeds.json")]
    config: PathBuf,

    /// Path to the watermark state file
    #[arg(long, default_value = "feed-data.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report how many new articles each feed has
    Count { query: Vec<String> },
    /// Step through new articles interactively
    Read { query: Vec<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ReaderConfig::load(&cli.config)?;
    let slots = config.valid_slots();

    let fetcher = Fetcher::new(FetchConfig::default());
    let mut io = ConsoleInteraction;
    let mailer = LogDelivery;
    let mut store = WatermarkStore::open(&cli.state)?;

    let mut session = ReaderSession::new(slots, &fetcher, &mut io, &mailer);

    match cli.command {
        Command::Count { query } => {
            session.check_feeds(&query.join(" "), &mut store).await?;
        }
        Command::Read { query } => {
            let outcome = session.read_feeds(&query.join(" "), &mut store).await?;
            info!("session finished: {:?}", outcome);
        }
    }

    Ok(())
}
