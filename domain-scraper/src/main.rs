//! Domain Scraper CLI - scrape relay domains from emails and mail a digest.
//!
//! Paths and SMTP settings come from the environment (see `Config`) and can
//! be overridden on the command line. Without a command, `scrape-and-send`
//! runs.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_scraper::pipeline::{self, ScrapeOutcome, ScrapeSource, SendOutcome};
use domain_scraper::{Config, Inbox, MessageDomains, ScraperError, SmtpMailer};

/// Scrape domains from emails and send summary email.
#[derive(Parser)]
#[command(name = "domain-scraper")]
#[command(version)]
struct Cli {
    /// File to save scraped domains
    #[arg(short = 'd', long, global = true)]
    dbfile: Option<PathBuf>,

    /// Input directory to read emails
    #[arg(short = 'i', long, global = true)]
    input_dir: Option<PathBuf>,

    /// Archive directory to move emails
    #[arg(short = 'a', long, global = true)]
    archive_dir: Option<PathBuf>,

    /// Path to only one email to scrape; input-dir is ignored
    #[arg(short = 'e', long, global = true)]
    email: Option<PathBuf>,

    /// Send all scraped domains instead of only new emails
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Print scraped domains to stdout
    #[arg(short = 'p', long, global = true)]
    print: bool,

    /// Logging level, used when RUST_LOG is not set
    #[arg(short = 'l', long, value_enum, default_value_t = LogLevel::Info, global = true)]
    logging_level: LogLevel,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Scrape emails and merge their domains into the store
    Scrape,
    /// Mail a digest of stored domains to DOMAINS_SUBSCRIBERS
    Send,
    /// Scrape, then send (default)
    ScrapeAndSend,
    /// Development: remove the store and move archived emails back
    Clean,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Structured JSON logging on stderr; stdout is reserved for --print
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.logging_level.as_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(dbfile) = cli.dbfile.clone() {
        config.db_file = dbfile;
    }
    if let Some(input_dir) = cli.input_dir.clone() {
        config.input_dir = input_dir;
    }
    if let Some(archive_dir) = cli.archive_dir.clone() {
        config.archive_dir = archive_dir;
    }

    info!(
        db_file = %config.db_file.display(),
        input_dir = %config.input_dir.display(),
        archive_dir = %config.archive_dir.display(),
        subscribers_set = config.subscribers.is_some(),
        "config_loaded"
    );

    match cli.command.unwrap_or(Command::ScrapeAndSend) {
        Command::Scrape => scrape(&cli, &config),
        Command::Send => send(&cli, &config).await,
        Command::ScrapeAndSend => {
            scrape(&cli, &config)?;
            send(&cli, &config).await
        }
        Command::Clean => pipeline::clean(&config.db_file, &inbox(&config)),
    }
}

fn inbox(config: &Config) -> Inbox {
    Inbox::new(&config.input_dir, &config.archive_dir)
}

fn scrape(cli: &Cli, config: &Config) -> Result<()> {
    let source = match &cli.email {
        Some(path) => {
            info!(email = %path.display(), "scrape_single_file");
            ScrapeSource::File(path.clone())
        }
        None => ScrapeSource::Inbox(inbox(config)),
    };

    match pipeline::scrape(&config.db_file, &source)? {
        ScrapeOutcome::NothingToPersist => warn!("No new messages"),
        ScrapeOutcome::Saved { batch } => {
            if cli.print {
                for (message_id, domains) in batch {
                    println!("{}", MessageDomains { message_id, domains });
                }
            }
        }
    }

    Ok(())
}

async fn send(cli: &Cli, config: &Config) -> Result<()> {
    let Some(subscribers) = config.subscribers.clone() else {
        error!("DOMAINS_SUBSCRIBERS variable is not set, cannot send summary");
        return Ok(());
    };

    let mailer = SmtpMailer::new(config.clone(), subscribers);
    let today = chrono::Local::now().date_naive();

    match pipeline::send(&config.db_file, cli.force, &mailer, today).await {
        Ok(SendOutcome::Sent { messages }) => {
            info!(messages = messages, "Email sent.");
            Ok(())
        }
        Ok(SendOutcome::NothingToSend) => Ok(()),
        Err(e) => match e.downcast_ref::<ScraperError>() {
            Some(err) if err.is_store_not_found() => {
                warn!(error = %err, "store_missing");
                Ok(())
            }
            _ => Err(e),
        },
    }
}
