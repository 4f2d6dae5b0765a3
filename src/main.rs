//! Binary entrypoint for telecat.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{Level, debug, info};
use tracing_subscriber::{EnvFilter, fmt};

use telecat::config::Configuration;
use telecat::connectivity::{self, ConnectivityProbe};
use telecat::error::Error;
use telecat::events::FormEvent;
use telecat::form::{CaptionChoice, FormState};
use telecat::history::HistoryStore;

#[derive(Debug, Parser)]
#[command(name = "telecat", about = "Timed cat-image slideshow with persisted history")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the form, verify connectivity, and run a slideshow
    Run {
        /// How many images to show
        #[arg(long, value_name = "COUNT")]
        count: Option<String>,

        /// Caption embedded in every image
        #[arg(long, value_name = "TEXT", conflicts_with = "no_caption")]
        caption: Option<String>,

        /// Show the images without a caption
        #[arg(long)]
        no_caption: bool,
    },
    /// Print recorded interactions and their aggregates
    History,
    /// Clear the recorded history
    Clear,
}

fn init_tracing(verbosity: u8) {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("telecat={level}")));
    fmt().with_env_filter(filter).with_target(true).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = if cli.config.exists() {
        Configuration::from_yaml_file(&cli.config)
            .with_context(|| format!("loading config from {}", cli.config.display()))?
            .validated()
            .context("validating configuration")?
    } else {
        debug!(path = %cli.config.display(), "config file missing; using defaults");
        Configuration::default().validated()?
    };

    let store = HistoryStore::at_path(&cfg.history_path);

    match cli.command {
        Command::Run {
            count,
            caption,
            no_caption,
        } => run_flow(&cfg, &store, count, caption, no_caption).await,
        Command::History => {
            print_history(&store);
            Ok(())
        }
        Command::Clear => {
            store.clear().context("clearing history")?;
            println!("history cleared");
            Ok(())
        }
    }
}

/// The form flow from the spec: fill the fields, run the connectivity check,
/// and begin only when the form validates and connectivity is verified.
async fn run_flow(
    cfg: &Configuration,
    store: &HistoryStore,
    count: Option<String>,
    caption: Option<String>,
    no_caption: bool,
) -> Result<()> {
    let (form_tx, mut form_rx) = mpsc::unbounded_channel::<FormEvent>();
    let mut form = FormState::new(form_tx.clone());

    form.set_count(count.unwrap_or_default());
    if let Some(text) = caption {
        form.set_caption_choice(CaptionChoice::Yes);
        form.set_caption_text(text);
    } else if no_caption {
        form.set_caption_choice(CaptionChoice::No);
    }

    let verified = check_connectivity(cfg, &form_tx).await;
    form.set_connectivity_verified(verified);
    drain_form_events(&mut form_rx);

    if !form.begin_enabled() {
        let message = form
            .report_validation_error()
            .unwrap_or_else(|| "the form is not ready".to_string());
        drain_form_events(&mut form_rx);
        bail!(Error::InvalidForm(message));
    }

    let data = form.form_data();
    info!(count = %data.count, caption = %data.caption(), "beginning slideshow");
    telecat::app::run(cfg, &data, store).await
}

async fn check_connectivity(cfg: &Configuration, form_tx: &UnboundedSender<FormEvent>) -> bool {
    println!("checking connectivity...");
    let probe = ConnectivityProbe::system();
    connectivity::verify(&probe, cfg.connectivity_check_delay, form_tx).await
}

fn drain_form_events(rx: &mut UnboundedReceiver<FormEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            FormEvent::Notice(message) => println!("{message}"),
            FormEvent::ConnectivityStatus(online) => info!(online, "connectivity status"),
            FormEvent::BeginEnabled(enabled) => debug!(enabled, "begin action"),
            FormEvent::CaptionFieldEnabled(enabled) => debug!(enabled, "caption field"),
        }
    }
}

fn print_history(store: &HistoryStore) {
    let entries = store.get_all();
    if entries.is_empty() {
        println!("no recorded interactions");
        return;
    }
    for entry in &entries {
        println!(
            "#{:<4} {:<24} {:<10} {}",
            entry.interaction_number,
            entry.display_text(),
            entry.quantity_text(),
            entry.created_at().format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!(
        "{} interactions, {} images viewed",
        store.total_interactions(),
        store.total_images_viewed()
    );
}
