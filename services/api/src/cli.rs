use crate::infra::Services;
use crate::server;
use clap::{Args, Parser, Subcommand};
use secret_finder::config::AppConfig;
use secret_finder::error::AppError;
use secret_finder::telemetry;
use secret_finder::workflows::leads::SearchRequest;
use secret_finder::workflows::watch::ScanOutcome;

#[derive(Parser, Debug)]
#[command(
    name = "Secret Finder",
    about = "Find, score and watch wholesale leads from maps search and social tags",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run a one-off bulk maps search and print the leads as JSON
    Search(SearchArgs),
    /// Run one watchtower scan against the configured state file
    Scan(ScanArgs),
    /// Manage monitored tags
    Tags {
        #[command(subcommand)]
        command: TagCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TagCommand {
    /// Start watching a tag
    Add { tag: String },
    /// Stop watching a tag
    Remove { tag: String },
    /// Print the monitored tags
    List,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct SearchArgs {
    /// Comma-separated search terms
    #[arg(long, default_value = "Jewelry")]
    keyword: String,
    /// Comma-separated locations
    #[arg(long, default_value = "Local")]
    city: String,
    #[arg(long, default_value = "")]
    country: String,
    /// Override the configured page ceiling per term/location pair
    #[arg(long)]
    max_pages: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct ScanArgs {
    /// Scan even when the watchtower is stopped
    #[arg(long)]
    force: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Search(args) => run_search(args).await,
        Command::Scan(args) => run_scan(args).await,
        Command::Tags { command } => run_tags(command).await,
    }
}

fn prepare() -> Result<Services, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(Services::from_config(&config))
}

async fn run_search(args: SearchArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    if let Some(max_pages) = args.max_pages {
        config.search.max_pages = max_pages;
    }
    let services = Services::from_config(&config);

    let request = SearchRequest::from_lists(&args.keyword, &args.city, &args.country);
    let leads = services.search.search_leads(&request).await?;
    print_json(&leads)
}

async fn run_scan(args: ScanArgs) -> Result<(), AppError> {
    let services = prepare()?;
    match services.watchtower.scan(args.force).await? {
        ScanOutcome::Paused => println!("watchtower is stopped; pass --force to scan anyway"),
        ScanOutcome::Completed { new_leads } => println!("{new_leads} new lead(s)"),
    }
    Ok(())
}

async fn run_tags(command: TagCommand) -> Result<(), AppError> {
    let services = prepare()?;
    let watchtower = &services.watchtower;
    match command {
        TagCommand::Add { tag } => {
            if !watchtower.add_tag(&tag).await? {
                println!("'{tag}' is blank or already monitored");
            }
        }
        TagCommand::Remove { tag } => {
            if !watchtower.remove_tag(&tag).await? {
                println!("'{tag}' was not monitored");
            }
        }
        TagCommand::List => {}
    }
    for tag in watchtower.load_state().await?.monitored_tags {
        println!("#{tag}");
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}
