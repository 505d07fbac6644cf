use anyhow::Result;
use aurum::core::log::init_logging;
use aurum::core::query::{ListingQuery, RawListingQuery};
use clap::{Args, CommandFactory, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ListingArgs {
    /// Lowest price to include (0-10000)
    #[arg(long)]
    min_price: Option<String>,

    /// Highest price to include (0-10000)
    #[arg(long)]
    max_price: Option<String>,

    /// Lowest star rating to include (0-5)
    #[arg(long)]
    min_rating: Option<String>,

    /// Highest star rating to include (0-5)
    #[arg(long)]
    max_rating: Option<String>,

    /// Sort field: default, price, rating or name
    #[arg(long)]
    sort_by: Option<String>,

    /// Sort direction: asc or desc
    #[arg(long)]
    sort_order: Option<String>,
}

impl From<ListingArgs> for RawListingQuery {
    fn from(args: ListingArgs) -> Self {
        RawListingQuery {
            min_price: args.min_price,
            max_price: args.max_price,
            min_rating: args.min_rating,
            max_rating: args.max_rating,
            sort_by: args.sort_by,
            sort_order: args.sort_order,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the HTTP API
    Serve,
    /// Print the priced product listing
    Products(ListingArgs),
    /// Print the current gold price per gram
    Price,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Some(Commands::Serve) => LevelFilter::INFO,
        _ => LevelFilter::OFF,
    };
    init_logging(cli.verbose, default_level);

    let result = match cli.command {
        Some(Commands::Setup) => aurum::cli::setup::setup(),
        Some(Commands::Serve) => {
            aurum::run_command(aurum::AppCommand::Serve, cli.config_path.as_deref()).await
        }
        Some(Commands::Products(args)) => {
            match ListingQuery::from_raw(&RawListingQuery::from(args)) {
                Ok(query) => {
                    aurum::run_command(
                        aurum::AppCommand::Products(query),
                        cli.config_path.as_deref(),
                    )
                    .await
                }
                Err(e) => Err(validation_report(e)),
            }
        }
        Some(Commands::Price) => {
            aurum::run_command(aurum::AppCommand::Price, cli.config_path.as_deref()).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn validation_report(error: aurum::core::AppError) -> anyhow::Error {
    match error {
        aurum::core::AppError::Validation { details } => {
            anyhow::anyhow!("Invalid options:\n  {}", details.join("\n  "))
        }
        other => other.into(),
    }
}
