use crate::demo::{
    run_demo, run_marketplace_sync, run_property_import, DemoArgs, MarketplaceSyncArgs,
    PropertyImportArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use maison::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Maison",
    about = "Run and demonstrate the Maison membership platform from the command line",
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
    /// Scrape the luxury marketplace into the catalog
    Marketplace {
        #[command(subcommand)]
        command: MarketplaceCommand,
    },
    /// Work with the local property inventory
    Properties {
        #[command(subcommand)]
        command: PropertiesCommand,
    },
    /// Walk through membership, concierge, events and listings with mock integrations
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum MarketplaceCommand {
    /// Run a sync (or a preview with --preview) and print the summary
    Sync(MarketplaceSyncArgs),
}

#[derive(Subcommand, Debug)]
enum PropertiesCommand {
    /// Import a listing CSV export and print the aggregated view
    Import(PropertyImportArgs),
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

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Marketplace {
            command: MarketplaceCommand::Sync(args),
        } => run_marketplace_sync(args).await,
        Command::Properties {
            command: PropertiesCommand::Import(args),
        } => run_property_import(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
