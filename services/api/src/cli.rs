use crate::demo::{run_demo, run_qualify, DemoArgs, QualifyArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use lead_qualifier::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Lead Qualifier",
    about = "Score, deduplicate and report on prospect exports, or serve the qualification API",
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
    /// Qualify a CSV or JSON collector export as one campaign
    Qualify(QualifyArgs),
    /// Run a campaign over a built-in sample batch
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Never probe websites or call the company registry
    #[arg(long)]
    pub(crate) offline: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Qualify(args) => run_qualify(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
