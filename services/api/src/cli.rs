use crate::demo::{run_backfill, run_demo, BackfillArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use onboard_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Compliance Onboarding Service",
    about = "Run and demonstrate the compliance onboarding case pipeline from the command line",
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
    /// Restore cases from a legacy intake CSV export and print a summary
    Backfill(BackfillArgs),
    /// Walk one case end to end: screening, officer decisions, portal view
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
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Backfill(args) => run_backfill(args),
        Command::Demo(args) => run_demo(args),
    }
}
