use crate::demo::{run_demo, DemoArgs};
use crate::feasibility::{run_compute, run_max_bid, ComputeArgs, MaxBidArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use deal_flow::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "deal-flow-api",
    about = "Evaluate auction properties and run the deal-flow service",
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
    /// Evaluate a property analysis form from a JSON file
    Feasibility {
        #[command(subcommand)]
        command: FeasibilityCommand,
    },
    /// Walk an in-memory analysis from claim to sale
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum FeasibilityCommand {
    /// Print the metrics report for the form's initial and max bids
    Compute(ComputeArgs),
    /// Search for the highest bid that clears a target ROI
    MaxBid(MaxBidArgs),
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
        Command::Feasibility {
            command: FeasibilityCommand::Compute(args),
        } => run_compute(args),
        Command::Feasibility {
            command: FeasibilityCommand::MaxBid(args),
        } => run_max_bid(args),
        Command::Demo(args) => run_demo(args),
    }
}
