use crate::demo::{run_demo, run_rma_export, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use stock_rma::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Stock Return RMA",
    about = "Return deliveries and raise RMAs for the returned lines",
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
    /// Return the demo delivery and print the resulting shipment and RMAs
    Demo(DemoArgs),
    /// RMA reporting helpers
    Rma {
        #[command(subcommand)]
        command: RmaCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RmaCommand {
    /// Run the demo return and print the raised RMAs as CSV
    Export,
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
        Command::Demo(args) => run_demo(args),
        Command::Rma {
            command: RmaCommand::Export,
        } => run_rma_export(),
    }
}
