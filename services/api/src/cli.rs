use crate::demo::{run_demo, run_roster_report, DemoArgs, RosterReportArgs};
use crate::server;
use asecapt::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "ASECAPT Certificates",
    about = "Evaluate certificate eligibility and run the ASECAPT certificate service",
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
    /// Evaluate certificate eligibility offline
    Eligibility {
        #[command(subcommand)]
        command: EligibilityCommand,
    },
    /// Walk through enrollment, issuance, revocation and verification in memory
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum EligibilityCommand {
    /// Evaluate every enrollment in a CSV roster export
    Roster(RosterReportArgs),
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
        Command::Eligibility {
            command: EligibilityCommand::Roster(args),
        } => run_roster_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
