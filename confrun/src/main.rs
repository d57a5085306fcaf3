use std::process::ExitCode;

use clap::Parser;
use log::error;

use confrun::cli::Cli;
use confrun::{IcmpProber, IosConnector, Orchestrator, PortDiscoverer};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let verbose = cli.verbose;
    let config = cli.into_run_config();
    let session = config.session.clone();
    let orchestrator = Orchestrator::new(
        config.clone(),
        IcmpProber::new(config.probe_timeout),
        PortDiscoverer::new(session.ssh_port, session.telnet_port, session.connect_timeout),
        IosConnector::new(session),
    );

    match orchestrator.run_from_files().await {
        Ok(report) => {
            print!("\n{}", report.summary(verbose));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
