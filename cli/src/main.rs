//! `barber`: book and manage barbershop appointments from the terminal.

mod app;
mod args;
mod output;

use std::process::ExitCode;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = match App::new(cli.config, cli.json) {
        Ok(app) => app,
        Err(err) => return fail(&err),
    };

    // Dropping the command future on Ctrl-C drops its screen, which cancels
    // whatever the screen still has in flight.
    let result = tokio::select! {
        result = app.run(cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            app.out.flush_notices();
            eprintln!("{}", "Interrupted".yellow());
            return ExitCode::from(130);
        }
    };

    let already_reported = app.out.flush_notices();
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) if already_reported => ExitCode::FAILURE,
        Err(err) => fail(&err),
    }
}

fn fail(err: &anyhow::Error) -> ExitCode {
    tracing::debug!("{err:?}");
    eprintln!("{} {err:#}", "error:".red().bold());
    ExitCode::FAILURE
}
