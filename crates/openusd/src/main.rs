use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use openusd::{ProcessError, Tool, UpdateRequest};

#[derive(Parser, Debug)]
#[command(
    name = "openusd",
    version,
    about = "A tool for updating the version of USD in the current package."
)]
struct Cli {
    /// Print verbose error messages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check out another OpenUSD version
    Update {
        /// The version of OpenUSD to migrate to
        usd_version: Option<String>,

        /// The directory containing the package to update
        #[arg(short = 'd', long = "directory")]
        directory: Option<PathBuf>,
    },
}

fn report(error: &ProcessError, verbose: bool) {
    let tool = Tool::Git.name();
    match error.termination() {
        Some((reason, status)) => eprintln!("{} failed: {}:{}", tool, reason, status),
        None => {
            eprintln!("error: {}", error);
            if verbose {
                if let Some(source) = std::error::Error::source(error) {
                    eprintln!("caused by: {}", source);
                }
            } else {
                eprintln!("Use -v to get more error details");
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match cli.command {
        Commands::Update {
            usd_version,
            directory,
        } => {
            let request = UpdateRequest {
                usd_version,
                directory,
            };
            log::debug!("Update request: {:?}", request);

            match request.run() {
                Ok(()) => {
                    println!("{} success: completed.", Tool::Git.name());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    report(&e, cli.verbose);
                    ExitCode::from(e.exit_code())
                }
            }
        }
    }
}
