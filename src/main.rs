use clap::Parser;
use std::error::Error;
use tracing::error;

fn main() {
    let cli = novelscraper::cli::Cli::parse();
    novelscraper::logging::init(cli.verbose, cli.quiet);
    if let Err(e) = novelscraper::cli::run(&cli) {
        error!("{e}");
        if cli.verbose > 0 {
            let mut source = e.source();
            while let Some(s) = source {
                eprintln!("  cause: {}", s);
                source = s.source();
            }
        }
        std::process::exit(e.exit_code());
    }
}
