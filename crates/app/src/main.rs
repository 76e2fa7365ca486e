//! InvestoMart Marketplace CLI

use std::process;

use clap::Parser;
use investomart_app::observability;

use crate::cli::Cli;

mod cli;

#[tokio::main]
pub async fn main() {
    // Load .env file if present (ignore if missing)
    _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = match observability::init(&cli.config.logging) {
        Ok(()) => cli.run().await,
        Err(error) => Err(error.to_string()),
    };

    if let Err(error) = result {
        #[expect(
            clippy::print_stderr,
            reason = "errors are reported to the user on stderr"
        )]
        {
            eprintln!("{error}");
        }

        process::exit(1);
    }
}
