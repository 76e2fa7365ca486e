use clap::{Parser, Subcommand};
use investomart_app::{config::AppConfig, context::AppContext};

mod account;
mod catalog;
mod chat;
mod checkout;
mod output;

#[derive(Debug, Parser)]
#[command(name = "investomart", about = "InvestoMart marketplace CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search products and livestock
    Search(catalog::SearchArgs),

    /// Browse listings, optionally by category
    Explore(catalog::ExploreArgs),

    /// Show one listing
    Show(catalog::ShowArgs),

    /// Sign in and remember the session
    Login(account::LoginArgs),

    /// Create an account and sign in
    Register(account::RegisterArgs),

    /// End the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Buy listings
    Checkout(checkout::CheckoutArgs),

    /// Talk to the farming assistant
    Chat(chat::ChatArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let app = AppContext::from_config(&self.config)
            .map_err(|error| format!("failed to initialise: {error}"))?;

        match self.command {
            Commands::Search(args) => catalog::search(&app, args).await,
            Commands::Explore(args) => catalog::explore(&app, args).await,
            Commands::Show(args) => catalog::show(&app, args).await,
            Commands::Login(args) => account::login(&app, args).await,
            Commands::Register(args) => account::register(&app, args).await,
            Commands::Logout => account::logout(&app).await,
            Commands::Whoami => account::whoami(&app).await,
            Commands::Checkout(args) => checkout::run(&app, args).await,
            Commands::Chat(args) => chat::run(&app, args).await,
        }
    }
}

fn output_error(error: std::io::Error) -> String {
    format!("failed to write output: {error}")
}
