use std::io;

use clap::{Args, ValueEnum};
use investomart::{catalog::ItemId, search::SearchTerm};
use investomart_app::context::AppContext;

use super::{output, output_error};

#[derive(Debug, Args)]
pub(crate) struct SearchArgs {
    /// Text to look for in titles, breeds and descriptions
    query: String,
}

#[derive(Debug, Args)]
pub(crate) struct ExploreArgs {
    /// Category such as goat, buffalo, chicken or feed; `all` lists everything
    #[arg(long)]
    category: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum ListingKind {
    Product,
    Livestock,
}

#[derive(Debug, Args)]
pub(crate) struct ShowArgs {
    /// Listing type
    #[arg(value_enum)]
    kind: ListingKind,

    /// Listing id
    id: String,
}

pub(crate) async fn search(app: &AppContext, args: SearchArgs) -> Result<(), String> {
    let term = SearchTerm::parse(&args.query).map_err(|error| error.to_string())?;
    let results = app.catalog.search(term.as_str()).await;

    output::write_listings(&mut io::stdout().lock(), &results).map_err(output_error)
}

pub(crate) async fn explore(app: &AppContext, args: ExploreArgs) -> Result<(), String> {
    let results = app
        .catalog
        .explore(args.category)
        .await
        .map_err(|error| format!("failed to load listings: {error}"))?;

    output::write_listings(&mut io::stdout().lock(), &results).map_err(output_error)
}

pub(crate) async fn show(app: &AppContext, args: ShowArgs) -> Result<(), String> {
    let id = ItemId::new(args.id);

    let item = match args.kind {
        ListingKind::Product => app.catalog.product(&id).await,
        ListingKind::Livestock => app.catalog.livestock(&id).await,
    }
    .map_err(|error| format!("failed to load {id}: {error}"))?;

    output::write_listing_detail(&mut io::stdout().lock(), &item).map_err(output_error)
}
