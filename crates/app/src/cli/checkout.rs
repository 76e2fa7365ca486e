use std::{
    io::{self, Write},
    str::FromStr,
};

use clap::{Args, ValueEnum};
use investomart::{
    cart::Cart,
    catalog::{ItemId, ItemKind},
    checkout::{OrderSummary, PaymentMethod},
    session::Access,
};
use investomart_app::context::AppContext;
use tracing::debug;

use super::{output, output_error};

/// Protected path the checkout command is gated on.
const CHECKOUT_PATH: &str = "/checkout";

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum MethodArg {
    Esewa,
    Ips,
    Card,
}

impl From<MethodArg> for PaymentMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Esewa => Self::Esewa,
            MethodArg::Ips => Self::Ips,
            MethodArg::Card => Self::Card,
        }
    }
}

/// A listing to put in the cart, written `product:ID[:QTY]` or `livestock:ID`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ItemSpec {
    kind: ItemKind,
    id: ItemId,
    quantity: u32,
}

impl FromStr for ItemSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.splitn(3, ':');

        let kind = match parts.next() {
            Some("product") => ItemKind::Product,
            Some("livestock") => ItemKind::Livestock,
            _ => return Err(format!("`{value}` must start with product: or livestock:")),
        };

        let id = parts
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| format!("`{value}` is missing a listing id"))?;

        let quantity = parts
            .next()
            .map_or(Ok(1), str::parse::<u32>)
            .map_err(|error| format!("`{value}` has an invalid quantity: {error}"))?;

        if quantity == 0 {
            return Err(format!("`{value}` must buy at least one unit"));
        }

        Ok(Self {
            kind,
            id: ItemId::from(id),
            quantity,
        })
    }
}

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Listing to buy, as `product:ID[:QTY]` or `livestock:ID`; repeatable
    #[arg(long = "item", required = true)]
    items: Vec<ItemSpec>,

    /// Payment method
    #[arg(long, value_enum, default_value_t = MethodArg::Esewa)]
    method: MethodArg,

    /// Print the order summary without paying
    #[arg(long)]
    dry_run: bool,
}

pub(crate) async fn run(app: &AppContext, args: CheckoutArgs) -> Result<(), String> {
    let mut manager = app.session_manager();

    manager.initialize().await;

    if !args.dry_run && !matches!(manager.guard(CHECKOUT_PATH), Access::Granted(_)) {
        return Err("sign in first with `investomart login`".to_string());
    }

    let mut cart = Cart::new();

    for spec in &args.items {
        let item = match spec.kind {
            ItemKind::Product => app.catalog.product(&spec.id).await,
            ItemKind::Livestock => app.catalog.livestock(&spec.id).await,
        }
        .map_err(|error| format!("failed to load {}: {error}", spec.id))?;

        cart.add_item(&item);

        let extra = i32::try_from(spec.quantity.saturating_sub(1)).unwrap_or(i32::MAX);

        cart.update_quantity(&spec.id, extra);

        if let Some(line) = cart.line(&spec.id)
            && line.quantity() < spec.quantity
        {
            debug!(
                id = %spec.id,
                requested = spec.quantity,
                available = line.available_quantity(),
                "quantity clamped to availability"
            );
        }
    }

    let summary = OrderSummary::from_cart(&cart);

    output::write_order(&mut io::stdout().lock(), &cart, &summary).map_err(output_error)?;

    if args.dry_run {
        return Ok(());
    }

    let receipt = app
        .checkout()
        .checkout(&mut cart, args.method.into(), manager.session())
        .await
        .map_err(|error| error.user_message())?;

    writeln!(
        io::stdout(),
        "\nPayment successful. Transaction ID: {}",
        receipt.transaction_id.as_deref().unwrap_or("unknown")
    )
    .map_err(output_error)
}
