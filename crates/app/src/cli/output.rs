//! Terminal rendering for command results.

use std::io;

use investomart::{
    cart::Cart,
    catalog::CatalogItem,
    chat::ChatSessionSummary,
    checkout::OrderSummary,
    session::UserProfile,
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};

/// Format an amount in Nepalese rupees.
pub(crate) fn money(amount: Decimal) -> String {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .map_or_else(
            || format!("NPR {amount}"),
            |minor| format!("{}", Money::from_minor(minor, iso::NPR)),
        )
}

pub(crate) fn write_listings(out: &mut impl io::Write, items: &[CatalogItem]) -> io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "No results found.");
    }

    let mut builder = Builder::default();

    builder.push_record(["Type", "ID", "Title", "Category", "Price", "Available"]);

    for item in items {
        builder.push_record([
            item.kind().to_string(),
            item.id().to_string(),
            item.title().to_string(),
            item.category().to_string(),
            money(item.price()),
            item.available_quantity().to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(4..6), Alignment::right());

    writeln!(out, "{table}")
}

pub(crate) fn write_listing_detail(out: &mut impl io::Write, item: &CatalogItem) -> io::Result<()> {
    let mut rows: Vec<(&str, String)> = vec![
        ("ID", item.id().to_string()),
        ("Type", item.kind().to_string()),
        ("Title", item.title().to_string()),
        ("Category", item.category().to_string()),
        ("Price", money(item.price())),
        ("Available", item.available_quantity().to_string()),
    ];

    match item {
        CatalogItem::Product(product) => {
            push_optional(&mut rows, "Status", product.status.as_deref());
            push_optional(&mut rows, "Location", product.location.as_deref());
            push_optional(&mut rows, "Risk", product.risk_level.as_deref());
            push_optional(
                &mut rows,
                "ROI estimate",
                product.roi_estimate.map(|roi| format!("{roi}%")).as_deref(),
            );

            if let Some(animal) = &product.animal_details {
                push_optional(&mut rows, "Breed", animal.breed.as_deref());
                push_optional(&mut rows, "Health", animal.health_status.as_deref());
            }
        }
        CatalogItem::Livestock(animal) => {
            push_optional(&mut rows, "Breed", animal.breed.as_deref());
            push_optional(
                &mut rows,
                "Age",
                animal.age_months.map(|age| format!("{age} months")).as_deref(),
            );
            push_optional(
                &mut rows,
                "Weight",
                animal.weight.map(|weight| format!("{weight} kg")).as_deref(),
            );
            push_optional(&mut rows, "Health", animal.health_status.as_deref());
            push_optional(&mut rows, "Gender", animal.gender.as_deref());
            push_optional(&mut rows, "Tag", animal.tag_number.as_deref());
        }
    }

    let mut builder = Builder::default();

    for (label, value) in rows {
        builder.push_record([label.to_string(), value]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());

    writeln!(out, "{table}")?;

    if !item.description().is_empty() {
        writeln!(out, "\n{}", item.description())?;
    }

    Ok(())
}

fn push_optional<'a>(rows: &mut Vec<(&'a str, String)>, label: &'a str, value: Option<&str>) {
    if let Some(value) = value.filter(|value| !value.is_empty()) {
        rows.push((label, value.to_string()));
    }
}

pub(crate) fn write_order(
    out: &mut impl io::Write,
    cart: &Cart,
    summary: &OrderSummary,
) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Type", "Qty", "Unit price", "Line total"]);

    for line in cart.lines() {
        builder.push_record([
            line.title().to_string(),
            line.kind().to_string(),
            line.quantity().to_string(),
            money(line.price()),
            money(line.line_total()),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Alignment::center());
    table.modify(Columns::new(2..5), Alignment::right());

    writeln!(out, "{table}")?;
    writeln!(out, " Subtotal:      {}", money(summary.subtotal))?;
    writeln!(out, " Platform fee:  {}", money(summary.platform_fee))?;
    writeln!(out, " Total:         {}", money(summary.total))
}

pub(crate) fn write_profile(out: &mut impl io::Write, user: &UserProfile) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["Name".to_string(), user.name.clone()]);
    builder.push_record(["Username".to_string(), user.username.clone()]);
    builder.push_record(["Email".to_string(), user.email.clone()]);
    builder.push_record([
        "KYC".to_string(),
        user.kyc_status.clone().unwrap_or_else(|| "unknown".to_string()),
    ]);
    builder.push_record([
        "Email verified".to_string(),
        if user.is_email_verified { "yes" } else { "no" }.to_string(),
    ]);

    if user.is_admin() {
        builder.push_record(["Role".to_string(), "admin".to_string()]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());

    writeln!(out, "{table}")
}

pub(crate) fn write_chat_sessions(
    out: &mut impl io::Write,
    sessions: &[ChatSessionSummary],
) -> io::Result<()> {
    if sessions.is_empty() {
        return writeln!(out, "No past conversations.");
    }

    let mut builder = Builder::default();

    builder.push_record(["ID", "Title", "Messages", "Last activity"]);

    for session in sessions {
        builder.push_record([
            session.session_id.clone(),
            session.title().to_string(),
            session.total_messages.to_string(),
            session.last_activity.clone().unwrap_or_default(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(2..3), Alignment::right());

    writeln!(out, "{table}")
}
