//! Console presentation of engine snapshots.

use chrono::NaiveDate;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::engine::SnapshotSink;
use crate::filter::FilterSpec;
use crate::records::{PurchaseOrder, SalesOrder};
use crate::snapshot::Snapshot;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Positive,
    Negative,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Positive => style(text).green().bold(),
        StyleType::Negative => style(text).red().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<NaiveDate>` into a `Cell`. `None` is displayed as "N/A".
fn date_cell(date: Option<NaiveDate>) -> Cell {
    date.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |d| Cell::new(d.to_string()).set_alignment(CellAlignment::Right),
    )
}

fn quantity_cell(quantity: f64) -> Cell {
    Cell::new(format!("{quantity:.2}")).set_alignment(CellAlignment::Right)
}

/// Creates a spinner for startup work with standard styling.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub fn sales_table(orders: &[SalesOrder]) -> Table {
    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Subject"),
        header_cell("Product"),
        header_cell("Qty Sold"),
        header_cell("Date"),
        header_cell("Status"),
    ]);
    for order in orders {
        table.add_row(vec![
            Cell::new(&order.subject),
            Cell::new(&order.product),
            quantity_cell(order.quantity_sold),
            date_cell(order.date),
            Cell::new(&order.status),
        ]);
    }
    table
}

pub fn purchases_table(orders: &[PurchaseOrder]) -> Table {
    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Reference"),
        header_cell("Product"),
        header_cell("Qty Paid"),
        header_cell("Date"),
    ]);
    for order in orders {
        table.add_row(vec![
            Cell::new(&order.reference),
            Cell::new(&order.product),
            quantity_cell(order.quantity_paid),
            date_cell(order.date),
        ]);
    }
    table
}

/// Style shared by the quote cards: green on a non-negative variation, red on
/// a negative one, dim when the variation is unknown.
fn quote_style(variation_pct: Option<f64>) -> StyleType {
    match variation_pct {
        Some(v) if v < 0.0 => StyleType::Negative,
        Some(_) => StyleType::Positive,
        None => StyleType::Subtle,
    }
}

/// Renders one snapshot as the full dashboard frame.
pub fn render_snapshot(
    snapshot: &Snapshot,
    spec: &FilterSpec,
    pair: &str,
    refresh_interval: Duration,
) -> String {
    let bid_text = snapshot
        .bid
        .map_or("no data".to_string(), |bid| format!("R$ {bid:.4}"));
    let variation_text = snapshot
        .variation_pct
        .map_or("N/A".to_string(), |v| format!("{v:+.2}%"));

    let mut output = format!(
        "{} (live): {}\n",
        style_text(pair, StyleType::Title),
        style_text(&bid_text, quote_style(snapshot.variation_pct))
    );
    output.push_str(&format!(
        "Variation vs last close: {}\n",
        style_text(&variation_text, quote_style(snapshot.variation_pct))
    ));

    if !snapshot.valid {
        output.push_str(&style_text(
            "Snapshot invalid: history unavailable this cycle\n",
            StyleType::Error,
        ));
    } else {
        output.push_str(&format!(
            "\nSales Orders\n{}\n\nPurchase Orders\n{}\n",
            sales_table(&snapshot.sales),
            purchases_table(&snapshot.purchases)
        ));
    }

    output.push_str(&style_text(
        &format!(
            "\nFilters: date {} · {} payment terms · {} child flags · {} statuses · {} warehouses",
            spec.date,
            spec.payment_terms.len(),
            spec.child_flags.len(),
            spec.statuses.len(),
            spec.warehouses.len()
        ),
        StyleType::Subtle,
    ));
    output.push_str(&style_text(
        &format!(
            "\nUpdated at {} — next refresh in {}s",
            snapshot.generated_at.format("%H:%M:%S"),
            refresh_interval.as_secs()
        ),
        StyleType::Subtle,
    ));
    output
}

/// The presentation collaborator used by the CLI: prints each frame and any
/// status messages to the terminal.
pub struct ConsoleSink {
    pair: String,
    refresh_interval: Duration,
}

impl ConsoleSink {
    pub fn new(pair: &str, refresh_interval: Duration) -> Self {
        ConsoleSink {
            pair: pair.to_string(),
            refresh_interval,
        }
    }
}

impl SnapshotSink for ConsoleSink {
    fn present(&self, snapshot: &Snapshot, spec: &FilterSpec) {
        println!(
            "\n{}",
            render_snapshot(snapshot, spec, &self.pair, self.refresh_interval)
        );
    }

    fn status(&self, message: &str) {
        println!("{}", style_text(message, StyleType::Error));
    }
}
