use std::io::{self, Write};
use std::time::Duration;

use comfy_table::presets::{NOTHING, UTF8_FULL_CONDENSED};
use comfy_table::{ColumnConstraint, Table, Width};
use crossterm::cursor::MoveTo;
use crossterm::terminal::{Clear, ClearType};

use crate::registry::TrackedEntry;

const TITLE: &str = "⥮ Louis Vuitton Product Monitor";
const PRODUCT_ID_WIDTH: u16 = 20;

/// Static facts shown above the stock table.
#[derive(Debug, Clone)]
pub struct StatusHeader {
    pub region: String,
    pub product_file: String,
    pub check_interval: Duration,
}

/// Renders the status view shown after every cycle: title, header facts, the
/// stock table and the last cycle message.
pub fn render_status(
    header: &StatusHeader,
    entries: &[(String, TrackedEntry)],
    message: Option<&str>,
) -> String {
    let mut facts = Table::new();
    facts.load_preset(NOTHING);
    facts.add_row(vec!["Region".to_string(), header.region.clone()]);
    facts.add_row(vec!["Product file".to_string(), header.product_file.clone()]);
    facts.add_row(vec!["Products found".to_string(), entries.len().to_string()]);
    facts.add_row(vec![
        "Check interval".to_string(),
        format!("{}s", header.check_interval.as_secs()),
    ]);

    let mut out = format!("{TITLE}\n\n{facts}\n\n{}\n", stock_table(entries));
    if let Some(message) = message.filter(|m| !m.is_empty()) {
        out.push('\n');
        out.push_str(message);
        out.push('\n');
    }
    out
}

fn stock_table(entries: &[(String, TrackedEntry)]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["PRODUCT", "SKU", "IN STOCK?"]);
    if let Some(column) = table.column_mut(0) {
        column.set_constraint(ColumnConstraint::LowerBoundary(Width::Fixed(PRODUCT_ID_WIDTH)));
    }

    for (product_id, entry) in entries {
        let product = if entry.listing.is_valid() {
            product_id.clone()
        } else {
            "Invalid product URL!".to_string()
        };
        let in_stock = if entry.in_stock { "Yes" } else { "No" };
        table.add_row(vec![product, entry.listing.variant_id(), in_stock.to_string()]);
    }
    table
}

/// Replaces whatever `out` shows with `frame`, redrawing the view in place
/// instead of scrolling a new copy onto the terminal.
pub fn redraw<W: Write>(out: &mut W, frame: &str) -> io::Result<()> {
    crossterm::queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    out.write_all(frame.as_bytes())?;
    out.flush()
}
