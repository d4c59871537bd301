use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;

use crate::data::data_view::SortDirection;
use crate::engine::GridEngine;

/// The engine's current window as a comfy-table, columns in display order
pub fn window_table(engine: &GridEngine) -> Table {
    let columns = engine.column_order();
    let sort = engine.sort();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers: Vec<Cell> = columns
        .iter()
        .map(|field| {
            let title = match (sort.key, sort.direction) {
                (Some(key), SortDirection::Ascending) if key == *field => {
                    format!("{} ^", field.title())
                }
                (Some(key), SortDirection::Descending) if key == *field => {
                    format!("{} v", field.title())
                }
                _ => field.title().to_string(),
            };
            Cell::new(title).add_attribute(Attribute::Bold)
        })
        .collect();
    table.set_header(headers);

    for record in engine.visible_window().rows {
        let row: Vec<String> = columns
            .iter()
            .map(|field| record.display_value(*field))
            .collect();
        table.add_row(row);
    }

    table
}

/// Print the window followed by the row count line
pub fn print_window(engine: &GridEngine) {
    let counts = engine.counts();
    if counts.visible == 0 {
        println!("{}", "No rows match.".yellow());
        return;
    }

    let range = engine.visible_range();
    println!("{}", window_table(engine));
    println!(
        "\n{}",
        format!(
            "Showing {} of {} rows (rows {}-{})",
            counts.visible,
            counts.total,
            range.start + 1,
            range.end
        )
        .green()
    );
}
