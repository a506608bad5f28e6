//! Table output using comfy-table.
//!
//! One row per size: plan shape, median time of every method, speedup of the
//! bitonic sort over `sort_unstable`, and its CV%.

use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::harness::{format_size, DataPoint, SortRun};

fn speedup_cell(speedup: f64) -> Cell {
    let text = format!("{:.2}x", speedup);
    let color = if speedup >= 2.0 {
        Color::Green
    } else if speedup >= 1.0 {
        Color::Yellow
    } else {
        Color::Red
    };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Right)
}

fn time_cell(run: &SortRun) -> Cell {
    let cell = Cell::new(format!("{:.3}", run.stats.median)).set_alignment(CellAlignment::Right);
    if run.sorted {
        cell
    } else {
        cell.fg(Color::Red).add_attribute(Attribute::CrossedOut)
    }
}

/// Build the results table. Unsorted outputs are struck through in red.
pub fn build_table(data: &[DataPoint]) -> Option<Table> {
    let first = data.first()?;

    let bold = |s: &str| Cell::new(s).add_attribute(Attribute::Bold);
    let mut header = vec![bold("Size"), bold("Groups x Width"), bold("Dispatches")];
    header.push(bold(&format!("{} (ms)", first.bitonic.method)));
    header.extend(first.baselines.iter().map(|b| bold(&format!("{} (ms)", b.method))));
    header.push(bold("Speedup"));
    header.push(bold("CV%"));

    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for dp in data {
        let mut row = vec![
            Cell::new(format_size(dp.size)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} x {}", dp.plan.group_count, dp.plan.group_width))
                .set_alignment(CellAlignment::Right),
            Cell::new(dp.plan.dispatches).set_alignment(CellAlignment::Right),
            time_cell(&dp.bitonic),
        ];
        row.extend(dp.baselines.iter().map(time_cell));
        row.push(speedup_cell(dp.speedup));
        row.push(
            Cell::new(format!("{:.1}", dp.bitonic.stats.cv_percent))
                .set_alignment(CellAlignment::Right),
        );
        table.add_row(row);
    }
    Some(table)
}

/// Print the results table, or a note when there is nothing to show.
pub fn render_table(data: &[DataPoint]) {
    match build_table(data) {
        Some(table) => println!("\n{table}"),
        None => println!("No results to display."),
    }
}
