//! The `queryeval criteria` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use queryeval_core::criteria::Criterion;

pub fn execute() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["#", "Key", "Question", "Yes", "No"]);

    for c in Criterion::ALL {
        table.add_row(vec![
            Cell::new(c.ordinal()),
            Cell::new(c.key()),
            Cell::new(format!("{}\n{}", c.question(), c.description())),
            Cell::new(c.positive_label()),
            Cell::new(c.negative_label()),
        ]);
    }

    println!("{table}");
    println!("\nAll {} criteria must be answered before submitting.", Criterion::COUNT);

    Ok(())
}
