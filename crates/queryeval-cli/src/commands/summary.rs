//! The `queryeval summary` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use queryeval_core::criteria::Criterion;
use queryeval_core::report::SessionReport;

pub fn execute(report_path: PathBuf) -> Result<()> {
    let report = SessionReport::load_json(&report_path)?;

    println!(
        "Catalog: {} ({} tasks)",
        report.catalog.name, report.catalog.task_count
    );
    if let Some(name) = &report.annotator {
        println!("Annotator: {name}");
    }
    println!(
        "Session started {}",
        report.session_started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let mut table = Table::new();
    let mut header = vec!["Task".to_string(), "Status".to_string(), "Time".to_string()];
    header.extend(Criterion::ALL.iter().map(|c| c.ordinal().to_string()));
    table.set_header(header);

    for record in &report.records {
        let mut row = vec![
            Cell::new(&record.id),
            Cell::new(&record.status),
            Cell::new(format!("{}s", record.time_spent_secs)),
        ];
        row.extend(Criterion::ALL.iter().map(|c| {
            let answer = record.response.as_ref().and_then(|r| r.get(*c));
            Cell::new(match answer {
                Some(true) => "Y",
                Some(false) => "N",
                None => "",
            })
        }));
        table.add_row(row);
    }

    println!("\n{table}");
    super::annotate::print_stats(&report.stats, report.session_elapsed_secs);

    Ok(())
}
