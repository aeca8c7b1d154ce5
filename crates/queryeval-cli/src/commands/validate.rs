//! The `queryeval validate` command.

use std::path::PathBuf;

use anyhow::Result;

use queryeval_core::parser;

pub fn execute(catalog_path: PathBuf) -> Result<()> {
    let catalogs = parser::load_catalogs(&catalog_path)?;

    let mut total_warnings = 0;

    for catalog in &catalogs {
        println!("Catalog: {} ({} tasks)", catalog.name, catalog.len());

        let warnings = parser::validate_catalog(catalog);
        for w in &warnings {
            let prefix = w
                .task_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All catalogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
