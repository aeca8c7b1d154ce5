//! The `queryeval init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create queryeval.toml
    if std::path::Path::new("queryeval.toml").exists() {
        println!("queryeval.toml already exists, skipping.");
    } else {
        std::fs::write("queryeval.toml", SAMPLE_CONFIG)?;
        println!("Created queryeval.toml");
    }

    // Create example catalog
    std::fs::create_dir_all("catalogs")?;
    let example_path = std::path::Path::new("catalogs/example.toml");
    if example_path.exists() {
        println!("catalogs/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_CATALOG)?;
        println!("Created catalogs/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set your annotator name in queryeval.toml");
    println!("  2. Run: queryeval validate --catalog catalogs/example.toml");
    println!("  3. Run: queryeval annotate --catalog catalogs/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# queryeval configuration

annotator = "${USER}"
auto_advance_delay_ms = 500
tick_interval_ms = 1000
output_dir = "./queryeval-sessions"

[sink]
type = "simulated"
latency_ms = 1000
# fail_every = 5
# fail_first = 0
"#;

const EXAMPLE_CATALOG: &str = r#"[catalog]
id = "example"
name = "Example Catalog"
description = "A small catalog to get started"

[[tasks]]
id = "example_001"
query = "When is the Grammy Awards?"
context = "[February 01, 2025 11:25am Central Time Zone]"
reference_date = "2025-02-01"
interaction_history = [
    "Human: What's the date today?",
    "Agent: It's February 1st, 2025.",
]

[[tasks]]
id = "example_002"
query = "What is the meaning of life?"
context = "[No specific temporal context]"
interaction_history = [
    "Human: I've been thinking about philosophy lately",
    "Agent: That's fascinating! What philosophical topics interest you?",
    "Human: What is the meaning of life?",
]

[[tasks]]
id = "example_003"
query = "djshfkjsdf sdkjfhskdf"
context = "[No context available]"
interaction_history = ["Human: djshfkjsdf sdkjfhskdf"]
"#;
