use graphmem::graph::{GraphStore, MatchField};
use graphmem::Config;

/// Parse CLI args: the first positional argument is the query.
fn parse_search_args() -> anyhow::Result<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let query = args
        .into_iter()
        .find(|arg| !arg.starts_with("--"))
        .ok_or_else(|| {
            anyhow::anyhow!("Usage: search <query>\nExample: search \"coffee\"")
        })?;
    if query.trim().is_empty() {
        anyhow::bail!("Query cannot be empty");
    }
    Ok(query)
}

fn match_label(matched: MatchField) -> &'static str {
    match matched {
        MatchField::Name => "name",
        MatchField::Type => "type",
        MatchField::Observation => "observation",
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    // Load configuration
    let config = Config::load()?;
    let store = GraphStore::new(config.memory_file());

    let query = parse_search_args()?;

    let hits = store.search_nodes(&query)?;

    // Display results
    println!("\n╔══════════════════════════════════════════════════════════════════════════════╗");
    println!("║ GraphMem Search Results                                                      ║");
    println!("╚══════════════════════════════════════════════════════════════════════════════╝");
    println!("\nQuery: \"{}\"\n", query);

    if hits.is_empty() {
        println!("No matching entities found.");
    } else {
        for hit in &hits {
            println!("─────────────────────────────────────────────────────────────────────────────");
            println!(
                "{} [{}] (matched: {})",
                hit.entity.name,
                hit.entity.entity_type,
                match_label(hit.matched)
            );

            for obs in &hit.entity.observations {
                println!("  - {}", obs);
            }
        }
        println!("─────────────────────────────────────────────────────────────────────────────");
    }

    println!("\n{} result(s)\n", hits.len());

    Ok(())
}
