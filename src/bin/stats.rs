use graphmem::graph::GraphStore;
use graphmem::Config;
use std::collections::BTreeMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    let store = GraphStore::new(config.memory_file());
    let graph = store.read_graph()?;

    println!("\n=== GraphMem Knowledge Graph Statistics ===\n");
    println!("Memory file: {}", store.path().display());

    if graph.entity_count() == 0 && graph.relation_count() == 0 {
        println!("\nThe graph is empty.");
        println!("\nCreate entities with the `tool` binary to get started.");
        return Ok(());
    }

    let total_observations: usize = graph.entities.iter().map(|e| e.observations.len()).sum();
    println!(
        "\n{} entities, {} relations, {} observations\n",
        graph.entity_count(),
        graph.relation_count(),
        total_observations
    );

    // BTreeMap keeps report order stable across runs
    let mut entity_types: BTreeMap<&str, usize> = BTreeMap::new();
    for entity in &graph.entities {
        *entity_types.entry(entity.entity_type.as_str()).or_default() += 1;
    }

    println!("Entities by type:\n");
    println!("{:-<60}", "");
    println!("{:<40} {:>8}", "Type", "Count");
    println!("{:-<60}", "");
    for (entity_type, count) in &entity_types {
        println!("{:<40} {:>8}", entity_type, count);
    }

    if graph.relation_count() > 0 {
        let mut relation_types: BTreeMap<&str, usize> = BTreeMap::new();
        for relation in &graph.relations {
            *relation_types
                .entry(relation.relation_type.as_str())
                .or_default() += 1;
        }

        println!("\nRelations by type:\n");
        println!("{:-<60}", "");
        println!("{:<40} {:>8}", "Type", "Count");
        println!("{:-<60}", "");
        for (relation_type, count) in &relation_types {
            println!("{:<40} {:>8}", relation_type, count);
        }
    }

    println!();
    Ok(())
}
