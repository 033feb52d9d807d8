use anyhow::Result;
use graphmem::graph::{GraphStore, KnowledgeGraph};
use graphmem::mcp::McpServer;
use graphmem::Config;
use std::collections::HashSet;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger from environment variable or default to info level.
    // In MCP server mode logs go to stderr (per MCP spec); env_logger
    // already writes there.
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("verify");

    match command {
        "serve" => {
            // MCP server mode (stdio transport)
            run_mcp_server().await?;
        }
        "verify" | _ => {
            // Default: load the graph and check its invariants
            run_graph_verification()?;
        }
    }

    Ok(())
}

/// Run MCP server (stdio transport)
async fn run_mcp_server() -> Result<()> {
    let config = Config::load()?;
    let store = GraphStore::new(config.memory_file());

    let mut server = McpServer::new(store);
    server.run().await?;

    Ok(())
}

/// Load the graph and verify the data-model invariants
fn run_graph_verification() -> Result<()> {
    log::info!("Starting GraphMem v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    log::info!("Configuration loaded successfully");
    log::info!("Memory file: {}", config.memory_file().display());

    let store = GraphStore::new(config.memory_file());
    let graph = store.read_graph()?;

    log::info!(
        "Graph loaded: {} entities, {} relations",
        graph.entity_count(),
        graph.relation_count()
    );

    verify_graph(&graph)?;

    log::info!("✓ Graph verification complete");
    Ok(())
}

/// Check that the loaded graph satisfies the store invariants: unique
/// entity names, unique relation triples, and no dangling edges.
fn verify_graph(graph: &KnowledgeGraph) -> Result<()> {
    let mut names = HashSet::new();
    for entity in &graph.entities {
        if !names.insert(&entity.name) {
            anyhow::bail!("Duplicate entity name: {}", entity.name);
        }
        if entity.name.is_empty() {
            anyhow::bail!("Entity with empty name");
        }
    }
    log::debug!("✓ Entity names unique");

    let mut triples = HashSet::new();
    for relation in &graph.relations {
        if !triples.insert((&relation.from, &relation.to, &relation.relation_type)) {
            anyhow::bail!(
                "Duplicate relation: {} -[{}]-> {}",
                relation.from,
                relation.relation_type,
                relation.to
            );
        }
        if !names.contains(&relation.from) {
            anyhow::bail!("Dangling relation source: {}", relation.from);
        }
        if !names.contains(&relation.to) {
            anyhow::bail!("Dangling relation target: {}", relation.to);
        }
    }
    log::debug!("✓ Relation triples unique, no dangling edges");

    Ok(())
}
