use anyhow::Result;
use clap::Parser;
use graphmem::graph::GraphStore;
use graphmem::mcp::tools;
use graphmem::Config;
use serde_json::{json, Value};

#[derive(Parser, Debug)]
#[command(name = "tool")]
#[command(about = "Run one knowledge graph operation and print its result envelope")]
struct Args {
    /// Operation name, e.g. create_entities, read_graph, search_nodes
    tool: String,

    /// Positional JSON arguments for the operation
    args: Vec<String>,
}

const AVAILABLE_TOOLS: &[&str] = &[
    "create_entities",
    "create_relations",
    "add_observations",
    "delete_entities",
    "delete_observations",
    "delete_relations",
    "read_graph",
    "search_nodes",
    "open_nodes",
];

/// Map positional JSON arguments onto the named-argument object the tool
/// handlers take. The positional order matches each operation's signature.
fn build_arguments(tool: &str, args: &[Value]) -> Result<Value> {
    let expect = |n: usize| -> Result<()> {
        if args.len() != n {
            anyhow::bail!("{} takes {} JSON argument(s), got {}", tool, n, args.len());
        }
        Ok(())
    };

    let arguments = match tool {
        "create_entities" => {
            expect(1)?;
            json!({"entities": args[0]})
        }
        "create_relations" => {
            expect(1)?;
            json!({"relations": args[0]})
        }
        "add_observations" => {
            expect(2)?;
            json!({"entityName": args[0], "observations": args[1]})
        }
        "delete_entities" => {
            expect(1)?;
            json!({"entityNames": args[0]})
        }
        "delete_observations" => {
            expect(2)?;
            json!({"entityName": args[0], "observations": args[1]})
        }
        "delete_relations" => {
            expect(1)?;
            json!({"relations": args[0]})
        }
        "read_graph" => {
            expect(0)?;
            json!({})
        }
        "search_nodes" => {
            expect(1)?;
            json!({"query": args[0]})
        }
        "open_nodes" => {
            expect(1)?;
            json!({"names": args[0]})
        }
        _ => anyhow::bail!(
            "Unknown tool: {}\nAvailable tools: {}",
            tool,
            AVAILABLE_TOOLS.join(", ")
        ),
    };

    Ok(arguments)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let cli = Args::parse();
    let tool = cli.tool.replace('-', "_");

    let mut parsed_args = Vec::with_capacity(cli.args.len());
    for arg in &cli.args {
        let value: Value = serde_json::from_str(arg)
            .map_err(|e| anyhow::anyhow!("Error parsing JSON argument {:?}: {}", arg, e))?;
        parsed_args.push(value);
    }

    let arguments = build_arguments(&tool, &parsed_args)?;

    let config = Config::load()?;
    let store = GraphStore::new(config.memory_file());

    let envelope = tools::dispatch(&store, &tool, &arguments)?;
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    Ok(())
}
