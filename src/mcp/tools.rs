//! Tool definitions and handlers for the knowledge graph operations.
//!
//! Every handler produces the uniform result envelope
//! `{"status": "success" | "error", "tool": <name>, ...operation fields,
//! "message"?}`. Validation and persistence failures become error envelopes
//! rather than protocol errors, so a failed operation is still a successful
//! tool call from the transport's point of view.

use crate::error::{GraphMemError, Result};
use crate::graph::{Entity, GraphStore, Relation};
use crate::mcp::types::Tool;
use serde::Deserialize;
use serde_json::{json, Value};

/// Get all tool definitions for tools/list
pub fn get_tool_definitions() -> Vec<Tool> {
    let entity_schema = json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "description": "Unique entity name"},
            "entityType": {"type": "string", "description": "Free-form type label, e.g. 'person'"},
            "observations": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Initial observation notes (optional)"
            }
        },
        "required": ["name", "entityType"]
    });
    let relation_schema = json!({
        "type": "object",
        "properties": {
            "from": {"type": "string", "description": "Source entity name"},
            "to": {"type": "string", "description": "Target entity name"},
            "relationType": {"type": "string", "description": "Free-form type label, e.g. 'knows'"}
        },
        "required": ["from", "to", "relationType"]
    });

    vec![
        Tool {
            name: "create_entities".to_string(),
            description: "Create new entities in the knowledge graph. Fails if a name already exists.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "entities": {"type": "array", "items": entity_schema}
                },
                "required": ["entities"]
            }),
        },
        Tool {
            name: "create_relations".to_string(),
            description: "Create directed relations between existing entities. Both endpoints must exist; duplicate (from, to, type) triples are rejected.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "relations": {"type": "array", "items": relation_schema.clone()}
                },
                "required": ["relations"]
            }),
        },
        Tool {
            name: "add_observations".to_string(),
            description: "Append observation notes to an existing entity, preserving order.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "entityName": {"type": "string"},
                    "observations": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["entityName", "observations"]
            }),
        },
        Tool {
            name: "delete_entities".to_string(),
            description: "Delete entities by name, cascading to every relation that touches them. Missing names are ignored.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "entityNames": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["entityNames"]
            }),
        },
        Tool {
            name: "delete_observations".to_string(),
            description: "Remove exact-matching observation notes from an entity (all occurrences).".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "entityName": {"type": "string"},
                    "observations": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["entityName", "observations"]
            }),
        },
        Tool {
            name: "delete_relations".to_string(),
            description: "Delete relations matching the given (from, to, type) triples exactly. Misses are ignored.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "relations": {"type": "array", "items": relation_schema}
                },
                "required": ["relations"]
            }),
        },
        Tool {
            name: "read_graph".to_string(),
            description: "Read the complete knowledge graph: all entities and relations in insertion order.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        Tool {
            name: "search_nodes".to_string(),
            description: "Case-insensitive substring search across entity names, types, and observations. Each match reports which field matched first.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search term"}
                },
                "required": ["query"]
            }),
        },
        Tool {
            name: "open_nodes".to_string(),
            description: "Retrieve specific entities by name with their incoming and outgoing relations. Missing names are skipped.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "names": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["names"]
            }),
        },
    ]
}

/// Dispatch a tool call by name.
///
/// Returns the result envelope. Only an unknown tool name is a hard error;
/// operation failures are reported inside the envelope.
pub fn dispatch(store: &GraphStore, name: &str, arguments: &Value) -> Result<Value> {
    let envelope = match name {
        "create_entities" => handle_create_entities(store, arguments),
        "create_relations" => handle_create_relations(store, arguments),
        "add_observations" => handle_add_observations(store, arguments),
        "delete_entities" => handle_delete_entities(store, arguments),
        "delete_observations" => handle_delete_observations(store, arguments),
        "delete_relations" => handle_delete_relations(store, arguments),
        "read_graph" => handle_read_graph(store),
        "search_nodes" => handle_search_nodes(store, arguments),
        "open_nodes" => handle_open_nodes(store, arguments),
        _ => return Err(GraphMemError::Protocol(format!("Unknown tool: {}", name))),
    };
    Ok(envelope)
}

/// True if the envelope reports an error status.
pub fn is_error_envelope(envelope: &Value) -> bool {
    envelope.get("status").and_then(Value::as_str) == Some("error")
}

fn error_envelope(tool: &str, message: String) -> Value {
    json!({
        "status": "error",
        "tool": tool,
        "message": message,
    })
}

#[derive(Debug, Deserialize)]
struct CreateEntitiesParams {
    entities: Vec<Entity>,
}

fn handle_create_entities(store: &GraphStore, arguments: &Value) -> Value {
    let params: CreateEntitiesParams = match serde_json::from_value(arguments.clone()) {
        Ok(p) => p,
        Err(e) => return error_envelope("create_entities", format!("Invalid arguments: {}", e)),
    };

    match store.create_entities(params.entities) {
        Ok(names) => json!({
            "status": "success",
            "tool": "create_entities",
            "created": names.len(),
            "entities": names,
        }),
        Err(e) => error_envelope("create_entities", e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct CreateRelationsParams {
    relations: Vec<Relation>,
}

fn handle_create_relations(store: &GraphStore, arguments: &Value) -> Value {
    let params: CreateRelationsParams = match serde_json::from_value(arguments.clone()) {
        Ok(p) => p,
        Err(e) => return error_envelope("create_relations", format!("Invalid arguments: {}", e)),
    };

    let relations = params.relations.clone();
    match store.create_relations(params.relations) {
        Ok(created) => json!({
            "status": "success",
            "tool": "create_relations",
            "created": created,
            "relations": relations,
        }),
        Err(e) => error_envelope("create_relations", e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct AddObservationsParams {
    #[serde(rename = "entityName")]
    entity_name: String,
    observations: Vec<String>,
}

fn handle_add_observations(store: &GraphStore, arguments: &Value) -> Value {
    let params: AddObservationsParams = match serde_json::from_value(arguments.clone()) {
        Ok(p) => p,
        Err(e) => return error_envelope("add_observations", format!("Invalid arguments: {}", e)),
    };

    match store.add_observations(&params.entity_name, params.observations) {
        Ok(added) => json!({
            "status": "success",
            "tool": "add_observations",
            "entity": params.entity_name,
            "added": added,
        }),
        Err(e) => error_envelope("add_observations", e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct DeleteEntitiesParams {
    #[serde(rename = "entityNames")]
    entity_names: Vec<String>,
}

fn handle_delete_entities(store: &GraphStore, arguments: &Value) -> Value {
    let params: DeleteEntitiesParams = match serde_json::from_value(arguments.clone()) {
        Ok(p) => p,
        Err(e) => return error_envelope("delete_entities", format!("Invalid arguments: {}", e)),
    };

    match store.delete_entities(&params.entity_names) {
        Ok(()) => json!({
            "status": "success",
            "tool": "delete_entities",
            "deleted": params.entity_names.len(),
            "entities": params.entity_names,
        }),
        Err(e) => error_envelope("delete_entities", e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct DeleteObservationsParams {
    #[serde(rename = "entityName")]
    entity_name: String,
    observations: Vec<String>,
}

fn handle_delete_observations(store: &GraphStore, arguments: &Value) -> Value {
    let params: DeleteObservationsParams = match serde_json::from_value(arguments.clone()) {
        Ok(p) => p,
        Err(e) => return error_envelope("delete_observations", format!("Invalid arguments: {}", e)),
    };

    match store.delete_observations(&params.entity_name, &params.observations) {
        Ok(()) => json!({
            "status": "success",
            "tool": "delete_observations",
            "entity": params.entity_name,
            "deleted": params.observations.len(),
        }),
        Err(e) => error_envelope("delete_observations", e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct DeleteRelationsParams {
    relations: Vec<Relation>,
}

fn handle_delete_relations(store: &GraphStore, arguments: &Value) -> Value {
    let params: DeleteRelationsParams = match serde_json::from_value(arguments.clone()) {
        Ok(p) => p,
        Err(e) => return error_envelope("delete_relations", format!("Invalid arguments: {}", e)),
    };

    match store.delete_relations(&params.relations) {
        Ok(()) => json!({
            "status": "success",
            "tool": "delete_relations",
            "deleted": params.relations.len(),
            "relations": params.relations,
        }),
        Err(e) => error_envelope("delete_relations", e.to_string()),
    }
}

fn handle_read_graph(store: &GraphStore) -> Value {
    match store.read_graph() {
        Ok(graph) => json!({
            "status": "success",
            "tool": "read_graph",
            "entity_count": graph.entity_count(),
            "relation_count": graph.relation_count(),
            "graph": graph,
        }),
        Err(e) => error_envelope("read_graph", e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct SearchNodesParams {
    query: String,
}

fn handle_search_nodes(store: &GraphStore, arguments: &Value) -> Value {
    let params: SearchNodesParams = match serde_json::from_value(arguments.clone()) {
        Ok(p) => p,
        Err(e) => return error_envelope("search_nodes", format!("Invalid arguments: {}", e)),
    };

    match store.search_nodes(&params.query) {
        Ok(results) => json!({
            "status": "success",
            "tool": "search_nodes",
            "query": params.query,
            "count": results.len(),
            "results": results,
        }),
        Err(e) => error_envelope("search_nodes", e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct OpenNodesParams {
    names: Vec<String>,
}

fn handle_open_nodes(store: &GraphStore, arguments: &Value) -> Value {
    let params: OpenNodesParams = match serde_json::from_value(arguments.clone()) {
        Ok(p) => p,
        Err(e) => return error_envelope("open_nodes", format!("Invalid arguments: {}", e)),
    };

    match store.open_nodes(&params.names) {
        Ok(nodes) => json!({
            "status": "success",
            "tool": "open_nodes",
            "requested": params.names.len(),
            "found": nodes.len(),
            "nodes": nodes,
        }),
        Err(e) => error_envelope("open_nodes", e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(temp_dir: &TempDir) -> GraphStore {
        GraphStore::new(temp_dir.path().join("graph.jsonl"))
    }

    #[test]
    fn test_tool_definitions_cover_all_operations() {
        let tools = get_tool_definitions();
        assert_eq!(tools.len(), 9);
        assert!(tools.iter().any(|t| t.name == "create_entities"));
        assert!(tools.iter().any(|t| t.name == "open_nodes"));
    }

    #[test]
    fn test_dispatch_success_envelope() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let args = serde_json::json!({
            "entities": [{"name": "Alice", "entityType": "person"}]
        });
        let envelope = dispatch(&store, "create_entities", &args).unwrap();

        assert_eq!(envelope["status"], "success");
        assert_eq!(envelope["tool"], "create_entities");
        assert_eq!(envelope["created"], 1);
        assert_eq!(envelope["entities"][0], "Alice");
        assert!(!is_error_envelope(&envelope));
    }

    #[test]
    fn test_dispatch_error_envelope_on_duplicate() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let args = serde_json::json!({
            "entities": [{"name": "Alice", "entityType": "person"}]
        });
        dispatch(&store, "create_entities", &args).unwrap();
        let envelope = dispatch(&store, "create_entities", &args).unwrap();

        assert_eq!(envelope["status"], "error");
        assert!(envelope["message"]
            .as_str()
            .unwrap()
            .contains("Entity already exists: Alice"));
        assert!(is_error_envelope(&envelope));
    }

    #[test]
    fn test_dispatch_invalid_arguments() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let envelope = dispatch(&store, "search_nodes", &serde_json::json!({})).unwrap();
        assert_eq!(envelope["status"], "error");
        assert!(envelope["message"].as_str().unwrap().contains("Invalid arguments"));
    }

    #[test]
    fn test_dispatch_unknown_tool() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let err = dispatch(&store, "explode", &Value::Null).unwrap_err();
        assert!(matches!(err, GraphMemError::Protocol(_)));
    }

    #[test]
    fn test_read_graph_envelope_counts() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        dispatch(
            &store,
            "create_entities",
            &serde_json::json!({
                "entities": [
                    {"name": "Alice", "entityType": "person"},
                    {"name": "Bob", "entityType": "person"}
                ]
            }),
        )
        .unwrap();
        dispatch(
            &store,
            "create_relations",
            &serde_json::json!({
                "relations": [{"from": "Alice", "to": "Bob", "relationType": "knows"}]
            }),
        )
        .unwrap();

        let envelope = dispatch(&store, "read_graph", &Value::Null).unwrap();
        assert_eq!(envelope["entity_count"], 2);
        assert_eq!(envelope["relation_count"], 1);
        assert_eq!(envelope["graph"]["relations"][0]["relationType"], "knows");
    }

    #[test]
    fn test_search_envelope_reports_match_field() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        dispatch(
            &store,
            "create_entities",
            &serde_json::json!({
                "entities": [
                    {"name": "Bob", "entityType": "person", "observations": ["likes coffee"]}
                ]
            }),
        )
        .unwrap();

        let envelope = dispatch(
            &store,
            "search_nodes",
            &serde_json::json!({"query": "coffee"}),
        )
        .unwrap();
        assert_eq!(envelope["count"], 1);
        assert_eq!(envelope["results"][0]["name"], "Bob");
        assert_eq!(envelope["results"][0]["match"], "observation");
    }

    #[test]
    fn test_open_nodes_envelope_requested_vs_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        dispatch(
            &store,
            "create_entities",
            &serde_json::json!({
                "entities": [{"name": "Alice", "entityType": "person"}]
            }),
        )
        .unwrap();

        let envelope = dispatch(
            &store,
            "open_nodes",
            &serde_json::json!({"names": ["Alice", "Missing"]}),
        )
        .unwrap();
        assert_eq!(envelope["requested"], 2);
        assert_eq!(envelope["found"], 1);
        assert!(envelope["nodes"][0]["relations_from"].as_array().unwrap().is_empty());
    }
}
