//! Knowledge graph data model: entities, relations, and query result types.
//!
//! Wire names follow the persisted JSONL format (`entityType`,
//! `relationType`), so these types serialize byte-compatible with existing
//! memory files.

mod search;
mod store;

pub use search::{open_nodes, search_nodes};
pub use store::GraphStore;

use serde::{Deserialize, Serialize};

/// A named node in the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    /// Unique name, serves as the primary key.
    pub name: String,
    /// Free-form type label, e.g. `person`, `project`.
    #[serde(rename = "entityType")]
    pub entity_type: String,
    /// Ordered free-text notes. Insertion order is chronological.
    #[serde(default)]
    pub observations: Vec<String>,
}

/// A directed, typed edge between two entities.
///
/// Unique per (from, to, relation_type) triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relation {
    /// Source entity name.
    pub from: String,
    /// Target entity name.
    pub to: String,
    /// Free-form type label, e.g. `knows`, `works_at`.
    #[serde(rename = "relationType")]
    pub relation_type: String,
}

/// The full current set of entities and relations.
///
/// Vectors preserve insertion order, which keeps serialization
/// deterministic: entities in creation order, relations in creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn find_entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.name == name)
    }

    pub fn contains_entity(&self, name: &str) -> bool {
        self.entities.iter().any(|e| e.name == name)
    }

    pub fn contains_relation(&self, relation: &Relation) -> bool {
        self.relations.iter().any(|r| r == relation)
    }
}

/// Which entity field a search query matched, in precedence order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Name,
    Type,
    Observation,
}

/// A search result: the entity plus the first field the query matched.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(rename = "match")]
    pub matched: MatchField,
}

/// An opened entity with its incident relations in both directions.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDetail {
    #[serde(flatten)]
    pub entity: Entity,
    pub relations_from: Vec<Relation>,
    pub relations_to: Vec<Relation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str) -> Entity {
        Entity {
            name: name.to_string(),
            entity_type: "person".to_string(),
            observations: vec![],
        }
    }

    #[test]
    fn test_entity_wire_names() {
        let e = Entity {
            name: "Alice".to_string(),
            entity_type: "person".to_string(),
            observations: vec!["likes coffee".to_string()],
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["entityType"], "person");
        assert!(json.get("entity_type").is_none());
    }

    #[test]
    fn test_relation_wire_names() {
        let r = Relation {
            from: "Alice".to_string(),
            to: "Bob".to_string(),
            relation_type: "knows".to_string(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["relationType"], "knows");
    }

    #[test]
    fn test_observations_default_when_omitted() {
        let e: Entity =
            serde_json::from_str(r#"{"name":"Alice","entityType":"person"}"#).unwrap();
        assert!(e.observations.is_empty());
    }

    #[test]
    fn test_graph_lookups() {
        let mut graph = KnowledgeGraph::new();
        graph.entities.push(entity("Alice"));
        graph.relations.push(Relation {
            from: "Alice".to_string(),
            to: "Alice".to_string(),
            relation_type: "self".to_string(),
        });

        assert!(graph.contains_entity("Alice"));
        assert!(!graph.contains_entity("Bob"));
        assert_eq!(graph.entity_count(), 1);
        assert_eq!(graph.relation_count(), 1);
        assert!(graph.contains_relation(&graph.relations[0].clone()));
    }

    #[test]
    fn test_match_field_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MatchField::Observation).unwrap(),
            r#""observation""#
        );
    }
}
