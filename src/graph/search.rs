//! Query helpers over a loaded graph: substring search and node opening.

use crate::graph::{KnowledgeGraph, MatchField, NodeDetail, SearchHit};

/// Case-insensitive substring search across entities.
///
/// Fields are checked in precedence order per entity: name, then type, then
/// each observation. The first match wins and is reported; an entity never
/// appears twice.
pub fn search_nodes(graph: &KnowledgeGraph, query: &str) -> Vec<SearchHit> {
    let needle = query.to_lowercase();
    let mut results = Vec::new();

    for entity in &graph.entities {
        if entity.name.to_lowercase().contains(&needle) {
            results.push(SearchHit {
                entity: entity.clone(),
                matched: MatchField::Name,
            });
            continue;
        }

        if entity.entity_type.to_lowercase().contains(&needle) {
            results.push(SearchHit {
                entity: entity.clone(),
                matched: MatchField::Type,
            });
            continue;
        }

        if entity
            .observations
            .iter()
            .any(|obs| obs.to_lowercase().contains(&needle))
        {
            results.push(SearchHit {
                entity: entity.clone(),
                matched: MatchField::Observation,
            });
        }
    }

    results
}

/// Open the named entities, deriving their incident relations.
///
/// Names not present in the graph are silently skipped, so the result may be
/// shorter than the request.
pub fn open_nodes(graph: &KnowledgeGraph, names: &[String]) -> Vec<NodeDetail> {
    let mut results = Vec::new();

    for name in names {
        let Some(entity) = graph.find_entity(name) else {
            continue;
        };

        let relations_from = graph
            .relations
            .iter()
            .filter(|r| &r.from == name)
            .cloned()
            .collect();
        let relations_to = graph
            .relations
            .iter()
            .filter(|r| &r.to == name)
            .cloned()
            .collect();

        results.push(NodeDetail {
            entity: entity.clone(),
            relations_from,
            relations_to,
        });
    }

    results
}
