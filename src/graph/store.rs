//! The graph store: CRUD and search over the persisted knowledge graph.
//!
//! The store holds only the memory file path. Every public operation loads
//! the current on-disk graph, applies the change under invariant checks,
//! and on success rewrites the whole file before returning. A failed
//! operation never saves, so the file always holds the previous consistent
//! state.
//!
//! Batch operations validate and insert one item at a time and stop at the
//! first failure, aborting the remainder of the batch. Since nothing is
//! persisted on failure, the aborted batch is not observable on disk.

use crate::codec;
use crate::error::{GraphMemError, Result};
use crate::graph::{search, Entity, KnowledgeGraph, NodeDetail, Relation, SearchHit};
use std::path::{Path, PathBuf};

/// Handle to a knowledge graph persisted at a single file path.
///
/// The path is explicit configuration: the store keeps no global state and
/// no open file handles between calls.
pub struct GraphStore {
    path: PathBuf,
}

impl GraphStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current on-disk graph.
    pub fn load(&self) -> Result<KnowledgeGraph> {
        codec::load(&self.path)
    }

    fn save(&self, graph: &KnowledgeGraph) -> Result<()> {
        codec::save(&self.path, graph)
    }

    /// Create new entities. Fails with `DuplicateEntity` on the first name
    /// that already exists. Returns the created names.
    pub fn create_entities(&self, entities: Vec<Entity>) -> Result<Vec<String>> {
        let mut graph = self.load()?;
        let mut created = Vec::with_capacity(entities.len());

        for entity in entities {
            if graph.contains_entity(&entity.name) {
                return Err(GraphMemError::DuplicateEntity(entity.name));
            }
            created.push(entity.name.clone());
            graph.entities.push(entity);
        }

        self.save(&graph)?;
        Ok(created)
    }

    /// Create new relations between existing entities. Fails with
    /// `EntityNotFound` if either endpoint is absent and with
    /// `DuplicateRelation` if the triple already exists.
    pub fn create_relations(&self, relations: Vec<Relation>) -> Result<usize> {
        let mut graph = self.load()?;
        let mut created = 0;

        for relation in relations {
            if !graph.contains_entity(&relation.from) {
                return Err(GraphMemError::EntityNotFound(relation.from));
            }
            if !graph.contains_entity(&relation.to) {
                return Err(GraphMemError::EntityNotFound(relation.to));
            }
            if graph.contains_relation(&relation) {
                return Err(GraphMemError::DuplicateRelation {
                    from: relation.from,
                    to: relation.to,
                    relation_type: relation.relation_type,
                });
            }
            graph.relations.push(relation);
            created += 1;
        }

        self.save(&graph)?;
        Ok(created)
    }

    /// Append observations to an entity, preserving order, no dedup.
    /// Returns the number appended.
    pub fn add_observations(
        &self,
        entity_name: &str,
        observations: Vec<String>,
    ) -> Result<usize> {
        let mut graph = self.load()?;

        let entity = graph
            .find_entity_mut(entity_name)
            .ok_or_else(|| GraphMemError::EntityNotFound(entity_name.to_string()))?;

        let added = observations.len();
        entity.observations.extend(observations);

        self.save(&graph)?;
        Ok(added)
    }

    /// Delete the named entities if present, cascading to every relation
    /// that touches a deleted name. Missing names are silently ignored.
    pub fn delete_entities(&self, entity_names: &[String]) -> Result<()> {
        let mut graph = self.load()?;

        for name in entity_names {
            let before = graph.entities.len();
            graph.entities.retain(|e| &e.name != name);
            if graph.entities.len() < before {
                graph.relations.retain(|r| &r.from != name && &r.to != name);
            }
        }

        self.save(&graph)
    }

    /// Remove every observation of the entity that exactly matches any of
    /// the given strings (all occurrences).
    pub fn delete_observations(&self, entity_name: &str, observations: &[String]) -> Result<()> {
        let mut graph = self.load()?;

        let entity = graph
            .find_entity_mut(entity_name)
            .ok_or_else(|| GraphMemError::EntityNotFound(entity_name.to_string()))?;

        entity.observations.retain(|obs| !observations.contains(obs));

        self.save(&graph)
    }

    /// Remove every stored relation that matches a given triple exactly.
    /// Misses are silently ignored.
    pub fn delete_relations(&self, relations: &[Relation]) -> Result<()> {
        let mut graph = self.load()?;

        graph.relations.retain(|r| !relations.contains(r));

        self.save(&graph)
    }

    /// Read the full graph in insertion order.
    pub fn read_graph(&self) -> Result<KnowledgeGraph> {
        self.load()
    }

    /// Case-insensitive substring search over names, types, and
    /// observations.
    pub fn search_nodes(&self, query: &str) -> Result<Vec<SearchHit>> {
        let graph = self.load()?;
        Ok(search::search_nodes(&graph, query))
    }

    /// Open the named entities with their incident relations. Missing names
    /// are silently skipped.
    pub fn open_nodes(&self, names: &[String]) -> Result<Vec<NodeDetail>> {
        let graph = self.load()?;
        Ok(search::open_nodes(&graph, names))
    }
}
