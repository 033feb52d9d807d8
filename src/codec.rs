//! Persistence codec: the graph as one self-describing JSON record per line.
//!
//! Two record shapes, discriminated by a `type` field:
//!
//! ```text
//! {"type":"entity","name":...,"entityType":...,"observations":[...]}
//! {"type":"relation","from":...,"to":...,"relationType":...}
//! ```
//!
//! Load is lossy-tolerant: blank lines are skipped and unparsable lines are
//! logged at warn level and skipped, so one corrupt record never takes the
//! whole graph down. Save is a full rewrite of the file, entities first,
//! then relations.

use crate::error::Result;
use crate::graph::{Entity, KnowledgeGraph, Relation};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One persisted line, tagged by the `type` discriminator.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Record {
    Entity {
        name: String,
        #[serde(rename = "entityType")]
        entity_type: String,
        observations: Vec<String>,
    },
    Relation {
        from: String,
        to: String,
        #[serde(rename = "relationType")]
        relation_type: String,
    },
}

/// Load a graph from the memory file.
///
/// A missing file yields an empty graph (first run). A repeated entity name
/// resolves last-record-wins, matching files written by other compatible
/// implementations.
pub fn load(path: &Path) -> Result<KnowledgeGraph> {
    let mut graph = KnowledgeGraph::new();

    if !path.exists() {
        return Ok(graph);
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<Record>(trimmed) {
            Ok(Record::Entity {
                name,
                entity_type,
                observations,
            }) => {
                let entity = Entity {
                    name,
                    entity_type,
                    observations,
                };
                if let Some(pos) = graph.entities.iter().position(|e| e.name == entity.name) {
                    graph.entities[pos] = entity;
                } else {
                    graph.entities.push(entity);
                }
            }
            Ok(Record::Relation {
                from,
                to,
                relation_type,
            }) => {
                graph.relations.push(Relation {
                    from,
                    to,
                    relation_type,
                });
            }
            Err(e) => {
                log::warn!(
                    "Skipping malformed record at {}:{}: {}",
                    path.display(),
                    line_no + 1,
                    e
                );
            }
        }
    }

    Ok(graph)
}

/// Save a graph to the memory file, rewriting it in full.
pub fn save(path: &Path, graph: &KnowledgeGraph) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for entity in &graph.entities {
        let record = Record::Entity {
            name: entity.name.clone(),
            entity_type: entity.entity_type.clone(),
            observations: entity.observations.clone(),
        };
        writeln!(writer, "{}", serde_json::to_string(&record)?)?;
    }

    for relation in &graph.relations {
        let record = Record::Relation {
            from: relation.from.clone(),
            to: relation.to.clone(),
            relation_type: relation.relation_type.clone(),
        };
        writeln!(writer, "{}", serde_json::to_string(&record)?)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_graph() -> KnowledgeGraph {
        KnowledgeGraph {
            entities: vec![
                Entity {
                    name: "Alice".to_string(),
                    entity_type: "person".to_string(),
                    observations: vec!["likes coffee".to_string()],
                },
                Entity {
                    name: "Acme".to_string(),
                    entity_type: "company".to_string(),
                    observations: vec![],
                },
            ],
            relations: vec![Relation {
                from: "Alice".to_string(),
                to: "Acme".to_string(),
                relation_type: "works_at".to_string(),
            }],
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let graph = load(&temp_dir.path().join("nope.jsonl")).unwrap();
        assert_eq!(graph.entity_count(), 0);
        assert_eq!(graph.relation_count(), 0);
    }

    #[test]
    fn test_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("graph.jsonl");

        let graph = sample_graph();
        save(&path, &graph).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.entities, graph.entities);
        assert_eq!(loaded.relations, graph.relations);
    }

    #[test]
    fn test_wire_format_exact() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("graph.jsonl");

        save(&path, &sample_graph()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(
            lines[0],
            r#"{"type":"entity","name":"Alice","entityType":"person","observations":["likes coffee"]}"#
        );
        assert_eq!(
            lines[2],
            r#"{"type":"relation","from":"Alice","to":"Acme","relationType":"works_at"}"#
        );
    }

    #[test]
    fn test_malformed_and_blank_lines_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("graph.jsonl");

        fs::write(
            &path,
            concat!(
                r#"{"type":"entity","name":"Alice","entityType":"person","observations":[]}"#,
                "\n\n",
                "not json at all\n",
                r#"{"type":"teapot","name":"Bob"}"#,
                "\n",
                r#"{"type":"relation","from":"Alice","to":"Alice","relationType":"self"}"#,
                "\n",
            ),
        )
        .unwrap();

        let graph = load(&path).unwrap();
        assert_eq!(graph.entity_count(), 1);
        assert_eq!(graph.relation_count(), 1);
        assert_eq!(graph.entities[0].name, "Alice");
    }

    #[test]
    fn test_repeated_entity_name_last_wins() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("graph.jsonl");

        fs::write(
            &path,
            concat!(
                r#"{"type":"entity","name":"Alice","entityType":"person","observations":["old"]}"#,
                "\n",
                r#"{"type":"entity","name":"Alice","entityType":"person","observations":["new"]}"#,
                "\n",
            ),
        )
        .unwrap();

        let graph = load(&path).unwrap();
        assert_eq!(graph.entity_count(), 1);
        assert_eq!(graph.entities[0].observations, vec!["new".to_string()]);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("graph.jsonl");

        save(&path, &sample_graph()).unwrap();
        assert!(path.exists());
    }
}
