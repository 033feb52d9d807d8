pub mod codec;
pub mod config;
pub mod error;
pub mod graph;
pub mod mcp;

pub use config::Config;
pub use error::{GraphMemError, Result};
pub use graph::{Entity, GraphStore, KnowledgeGraph, Relation};
