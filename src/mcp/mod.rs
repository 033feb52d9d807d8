//! MCP protocol layer: JSON-RPC types, stdio server, and tool handlers.

pub mod server;
pub mod tools;
pub mod types;

pub use server::McpServer;
