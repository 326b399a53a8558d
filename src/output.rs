//! Table and JSON output for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use filetree_entity::node::Node;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One node as a table row.
#[derive(Debug, Serialize, Tabled)]
pub struct NodeRow {
    /// Node ID
    pub id: String,
    /// Kind
    pub kind: String,
    /// Name
    pub name: String,
    /// Size in bytes
    pub size: i64,
    /// MIME type
    pub mime: String,
    /// Trash state
    pub state: String,
    /// Last update
    pub updated_at: String,
}

impl From<&Node> for NodeRow {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.to_string(),
            kind: node.kind.to_string(),
            name: node.name.clone(),
            size: node.size_bytes,
            mime: node.mime_type.clone().unwrap_or_default(),
            state: match node.deleted_at() {
                Some(at) => format!("trashed {}", at.format("%Y-%m-%d %H:%M")),
                None => "active".to_string(),
            },
            updated_at: node.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Print nodes in the selected format. JSON keeps every field.
pub fn print_nodes(nodes: &[Node], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let rows: Vec<NodeRow> = nodes.iter().map(NodeRow::from).collect();
            print_list(&rows, format);
        }
        OutputFormat::Json => print_item(&nodes, format),
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{item:#?}"),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{json}");
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{key}:"), value);
}
