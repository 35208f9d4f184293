//! querygraph - a dependency-aware compiler for SQL query templates
//!
//! Templates are named query fragments that reference each other with
//! `{{name}}` placeholders. Compiling a template inlines its transitive
//! dependencies as common table expressions, each emitted once, ordered so
//! every block precedes its first use.
//!
//! # Example
//!
//! ```rust
//! use querygraph::TemplateRegistry;
//!
//! let mut registry = TemplateRegistry::new();
//! registry.register("loc", "SELECT * FROM locations").unwrap();
//! registry.register("cnt", "SELECT count(*) FROM {{loc}}").unwrap();
//!
//! let sql = registry.compile("cnt").unwrap();
//! assert_eq!(sql, "WITH loc AS (\nSELECT * FROM locations\n)\nSELECT count(*) FROM loc");
//! ```
//!
//! Placeholders are recognised anywhere in a body, including inside quoted
//! SQL string literals.

pub mod compiler;
pub mod error;
pub mod graph;
pub mod parser;
pub mod registry;

pub use compiler::{BlockLayout, CompileConfig, Compiler, ConfigFileError, Literals};
pub use error::{ParseError, QueryError, Span};
pub use graph::{DependencyGraph, Resolution};
pub use parser::Reference;
pub use registry::{Template, TemplateKind, TemplateRegistry};

/// Compile `name` from `registry` with a custom configuration
///
/// # Example
///
/// ```rust
/// use querygraph::{compile_with_config, BlockLayout, CompileConfig, Literals, TemplateRegistry};
///
/// let registry = TemplateRegistry::from_templates([
///     ("recent", "SELECT * FROM {{events}} WHERE ts > now() - interval '1 day'"),
///     ("per_user", "SELECT user_id, count(*) FROM {{recent}} GROUP BY user_id"),
/// ])
/// .unwrap();
///
/// let mut literals = Literals::new();
/// literals.insert("events".to_string(), "analytics.events".to_string());
///
/// let config = CompileConfig::new().with_layout(BlockLayout::Compact);
/// let sql = compile_with_config(&registry, "per_user", &literals, config).unwrap();
/// assert!(sql.starts_with("WITH recent AS (SELECT * FROM analytics.events"));
/// assert!(sql.ends_with("FROM recent GROUP BY user_id"));
/// ```
pub fn compile_with_config(
    registry: &TemplateRegistry,
    name: &str,
    literals: &Literals,
    config: CompileConfig,
) -> Result<String, QueryError> {
    Compiler::new(registry).with_config(config).compile(name, literals)
}
