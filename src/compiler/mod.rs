//! Compilation of a template and its dependencies into one statement
//!
//! The compiler never re-expands references recursively. It computes the
//! transitive dependency set once, orders it so dependencies come first, and
//! emits each block template exactly once as a named `WITH` block. Every
//! placeholder is then rewritten to a bare block name, a parenthesised inline
//! subquery, or a literal value.

mod config;
mod emit;

pub use config::{BlockLayout, CompileConfig, ConfigFileError};

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::QueryError;
use crate::graph::{DependencyGraph, Resolution};
use crate::parser;
use crate::registry::{Template, TemplateKind, TemplateRegistry};
use emit::Block;

/// Literal parameters: placeholder name to replacement text
pub type Literals = BTreeMap<String, String>;

/// Compiles templates from a registry snapshot
///
/// Holding a shared borrow of the registry means it cannot change while a
/// compiler exists, so every compile sees one consistent snapshot.
#[derive(Debug, Clone)]
pub struct Compiler<'r> {
    registry: &'r TemplateRegistry,
    config: CompileConfig,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r TemplateRegistry) -> Self {
        Self {
            registry,
            config: CompileConfig::default(),
        }
    }

    /// Set the output configuration
    pub fn with_config(mut self, config: CompileConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Compile `name` into a single statement
    ///
    /// Fails without producing any text if the target is missing, a literal
    /// key is unusable, a reference cannot be resolved, a placeholder is
    /// malformed, or the target's dependencies contain a cycle.
    pub fn compile(&self, name: &str, literals: &Literals) -> Result<String, QueryError> {
        let target = self.registry.get(name)?;
        self.check_literals(literals)?;

        let leaves: HashSet<&str> = literals.keys().map(String::as_str).collect();
        let graph = DependencyGraph::from_root_with_leaves(
            self.registry,
            name,
            Resolution::Strict,
            &leaves,
        )?;
        let order = graph.transitive_dependencies(name);
        tracing::debug!(template = name, dependencies = ?order, "compiling template");

        // What each dependency's placeholder is rewritten to
        let mut renders: HashMap<&str, String> = HashMap::new();
        let mut blocks = Vec::new();

        for dependency in order {
            let template = self.registry.get(dependency)?;
            let body = self.rewrite(template, &renders, literals)?;
            match template.kind() {
                TemplateKind::Block => {
                    renders.insert(dependency, dependency.to_string());
                    blocks.push(Block {
                        name: dependency,
                        body,
                    });
                }
                TemplateKind::Inline => {
                    let body = if self.config.trim_bodies {
                        body.trim()
                    } else {
                        body.as_str()
                    };
                    renders.insert(dependency, format!("({})", body));
                }
            }
        }

        let statement = self.rewrite(target, &renders, literals)?;
        let output = emit::assemble(&blocks, statement, &self.config);
        tracing::debug!(template = name, blocks = blocks.len(), "compiled template");
        Ok(output)
    }

    /// Literal keys must be identifiers and must not shadow registered templates
    fn check_literals(&self, literals: &Literals) -> Result<(), QueryError> {
        for key in literals.keys() {
            if !parser::is_identifier(key) {
                return Err(QueryError::config(key, "not a valid placeholder name"));
            }
            if self.registry.contains(key) {
                return Err(QueryError::config(key, "collides with a registered template"));
            }
        }
        Ok(())
    }

    fn rewrite(
        &self,
        template: &Template,
        renders: &HashMap<&str, String>,
        literals: &Literals,
    ) -> Result<String, QueryError> {
        parser::substitute(template.body(), |name| {
            literals.get(name).or_else(|| renders.get(name)).cloned()
        })
        .map_err(|source| QueryError::parse(template.name(), source))
    }
}
