//! Template registry for storing and retrieving query templates

use std::collections::HashMap;

use crate::compiler::{Compiler, Literals};
use crate::error::{ParseError, QueryError};
use crate::graph::{DependencyGraph, Resolution};
use crate::parser::{self, Reference};

/// How a template is materialised when something depends on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateKind {
    /// Emitted once as a named `WITH` block
    #[default]
    Block,
    /// Substituted as a parenthesised subquery at every use site
    Inline,
}

/// A named query template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    body: String,
    kind: TemplateKind,
}

impl Template {
    /// Create a block template
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            kind: TemplateKind::Block,
        }
    }

    /// Create an inline template
    pub fn inline(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: TemplateKind::Inline,
            ..Self::new(name, body)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn is_inline(&self) -> bool {
        self.kind == TemplateKind::Inline
    }

    /// Every placeholder in the body, in order, duplicates included
    pub fn references(&self) -> Result<Vec<Reference>, ParseError> {
        parser::extract(&self.body)
    }

    /// Direct dependencies in first-occurrence order
    pub fn dependency_names(&self) -> Result<Vec<String>, ParseError> {
        parser::dependency_names(&self.body)
    }
}

/// Registry for storing query templates
///
/// Registration never inspects bodies, so a template may reference names that
/// are registered later. Malformed or dangling references surface when a
/// compile needs them.
#[derive(Debug, Default, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(name, body)` pairs; later pairs overwrite earlier ones
    pub fn from_templates<I, N, B>(templates: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (N, B)>,
        N: Into<String>,
        B: Into<String>,
    {
        let mut registry = Self::new();
        for (name, body) in templates {
            registry.register(name, body)?;
        }
        Ok(registry)
    }

    /// Register a block template, replacing any existing template of that name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<(), QueryError> {
        self.insert(Template::new(name, body))
    }

    /// Register an inline template, replacing any existing template of that name
    pub fn register_inline(
        &mut self,
        name: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<(), QueryError> {
        self.insert(Template::inline(name, body))
    }

    /// Register a template value directly
    pub fn insert(&mut self, template: Template) -> Result<(), QueryError> {
        if !parser::is_identifier(&template.name) {
            return Err(QueryError::invalid_name(template.name));
        }

        let name = template.name.clone();
        let replaced = self.templates.insert(name.clone(), template);
        tracing::trace!(name = %name, replaced = replaced.is_some(), "registered template");
        Ok(())
    }

    /// Remove a template
    ///
    /// Templates that still reference `name` fail with
    /// [`QueryError::UnknownDependency`] at their next compile.
    pub fn remove(&mut self, name: &str) -> Option<Template> {
        let removed = self.templates.remove(name);
        tracing::trace!(name, removed = removed.is_some(), "removed template");
        removed
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Result<&Template, QueryError> {
        self.templates
            .get(name)
            .ok_or_else(|| QueryError::not_found(name))
    }

    /// Get the body of a template by name
    pub fn body(&self, name: &str) -> Result<&str, QueryError> {
        self.get(name).map(Template::body)
    }

    /// Check if a template exists
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Get all template names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|s| s.as_str())
    }

    /// Iterate over all templates, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Whether `target` is reachable from `root` through placeholders
    ///
    /// Fails only if `root` is unregistered or a visited body is malformed.
    /// Dangling references are not errors: an unregistered name referenced by
    /// a visited body counts as reached, one that nothing references does not.
    pub fn reaches(&self, root: &str, target: &str) -> Result<bool, QueryError> {
        let graph = DependencyGraph::from_root(self, root, Resolution::Lenient)?;
        Ok(graph.reaches(root, target))
    }

    /// All transitive dependencies of `name`, dependencies before dependents
    pub fn transitive_dependencies(&self, name: &str) -> Result<Vec<String>, QueryError> {
        let graph = DependencyGraph::from_root(self, name, Resolution::Strict)?;
        Ok(graph
            .transitive_dependencies(name)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Names referenced directly by `name`, in first-reference order
    ///
    /// Dangling references are included; literal placeholders cannot be told
    /// apart from them at this point.
    pub fn direct_dependencies(&self, name: &str) -> Result<Vec<String>, QueryError> {
        let graph = DependencyGraph::from_root(self, name, Resolution::Lenient)?;
        Ok(graph
            .dependencies_of(name)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Registered templates whose bodies reference `name` directly, sorted
    pub fn dependents(&self, name: &str) -> Result<Vec<String>, QueryError> {
        let graph = DependencyGraph::from_registry(self, Resolution::Lenient)?;
        Ok(graph
            .dependents_of(name)
            .into_iter()
            .filter(|n| self.contains(n))
            .map(str::to_string)
            .collect())
    }

    /// Every registered template, dependencies before dependents
    pub fn topological_order(&self) -> Result<Vec<String>, QueryError> {
        let graph = DependencyGraph::from_registry(self, Resolution::Strict)?;
        Ok(graph
            .topological_order()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Compile `name` with the default configuration and no literals
    pub fn compile(&self, name: &str) -> Result<String, QueryError> {
        self.compile_with(name, &Literals::new())
    }

    /// Compile `name` with the default configuration and the given literals
    pub fn compile_with(&self, name: &str, literals: &Literals) -> Result<String, QueryError> {
        Compiler::new(self).compile(name, literals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = TemplateRegistry::new();
        registry
            .register("loc", "SELECT * FROM locations")
            .expect("Should register");

        assert!(registry.contains("loc"));
        assert_eq!(registry.body("loc").unwrap(), "SELECT * FROM locations");
        assert_eq!(registry.get("loc").unwrap().kind(), TemplateKind::Block);
    }

    #[test]
    fn test_registry_overwrite() {
        let mut registry = TemplateRegistry::new();
        registry.register("loc", "SELECT 1").unwrap();
        registry.register("loc", "SELECT 2").unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.body("loc").unwrap(), "SELECT 2");
    }

    #[test]
    fn test_registry_not_found() {
        let registry = TemplateRegistry::new();
        let result = registry.get("missing");
        assert!(matches!(result, Err(QueryError::NotFound { ref name }) if name == "missing"));
    }

    #[test]
    fn test_registry_invalid_name() {
        let mut registry = TemplateRegistry::new();
        for name in ["", "1abc", "has space", "semi;colon"] {
            let result = registry.register(name, "SELECT 1");
            assert!(matches!(result, Err(QueryError::InvalidName { .. })), "{name:?}");
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_accepts_malformed_body() {
        let mut registry = TemplateRegistry::new();
        registry
            .register("bad", "SELECT {{not valid")
            .expect("Bodies are not validated at registration");
        assert!(registry.get("bad").unwrap().references().is_err());
    }

    #[test]
    fn test_registry_names() {
        let registry =
            TemplateRegistry::from_templates([("a", "SELECT 1"), ("b", "SELECT 2")]).unwrap();
        let mut names: Vec<&str> = registry.names().collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_registry_remove() {
        let mut registry = TemplateRegistry::new();
        registry.register("a", "SELECT 1").unwrap();

        let removed = registry.remove("a").expect("Should remove");
        assert_eq!(removed.name(), "a");
        assert!(!registry.contains("a"));
        assert!(registry.remove("a").is_none());
    }

    #[test]
    fn test_register_inline() {
        let mut registry = TemplateRegistry::new();
        registry.register_inline("recent", "SELECT 1").unwrap();
        assert!(registry.get("recent").unwrap().is_inline());
    }

    #[test]
    fn test_template_dependency_names() {
        let template = Template::new("q", "SELECT * FROM {{a}} JOIN {{b}} JOIN {{a}}");
        assert_eq!(template.dependency_names().unwrap(), vec!["a", "b"]);
        assert_eq!(template.references().unwrap().len(), 3);
    }
}
