//! Per-session tool registry
//!
//! The registry is the local record of which tools the agent has agreed to.
//! It is updated only after the relay has bound handlers and announced the
//! change, so it never runs ahead of the remote side.

use thiserror::Error;

use crate::types::ToolDefinition;

/// Registry precondition failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool {0} is already registered")]
    DuplicateTool(String),

    #[error("Tool {0} is not registered")]
    UnknownTool(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Ordered name → tool mapping with unique names
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list, rejecting duplicate names
    pub fn from_tools(tools: impl IntoIterator<Item = ToolDefinition>) -> RegistryResult<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.add(tool)?;
        }
        Ok(registry)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tools.iter().position(|t| t.name == name)
    }

    /// Fail with `DuplicateTool` if `name` is present
    pub fn ensure_absent(&self, name: &str) -> RegistryResult<()> {
        if self.contains(name) {
            return Err(RegistryError::DuplicateTool(name.to_string()));
        }
        Ok(())
    }

    /// Fail with `UnknownTool` if `name` is absent
    pub fn ensure_present(&self, name: &str) -> RegistryResult<()> {
        if !self.contains(name) {
            return Err(RegistryError::UnknownTool(name.to_string()));
        }
        Ok(())
    }

    /// Insert a new tool
    pub fn add(&mut self, tool: ToolDefinition) -> RegistryResult<()> {
        self.ensure_absent(&tool.name)?;
        self.tools.push(tool);
        Ok(())
    }

    /// Replace an existing tool in place, keeping its position
    pub fn update(&mut self, tool: ToolDefinition) -> RegistryResult<()> {
        let pos = self
            .position(&tool.name)
            .ok_or_else(|| RegistryError::UnknownTool(tool.name.clone()))?;
        self.tools[pos] = tool;
        Ok(())
    }

    /// Remove a tool and return it
    pub fn remove(&mut self, name: &str) -> RegistryResult<ToolDefinition> {
        let pos = self
            .position(name)
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;
        Ok(self.tools.remove(pos))
    }

    /// Replace the whole mapping.
    ///
    /// The only failure is a duplicate name inside `tools`, in which case the
    /// registry is left untouched.
    pub fn replace_all(&mut self, tools: impl IntoIterator<Item = ToolDefinition>) -> RegistryResult<()> {
        *self = Self::from_tools(tools)?;
        Ok(())
    }

    /// Remove every tool, returning what was registered
    pub fn clear(&mut self) -> Vec<ToolDefinition> {
        std::mem::take(&mut self.tools)
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Tools in insertion order
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn tool(name: &str) -> ToolDefinition {
        ToolDefinition::from_fn(name, "test tool", |_inv| async { Ok(String::new()) })
    }

    #[test]
    fn test_add_and_duplicate() {
        let mut registry = ToolRegistry::new();
        registry.add(tool("get_weather")).unwrap();

        let err = registry.add(tool("get_weather")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("get_weather".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_update_keeps_position() {
        let mut registry = ToolRegistry::from_tools([tool("a"), tool("b"), tool("c")]).unwrap();
        registry.update(tool("b").with_timeout(30.0)).unwrap();

        assert_eq!(registry.names(), vec!["a", "b", "c"]);
        assert_eq!(registry.get("b").map(|t| t.timeout_secs), Some(30.0));
    }

    #[test]
    fn test_update_and_remove_unknown() {
        let mut registry = ToolRegistry::new();
        assert_eq!(
            registry.update(tool("missing")).unwrap_err(),
            RegistryError::UnknownTool("missing".to_string())
        );
        assert_eq!(
            registry.remove("missing").unwrap_err(),
            RegistryError::UnknownTool("missing".to_string())
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_replace_all() {
        let mut registry = ToolRegistry::from_tools([tool("a"), tool("b")]).unwrap();
        registry.replace_all([tool("b"), tool("c")]).unwrap();
        assert_eq!(registry.names(), vec!["b", "c"]);
        assert!(!registry.contains("a"));
    }

    #[test]
    fn test_replace_all_rejects_duplicates() {
        let mut registry = ToolRegistry::from_tools([tool("a")]).unwrap();
        let err = registry.replace_all([tool("x"), tool("x")]).unwrap_err();

        assert_eq!(err, RegistryError::DuplicateTool("x".to_string()));
        assert_eq!(registry.names(), vec!["a"]);
    }

    #[test]
    fn test_key_set_tracks_adds_and_removes() {
        let mut registry = ToolRegistry::new();
        let mut expected = BTreeSet::new();

        let ops: &[(&str, bool)] = &[
            ("a", true),
            ("b", true),
            ("c", true),
            ("b", false),
            ("d", true),
            ("a", false),
            ("b", true),
        ];

        for (name, is_add) in ops {
            if *is_add {
                registry.add(tool(name)).unwrap();
                expected.insert(name.to_string());
            } else {
                registry.remove(name).unwrap();
                expected.remove(*name);
            }
            let actual: BTreeSet<String> = registry.names().into_iter().collect();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_clear_returns_tools() {
        let mut registry = ToolRegistry::from_tools([tool("a"), tool("b")]).unwrap();
        let removed = registry.clear();
        assert_eq!(removed.len(), 2);
        assert!(registry.is_empty());
    }
}
