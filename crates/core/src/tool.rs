//! Tool trait — the uniform capability interface the agent routes between.
//!
//! A tool takes a text query and returns a text observation. Tools never
//! fail from the agent's point of view: implementations return
//! `Result<String, ToolError>` from [`Tool::execute`], and the provided
//! [`Tool::invoke`] turns errors into observation text so the agent can
//! reason about them.

use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// The observation produced by one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// The observation text (including error text on failure)
    pub output: String,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn error(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "Train Schedule DB").
    fn name(&self) -> &str;

    /// What this tool is for. The agent's reasoning step chooses tools by
    /// reading these descriptions.
    fn description(&self) -> &str;

    /// Run the tool.
    async fn execute(&self, input: &str) -> Result<String, ToolError>;

    /// Run the tool and fold any error into observation text.
    async fn invoke(&self, input: &str) -> ToolResult {
        match self.execute(input).await {
            Ok(output) => ToolResult::ok(output),
            Err(e) => {
                warn!(tool = %self.name(), error = %e, "Tool returned an error observation");
                ToolResult::error(format!("Error: {e}"))
            }
        }
    }
}

/// A fixed set of uniquely named tools.
///
/// Built once, never mutated afterwards. Registration order is kept so the
/// reasoning prompt lists tools deterministically.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry from a list of tools. Fails on duplicate names.
    pub fn from_tools(tools: Vec<Box<dyn Tool>>) -> Result<Self, ToolError> {
        let mut by_name = HashMap::with_capacity(tools.len());
        for (i, tool) in tools.iter().enumerate() {
            if by_name.insert(tool.name().to_string(), i).is_some() {
                return Err(ToolError::DuplicateTool(tool.name().to_string()));
            }
        }
        Ok(Self { tools, by_name })
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.by_name.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// Whether a tool with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// `(name, description)` pairs, in registration order.
    pub fn descriptions(&self) -> Vec<(&str, &str)> {
        self.tools.iter().map(|t| (t.name(), t.description())).collect()
    }

    /// Invoke a tool by name. Unknown names yield an error observation.
    pub async fn invoke(&self, name: &str, input: &str) -> ToolResult {
        match self.get(name) {
            Some(tool) => tool.invoke(input).await,
            None => ToolResult::error(format!("Error: {}", ToolError::NotFound(name.to_string()))),
        }
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

    struct EchoTool(&'static str);

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        async fn execute(&self, input: &str) -> Result<String, ToolError> {
            Ok(input.to_string())
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        async fn execute(&self, _input: &str) -> Result<String, ToolError> {
            Err(ToolError::ExecutionFailed {
                tool_name: "broken".into(),
                reason: "store unreachable".into(),
            })
        }
    }

    #[test]
    fn registry_lookup_keeps_order() {
        let registry = ToolRegistry::from_tools(vec![
            Box::new(EchoTool("b")),
            Box::new(EchoTool("a")),
        ])
        .unwrap();
        assert!(registry.get("a").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.names(), vec!["b", "a"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let result = ToolRegistry::from_tools(vec![
            Box::new(EchoTool("echo")),
            Box::new(EchoTool("echo")),
        ]);
        assert!(matches!(result, Err(ToolError::DuplicateTool(name)) if name == "echo"));
    }

    #[tokio::test]
    async fn registry_invoke_tool() {
        let registry = ToolRegistry::from_tools(vec![Box::new(EchoTool("echo"))]).unwrap();
        let result = registry.invoke("echo", "hello world").await;
        assert!(result.success);
        assert_eq!(result.output, "hello world");
    }

    #[tokio::test]
    async fn tool_errors_become_observations() {
        let registry = ToolRegistry::from_tools(vec![Box::new(BrokenTool)]).unwrap();
        let result = registry.invoke("broken", "anything").await;
        assert!(!result.success);
        assert!(result.output.starts_with("Error:"));
        assert!(result.output.contains("store unreachable"));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_observation() {
        let registry = ToolRegistry::from_tools(vec![]).unwrap();
        let result = registry.invoke("nonexistent", "x").await;
        assert!(!result.success);
        assert!(result.output.contains("nonexistent"));
    }
}
