// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent command construction

use mj_adapters::CommandSpec;
use mj_storage::PROMPT_FILE;
use std::collections::BTreeMap;
use std::path::Path;

/// Maps model names to the CLI tool that serves them.
///
/// Lookup order: exact model name, then longest matching prefix, then the
/// default tool (logged as a warning).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMap {
    exact: BTreeMap<String, String>,
    prefixes: Vec<(String, String)>,
    default_tool: String,
}

impl Default for ModelMap {
    fn default() -> Self {
        Self::empty("gemini")
            .with_model("claude-opus-4", "claude")
            .with_model("claude-sonnet-4", "claude")
            .with_model("gemini-2.5-pro", "gemini")
            .with_model("gemini-2.5-flash", "gemini")
            .with_prefix("claude", "claude")
            .with_prefix("gemini", "gemini")
    }
}

impl ModelMap {
    /// A map with no rules; every model resolves to `default_tool`.
    pub fn empty(default_tool: impl Into<String>) -> Self {
        Self {
            exact: BTreeMap::new(),
            prefixes: Vec::new(),
            default_tool: default_tool.into(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>, tool: impl Into<String>) -> Self {
        self.exact.insert(model.into(), tool.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, tool: impl Into<String>) -> Self {
        self.prefixes.push((prefix.into(), tool.into()));
        self
    }

    pub fn with_default_tool(mut self, tool: impl Into<String>) -> Self {
        self.default_tool = tool.into();
        self
    }

    pub fn default_tool(&self) -> &str {
        &self.default_tool
    }

    /// Tool for `model`, or `None` if only the default would apply.
    pub fn lookup(&self, model: &str) -> Option<&str> {
        if let Some(tool) = self.exact.get(model) {
            return Some(tool.as_str());
        }
        self.prefixes
            .iter()
            .filter(|(prefix, _)| model.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, tool)| tool.as_str())
    }

    pub fn tool_for(&self, model: &str) -> &str {
        match self.lookup(model) {
            Some(tool) => tool,
            None => {
                tracing::warn!(
                    model,
                    default_tool = %self.default_tool,
                    "unknown model, using default tool"
                );
                &self.default_tool
            }
        }
    }
}

/// Build the agent invocation for one job.
///
/// `<tool> --print @prompt.md --verbose --output-format stream-json
/// --model <model> [--disallowedTools <tools>]`, run inside `workspace`.
pub fn agent_command(
    models: &ModelMap,
    model: &str,
    disallowed_tools: Option<&str>,
    workspace: &Path,
) -> CommandSpec {
    let spec = CommandSpec::new(models.tool_for(model), workspace).args([
        "--print".to_string(),
        format!("@{PROMPT_FILE}"),
        "--verbose".to_string(),
        "--output-format".to_string(),
        "stream-json".to_string(),
        "--model".to_string(),
        model.to_string(),
    ]);
    match disallowed_tools.filter(|t| !t.is_empty()) {
        Some(tools) => spec.args(["--disallowedTools", tools]),
        None => spec,
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
