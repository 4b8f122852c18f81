use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured record of an action the agent took before producing text.
///
/// Tool calls arrive as `thinking` events while streaming, or as
/// `function_call` parts in stored session events, and are displayed as the
/// "thinking steps" of the AI message that follows them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Name of the function the agent invoked.
    #[serde(alias = "name")]
    pub function_name: String,

    /// Arguments the function was invoked with.
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl ToolCall {
    /// Creates a tool call with the given name and arguments.
    pub fn new(function_name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            function_name: function_name.into(),
            args,
        }
    }

    /// Creates a tool call that carries no arguments.
    pub fn named(function_name: impl Into<String>) -> Self {
        Self::new(function_name, Map::new())
    }

    /// A short human-readable label, e.g. `search_facebook_ads(query, limit)`.
    pub fn summary(&self) -> String {
        let keys: Vec<&str> = self.args.keys().map(String::as_str).collect();
        format!("{}({})", self.function_name, keys.join(", "))
    }
}
