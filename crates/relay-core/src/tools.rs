//! Tool descriptors — the discoverable surface of the tool backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One entry in the tool backend's listing.
///
/// Feeds both the `/tools` endpoint and the routing prompt. `parameters`
/// is a flat name → type-description map (e.g. `city → string`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Registry name (e.g. `get_weather`).
    pub name: String,
    /// One-line description shown to the routing model.
    pub description: String,
    /// Argument schema: parameter name → expected type.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ToolDescriptor {
    /// Build a descriptor from name, description, and parameter pairs.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: &[(&str, &str)],
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: parameters
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}
