//! Artifact handles.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ArtifactId;
use crate::utils::Timestamp;

/// An immutable handle to a unit of pipeline data.
///
/// Only identity and descriptive metadata are carried; the payload behind
/// `uri` is never read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Store-assigned identity.
    pub id: ArtifactId,

    /// The artifact type (e.g., "Examples", "ExampleStatistics").
    #[serde(rename = "type")]
    pub type_name: String,

    /// Location of the payload, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Custom properties.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, serde_json::Value>,

    /// When the store created the artifact.
    #[serde(rename = "create_time_since_epoch", with = "chrono::serde::ts_milliseconds")]
    pub created_at: Timestamp,
}

impl Artifact {
    /// Creates a new artifact handle.
    #[must_use]
    pub fn new(id: ArtifactId, type_name: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            uri: None,
            properties: HashMap::new(),
            created_at,
        }
    }

    /// Sets the payload URI.
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Adds a custom property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::from_epoch_millis;

    #[test]
    fn test_artifact_builder() {
        let artifact = Artifact::new(ArtifactId::new(1), "Examples", from_epoch_millis(0).unwrap())
            .with_uri("/pipelines/p/ExampleGen/examples/1")
            .with_property("span", serde_json::json!(3));

        assert_eq!(artifact.type_name, "Examples");
        assert_eq!(artifact.properties.get("span"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn test_artifact_wire_names() {
        let artifact = Artifact::new(ArtifactId::new(9), "Model", from_epoch_millis(1500).unwrap());
        let json = serde_json::to_value(&artifact).unwrap();

        assert_eq!(json["type"], "Model");
        assert_eq!(json["create_time_since_epoch"], 1500);
        assert!(json.get("uri").is_none());
    }
}
