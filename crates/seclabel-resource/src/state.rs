//! Resource state exchanged with the host: an identity plus string attributes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ResourceError, ResourceResult};

/// Identity and attribute values of one resource instance.
///
/// An empty identity means the resource does not exist (or no longer exists)
/// from the host's point of view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

impl ResourceData {
    /// Empty resource data with no identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource data holding only an identity.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute assignment.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Recorded identity, empty when unset.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether an identity is recorded.
    #[must_use]
    pub const fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Record an identity.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Forget the identity, marking the resource as gone.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// Attribute value, if set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set an attribute value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    /// Attribute value, treating absent or blank values as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingAttribute`] when the attribute is absent or blank.
    pub fn require(&self, name: &'static str) -> ResourceResult<&str> {
        self.get(name)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ResourceError::MissingAttribute { attribute: name })
    }

    /// All attributes in name order.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_can_be_set_and_cleared() {
        let mut data = ResourceData::new();
        assert!(!data.has_id());
        data.set_id("skynet");
        assert_eq!(data.id(), "skynet");
        data.clear_id();
        assert!(!data.has_id());
        assert_eq!(data.id(), "");
    }

    #[test]
    fn require_rejects_absent_and_blank_values() {
        let data = ResourceData::new()
            .with_attribute("label", "   ")
            .with_attribute("type", "ROLE");
        assert!(matches!(
            data.require("label"),
            Err(ResourceError::MissingAttribute { attribute: "label" })
        ));
        assert!(matches!(
            data.require("name"),
            Err(ResourceError::MissingAttribute { attribute: "name" })
        ));
        assert_eq!(data.require("type").ok(), Some("ROLE"));
    }

    #[test]
    fn state_file_shape_round_trips() -> Result<(), serde_json::Error> {
        let json = r#"{"id":"skynet","attributes":{"label":"'MASKED'","type":"ROLE"}}"#;
        let data: ResourceData = serde_json::from_str(json)?;
        assert_eq!(data.id(), "skynet");
        assert_eq!(data.get("label"), Some("'MASKED'"));
        assert_eq!(serde_json::to_string(&data)?, json);
        Ok(())
    }

    #[test]
    fn missing_fields_default_to_empty() -> Result<(), serde_json::Error> {
        let data: ResourceData = serde_json::from_str("{}")?;
        assert_eq!(data, ResourceData::new());
        Ok(())
    }
}
