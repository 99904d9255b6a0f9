//! Declarative schema of the `security_label` resource.

use serde::Serialize;

/// Resource kind registered with the host.
pub const RESOURCE_KIND: &str = "security_label";
/// Attribute holding the label provider name.
pub const LABEL_PROVIDER_ATTR: &str = "label_provider";
/// Attribute holding the label literal.
pub const LABEL_ATTR: &str = "label";
/// Attribute holding the object kind keyword.
pub const OBJECT_TYPE_ATTR: &str = "type";
/// Attribute holding the object name.
pub const OBJECT_NAME_ATTR: &str = "name";

/// Value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// Free-form string.
    String,
}

/// How existing resources are brought under management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStrategy {
    /// The supplied identity is stored as-is and populated by a later read.
    Passthrough,
}

/// Schema entry for one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSchema {
    /// Attribute name.
    pub name: &'static str,
    /// Attribute value type.
    #[serde(rename = "type")]
    pub value_type: AttributeType,
    /// Whether the attribute must be supplied.
    pub required: bool,
    /// Whether a change to the attribute replaces the resource.
    pub force_new: bool,
    /// Human-readable description.
    pub description: &'static str,
}

/// Full schema of the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSchema {
    /// Resource kind.
    pub kind: &'static str,
    /// Attributes in declaration order.
    pub attributes: Vec<AttributeSchema>,
    /// Import behaviour.
    pub import: ImportStrategy,
}

impl ResourceSchema {
    /// Names of attributes whose change forces replacement.
    pub fn force_new_attributes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes
            .iter()
            .filter(|attr| attr.force_new)
            .map(|attr| attr.name)
    }
}

const fn required_string(name: &'static str, description: &'static str) -> AttributeSchema {
    AttributeSchema {
        name,
        value_type: AttributeType::String,
        required: true,
        force_new: true,
        description,
    }
}

/// Build the `security_label` schema.
#[must_use]
pub fn security_label_schema() -> ResourceSchema {
    ResourceSchema {
        kind: RESOURCE_KIND,
        attributes: vec![
            required_string(
                LABEL_PROVIDER_ATTR,
                "The name of the provider with which this label is to be associated.",
            ),
            required_string(
                LABEL_ATTR,
                "The value of the security label, written as a string literal or NULL to drop it.",
            ),
            required_string(
                OBJECT_TYPE_ATTR,
                "The type of the object the label is attached to, for example ROLE or TABLE.",
            ),
            required_string(
                OBJECT_NAME_ATTR,
                "The name of the object to be labeled, schema-qualified where the type allows.",
            ),
        ],
        import: ImportStrategy::Passthrough,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_attribute_is_required_and_forces_replacement() {
        let schema = security_label_schema();
        assert_eq!(schema.kind, "security_label");
        assert_eq!(schema.attributes.len(), 4);
        for attr in &schema.attributes {
            assert!(attr.required, "{} should be required", attr.name);
            assert!(attr.force_new, "{} should force replacement", attr.name);
            assert!(!attr.description.is_empty());
        }
        assert_eq!(
            schema.force_new_attributes().collect::<Vec<_>>(),
            vec!["label_provider", "label", "type", "name"]
        );
    }

    #[test]
    fn schema_serialises_with_wire_names() -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(security_label_schema())?;
        assert_eq!(value["kind"], "security_label");
        assert_eq!(value["import"], "passthrough");
        assert_eq!(value["attributes"][2]["name"], "type");
        assert_eq!(value["attributes"][2]["type"], "string");
        assert_eq!(value["attributes"][2]["force_new"], true);
        Ok(())
    }
}
