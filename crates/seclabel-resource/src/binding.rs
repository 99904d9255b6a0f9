//! Typed view of the four configured attributes.

use seclabel_data::{LabelTarget, LabelValue, ObjectKind, ObjectName, ProviderName};

use crate::error::{ResourceError, ResourceResult};
use crate::identity::LabelIdentity;
use crate::schema::{
    LABEL_ATTR, LABEL_PROVIDER_ATTR, OBJECT_NAME_ATTR, OBJECT_TYPE_ATTR, security_label_schema,
};
use crate::state::ResourceData;

/// A provider's label on one object, as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityLabelBinding {
    provider: ProviderName,
    label: LabelValue,
    target: LabelTarget,
}

impl SecurityLabelBinding {
    /// Validate and type the configured attributes.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingAttribute`] when any attribute is absent
    /// and [`ResourceError::InvalidAttribute`] when one fails to parse.
    pub fn from_data(data: &ResourceData) -> ResourceResult<Self> {
        let provider = ProviderName::parse(data.require(LABEL_PROVIDER_ATTR)?)
            .map_err(invalid(LABEL_PROVIDER_ATTR))?;
        let label = LabelValue::parse(data.require(LABEL_ATTR)?).map_err(invalid(LABEL_ATTR))?;
        let kind = data
            .require(OBJECT_TYPE_ATTR)?
            .parse::<ObjectKind>()
            .map_err(invalid(OBJECT_TYPE_ATTR))?;
        let name =
            ObjectName::parse(data.require(OBJECT_NAME_ATTR)?).map_err(invalid(OBJECT_NAME_ATTR))?;
        let target = LabelTarget::new(kind, name).map_err(invalid(OBJECT_NAME_ATTR))?;

        Ok(Self {
            provider,
            label,
            target,
        })
    }

    /// Label provider.
    #[must_use]
    pub const fn provider(&self) -> &ProviderName {
        &self.provider
    }

    /// Configured label.
    #[must_use]
    pub const fn label(&self) -> &LabelValue {
        &self.label
    }

    /// Labelled object.
    #[must_use]
    pub const fn target(&self) -> &LabelTarget {
        &self.target
    }

    /// Identity under which the binding is recorded.
    #[must_use]
    pub fn identity(&self) -> LabelIdentity {
        LabelIdentity::new(self.target.clone())
    }
}

fn invalid(attribute: &'static str) -> impl FnOnce(seclabel_data::DataError) -> ResourceError {
    move |source| ResourceError::InvalidAttribute { attribute, source }
}

/// List the attributes whose change between `prior` and `proposed` forces
/// replacement of the resource, in schema order.
///
/// Values are compared after parsing, so `'MASKED'` and `MASKED`, or `ROLE`
/// and `role`, are the same value. Names compare part by part as written:
/// `customers` and `public.customers` differ even when `search_path` makes
/// them the same table.
///
/// # Errors
///
/// Returns an error when either side fails validation.
pub fn replacement_reasons(
    prior: &ResourceData,
    proposed: &ResourceData,
) -> ResourceResult<Vec<&'static str>> {
    let before = SecurityLabelBinding::from_data(prior)?;
    let after = SecurityLabelBinding::from_data(proposed)?;

    let changed = |attribute: &str| match attribute {
        LABEL_PROVIDER_ATTR => before.provider != after.provider,
        LABEL_ATTR => before.label != after.label,
        OBJECT_TYPE_ATTR => before.target.kind() != after.target.kind(),
        OBJECT_NAME_ATTR => before.target.name() != after.target.name(),
        _ => false,
    };
    Ok(security_label_schema()
        .force_new_attributes()
        .filter(|attribute| changed(attribute))
        .collect())
}
