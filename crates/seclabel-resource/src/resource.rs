//! Create/read/delete/exists/import lifecycle of a security label.

use seclabel_data::quote::{quote_ident, quote_literal};
use seclabel_data::{
    DataError, LabelRow, LabelTarget, ObjectKind, ObjectName, ProviderName, assign_statement,
    clear_statement,
};
use tracing::{debug, info, instrument, warn};

use crate::binding::SecurityLabelBinding;
use crate::error::{ResourceError, ResourceResult};
use crate::identity::LabelIdentity;
use crate::schema::{
    LABEL_ATTR, LABEL_PROVIDER_ATTR, OBJECT_NAME_ATTR, OBJECT_TYPE_ATTR, ResourceSchema,
    security_label_schema,
};
use crate::state::ResourceData;
use crate::store::LabelStore;

fn store_err(operation: &'static str) -> impl FnOnce(DataError) -> ResourceError {
    move |source| ResourceError::Store { operation, source }
}

/// Lifecycle handler for the `security_label` resource.
///
/// Every attribute forces replacement, so there is no update transition:
/// the host deletes and re-creates the label instead.
#[derive(Debug, Clone)]
pub struct SecurityLabelResource<S> {
    store: S,
}

impl<S: LabelStore> SecurityLabelResource<S> {
    /// Build a handler over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Declarative schema of the resource.
    #[must_use]
    pub fn schema() -> ResourceSchema {
        security_label_schema()
    }

    /// Assign the configured label, then read it back.
    ///
    /// The identity is recorded only once the read-back finds the label.
    ///
    /// # Errors
    ///
    /// Returns attribute errors for invalid input, [`ResourceError::Store`]
    /// when the statement or the read-back fails, and
    /// [`ResourceError::NotFoundAfterCreate`] when the label is not visible
    /// after a successful statement (as happens when assigning `NULL`).
    #[instrument(name = "security_label.create", skip_all)]
    pub async fn create(&self, data: &mut ResourceData) -> ResourceResult<()> {
        let binding = SecurityLabelBinding::from_data(data)?;
        let statement = assign_statement(binding.provider(), binding.target(), binding.label());
        self.store
            .apply(&statement)
            .await
            .map_err(store_err("create security label"))?;

        let identity = binding.identity();
        let row = self
            .store
            .fetch(identity.target(), Some(binding.provider()))
            .await
            .map_err(store_err("read security label"))?;
        let Some(row) = row else {
            return Err(ResourceError::NotFoundAfterCreate {
                object: binding.target().to_string(),
            });
        };

        populate(data, identity.target(), &row);
        data.set_id(identity.to_string());
        info!(id = %data.id(), "security label created");
        Ok(())
    }

    /// Refresh state from the catalog.
    ///
    /// A missing label is not an error: the identity is cleared so the host
    /// plans a re-create. Without mutation in between, two reads leave the
    /// data identical.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidIdentity`] for an unparseable identity
    /// and [`ResourceError::Store`] when the catalog query fails.
    #[instrument(name = "security_label.read", skip_all, fields(id = %data.id()))]
    pub async fn read(&self, data: &mut ResourceData) -> ResourceResult<()> {
        if !data.has_id() {
            warn!("security label has no identity; removing from state");
            return Ok(());
        }

        let identity = LabelIdentity::parse(data.id())?;
        let provider = state_provider(data)?;
        let row = self
            .store
            .fetch(identity.target(), provider.as_ref())
            .await
            .map_err(store_err("read security label"))?;

        match row {
            Some(row) => {
                debug!(object = %row.object_name, provider = %row.provider, "security label found");
                populate(data, identity.target(), &row);
                Ok(())
            }
            None => {
                warn!("security label not found; removing from state");
                data.clear_id();
                Ok(())
            }
        }
    }

    /// Clear the label by assigning `NULL`.
    ///
    /// # Errors
    ///
    /// Returns attribute errors for invalid state and [`ResourceError::Store`]
    /// when the statement fails.
    #[instrument(name = "security_label.delete", skip_all, fields(id = %data.id()))]
    pub async fn delete(&self, data: &ResourceData) -> ResourceResult<()> {
        let binding = SecurityLabelBinding::from_data(data)?;
        let statement = clear_statement(binding.provider(), binding.target());
        self.store
            .apply(&statement)
            .await
            .map_err(store_err("delete security label"))?;
        info!("security label cleared");
        Ok(())
    }

    /// Report whether the object currently carries a label.
    ///
    /// Uses the `type` and `name` attributes when both are present and falls
    /// back to the identity otherwise. With neither, the label does not exist.
    ///
    /// # Errors
    ///
    /// Returns parse errors for malformed state and [`ResourceError::Store`]
    /// when the catalog query fails.
    #[instrument(name = "security_label.exists", skip_all, fields(id = %data.id()))]
    pub async fn exists(&self, data: &ResourceData) -> ResourceResult<bool> {
        let Some(target) = state_target(data)? else {
            debug!("no object recorded in state");
            return Ok(false);
        };
        self.store
            .exists(&target)
            .await
            .map_err(store_err("check security label"))
    }

    /// Bring an existing label under management.
    ///
    /// The identity is stored unchanged and validated by the following read.
    #[allow(clippy::unused_self)]
    #[instrument(name = "security_label.import", skip(self))]
    pub fn import(&self, id: &str) -> ResourceData {
        ResourceData::with_id(id)
    }
}

/// Copy the observed label into state.
///
/// The row was found through `target`, so a configured `name` already names
/// the same object and keeps its spelling. Only state without a name (an
/// import) takes it from the identity, which keeps `name` and the identity in
/// agreement whatever the session's `search_path`.
fn populate(data: &mut ResourceData, target: &LabelTarget, row: &LabelRow) {
    data.set(LABEL_PROVIDER_ATTR, quote_ident(&row.provider));
    data.set(LABEL_ATTR, quote_literal(&row.label));
    data.set(OBJECT_TYPE_ATTR, target.kind().keyword());
    if present(data, OBJECT_NAME_ATTR).is_none() {
        data.set(OBJECT_NAME_ATTR, target.name().render());
    }
}

fn present<'a>(data: &'a ResourceData, attribute: &str) -> Option<&'a str> {
    data.get(attribute).filter(|value| !value.trim().is_empty())
}

fn state_provider(data: &ResourceData) -> ResourceResult<Option<ProviderName>> {
    present(data, LABEL_PROVIDER_ATTR)
        .map(|value| {
            ProviderName::parse(value).map_err(|source| ResourceError::InvalidAttribute {
                attribute: LABEL_PROVIDER_ATTR,
                source,
            })
        })
        .transpose()
}

fn state_target(data: &ResourceData) -> ResourceResult<Option<LabelTarget>> {
    if let (Some(kind), Some(name)) = (
        present(data, OBJECT_TYPE_ATTR),
        present(data, OBJECT_NAME_ATTR),
    ) {
        let kind = kind
            .parse::<ObjectKind>()
            .map_err(|source| ResourceError::InvalidAttribute {
                attribute: OBJECT_TYPE_ATTR,
                source,
            })?;
        let target = ObjectName::parse(name)
            .and_then(|name| LabelTarget::new(kind, name))
            .map_err(|source| ResourceError::InvalidAttribute {
                attribute: OBJECT_NAME_ATTR,
                source,
            })?;
        return Ok(Some(target));
    }
    if data.has_id() {
        return Ok(Some(LabelIdentity::parse(data.id())?.into_target()));
    }
    Ok(None)
}
