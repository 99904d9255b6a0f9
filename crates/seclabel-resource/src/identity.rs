//! External identity of a security label resource.
//!
//! Role labels use the rendered role name so that importing by role name
//! works. Every other kind is prefixed with its keyword, as in
//! `SCHEMA:audit` or `MATERIALIZED VIEW:reporting.daily`. The provider is not
//! part of the identity; reads filter by the provider recorded in state.

use std::fmt::{self, Display, Formatter};

use seclabel_data::{DataError, LabelTarget, ObjectKind, ObjectName};

use crate::error::{ResourceError, ResourceResult};

/// Parsed resource identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelIdentity {
    target: LabelTarget,
}

impl LabelIdentity {
    /// Identity of the label attached to `target`.
    #[must_use]
    pub const fn new(target: LabelTarget) -> Self {
        Self { target }
    }

    /// Parse an identity recorded in state or supplied on import.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidIdentity`] when the kind prefix names an
    /// unsupported kind or the name is malformed for its kind.
    pub fn parse(value: &str) -> ResourceResult<Self> {
        let invalid = |source: DataError| ResourceError::InvalidIdentity {
            value: value.to_string(),
            source,
        };

        let (kind, name) = match value.split_once(':') {
            Some((prefix, rest)) => match prefix.parse::<ObjectKind>() {
                Ok(kind) => (kind, rest),
                Err(err @ DataError::UnsupportedObjectType { .. }) => return Err(invalid(err)),
                // Quoted role names may contain a colon.
                Err(_) => (ObjectKind::Role, value),
            },
            None => (ObjectKind::Role, value),
        };

        let name = ObjectName::parse(name).map_err(invalid)?;
        let target = LabelTarget::new(kind, name).map_err(invalid)?;
        Ok(Self { target })
    }

    /// Labelled object.
    #[must_use]
    pub const fn target(&self) -> &LabelTarget {
        &self.target
    }

    /// Consume the identity, yielding the labelled object.
    #[must_use]
    pub fn into_target(self) -> LabelTarget {
        self.target
    }
}

impl Display for LabelIdentity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self.target.kind() {
            ObjectKind::Role => write!(formatter, "{}", self.target.name()),
            kind => write!(formatter, "{}:{}", kind.keyword(), self.target.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(kind: &str, name: &str) -> ResourceResult<LabelIdentity> {
        let target = LabelTarget::parse(kind, name).map_err(|source| {
            ResourceError::InvalidIdentity {
                value: name.to_string(),
                source,
            }
        })?;
        Ok(LabelIdentity::new(target))
    }

    #[test]
    fn role_identity_is_the_bare_role_name() -> ResourceResult<()> {
        let id = identity("ROLE", "skynet")?;
        assert_eq!(id.to_string(), "skynet");

        let parsed = LabelIdentity::parse("skynet")?;
        assert_eq!(parsed, id);
        assert_eq!(parsed.target().kind(), ObjectKind::Role);
        Ok(())
    }

    #[test]
    fn other_kinds_carry_a_keyword_prefix() -> ResourceResult<()> {
        let schema = identity("SCHEMA", "audit")?;
        assert_eq!(schema.to_string(), "SCHEMA:audit");
        assert_eq!(LabelIdentity::parse("SCHEMA:audit")?, schema);

        let view = identity("materialized view", "reporting.daily")?;
        assert_eq!(view.to_string(), "MATERIALIZED VIEW:reporting.daily");
        assert_eq!(
            LabelIdentity::parse("MATERIALIZED VIEW:reporting.daily")?,
            view
        );
        Ok(())
    }

    #[test]
    fn explicit_role_prefix_is_accepted() -> ResourceResult<()> {
        let parsed = LabelIdentity::parse("ROLE:skynet")?;
        assert_eq!(parsed.to_string(), "skynet");
        Ok(())
    }

    #[test]
    fn quoted_role_names_survive_round_trip() -> ResourceResult<()> {
        let id = identity("ROLE", "\"Sky:Net\"")?;
        assert_eq!(id.to_string(), "\"Sky:Net\"");
        assert_eq!(LabelIdentity::parse(&id.to_string())?, id);
        Ok(())
    }

    #[test]
    fn unsupported_kinds_are_rejected() {
        let err = LabelIdentity::parse("FUNCTION:public.mask");
        assert!(matches!(
            err,
            Err(ResourceError::InvalidIdentity {
                source: DataError::UnsupportedObjectType { .. },
                ..
            })
        ));
    }

    #[test]
    fn qualified_role_names_are_rejected() {
        assert!(LabelIdentity::parse("public.skynet").is_err());
    }
}
