//! Object kinds that can carry a security label, their names, and the catalog
//! queries used to read labels back.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::{DataError, Result};
use crate::quote::{parse_identifier_parts, quote_ident};

/// Capabilities every labelled object kind provides.
pub trait CatalogTarget {
    /// Keyword used after `ON` in a `SECURITY LABEL` statement.
    fn describe(&self) -> &'static str;

    /// Catalog query returning `provider, label, object_name`.
    ///
    /// `$1` is the lookup key and `$2` an optional provider filter.
    fn catalog_query(&self) -> &'static str;

    /// Whether names of this kind may be schema-qualified.
    fn qualified(&self) -> bool;

    /// Whether labels for this kind live in the cluster-wide `pg_shseclabel`.
    fn shared(&self) -> bool;
}

/// Object kinds managed by the security label resource.
///
/// Functions, procedures, and routines need an argument signature to be
/// addressed and are rejected along with the other kinds listed in
/// [`ObjectKind::UNSUPPORTED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// `ROLE`
    Role,
    /// `DATABASE`
    Database,
    /// `TABLESPACE`
    Tablespace,
    /// `SCHEMA`
    Schema,
    /// `TABLE` (ordinary and partitioned)
    Table,
    /// `VIEW`
    View,
    /// `MATERIALIZED VIEW`
    MaterializedView,
    /// `FOREIGN TABLE`
    ForeignTable,
    /// `SEQUENCE`
    Sequence,
    /// `TYPE` (any non-domain type)
    Type,
    /// `DOMAIN`
    Domain,
}

impl ObjectKind {
    /// Every supported kind.
    pub const ALL: [Self; 11] = [
        Self::Role,
        Self::Database,
        Self::Tablespace,
        Self::Schema,
        Self::Table,
        Self::View,
        Self::MaterializedView,
        Self::ForeignTable,
        Self::Sequence,
        Self::Type,
        Self::Domain,
    ];

    /// Valid `SECURITY LABEL` targets that this resource does not manage.
    pub const UNSUPPORTED: [&'static str; 11] = [
        "AGGREGATE",
        "COLUMN",
        "EVENT TRIGGER",
        "FUNCTION",
        "LANGUAGE",
        "LARGE OBJECT",
        "PROCEDURAL LANGUAGE",
        "PROCEDURE",
        "PUBLICATION",
        "ROUTINE",
        "SUBSCRIPTION",
    ];

    /// Keyword rendered into statements and reported on read.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Role => "ROLE",
            Self::Database => "DATABASE",
            Self::Tablespace => "TABLESPACE",
            Self::Schema => "SCHEMA",
            Self::Table => "TABLE",
            Self::View => "VIEW",
            Self::MaterializedView => "MATERIALIZED VIEW",
            Self::ForeignTable => "FOREIGN TABLE",
            Self::Sequence => "SEQUENCE",
            Self::Type => "TYPE",
            Self::Domain => "DOMAIN",
        }
    }
}

impl CatalogTarget for ObjectKind {
    fn describe(&self) -> &'static str {
        self.keyword()
    }

    fn catalog_query(&self) -> &'static str {
        match self {
            Self::Role => ROLE_LABEL_QUERY,
            Self::Database => DATABASE_LABEL_QUERY,
            Self::Tablespace => TABLESPACE_LABEL_QUERY,
            Self::Schema => SCHEMA_LABEL_QUERY,
            Self::Table => TABLE_LABEL_QUERY,
            Self::View => VIEW_LABEL_QUERY,
            Self::MaterializedView => MATERIALIZED_VIEW_LABEL_QUERY,
            Self::ForeignTable => FOREIGN_TABLE_LABEL_QUERY,
            Self::Sequence => SEQUENCE_LABEL_QUERY,
            Self::Type => TYPE_LABEL_QUERY,
            Self::Domain => DOMAIN_LABEL_QUERY,
        }
    }

    fn qualified(&self) -> bool {
        matches!(
            self,
            Self::Table
                | Self::View
                | Self::MaterializedView
                | Self::ForeignTable
                | Self::Sequence
                | Self::Type
                | Self::Domain
        )
    }

    fn shared(&self) -> bool {
        matches!(self, Self::Role | Self::Database | Self::Tablespace)
    }
}

impl Display for ObjectKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.describe())
    }
}

impl FromStr for ObjectKind {
    type Err = DataError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        if let Some(kind) = Self::ALL
            .into_iter()
            .find(|kind| kind.keyword() == normalized)
        {
            return Ok(kind);
        }
        if Self::UNSUPPORTED.contains(&normalized.as_str()) {
            return Err(DataError::UnsupportedObjectType { kind: normalized });
        }
        Err(DataError::InvalidObjectType {
            value: value.to_string(),
        })
    }
}

/// A parsed, possibly schema-qualified object name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName {
    parts: Vec<String>,
}

impl ObjectName {
    /// Parse a name as written in SQL (`skynet`, `"Sky Net"`, `public.accounts`).
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidIdentifier`] when any part is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self {
            parts: parse_identifier_parts("name", text)?,
        })
    }

    /// Unquoted name parts, outermost first.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Render the name with every part quoted as required.
    #[must_use]
    pub fn render(&self) -> String {
        self.parts
            .iter()
            .map(|part| quote_ident(part))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Display for ObjectName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.render())
    }
}

/// An object kind paired with a name valid for that kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelTarget {
    kind: ObjectKind,
    name: ObjectName,
}

impl LabelTarget {
    /// Pair a kind with a name, checking the name's shape against the kind.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::QualifiedNameNotAllowed`] when a schema-qualified
    /// name is given for a kind without schemas, and
    /// [`DataError::InvalidIdentifier`] when a qualified name has more than
    /// two parts.
    pub fn new(kind: ObjectKind, name: ObjectName) -> Result<Self> {
        let parts = name.parts().len();
        if !kind.qualified() && parts > 1 {
            return Err(DataError::QualifiedNameNotAllowed {
                kind: kind.keyword(),
                value: name.render(),
            });
        }
        if parts > 2 {
            return Err(DataError::InvalidIdentifier {
                field: "name",
                value: name.render(),
                reason: "names may have at most a schema and an object part",
            });
        }
        Ok(Self { kind, name })
    }

    /// Parse a kind keyword and a name.
    ///
    /// # Errors
    ///
    /// Returns an error when either the kind or the name is invalid.
    pub fn parse(kind: &str, name: &str) -> Result<Self> {
        Self::new(kind.parse()?, ObjectName::parse(name)?)
    }

    /// Object kind.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Object name.
    #[must_use]
    pub const fn name(&self) -> &ObjectName {
        &self.name
    }

    /// Value bound as `$1` in the kind's catalog query.
    ///
    /// Catalog name columns hold raw names, while `to_regclass`/`to_regtype`
    /// expect SQL syntax.
    #[must_use]
    pub fn lookup_key(&self) -> String {
        if self.kind.qualified() {
            self.name.render()
        } else {
            self.name.parts().concat()
        }
    }
}

impl Display for LabelTarget {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} {}", self.kind.describe(), self.name)
    }
}

const ROLE_LABEL_QUERY: &str = r"
    SELECT label.provider, label.label, roles.rolname::text AS object_name
    FROM pg_roles roles
    INNER JOIN pg_shseclabel label
        ON roles.oid = label.objoid
       AND label.classoid = 'pg_authid'::regclass
    WHERE roles.rolname = $1::name
      AND ($2::text IS NULL OR label.provider = $2::text)
    ORDER BY label.provider
    LIMIT 1
";

const DATABASE_LABEL_QUERY: &str = r"
    SELECT label.provider, label.label, db.datname::text AS object_name
    FROM pg_database db
    INNER JOIN pg_shseclabel label
        ON db.oid = label.objoid
       AND label.classoid = 'pg_database'::regclass
    WHERE db.datname = $1::name
      AND ($2::text IS NULL OR label.provider = $2::text)
    ORDER BY label.provider
    LIMIT 1
";

const TABLESPACE_LABEL_QUERY: &str = r"
    SELECT label.provider, label.label, spc.spcname::text AS object_name
    FROM pg_tablespace spc
    INNER JOIN pg_shseclabel label
        ON spc.oid = label.objoid
       AND label.classoid = 'pg_tablespace'::regclass
    WHERE spc.spcname = $1::name
      AND ($2::text IS NULL OR label.provider = $2::text)
    ORDER BY label.provider
    LIMIT 1
";

const SCHEMA_LABEL_QUERY: &str = r"
    SELECT label.provider, label.label, nsp.nspname::text AS object_name
    FROM pg_namespace nsp
    INNER JOIN pg_seclabel label
        ON nsp.oid = label.objoid
       AND label.classoid = 'pg_namespace'::regclass
       AND label.objsubid = 0
    WHERE nsp.nspname = $1::name
      AND ($2::text IS NULL OR label.provider = $2::text)
    ORDER BY label.provider
    LIMIT 1
";

const TABLE_LABEL_QUERY: &str = r"
    SELECT label.provider, label.label, format('%I.%I', nsp.nspname, rel.relname) AS object_name
    FROM pg_class rel
    INNER JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace
    INNER JOIN pg_seclabel label
        ON rel.oid = label.objoid
       AND label.classoid = 'pg_class'::regclass
       AND label.objsubid = 0
    WHERE rel.oid = to_regclass($1::text)
      AND rel.relkind IN ('r', 'p')
      AND ($2::text IS NULL OR label.provider = $2::text)
    ORDER BY label.provider
    LIMIT 1
";

const VIEW_LABEL_QUERY: &str = r"
    SELECT label.provider, label.label, format('%I.%I', nsp.nspname, rel.relname) AS object_name
    FROM pg_class rel
    INNER JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace
    INNER JOIN pg_seclabel label
        ON rel.oid = label.objoid
       AND label.classoid = 'pg_class'::regclass
       AND label.objsubid = 0
    WHERE rel.oid = to_regclass($1::text)
      AND rel.relkind = 'v'
      AND ($2::text IS NULL OR label.provider = $2::text)
    ORDER BY label.provider
    LIMIT 1
";

const MATERIALIZED_VIEW_LABEL_QUERY: &str = r"
    SELECT label.provider, label.label, format('%I.%I', nsp.nspname, rel.relname) AS object_name
    FROM pg_class rel
    INNER JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace
    INNER JOIN pg_seclabel label
        ON rel.oid = label.objoid
       AND label.classoid = 'pg_class'::regclass
       AND label.objsubid = 0
    WHERE rel.oid = to_regclass($1::text)
      AND rel.relkind = 'm'
      AND ($2::text IS NULL OR label.provider = $2::text)
    ORDER BY label.provider
    LIMIT 1
";

const FOREIGN_TABLE_LABEL_QUERY: &str = r"
    SELECT label.provider, label.label, format('%I.%I', nsp.nspname, rel.relname) AS object_name
    FROM pg_class rel
    INNER JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace
    INNER JOIN pg_seclabel label
        ON rel.oid = label.objoid
       AND label.classoid = 'pg_class'::regclass
       AND label.objsubid = 0
    WHERE rel.oid = to_regclass($1::text)
      AND rel.relkind = 'f'
      AND ($2::text IS NULL OR label.provider = $2::text)
    ORDER BY label.provider
    LIMIT 1
";

const SEQUENCE_LABEL_QUERY: &str = r"
    SELECT label.provider, label.label, format('%I.%I', nsp.nspname, rel.relname) AS object_name
    FROM pg_class rel
    INNER JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace
    INNER JOIN pg_seclabel label
        ON rel.oid = label.objoid
       AND label.classoid = 'pg_class'::regclass
       AND label.objsubid = 0
    WHERE rel.oid = to_regclass($1::text)
      AND rel.relkind = 'S'
      AND ($2::text IS NULL OR label.provider = $2::text)
    ORDER BY label.provider
    LIMIT 1
";

const TYPE_LABEL_QUERY: &str = r"
    SELECT label.provider, label.label, format('%I.%I', nsp.nspname, typ.typname) AS object_name
    FROM pg_type typ
    INNER JOIN pg_namespace nsp ON nsp.oid = typ.typnamespace
    INNER JOIN pg_seclabel label
        ON typ.oid = label.objoid
       AND label.classoid = 'pg_type'::regclass
       AND label.objsubid = 0
    WHERE typ.oid = to_regtype($1::text)
      AND typ.typtype <> 'd'
      AND ($2::text IS NULL OR label.provider = $2::text)
    ORDER BY label.provider
    LIMIT 1
";

const DOMAIN_LABEL_QUERY: &str = r"
    SELECT label.provider, label.label, format('%I.%I', nsp.nspname, typ.typname) AS object_name
    FROM pg_type typ
    INNER JOIN pg_namespace nsp ON nsp.oid = typ.typnamespace
    INNER JOIN pg_seclabel label
        ON typ.oid = label.objoid
       AND label.classoid = 'pg_type'::regclass
       AND label.objsubid = 0
    WHERE typ.oid = to_regtype($1::text)
      AND typ.typtype = 'd'
      AND ($2::text IS NULL OR label.provider = $2::text)
    ORDER BY label.provider
    LIMIT 1
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_is_case_and_whitespace_insensitive() -> Result<()> {
        assert_eq!("ROLE".parse::<ObjectKind>()?, ObjectKind::Role);
        assert_eq!("role".parse::<ObjectKind>()?, ObjectKind::Role);
        assert_eq!(
            "  materialized\tview ".parse::<ObjectKind>()?,
            ObjectKind::MaterializedView
        );
        assert_eq!(
            "Foreign Table".parse::<ObjectKind>()?,
            ObjectKind::ForeignTable
        );
        Ok(())
    }

    #[test]
    fn every_kind_parses_from_its_keyword() -> Result<()> {
        for kind in ObjectKind::ALL {
            assert_eq!(kind.keyword().parse::<ObjectKind>()?, kind);
            assert_eq!(kind.to_string(), kind.keyword());
        }
        Ok(())
    }

    #[test]
    fn signature_kinds_are_rejected_as_unsupported() {
        for keyword in ["FUNCTION", "procedure", "Routine", "large  object"] {
            let err = keyword.parse::<ObjectKind>();
            assert!(
                matches!(err, Err(DataError::UnsupportedObjectType { .. })),
                "expected unsupported for {keyword}"
            );
        }
        assert!(matches!(
            "WIDGET".parse::<ObjectKind>(),
            Err(DataError::InvalidObjectType { value }) if value == "WIDGET"
        ));
    }

    #[test]
    fn catalog_queries_follow_the_shared_column_contract() {
        for kind in ObjectKind::ALL {
            let query = kind.catalog_query();
            assert!(
                query.contains("SELECT label.provider, label.label,"),
                "{kind} query must select provider and label first"
            );
            assert!(query.contains("AS object_name"), "{kind}");
            assert!(query.contains("$1"), "{kind}");
            assert!(query.contains("$2::text IS NULL"), "{kind}");
            let catalog = if kind.shared() {
                "pg_shseclabel"
            } else {
                "pg_seclabel"
            };
            assert!(query.contains(catalog), "{kind} should read {catalog}");
        }
    }

    #[test]
    fn qualified_kinds_report_schema_qualified_names() {
        for kind in ObjectKind::ALL {
            let query = kind.catalog_query();
            if kind.qualified() {
                assert!(
                    query.contains("format('%I.%I', nsp.nspname,"),
                    "{kind} must name its schema"
                );
                assert!(query.contains("INNER JOIN pg_namespace nsp"), "{kind}");
            } else {
                assert!(!query.contains("format("), "{kind}");
            }
            assert!(!query.contains("::regclass::text"), "{kind}");
            assert!(!query.contains("format_type"), "{kind}");
        }
    }

    #[test]
    fn role_query_joins_roles_with_shared_labels() {
        let query = ObjectKind::Role.catalog_query();
        assert!(query.contains("FROM pg_roles roles"));
        assert!(query.contains("INNER JOIN pg_shseclabel label"));
        assert!(query.contains("ON roles.oid = label.objoid"));
        assert!(query.contains("WHERE roles.rolname = $1"));
    }

    #[test]
    fn target_rejects_qualified_names_for_unqualified_kinds() {
        let err = LabelTarget::parse("ROLE", "public.skynet");
        assert!(matches!(
            err,
            Err(DataError::QualifiedNameNotAllowed { kind: "ROLE", .. })
        ));
        assert!(LabelTarget::parse("TABLE", "a.b.c").is_err());
    }

    #[test]
    fn lookup_keys_depend_on_kind() -> Result<()> {
        let role = LabelTarget::parse("ROLE", "\"Sky Net\"")?;
        assert_eq!(role.lookup_key(), "Sky Net");
        assert_eq!(role.to_string(), "ROLE \"Sky Net\"");

        let table = LabelTarget::parse("table", "Public.\"Accounts\"")?;
        assert_eq!(table.lookup_key(), "public.\"Accounts\"");
        assert_eq!(table.to_string(), "TABLE public.\"Accounts\"");
        Ok(())
    }
}
