//! `SECURITY LABEL` statement rendering.
//!
//! The statement does not accept bind parameters for any of its clauses, so
//! inputs arrive as typed values whose rendering is owned by [`crate::quote`].

use std::fmt::{self, Display, Formatter};

use crate::error::{DataError, Result};
use crate::object::LabelTarget;
use crate::quote::{parse_identifier_parts, quote_ident, quote_literal, unquote_literal};

/// Whether a statement assigns or clears a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementAction {
    /// `IS <label>`
    Assign,
    /// `IS NULL`
    Clear,
}

impl Display for StatementAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign => formatter.write_str("creating"),
            Self::Clear => formatter.write_str("deleting"),
        }
    }
}

/// Name of a loaded label provider (for example `anon` or `selinux`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderName(String);

impl ProviderName {
    /// Parse a provider name written as a SQL identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidIdentifier`] for malformed or qualified names.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parts = parse_identifier_parts("label_provider", text)?;
        if parts.len() != 1 {
            return Err(DataError::InvalidIdentifier {
                field: "label_provider",
                value: text.to_string(),
                reason: "provider names cannot be qualified",
            });
        }
        Ok(Self(parts.remove(0)))
    }

    /// Raw provider name as stored in the label catalogs.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProviderName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&quote_ident(&self.0))
    }
}

/// Label assigned by a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LabelValue {
    /// `NULL`, which removes the label.
    Null,
    /// Label text, unquoted.
    Text(String),
}

impl LabelValue {
    /// Parse a label as supplied in resource configuration.
    ///
    /// Accepts `NULL`, a single-quoted or escape-string literal, or bare text
    /// which is quoted on render. Surrounding whitespace is not part of the
    /// label.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidLabel`] when the input is empty or starts
    /// like a literal without being a single well-formed literal.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DataError::InvalidLabel {
                value: text.to_string(),
                reason: "label is empty",
            });
        }
        if trimmed.eq_ignore_ascii_case("NULL") {
            return Ok(Self::Null);
        }
        let looks_quoted =
            trimmed.starts_with('\'') || trimmed.starts_with("E'") || trimmed.starts_with("e'");
        if looks_quoted {
            return unquote_literal(trimmed)
                .map(Self::Text)
                .map_err(|reason| DataError::InvalidLabel {
                    value: text.to_string(),
                    reason,
                });
        }
        Ok(Self::Text(trimmed.to_string()))
    }

    /// Label text without quoting, or `None` for `NULL`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Whether this value clears the label.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl Display for LabelValue {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => formatter.write_str("NULL"),
            Self::Text(text) => formatter.write_str(&quote_literal(text)),
        }
    }
}

/// A rendered-on-demand `SECURITY LABEL` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelStatement {
    action: StatementAction,
    provider: ProviderName,
    target: LabelTarget,
    label: LabelValue,
}

impl LabelStatement {
    /// Whether the statement assigns or clears.
    #[must_use]
    pub const fn action(&self) -> StatementAction {
        self.action
    }

    /// Provider the label belongs to.
    #[must_use]
    pub const fn provider(&self) -> &ProviderName {
        &self.provider
    }

    /// Labelled object.
    #[must_use]
    pub const fn target(&self) -> &LabelTarget {
        &self.target
    }

    /// Label value written by the statement.
    #[must_use]
    pub const fn label(&self) -> &LabelValue {
        &self.label
    }

    /// SQL text of the statement.
    #[must_use]
    pub fn sql(&self) -> String {
        self.to_string()
    }
}

impl Display for LabelStatement {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "SECURITY LABEL FOR {} ON {} IS {}",
            self.provider, self.target, self.label
        )
    }
}

/// Build `SECURITY LABEL FOR <provider> ON <type> <name> IS <label>`.
#[must_use]
pub fn assign_statement(
    provider: &ProviderName,
    target: &LabelTarget,
    label: &LabelValue,
) -> LabelStatement {
    LabelStatement {
        action: StatementAction::Assign,
        provider: provider.clone(),
        target: target.clone(),
        label: label.clone(),
    }
}

/// Build `SECURITY LABEL FOR <provider> ON <type> <name> IS NULL`.
#[must_use]
pub fn clear_statement(provider: &ProviderName, target: &LabelTarget) -> LabelStatement {
    LabelStatement {
        action: StatementAction::Clear,
        provider: provider.clone(),
        target: target.clone(),
        label: LabelValue::Null,
    }
}
