//! Identifier and literal quoting for SQL text that cannot use bind parameters.
//!
//! `SECURITY LABEL` takes its provider, object name, and label as part of the
//! statement text, so every value spliced into a statement goes through the
//! helpers in this module first.

use crate::error::{DataError, Result};

/// Keywords that must be quoted when used as identifiers.
const RESERVED_KEYWORDS: &[&str] = &[
    "all",
    "analyse",
    "analyze",
    "and",
    "any",
    "array",
    "as",
    "asc",
    "asymmetric",
    "authorization",
    "binary",
    "both",
    "case",
    "cast",
    "check",
    "collate",
    "collation",
    "column",
    "concurrently",
    "constraint",
    "create",
    "cross",
    "current_catalog",
    "current_date",
    "current_role",
    "current_schema",
    "current_time",
    "current_timestamp",
    "current_user",
    "default",
    "deferrable",
    "desc",
    "distinct",
    "do",
    "else",
    "end",
    "except",
    "false",
    "fetch",
    "for",
    "foreign",
    "freeze",
    "from",
    "full",
    "grant",
    "group",
    "having",
    "ilike",
    "in",
    "initially",
    "inner",
    "intersect",
    "into",
    "is",
    "isnull",
    "join",
    "lateral",
    "leading",
    "left",
    "like",
    "limit",
    "localtime",
    "localtimestamp",
    "natural",
    "not",
    "notnull",
    "null",
    "offset",
    "on",
    "only",
    "or",
    "order",
    "outer",
    "overlaps",
    "placing",
    "primary",
    "references",
    "returning",
    "right",
    "select",
    "session_user",
    "similar",
    "some",
    "symmetric",
    "system_user",
    "table",
    "tablesample",
    "then",
    "to",
    "trailing",
    "true",
    "union",
    "unique",
    "user",
    "using",
    "variadic",
    "verbose",
    "when",
    "where",
    "window",
    "with",
];

/// Quote an identifier the way `PostgreSQL`'s `quote_ident` does.
///
/// Lower-case simple identifiers that are not reserved keywords are returned
/// unchanged; everything else is wrapped in double quotes with embedded
/// quotes doubled.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    if is_simple_identifier(name) && !is_reserved_keyword(name) {
        return name.to_string();
    }
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal the way `PostgreSQL`'s `quote_literal` does.
///
/// Texts containing a backslash are rendered as escape strings (`E'...'`) so
/// the result is correct regardless of `standard_conforming_strings`.
#[must_use]
pub fn quote_literal(text: &str) -> String {
    let escaped = text.replace('\'', "''");
    if escaped.contains('\\') {
        format!("E'{}'", escaped.replace('\\', "\\\\"))
    } else {
        format!("'{escaped}'")
    }
}

/// Parse a single-quoted (`'...'`) or escape-string (`E'...'`) literal back
/// into its text.
///
/// # Errors
///
/// Returns a static reason when the input is not exactly one well-formed
/// literal.
pub fn unquote_literal(text: &str) -> std::result::Result<String, &'static str> {
    let (body, escapes) = if let Some(rest) = text
        .strip_prefix("E'")
        .or_else(|| text.strip_prefix("e'"))
    {
        (rest, true)
    } else if let Some(rest) = text.strip_prefix('\'') {
        (rest, false)
    } else {
        return Err("literal must start with a single quote");
    };

    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                let mut rest = chars.clone();
                match rest.next() {
                    Some('\'') => {
                        value.push('\'');
                        chars = rest;
                    }
                    None => return Ok(value),
                    Some(_) => return Err("unexpected text after closing quote"),
                }
            }
            '\\' if escapes => match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some('b') => value.push('\u{8}'),
                Some('f') => value.push('\u{c}'),
                Some(other) => value.push(other),
                None => return Err("dangling escape at end of literal"),
            },
            other => value.push(other),
        }
    }

    Err("unterminated literal")
}

/// Split a possibly schema-qualified name into its parts.
///
/// Double-quoted parts are taken verbatim (with `""` unescaped); unquoted
/// parts must be simple identifiers and are folded to lower case, matching
/// how the server resolves them.
///
/// # Errors
///
/// Returns [`DataError::InvalidIdentifier`] when the name is empty, a quoted
/// part is unterminated, or an unquoted part contains characters that would
/// require quoting.
pub fn parse_identifier_parts(field: &'static str, text: &str) -> Result<Vec<String>> {
    let invalid = |reason: &'static str| DataError::InvalidIdentifier {
        field,
        value: text.to_string(),
        reason,
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid("identifier is empty"));
    }

    let mut parts = Vec::new();
    let mut chars = trimmed.chars().peekable();
    loop {
        let part = if chars.peek() == Some(&'"') {
            chars.next();
            let mut quoted = String::new();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        quoted.push('"');
                    }
                    Some('"') => break,
                    Some(ch) => quoted.push(ch),
                    None => return Err(invalid("unterminated quoted identifier")),
                }
            }
            if quoted.is_empty() {
                return Err(invalid("quoted identifier is empty"));
            }
            quoted
        } else {
            let mut bare = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '.' {
                    break;
                }
                bare.push(ch);
                chars.next();
            }
            validate_bare_identifier(&bare).map_err(invalid)?;
            bare.to_ascii_lowercase()
        };
        parts.push(part);

        match chars.next() {
            None => return Ok(parts),
            Some('.') => {}
            Some(_) => return Err(invalid("unexpected text after quoted identifier")),
        }
    }
}

fn validate_bare_identifier(text: &str) -> std::result::Result<(), &'static str> {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return Err("identifier part is empty");
    };
    if !(first.is_alphabetic() || first == '_') {
        return Err("identifier must start with a letter or underscore");
    }
    if chars.any(|ch| !(ch.is_alphanumeric() || ch == '_' || ch == '$')) {
        return Err("identifier contains characters that require quoting");
    }
    Ok(())
}

fn is_simple_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_lowercase() || first == '_')
        && chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
}

fn is_reserved_keyword(name: &str) -> bool {
    RESERVED_KEYWORDS.binary_search(&name).is_ok()
}
