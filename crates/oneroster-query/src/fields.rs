//! Validation of the `fields` projection parameter.

use crate::error::QueryError;

/// Requested projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSelection {
    /// `*` or absent: every selectable field in declared order.
    #[default]
    All,
    Listed(Vec<String>),
}

impl FieldSelection {
    /// Parses a comma-separated field list. Blank entries are ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" {
            return Self::All;
        }
        let fields: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect();
        if fields.is_empty() {
            Self::All
        } else {
            Self::Listed(fields)
        }
    }

    /// Resolves the selection against `selectable`.
    ///
    /// The result borrows the allow-list's own spellings, so only
    /// compiled-in identifiers ever reach the SQL text. Repeated fields are
    /// projected once.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidSelectionField`] naming every requested
    /// field that is not selectable.
    pub fn resolve(
        &self,
        selectable: &'static [&'static str],
    ) -> Result<Vec<&'static str>, QueryError> {
        let requested = match self {
            Self::All => return Ok(selectable.to_vec()),
            Self::Listed(fields) => fields,
        };

        let mut resolved = Vec::with_capacity(requested.len());
        let mut invalid = Vec::new();
        for field in requested {
            match selectable.iter().copied().find(|s| s == field) {
                Some(known) if !resolved.contains(&known) => resolved.push(known),
                Some(_) => {}
                None => invalid.push(field.clone()),
            }
        }

        if invalid.is_empty() {
            Ok(resolved)
        } else {
            Err(QueryError::InvalidSelectionField {
                fields: invalid,
                allowed: selectable.to_vec(),
            })
        }
    }
}
