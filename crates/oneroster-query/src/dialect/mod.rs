//! SQL rendering strategies.
//!
//! A [`Dialect`] knows the engine-specific pieces (identifier quoting,
//! placeholder syntax, pagination, typed comparisons); the shared rendering of
//! filters, ordering and projections lives in the trait's provided methods so
//! both engines produce the same logical query. Every user-supplied value goes
//! through a [`ParamSink`]; only allow-listed identifiers are written into the
//! SQL text.
//!
//! Text comparisons and `~` are case-sensitive on both engines. Typed
//! columns (see [`FieldType`]) compare against a parameter cast to the same
//! type, and `~` on a typed column matches its canonical text form
//! (`2024-09-01T08:30:00.250`, `2024-09-01`, `true`).

mod postgres;
mod tsql;

use std::fmt;

use oneroster_storage::SqlValue;
use serde::{Deserialize, Serialize};

use crate::endpoint::{EndpointConfig, FixedPredicate, ResourceKind};
use crate::error::QueryError;
use crate::field_type::FieldType;
use crate::filter::{FilterExpression, FilterOperator};
use crate::request::SortDirection;

pub use postgres::PostgresDialect;
pub use tsql::TsqlDialect;

/// Supported engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Postgres,
    Mssql,
}

impl DialectKind {
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::Postgres => &PostgresDialect,
            Self::Mssql => &TsqlDialect,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Mssql => write!(f, "mssql"),
        }
    }
}

/// Collects bound parameters for one statement.
#[derive(Debug, Default)]
pub struct ParamSink {
    params: Vec<SqlValue>,
}

impl ParamSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value and returns its 1-based position.
    pub fn push(&mut self, value: impl Into<SqlValue>) -> usize {
        self.params.push(value.into());
        self.params.len()
    }

    #[must_use]
    pub fn into_params(self) -> Vec<SqlValue> {
        self.params
    }
}

/// Converts a page bound to the integer type every engine binds.
pub(crate) fn page_value(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Escapes `\`, `%` and `_` for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn escape_like_default(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub trait Dialect: Send + Sync + fmt::Debug {
    fn kind(&self) -> DialectKind;

    /// Quotes an identifier, escaping the closing quote character.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Trailing pagination clause; binds both bounds.
    fn render_pagination(&self, limit: u64, offset: u64, params: &mut ParamSink) -> String;

    /// Left operand of `=`, `!=`, `<`, `<=`, `>`, `>=` on a column of type `ty`.
    fn compare_operand(&self, column: &str, ty: FieldType) -> String;

    /// Right operand: the bound placeholder converted to `ty`.
    fn compare_value(&self, placeholder: &str, ty: FieldType) -> String;

    /// Column rendered as case-sensitive text for `LIKE`.
    fn pattern_operand(&self, column: &str, ty: FieldType) -> String;

    /// Escapes pattern metacharacters in a `~` value.
    fn escape_like(&self, value: &str) -> String {
        escape_like_default(value)
    }

    /// View name backing a resource.
    fn table_name(&self, resource: ResourceKind) -> String {
        resource.name().to_ascii_lowercase()
    }

    fn qualified_table(&self, schema: &str, resource: ResourceKind) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(schema),
            self.quote_identifier(&self.table_name(resource))
        )
    }

    fn qualified_column(&self, resource: ResourceKind, field: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(&self.table_name(resource)),
            self.quote_identifier(field)
        )
    }

    /// Binds `value` and returns its placeholder.
    fn bind(&self, params: &mut ParamSink, value: SqlValue) -> String {
        let index = params.push(value);
        self.placeholder(index)
    }

    /// Renders one comparison. `field` must already be allow-listed and
    /// `value` normalized for `ty` (see [`FieldType::normalize`]).
    fn render_comparison(
        &self,
        resource: ResourceKind,
        field: &str,
        ty: FieldType,
        operator: FilterOperator,
        value: &str,
        params: &mut ParamSink,
    ) -> String {
        let column = self.qualified_column(resource, field);
        match operator {
            FilterOperator::Contains => {
                let pattern = format!("%{}%", self.escape_like(value));
                let placeholder = self.bind(params, SqlValue::Text(pattern));
                format!(
                    "{} LIKE {placeholder} ESCAPE '\\'",
                    self.pattern_operand(&column, ty)
                )
            }
            op => {
                let placeholder = self.bind(params, SqlValue::Text(value.to_string()));
                format!(
                    "{} {} {}",
                    self.compare_operand(&column, ty),
                    op.as_sql(),
                    self.compare_value(&placeholder, ty)
                )
            }
        }
    }

    /// Renders a parsed filter, validating every clause first.
    ///
    /// An empty expression renders as `1=1`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidFilterField`] for a clause whose field is
    /// not in `allowed_filter_fields` and [`QueryError::InvalidFilterValue`]
    /// for a value that does not parse as the field's type. The first failing
    /// clause is reported and nothing is bound.
    fn render_filter(
        &self,
        expression: &FilterExpression,
        config: &EndpointConfig,
        params: &mut ParamSink,
    ) -> Result<String, QueryError> {
        let checked = expression
            .clauses
            .iter()
            .map(|clause| {
                let field = config.filterable(&clause.field).ok_or_else(|| {
                    QueryError::InvalidFilterField {
                        field: clause.field.clone(),
                    }
                })?;
                let ty = config.field_type(field);
                let value = if clause.operator == FilterOperator::Contains {
                    clause.value.clone()
                } else {
                    ty.normalize(&clause.value)
                        .ok_or_else(|| QueryError::InvalidFilterValue {
                            field: field.to_string(),
                            value: clause.value.clone(),
                            expected: ty.expected(),
                        })?
                };
                Ok((field, ty, clause.operator, value))
            })
            .collect::<Result<Vec<_>, QueryError>>()?;

        if checked.is_empty() {
            return Ok("1=1".to_string());
        }

        let separator = format!(" {} ", expression.connective.as_sql());
        Ok(checked
            .into_iter()
            .map(|(field, ty, operator, value)| {
                self.render_comparison(config.resource, field, ty, operator, &value, params)
            })
            .collect::<Vec<_>>()
            .join(&separator))
    }

    fn render_fixed_predicate(
        &self,
        fixed: FixedPredicate,
        resource: ResourceKind,
        params: &mut ParamSink,
    ) -> String {
        self.render_comparison(
            resource,
            fixed.field,
            FieldType::Text,
            FilterOperator::Eq,
            fixed.value,
            params,
        )
    }

    /// Renders the ORDER BY list. Unknown sort fields are dropped; when none
    /// survive the resource's default sort field is used.
    fn render_order_by(
        &self,
        sort_fields: &[String],
        config: &EndpointConfig,
        direction: SortDirection,
    ) -> String {
        let mut fields: Vec<&'static str> = Vec::new();
        for field in sort_fields.iter().filter_map(|f| config.selectable(f)) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        if fields.is_empty() {
            fields.push(config.default_sort_field);
        }

        fields
            .into_iter()
            .map(|field| {
                format!(
                    "{} {}",
                    self.qualified_column(config.resource, field),
                    direction.as_sql()
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn render_projection(&self, fields: &[&str], resource: ResourceKind) -> String {
        fields
            .iter()
            .map(|field| self.qualified_column(resource, field))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
