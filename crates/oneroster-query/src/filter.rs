//! Parser for the OneRoster `filter` query parameter.
//!
//! The grammar is deliberately small: clauses of the form
//! `field <predicate> value`, joined by a single connective (` AND ` or
//! ` OR `) for the whole expression. Field names are not checked here; the
//! dialect validates them against the resource allow-list while rendering.

use std::fmt;

use crate::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-sensitive substring match.
    Contains,
}

impl FilterOperator {
    /// Scan order. Two-character predicates come before their one-character
    /// prefixes so `a>=b` is never split on `=`.
    const PRIORITY: [FilterOperator; 7] = [
        Self::NotEq,
        Self::Gte,
        Self::Lte,
        Self::Eq,
        Self::Gt,
        Self::Lt,
        Self::Contains,
    ];

    /// Token as written in the filter string.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Contains => "~",
        }
    }

    /// SQL comparison operator. `Contains` is rendered by the dialect.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Contains => "LIKE",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Connective {
    #[default]
    And,
    Or,
}

impl Connective {
    /// Literal separator in the filter string.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }

    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterClause {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    fn parse(segment: &str) -> Result<Self, QueryError> {
        let syntax_error = || QueryError::FilterSyntax {
            clause: segment.to_string(),
        };

        let (operator, field, value) = FilterOperator::PRIORITY
            .into_iter()
            .find_map(|op| {
                let mut pieces = segment.split(op.token());
                match (pieces.next(), pieces.next(), pieces.next()) {
                    (Some(field), Some(value), None) => Some((op, field, value)),
                    _ => None,
                }
            })
            .ok_or_else(syntax_error)?;

        let field = field.trim();
        if field.is_empty() {
            return Err(syntax_error());
        }

        Ok(Self::new(field, operator, strip_quotes(value.trim())))
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}'{}'", self.field, self.operator.token(), self.value)
    }
}

/// Parsed filter: ordered clauses plus the connective that joins all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterExpression {
    pub clauses: Vec<FilterClause>,
    pub connective: Connective,
}

impl FilterExpression {
    /// The vacuously true expression.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(clause: FilterClause) -> Self {
        Self {
            clauses: vec![clause],
            connective: Connective::And,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Parses a raw `filter` parameter.
    ///
    /// A filter joins its clauses with either ` AND ` or ` OR `. One that
    /// contains both is rejected instead of being split on ` AND ` alone:
    /// that split would read `type='school' OR type='district' AND status='active'`
    /// as `type` equal to the literal `school' OR type='district`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::FilterSyntax`] for a clause without a recognised
    /// predicate and [`QueryError::MixedConnectives`] when both ` AND ` and
    /// ` OR ` appear.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        if input.trim().is_empty() {
            return Ok(Self::empty());
        }

        let has_and = input.contains(Connective::And.token());
        let has_or = input.contains(Connective::Or.token());
        if has_and && has_or {
            return Err(QueryError::MixedConnectives {
                filter: input.to_string(),
            });
        }

        let connective = if has_or { Connective::Or } else { Connective::And };
        let clauses = input
            .split(connective.token())
            .map(FilterClause::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            clauses,
            connective,
        })
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(self.connective.token())?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

/// Removes one layer of matching single or double quotes.
fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(field: &str, operator: FilterOperator, value: &str) -> FilterClause {
        FilterClause::new(field, operator, value)
    }

    #[test]
    fn test_empty_filter() {
        assert_eq!(FilterExpression::parse("").unwrap(), FilterExpression::empty());
        assert!(FilterExpression::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_single_clause() {
        let expr = FilterExpression::parse("status='active'").unwrap();
        assert_eq!(expr.connective, Connective::And);
        assert_eq!(expr.clauses, vec![clause("status", FilterOperator::Eq, "active")]);
    }

    #[test]
    fn test_all_operators() {
        let cases = [
            ("a=1", FilterOperator::Eq),
            ("a!=1", FilterOperator::NotEq),
            ("a>1", FilterOperator::Gt),
            ("a>=1", FilterOperator::Gte),
            ("a<1", FilterOperator::Lt),
            ("a<=1", FilterOperator::Lte),
            ("a~1", FilterOperator::Contains),
        ];
        for (input, operator) in cases {
            let expr = FilterExpression::parse(input).unwrap();
            assert_eq!(expr.clauses, vec![clause("a", operator, "1")], "{input}");
        }
    }

    #[test]
    fn test_quoted_and_unquoted_values_match() {
        let quoted = FilterExpression::parse("name=\"Lincoln High\"").unwrap();
        let single = FilterExpression::parse("name='Lincoln High'").unwrap();
        let bare = FilterExpression::parse("name=Lincoln High").unwrap();
        assert_eq!(quoted, bare);
        assert_eq!(single, bare);
        assert_eq!(bare.clauses[0].value, "Lincoln High");
    }

    #[test]
    fn test_only_one_quote_layer_is_stripped() {
        let expr = FilterExpression::parse("title='\"quoted\"'").unwrap();
        assert_eq!(expr.clauses[0].value, "\"quoted\"");

        let expr = FilterExpression::parse("title='unbalanced\"").unwrap();
        assert_eq!(expr.clauses[0].value, "'unbalanced\"");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let expr = FilterExpression::parse(" status = 'active' ").unwrap();
        assert_eq!(expr.clauses, vec![clause("status", FilterOperator::Eq, "active")]);
    }

    #[test]
    fn test_and_connective() {
        let expr =
            FilterExpression::parse("status='active' AND dateLastModified>'2024-01-01'").unwrap();
        assert_eq!(expr.connective, Connective::And);
        assert_eq!(
            expr.clauses,
            vec![
                clause("status", FilterOperator::Eq, "active"),
                clause("dateLastModified", FilterOperator::Gt, "2024-01-01"),
            ]
        );
    }

    #[test]
    fn test_or_connective() {
        let expr = FilterExpression::parse("type='school' OR type='district' OR type='state'")
            .unwrap();
        assert_eq!(expr.connective, Connective::Or);
        assert_eq!(expr.clauses.len(), 3);
        assert_eq!(expr.clauses[2].value, "state");
    }

    #[test]
    fn test_mixed_connectives_rejected() {
        let err = FilterExpression::parse("a=1 AND b=2 OR c=3").unwrap_err();
        assert!(matches!(err, QueryError::MixedConnectives { .. }));
    }

    #[test]
    fn test_connectives_are_case_sensitive() {
        let err = FilterExpression::parse("a=1 and b=2").unwrap_err();
        assert!(matches!(err, QueryError::FilterSyntax { .. }));
    }

    #[test]
    fn test_missing_predicate() {
        let err = FilterExpression::parse("status active").unwrap_err();
        match err {
            QueryError::FilterSyntax { clause } => assert_eq!(clause, "status active"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ambiguous_split_is_rejected() {
        assert!(FilterExpression::parse("a=b=c").is_err());
        assert!(FilterExpression::parse("=value").is_err());
    }

    #[test]
    fn test_empty_value_is_allowed() {
        let expr = FilterExpression::parse("middleName=''").unwrap();
        assert_eq!(expr.clauses[0].value, "");
    }

    #[test]
    fn test_display_round_trips() {
        let input = "status='active' OR name~'High'";
        let expr = FilterExpression::parse(input).unwrap();
        assert_eq!(expr.to_string(), input);
        assert_eq!(FilterExpression::parse(&expr.to_string()).unwrap(), expr);
    }
}
