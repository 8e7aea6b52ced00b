use super::{Dialect, DialectKind, ParamSink, page_value};
use crate::field_type::FieldType;

/// PostgreSQL: `"ident"` quoting, `$n` placeholders, `LIMIT .. OFFSET ..`.
///
/// Filter values always bind as `TEXT`. Text fields cast the column with
/// `::text`; typed fields cast both sides (`"t"."c"::timestamp > $1::timestamp`),
/// which is a no-op on the column when the view already has that type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn render_pagination(&self, limit: u64, offset: u64, params: &mut ParamSink) -> String {
        let limit = params.push(page_value(limit));
        let offset = params.push(page_value(offset));
        format!(
            "LIMIT {} OFFSET {}",
            self.placeholder(limit),
            self.placeholder(offset)
        )
    }

    fn compare_operand(&self, column: &str, ty: FieldType) -> String {
        format!("{column}::{}", sql_type(ty))
    }

    fn compare_value(&self, placeholder: &str, ty: FieldType) -> String {
        match ty {
            FieldType::Text => placeholder.to_string(),
            other => format!("{placeholder}::{}", sql_type(other)),
        }
    }

    fn pattern_operand(&self, column: &str, ty: FieldType) -> String {
        match ty {
            FieldType::Text | FieldType::Integer => format!("{column}::text"),
            FieldType::Boolean => format!("{column}::boolean::text"),
            FieldType::Date => format!("to_char({column}::date, 'YYYY-MM-DD')"),
            FieldType::Timestamp => {
                format!("to_char({column}::timestamp, 'YYYY-MM-DD\"T\"HH24:MI:SS.MS')")
            }
        }
    }
}

fn sql_type(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Text => "text",
        FieldType::Boolean => "boolean",
        FieldType::Integer => "bigint",
        FieldType::Date => "date",
        FieldType::Timestamp => "timestamp",
    }
}

#[cfg(test)]
mod tests {
    use oneroster_storage::SqlValue;

    use super::*;
    use crate::endpoint::{EndpointConfigRegistry, FixedPredicate, ResourceKind};
    use crate::filter::FilterExpression;
    use crate::request::SortDirection;

    #[test]
    fn test_quote_identifier() {
        let d = PostgresDialect;
        assert_eq!(d.quote_identifier("sourcedId"), "\"sourcedId\"");
        assert_eq!(d.quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_qualified_names() {
        let d = PostgresDialect;
        assert_eq!(
            d.qualified_table("oneroster12", ResourceKind::AcademicSessions),
            "\"oneroster12\".\"academicsessions\""
        );
        assert_eq!(
            d.qualified_column(ResourceKind::Orgs, "type"),
            "\"orgs\".\"type\""
        );
    }

    #[test]
    fn test_render_filter_binds_values() {
        let d = PostgresDialect;
        let config = EndpointConfigRegistry::get(ResourceKind::Orgs);
        let expr = FilterExpression::parse("status='active' AND name~'O''Brien; DROP'").unwrap();
        let mut params = ParamSink::new();

        let sql = d.render_filter(&expr, config, &mut params).unwrap();
        assert_eq!(
            sql,
            "\"orgs\".\"status\"::text = $1 AND \"orgs\".\"name\"::text LIKE $2 ESCAPE '\\'"
        );
        assert_eq!(
            params.into_params(),
            vec![
                SqlValue::from("active"),
                SqlValue::from("%O''Brien; DROP%"),
            ]
        );
    }

    #[test]
    fn test_render_filter_escapes_like_wildcards() {
        let d = PostgresDialect;
        let config = EndpointConfigRegistry::get(ResourceKind::Courses);
        let expr = FilterExpression::parse("title~100%_done").unwrap();
        let mut params = ParamSink::new();
        d.render_filter(&expr, config, &mut params).unwrap();
        assert_eq!(
            params.into_params(),
            vec![SqlValue::from("%100\\%\\_done%")]
        );
    }

    #[test]
    fn test_render_empty_filter() {
        let d = PostgresDialect;
        let config = EndpointConfigRegistry::get(ResourceKind::Users);
        let mut params = ParamSink::new();
        let sql = d
            .render_filter(&FilterExpression::empty(), config, &mut params)
            .unwrap();
        assert_eq!(sql, "1=1");
        assert!(params.into_params().is_empty());
    }

    #[test]
    fn test_render_filter_rejects_unknown_field() {
        let d = PostgresDialect;
        let config = EndpointConfigRegistry::get(ResourceKind::Orgs);
        let expr = FilterExpression::parse("status=active OR bogus=1").unwrap();
        let mut params = ParamSink::new();
        let err = d.render_filter(&expr, config, &mut params).unwrap_err();
        assert!(matches!(
            err,
            crate::QueryError::InvalidFilterField { ref field } if field == "bogus"
        ));
        assert!(params.into_params().is_empty());
    }

    #[test]
    fn test_render_timestamp_filter_casts_parameter() {
        let d = PostgresDialect;
        let config = EndpointConfigRegistry::get(ResourceKind::Orgs);
        let expr = FilterExpression::parse("dateLastModified>'2024-09-01T00:00:00Z'").unwrap();
        let mut params = ParamSink::new();

        let sql = d.render_filter(&expr, config, &mut params).unwrap();
        assert_eq!(
            sql,
            "\"orgs\".\"dateLastModified\"::timestamp > $1::timestamp"
        );
        assert_eq!(
            params.into_params(),
            vec![SqlValue::from("2024-09-01T00:00:00.000")]
        );
    }

    #[test]
    fn test_render_typed_filters() {
        let d = PostgresDialect;
        let config = EndpointConfigRegistry::get(ResourceKind::Enrollments);
        let expr =
            FilterExpression::parse("beginDate>='2024-08-15' AND primary=TRUE AND endDate~'2025'")
                .unwrap();
        let mut params = ParamSink::new();

        let sql = d.render_filter(&expr, config, &mut params).unwrap();
        assert_eq!(
            sql,
            "\"enrollments\".\"beginDate\"::date >= $1::date \
             AND \"enrollments\".\"primary\"::boolean = $2::boolean \
             AND to_char(\"enrollments\".\"endDate\"::date, 'YYYY-MM-DD') LIKE $3 ESCAPE '\\'"
        );
        assert_eq!(
            params.into_params(),
            vec![
                SqlValue::from("2024-08-15"),
                SqlValue::from("true"),
                SqlValue::from("%2025%"),
            ]
        );
    }

    #[test]
    fn test_render_filter_rejects_malformed_typed_value() {
        let d = PostgresDialect;
        let config = EndpointConfigRegistry::get(ResourceKind::Users);
        let expr = FilterExpression::parse("status='active' AND dateLastModified>'last week'")
            .unwrap();
        let mut params = ParamSink::new();

        let err = d.render_filter(&expr, config, &mut params).unwrap_err();
        assert!(matches!(
            err,
            crate::QueryError::InvalidFilterValue { ref field, .. } if field == "dateLastModified"
        ));
        assert!(params.into_params().is_empty());
    }

    #[test]
    fn test_render_fixed_predicate() {
        let d = PostgresDialect;
        let mut params = ParamSink::new();
        params.push("already-bound");
        let sql = d.render_fixed_predicate(
            FixedPredicate::new("type", "school"),
            ResourceKind::Orgs,
            &mut params,
        );
        assert_eq!(sql, "\"orgs\".\"type\"::text = $2");
    }

    #[test]
    fn test_render_order_by() {
        let d = PostgresDialect;
        let config = EndpointConfigRegistry::get(ResourceKind::Users);
        let sort = vec!["familyName".to_string(), "bogus".to_string()];
        assert_eq!(
            d.render_order_by(&sort, config, SortDirection::Desc),
            "\"users\".\"familyName\" DESC"
        );
        assert_eq!(
            d.render_order_by(&["bogus".to_string()], config, SortDirection::Asc),
            "\"users\".\"sourcedId\" ASC"
        );
        assert_eq!(
            d.render_order_by(&[], config, SortDirection::Asc),
            "\"users\".\"sourcedId\" ASC"
        );
    }

    #[test]
    fn test_render_pagination() {
        let d = PostgresDialect;
        let mut params = ParamSink::new();
        params.push("x");
        assert_eq!(d.render_pagination(2, 4, &mut params), "LIMIT $2 OFFSET $3");
        assert_eq!(
            params.into_params(),
            vec![SqlValue::from("x"), SqlValue::from(2_i64), SqlValue::from(4_i64)]
        );
    }

    #[test]
    fn test_render_projection() {
        let d = PostgresDialect;
        assert_eq!(
            d.render_projection(&["sourcedId", "user"], ResourceKind::Enrollments),
            "\"enrollments\".\"sourcedId\", \"enrollments\".\"user\""
        );
    }
}
