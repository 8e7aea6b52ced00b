use super::{Dialect, DialectKind, ParamSink, escape_like_default, page_value};
use crate::field_type::FieldType;

/// Case- and accent-sensitive collation applied to text comparisons.
const CASE_SENSITIVE_COLLATION: &str = "Latin1_General_CS_AS";

/// SQL Server: `[ident]` quoting, `@Pn` named parameters,
/// `OFFSET .. ROWS FETCH NEXT .. ROWS ONLY`.
///
/// Text fields are compared under a case-sensitive collation to match
/// PostgreSQL; `COLLATE` is only ever applied to character columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TsqlDialect;

impl Dialect for TsqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Mssql
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("[{}]", ident.replace(']', "]]"))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@P{index}")
    }

    fn render_pagination(&self, limit: u64, offset: u64, params: &mut ParamSink) -> String {
        let offset = params.push(page_value(offset));
        let limit = params.push(page_value(limit));
        format!(
            "OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            self.placeholder(offset),
            self.placeholder(limit)
        )
    }

    fn compare_operand(&self, column: &str, ty: FieldType) -> String {
        match ty {
            FieldType::Text => format!("{column} COLLATE {CASE_SENSITIVE_COLLATION}"),
            FieldType::Boolean => column.to_string(),
            other => format!("CAST({column} AS {})", sql_type(other)),
        }
    }

    fn compare_value(&self, placeholder: &str, ty: FieldType) -> String {
        match ty {
            FieldType::Text => placeholder.to_string(),
            other => format!("CAST({placeholder} AS {})", sql_type(other)),
        }
    }

    fn pattern_operand(&self, column: &str, ty: FieldType) -> String {
        match ty {
            FieldType::Text => format!("{column} COLLATE {CASE_SENSITIVE_COLLATION}"),
            FieldType::Boolean => {
                format!("CASE CAST({column} AS bit) WHEN 1 THEN 'true' WHEN 0 THEN 'false' END")
            }
            FieldType::Integer => format!("CAST({column} AS varchar(20))"),
            FieldType::Date => format!("CONVERT(char(10), CAST({column} AS date), 23)"),
            FieldType::Timestamp => format!(
                "FORMAT(CAST({column} AS datetime2), 'yyyy-MM-ddTHH:mm:ss.fff', 'en-US')"
            ),
        }
    }

    fn escape_like(&self, value: &str) -> String {
        escape_like_default(value).replace('[', "\\[")
    }
}

fn sql_type(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Text => "nvarchar(max)",
        FieldType::Boolean => "bit",
        FieldType::Integer => "bigint",
        FieldType::Date => "date",
        FieldType::Timestamp => "datetime2",
    }
}
