//! Orchestration of parsing, validation, rendering and execution.

use oneroster_storage::{DynExecutor, Record, RenderedQuery, StorageError};
use tracing::{debug, error, instrument};

use crate::dialect::{Dialect, DialectKind, ParamSink};
use crate::endpoint::{Endpoint, EndpointConfig, FixedPredicate};
use crate::error::QueryError;
use crate::filter::{FilterClause, FilterExpression, FilterOperator};
use crate::request::{QueryRequest, SortDirection};
use crate::shaper::ResultShaper;

/// Schema holding the OneRoster views.
pub const DEFAULT_SCHEMA: &str = "oneroster12";

/// Everything needed to render one SELECT.
struct SelectPlan<'a> {
    config: &'static EndpointConfig,
    fields: &'a [&'static str],
    filter: &'a FilterExpression,
    fixed: Option<FixedPredicate>,
    sort_fields: &'a [String],
    direction: SortDirection,
    limit: u64,
    offset: u64,
}

/// Stateless query service over one executor and its dialect.
///
/// Each call performs at most one database round trip and never retries.
pub struct QueryService {
    executor: DynExecutor,
    dialect: &'static dyn Dialect,
    schema: String,
}

impl QueryService {
    #[must_use]
    pub fn new(executor: DynExecutor, dialect: DialectKind) -> Self {
        Self {
            executor,
            dialect: dialect.dialect(),
            schema: DEFAULT_SCHEMA.to_string(),
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.executor.backend_name()
    }

    /// Checks database connectivity.
    ///
    /// # Errors
    ///
    /// Propagates the executor's error.
    pub async fn ping(&self) -> Result<(), StorageError> {
        self.executor.ping().await
    }

    /// Renders a collection query without executing it.
    ///
    /// Validation runs in a fixed order: filter syntax, then the projection,
    /// then the filter fields.
    ///
    /// # Errors
    ///
    /// Returns a validation [`QueryError`]; nothing is executed.
    pub fn render_many(
        &self,
        endpoint: Endpoint,
        request: &QueryRequest,
    ) -> Result<RenderedQuery, QueryError> {
        let config = endpoint.config();
        let filter = FilterExpression::parse(&request.filter)?;
        let fields = request.fields.resolve(config.selectable_fields)?;

        self.render_select(&SelectPlan {
            config,
            fields: &fields,
            filter: &filter,
            fixed: endpoint.fixed_predicate(),
            sort_fields: &request.sort_fields,
            direction: request.direction,
            limit: request.limit,
            offset: request.offset,
        })
    }

    /// Renders a single-record lookup by `sourcedId`.
    ///
    /// # Errors
    ///
    /// Only fails if `sourcedId` were missing from the filter allow-list.
    pub fn render_one(
        &self,
        endpoint: Endpoint,
        sourced_id: &str,
    ) -> Result<RenderedQuery, QueryError> {
        let config = endpoint.config();
        let filter =
            FilterExpression::single(FilterClause::new("sourcedId", FilterOperator::Eq, sourced_id));

        self.render_select(&SelectPlan {
            config,
            fields: config.selectable_fields,
            filter: &filter,
            fixed: endpoint.fixed_predicate(),
            sort_fields: &[],
            direction: SortDirection::Asc,
            limit: 1,
            offset: 0,
        })
    }

    fn render_select(&self, plan: &SelectPlan<'_>) -> Result<RenderedQuery, QueryError> {
        let dialect = self.dialect;
        let resource = plan.config.resource;
        let mut params = ParamSink::new();

        let mut where_clause = format!(
            "({})",
            dialect.render_filter(plan.filter, plan.config, &mut params)?
        );
        if let Some(fixed) = plan.fixed {
            let fixed_sql = dialect.render_fixed_predicate(fixed, resource, &mut params);
            where_clause = format!("{where_clause} AND ({fixed_sql})");
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {} {}",
            dialect.render_projection(plan.fields, resource),
            dialect.qualified_table(&self.schema, resource),
            where_clause,
            dialect.render_order_by(plan.sort_fields, plan.config, plan.direction),
            dialect.render_pagination(plan.limit, plan.offset, &mut params),
        );

        Ok(RenderedQuery::new(sql, params.into_params()))
    }

    /// Lists records of a collection endpoint.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before any SQL is executed;
    /// execution failures surface as [`QueryError::Storage`].
    #[instrument(skip_all, fields(endpoint = %endpoint, backend = self.backend_name()))]
    pub async fn query_many(
        &self,
        endpoint: Endpoint,
        request: &QueryRequest,
    ) -> Result<Vec<Record>, QueryError> {
        let query = self.render_many(endpoint, request).inspect_err(|err| {
            debug!(error = %err, "Rejected collection request");
        })?;
        let rows = self.execute(&query).await?;
        Ok(rows.into_iter().map(ResultShaper::normalize_record).collect())
    }

    /// Looks up one record; `Ok(None)` means no such record.
    ///
    /// # Errors
    ///
    /// Execution failures surface as [`QueryError::Storage`].
    #[instrument(skip_all, fields(endpoint = %endpoint, sourced_id = %sourced_id, backend = self.backend_name()))]
    pub async fn query_one(
        &self,
        endpoint: Endpoint,
        sourced_id: &str,
    ) -> Result<Option<Record>, QueryError> {
        let query = self.render_one(endpoint, sourced_id)?;
        let rows = self.execute(&query).await?;
        Ok(rows.into_iter().next().map(ResultShaper::normalize_record))
    }

    async fn execute(&self, query: &RenderedQuery) -> Result<Vec<Record>, QueryError> {
        debug!(sql = %query.sql, params_count = query.param_count(), "Executing query");

        let rows = self.executor.fetch_all(query).await.inspect_err(|err| {
            error!(error = %err, category = %err.category(), "Query execution failed");
        })?;

        debug!(rows = rows.len(), "Query completed");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use oneroster_storage::{RosterExecutor, SqlValue};
    use serde_json::{Value, json};

    use super::*;
    use crate::fields::FieldSelection;

    /// Records every statement and answers with a page of a fixed dataset
    /// or a failure.
    ///
    /// The dataset is assumed to be stored in the requested order; the page
    /// is cut from the two trailing pagination parameters, whose order
    /// depends on the dialect.
    #[derive(Default)]
    struct RecordingExecutor {
        rows: Vec<Record>,
        fail: bool,
        seen: Mutex<Vec<RenderedQuery>>,
    }

    fn page_bounds(query: &RenderedQuery) -> Option<(usize, usize)> {
        let [.., first, second] = query.params.as_slice() else {
            return None;
        };
        let (limit, offset) = if query.sql.ends_with("ROWS ONLY") {
            (second.as_integer()?, first.as_integer()?)
        } else {
            (first.as_integer()?, second.as_integer()?)
        };
        Some((usize::try_from(limit).ok()?, usize::try_from(offset).ok()?))
    }

    impl RecordingExecutor {
        fn with_rows(rows: Vec<Value>) -> Self {
            Self {
                rows: rows
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::Object(map) => Some(map),
                        _ => None,
                    })
                    .collect(),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn last(&self) -> Option<RenderedQuery> {
            self.seen.lock().unwrap().last().cloned()
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RosterExecutor for RecordingExecutor {
        async fn fetch_all(&self, query: &RenderedQuery) -> Result<Vec<Record>, StorageError> {
            self.seen.lock().unwrap().push(query.clone());
            if self.fail {
                return Err(StorageError::unavailable("connection refused"));
            }
            let (limit, offset) = page_bounds(query).unwrap_or((usize::MAX, 0));
            Ok(self.rows.iter().skip(offset).take(limit).cloned().collect())
        }

        async fn ping(&self) -> Result<(), StorageError> {
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "recording"
        }
    }

    fn service(executor: Arc<RecordingExecutor>, dialect: DialectKind) -> QueryService {
        QueryService::new(executor, dialect)
    }

    #[test]
    fn test_render_many_postgres() {
        let svc = service(Arc::default(), DialectKind::Postgres);
        let request = QueryRequest::default()
            .with_fields(FieldSelection::parse("sourcedId,name"))
            .with_filter("status='active'")
            .with_sort(&["name"], SortDirection::Desc)
            .with_limit(5)
            .with_offset(10);

        let query = svc.render_many(Endpoint::Schools, &request).unwrap();
        assert_eq!(
            query.sql,
            "SELECT \"orgs\".\"sourcedId\", \"orgs\".\"name\" FROM \"oneroster12\".\"orgs\" \
             WHERE (\"orgs\".\"status\"::text = $1) AND (\"orgs\".\"type\"::text = $2) \
             ORDER BY \"orgs\".\"name\" DESC LIMIT $3 OFFSET $4"
        );
        assert_eq!(
            query.params,
            vec![
                SqlValue::from("active"),
                SqlValue::from("school"),
                SqlValue::from(5_i64),
                SqlValue::from(10_i64),
            ]
        );
    }

    #[test]
    fn test_render_many_tsql() {
        let svc = service(Arc::default(), DialectKind::Mssql).with_schema("roster");
        let request = QueryRequest::default()
            .with_fields(FieldSelection::parse("sourcedId"))
            .with_filter("givenName='Ann' OR familyName='Lee'");

        let query = svc.render_many(Endpoint::Students, &request).unwrap();
        assert_eq!(
            query.sql,
            "SELECT [users].[sourcedId] FROM [roster].[users] \
             WHERE ([users].[givenName] COLLATE Latin1_General_CS_AS = @P1 \
             OR [users].[familyName] COLLATE Latin1_General_CS_AS = @P2) \
             AND ([users].[role] COLLATE Latin1_General_CS_AS = @P3) \
             ORDER BY [users].[sourcedId] ASC OFFSET @P4 ROWS FETCH NEXT @P5 ROWS ONLY"
        );
        assert_eq!(
            query.params,
            vec![
                SqlValue::from("Ann"),
                SqlValue::from("Lee"),
                SqlValue::from("student"),
                SqlValue::from(0_i64),
                SqlValue::from(10_i64),
            ]
        );
    }

    #[test]
    fn test_render_many_without_filter() {
        let svc = service(Arc::default(), DialectKind::Postgres);
        let query = svc.render_many(Endpoint::Courses, &QueryRequest::default()).unwrap();
        assert!(query.sql.contains("WHERE (1=1) ORDER BY \"courses\".\"sourcedId\" ASC"));
        assert_eq!(query.params.len(), 2);
    }

    #[test]
    fn test_render_one() {
        let svc = service(Arc::default(), DialectKind::Postgres);
        let query = svc.render_one(Endpoint::Teachers, "t-1").unwrap();
        assert!(query.sql.starts_with("SELECT \"users\".\"sourcedId\", \"users\".\"status\""));
        assert!(query.sql.contains(
            "WHERE (\"users\".\"sourcedId\"::text = $1) AND (\"users\".\"role\"::text = $2)"
        ));
        assert!(query.sql.ends_with("LIMIT $3 OFFSET $4"));
        assert_eq!(
            query.params,
            vec![
                SqlValue::from("t-1"),
                SqlValue::from("teacher"),
                SqlValue::from(1_i64),
                SqlValue::from(0_i64),
            ]
        );
    }

    #[test]
    fn test_validation_order() {
        let svc = service(Arc::default(), DialectKind::Postgres);

        let request = QueryRequest::default()
            .with_filter("status")
            .with_fields(FieldSelection::parse("bogus"));
        assert!(matches!(
            svc.render_many(Endpoint::Orgs, &request),
            Err(QueryError::FilterSyntax { .. })
        ));

        let request = QueryRequest::default()
            .with_filter("bogus=1")
            .with_fields(FieldSelection::parse("bogus"));
        assert!(matches!(
            svc.render_many(Endpoint::Orgs, &request),
            Err(QueryError::InvalidSelectionField { .. })
        ));
    }

    #[test]
    fn test_unknown_filter_field_rejected_for_every_endpoint() {
        let svc = service(Arc::default(), DialectKind::Mssql);
        let request = QueryRequest::default().with_filter("bogus=1");
        for endpoint in Endpoint::ALL {
            let err = svc.render_many(endpoint, &request).unwrap_err();
            assert_eq!(err.minor_code(), Some("invalid_filter_field"), "{endpoint}");
        }
    }

    #[test]
    fn test_quoted_values_bind_identically() {
        let svc = service(Arc::default(), DialectKind::Postgres);
        let quoted = svc
            .render_many(Endpoint::Orgs, &QueryRequest::default().with_filter("status='active'"))
            .unwrap();
        let bare = svc
            .render_many(Endpoint::Orgs, &QueryRequest::default().with_filter("status=active"))
            .unwrap();
        assert_eq!(quoted, bare);
    }

    #[test]
    fn test_dialects_bind_same_values() {
        let request = QueryRequest::default()
            .with_filter("title~'Alg' AND status!='tobedeleted'")
            .with_sort(&["title"], SortDirection::Asc)
            .with_limit(3);
        let pg = service(Arc::default(), DialectKind::Postgres)
            .render_many(Endpoint::Classes, &request)
            .unwrap();
        let ms = service(Arc::default(), DialectKind::Mssql)
            .render_many(Endpoint::Classes, &request)
            .unwrap();

        let text = |q: &RenderedQuery| -> Vec<SqlValue> {
            q.params.iter().filter(|p| p.as_text().is_some()).cloned().collect()
        };
        assert_eq!(text(&pg), text(&ms));
        assert_eq!(text(&pg), vec![SqlValue::from("%Alg%"), SqlValue::from("tobedeleted")]);
    }

    #[tokio::test]
    async fn test_query_many_normalizes_rows() {
        let executor = Arc::new(RecordingExecutor::with_rows(vec![json!({
            "sourcedId": "o1",
            "metadata": "{\"region\": \"north\"}",
        })]));
        let svc = service(executor.clone(), DialectKind::Mssql);

        let rows = svc
            .query_many(Endpoint::Orgs, &QueryRequest::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["metadata"], json!({"region": "north"}));
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_validation_errors_never_reach_executor() {
        let executor = Arc::new(RecordingExecutor::default());
        let svc = service(executor.clone(), DialectKind::Postgres);

        let err = svc
            .query_many(Endpoint::Users, &QueryRequest::default().with_filter("password=x"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilterField { .. }));
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_date_never_reaches_executor() {
        let executor = Arc::new(RecordingExecutor::default());
        let svc = service(executor.clone(), DialectKind::Mssql);

        let err = svc
            .query_many(
                Endpoint::AcademicSessions,
                &QueryRequest::default().with_filter("startDate>'next monday'"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilterValue { .. }));
        assert_eq!(err.minor_code(), Some("invalid_filter_field"));
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_consecutive_pages_are_disjoint() {
        let dataset: Vec<Value> = ["o1", "o2", "o3", "o4", "o5"]
            .into_iter()
            .map(|id| json!({"sourcedId": id}))
            .collect();
        fn ids(rows: &[Record]) -> Vec<String> {
            rows.iter()
                .filter_map(|r| r["sourcedId"].as_str().map(String::from))
                .collect()
        }

        for dialect in [DialectKind::Postgres, DialectKind::Mssql] {
            let executor = Arc::new(RecordingExecutor::with_rows(dataset.clone()));
            let svc = service(executor, dialect);
            let page = |offset| {
                QueryRequest::default()
                    .with_sort(&["sourcedId"], SortDirection::Asc)
                    .with_limit(2)
                    .with_offset(offset)
            };

            let first = svc.query_many(Endpoint::Orgs, &page(0)).await.unwrap();
            let second = svc.query_many(Endpoint::Orgs, &page(2)).await.unwrap();
            let last = svc.query_many(Endpoint::Orgs, &page(4)).await.unwrap();

            assert_eq!(ids(&first), vec!["o1", "o2"], "{dialect}");
            assert_eq!(ids(&second), vec!["o3", "o4"], "{dialect}");
            assert_eq!(ids(&last), vec!["o5"], "{dialect}");
            assert!(ids(&first).iter().all(|id| !ids(&second).contains(id)));
        }
    }

    #[tokio::test]
    async fn test_query_one_not_found() {
        let executor = Arc::new(RecordingExecutor::default());
        let svc = service(executor.clone(), DialectKind::Postgres);

        let found = svc.query_one(Endpoint::Orgs, "missing").await.unwrap();
        assert!(found.is_none());
        let sent = executor.last().unwrap();
        assert_eq!(sent.params[0], SqlValue::from("missing"));
    }

    #[tokio::test]
    async fn test_query_one_returns_first_row() {
        let executor = Arc::new(RecordingExecutor::with_rows(vec![
            json!({"sourcedId": "a"}),
            json!({"sourcedId": "b"}),
        ]));
        let svc = service(executor, DialectKind::Postgres);

        let found = svc.query_one(Endpoint::Orgs, "a").await.unwrap().unwrap();
        assert_eq!(found["sourcedId"], json!("a"));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let svc = service(Arc::new(RecordingExecutor::failing()), DialectKind::Postgres);
        let err = svc
            .query_many(Endpoint::Enrollments, &QueryRequest::default())
            .await
            .unwrap_err();
        match err {
            QueryError::Storage(inner) => assert!(inner.is_unavailable()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
