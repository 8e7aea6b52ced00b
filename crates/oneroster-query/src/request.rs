//! Request parameters accepted by collection endpoints.

use url::form_urlencoded;

use crate::fields::FieldSelection;

/// Page size used when `limit` is absent or unusable.
pub const DEFAULT_LIMIT: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `desc` in any case selects descending; anything else ascends.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Paging bounds applied while parsing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u64,
    pub max_limit: Option<u64>,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
        }
    }
}

/// Parsed collection request: paging, sorting, projection and raw filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub limit: u64,
    pub offset: u64,
    /// Requested sort fields; unknown names are dropped at render time.
    pub sort_fields: Vec<String>,
    pub direction: SortDirection,
    pub fields: FieldSelection,
    pub filter: String,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort_fields: Vec::new(),
            direction: SortDirection::Asc,
            fields: FieldSelection::All,
            filter: String::new(),
        }
    }
}

impl QueryRequest {
    /// Parses an `application/x-www-form-urlencoded` query string.
    ///
    /// Unknown parameters are ignored. A non-numeric or zero `limit` and a
    /// non-numeric `offset` fall back to their defaults; when the same
    /// parameter appears twice the last occurrence wins.
    #[must_use]
    pub fn from_query(query: &str, limits: PageLimits) -> Self {
        let mut request = Self {
            limit: limits.default_limit,
            ..Self::default()
        };

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "limit" => {
                    request.limit = value
                        .trim()
                        .parse::<u64>()
                        .ok()
                        .filter(|n| *n > 0)
                        .unwrap_or(limits.default_limit);
                }
                "offset" => {
                    request.offset = value.trim().parse::<u64>().unwrap_or(0);
                }
                "sort" => {
                    request.sort_fields = value
                        .split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(String::from)
                        .collect();
                }
                "orderBy" => request.direction = SortDirection::parse(&value),
                "fields" => request.fields = FieldSelection::parse(&value),
                "filter" => request.filter = value.into_owned(),
                _ => {}
            }
        }

        if let Some(max) = limits.max_limit {
            request.limit = request.limit.min(max);
        }
        request
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_sort(mut self, fields: &[&str], direction: SortDirection) -> Self {
        self.sort_fields = fields.iter().map(|f| (*f).to_string()).collect();
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: FieldSelection) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}
