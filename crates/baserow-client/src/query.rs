//! Row query parameters for the list-rows endpoint.
//!
//! [`RowQuery`] collects the high-level query arguments and flattens them
//! into the query string Baserow expects. Parameters are held in a
//! `BTreeMap`, so their iteration order is always sorted by name; the query
//! cache relies on that to build stable keys.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Prefix of free-form field filters (`filter__field_12__equal=...`).
pub const FILTER_PREFIX: &str = "filter__";

/// Sort direction for one ordering key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `"desc"` (any case) is descending; everything else is ascending.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// One ordering key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Desc => write!(f, "-{}", self.field),
            SortDirection::Asc => f.write_str(&self.field),
        }
    }
}

/// How top-level filters are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterType {
    #[default]
    And,
    Or,
}

impl FilterType {
    /// Case-insensitive; anything other than `and`/`or` is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Some(FilterType::And),
            "OR" => Some(FilterType::Or),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::And => "AND",
            FilterType::Or => "OR",
        }
    }
}

/// Query arguments for listing rows.
///
/// ```rust
/// use baserow_client::{RowQuery, Sort};
///
/// let query = RowQuery::new()
///     .page(2)
///     .page_size(50)
///     .fields(["Name", "Score"])
///     .sort([Sort::desc("Score"), Sort::asc("Name")])
///     .filter_type("or");
///
/// let params = query.to_params().unwrap();
/// assert_eq!(params["order_by"], "-Score,Name");
/// assert_eq!(params["include"], "Name,Score");
/// assert_eq!(params["filter_type"], "OR");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RowQuery {
    page: u32,
    page_size: u32,
    user_field_names: bool,
    include: Vec<String>,
    exclude: Vec<String>,
    sort: Vec<Sort>,
    filters: Option<Value>,
    filter_type: Option<FilterType>,
    view_id: Option<String>,
    search: Option<String>,
    field_filters: BTreeMap<String, String>,
}

impl Default for RowQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            user_field_names: true,
            include: Vec::new(),
            exclude: Vec::new(),
            sort: Vec::new(),
            filters: None,
            filter_type: Some(FilterType::And),
            view_id: None,
            search: None,
            field_filters: BTreeMap::new(),
        }
    }
}

impl RowQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1-based page number.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn current_page(&self) -> u32 {
        self.page
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Use field ids (`field_12`) instead of names in requests and rows.
    pub fn user_field_names(mut self, enabled: bool) -> Self {
        self.user_field_names = enabled;
        self
    }

    /// Only return these fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Alias of [`RowQuery::fields`].
    pub fn include<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields(fields)
    }

    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Ordering keys, applied in the given order.
    pub fn sort<I>(mut self, sort: I) -> Self
    where
        I: IntoIterator<Item = Sort>,
    {
        self.sort = sort.into_iter().collect();
        self
    }

    /// Structured filter tree, e.g.
    /// `{"filter_type": "AND", "filters": [...], "groups": []}`.
    /// Sent as JSON text without interpretation.
    pub fn filters(mut self, filters: Value) -> Self {
        self.filters = Some(filters);
        self
    }

    /// `AND` or `OR`, case-insensitive. Other values clear the setting so no
    /// `filter_type` parameter is sent.
    pub fn filter_type(mut self, filter_type: &str) -> Self {
        self.filter_type = FilterType::parse(filter_type);
        if self.filter_type.is_none() {
            tracing::debug!(filter_type = %filter_type, "Ignoring unknown filter_type");
        }
        self
    }

    pub fn view(mut self, view_id: impl ToString) -> Self {
        self.view_id = Some(view_id.to_string());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Add a free-form filter parameter such as `filter__field_12__equal`.
    ///
    /// Names that do not start with `filter__` are dropped.
    pub fn filter(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let name = name.into();
        if name.starts_with(FILTER_PREFIX) {
            self.field_filters.insert(name, value.to_string());
        } else {
            tracing::debug!(param = %name, "Dropping keyword without filter__ prefix");
        }
        self
    }

    /// Flatten into query-string parameters.
    pub fn to_params(&self) -> Result<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();

        params.insert("page".to_string(), self.page.to_string());
        params.insert("size".to_string(), self.page_size.to_string());

        if self.user_field_names {
            params.insert("user_field_names".to_string(), "true".to_string());
        }

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.insert("search".to_string(), search.to_string());
        }

        if !self.sort.is_empty() {
            params.insert("order_by".to_string(), join(&self.sort));
        }

        if let Some(filters) = &self.filters {
            params.insert("filters".to_string(), serde_json::to_string(filters)?);
        }

        if let Some(filter_type) = self.filter_type {
            params.insert("filter_type".to_string(), filter_type.as_str().to_string());
        }

        if !self.include.is_empty() {
            params.insert("include".to_string(), self.include.join(","));
        }

        if !self.exclude.is_empty() {
            params.insert("exclude".to_string(), self.exclude.join(","));
        }

        if let Some(view_id) = self.view_id.as_deref().filter(|s| !s.is_empty()) {
            params.insert("view_id".to_string(), view_id.to_string());
        }

        for (name, value) in &self.field_filters {
            params.insert(name.clone(), value.clone());
        }

        Ok(params)
    }
}

fn join(sort: &[Sort]) -> String {
    sort.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
