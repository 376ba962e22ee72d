//! Response types for the Baserow API.
//!
//! Rows are kept as open JSON objects: a table's schema is whatever the
//! server says it is, so [`Row`] never fails on an unknown field name.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::Index;

static NULL: Value = Value::Null;

/// A single table row.
///
/// Lookups by field name never fail: absent names give `None` from the
/// `get*` accessors and `null` through indexing.
///
/// ```rust
/// use baserow_client::Row;
/// use serde_json::json;
///
/// let row = Row::new(json!({"id": 3, "Name": "Ada"}).as_object().unwrap().clone());
/// assert_eq!(row["Name"], "Ada");
/// assert!(row["Missing"].is_null());
/// assert_eq!(row.get_or("Missing", json!("n/a")), json!("n/a"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: Map<String, Value>,
}

impl Row {
    /// Wrap a decoded JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Raw value of a field, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Value of a field, or `default` when the field is absent.
    pub fn get_or(&self, name: &str, default: Value) -> Value {
        self.fields.get(name).cloned().unwrap_or(default)
    }

    /// Decode a field into `T`. Absent or mismatched fields give `None`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let value = self.fields.get(name)?;
        T::deserialize(value).ok()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_i64()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }

    /// Parse an RFC 3339 timestamp field (Baserow date fields with time,
    /// `created_on`, `last_modified`).
    pub fn get_datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        let raw = self.get_str(name)?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Row id assigned by the server.
    pub fn id(&self) -> Option<i64> {
        self.get_i64("id")
    }

    /// Whether the row carries the named field.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// All fields of the row.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl Index<&str> for Row {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&NULL)
    }
}

impl From<Map<String, Value>> for Row {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// One page of rows returned by the list endpoint.
///
/// Records are materialized eagerly, so iteration can be repeated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowList {
    /// Total number of rows matching the query (all pages)
    #[serde(default)]
    count: Option<u64>,
    /// Cursor for the next page, as sent by the server
    #[serde(default)]
    next: Option<String>,
    /// Cursor for the previous page
    #[serde(default)]
    previous: Option<String>,
    #[serde(default, rename = "results")]
    records: Vec<Row>,
}

impl RowList {
    pub fn new(records: Vec<Row>, next: Option<String>) -> Self {
        Self {
            count: None,
            next,
            previous: None,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record of the page, if any.
    pub fn first(&self) -> Option<&Row> {
        self.records.first()
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.records.get(index)
    }

    /// All records, in server order.
    pub fn records(&self) -> &[Row] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.records.iter()
    }

    /// Pagination cursor for the next page; `None` on the last page.
    pub fn next_page(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub fn previous_page(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    pub fn has_next_page(&self) -> bool {
        self.next.is_some()
    }

    /// Page number encoded in the next cursor.
    ///
    /// Accepts either a URL carrying a `page` query parameter or a bare
    /// number.
    pub fn next_page_number(&self) -> Option<u32> {
        let cursor = self.next.as_deref()?;
        if let Ok(n) = cursor.trim().parse::<u32>() {
            return Some(n);
        }
        let url = url::Url::parse(cursor).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok())
    }

    /// Total row count across all pages, when the server reports it.
    pub fn total_count(&self) -> Option<u64> {
        self.count
    }

    pub fn into_records(self) -> Vec<Row> {
        self.records
    }
}

impl Index<usize> for RowList {
    type Output = Row;

    fn index(&self, index: usize) -> &Row {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a RowList {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for RowList {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Field (column) metadata from the field-list endpoint.
///
/// `id`, `table_id`, `name`, `order`, `type` and `primary` must be present;
/// everything else falls back to a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field id; the database column is named `field_<id>`
    pub id: i64,
    /// Owning table
    pub table_id: i64,
    /// Field name
    pub name: String,
    /// Position in the table, 0 is the first field
    pub order: i64,
    /// Field type (text, number, link_row, ...)
    #[serde(rename = "type")]
    pub field_type: String,
    /// Primary fields cannot be deleted and represent the whole row
    pub primary: bool,
    /// Read-only fields reject cell updates
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub link_row_table: Option<i64>,
    #[serde(default)]
    pub link_row_table_id: Option<i64>,
    #[serde(default)]
    pub link_row_related_field: Option<i64>,
    #[serde(default)]
    pub link_row_related_field_id: Option<i64>,
    #[serde(default)]
    pub link_row_limit_selection_view_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub immutable_type: bool,
    #[serde(default)]
    pub immutable_properties: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text_default: String,
}

impl Field {
    /// Name of the backing database column.
    pub fn column_name(&self) -> String {
        format!("field_{}", self.id)
    }

    pub fn is_link_row(&self) -> bool {
        self.field_type == "link_row"
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_row_absent_fields() {
        let r = row(json!({"id": 1, "Name": "x"}));

        assert_eq!(r.get("nope"), None);
        assert_eq!(r.get_or("nope", json!(42)), json!(42));
        assert_eq!(r.get_or("nope", Value::Null), Value::Null);
        assert!(r["nope"].is_null());
        assert_eq!(r.get_str("nope"), None);
    }

    #[test]
    fn test_row_get_is_stable() {
        let r = row(json!({"Score": 9.5}));
        assert_eq!(r.get("Score"), r.get("Score"));
        assert_eq!(r.get_f64("Score"), Some(9.5));
    }

    #[test]
    fn test_row_typed_access() {
        let r = row(json!({
            "id": 12,
            "Done": true,
            "Tags": ["a", "b"],
            "Created": "2024-01-15T10:30:00.123456Z",
            "Day": "2024-01-15"
        }));

        assert_eq!(r.id(), Some(12));
        assert_eq!(r.get_bool("Done"), Some(true));
        assert_eq!(
            r.get_as::<Vec<String>>("Tags"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(r.get_as::<Vec<String>>("Done"), None);
        assert!(r.get_datetime("Created").is_some());
        assert!(r.get_datetime("Day").is_none());
    }

    #[test]
    fn test_row_rejects_non_object() {
        let result: std::result::Result<Row, _> = serde_json::from_value(json!([1, 2]));
        assert!(result.is_err());
    }

    #[test]
    fn test_row_list_with_next() {
        let page: RowList = serde_json::from_value(json!({
            "next": "http://x/?page=2",
            "results": [{"id": 1}]
        }))
        .unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page.first().unwrap().get("id"), Some(&json!(1)));
        assert_eq!(page.next_page(), Some("http://x/?page=2"));
        assert_eq!(page.next_page_number(), Some(2));
        assert!(page.has_next_page());
    }

    #[test]
    fn test_row_list_empty() {
        let page: RowList = serde_json::from_value(json!({"results": []})).unwrap();

        assert_eq!(page.len(), 0);
        assert!(page.is_empty());
        assert!(page.first().is_none());
        assert_eq!(page.next_page(), None);
        assert_eq!(page.next_page_number(), None);
    }

    #[test]
    fn test_row_list_missing_results() {
        let page: RowList = serde_json::from_value(json!({"count": 0, "next": null})).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total_count(), Some(0));
    }

    #[test]
    fn test_row_list_order_and_reiteration() {
        let page: RowList = serde_json::from_value(json!({
            "count": 3,
            "results": [{"id": 3}, {"id": 1}, {"id": 2}]
        }))
        .unwrap();

        let first_pass: Vec<i64> = page.iter().filter_map(Row::id).collect();
        let second_pass: Vec<i64> = (&page).into_iter().filter_map(Row::id).collect();

        assert_eq!(first_pass, vec![3, 1, 2]);
        assert_eq!(first_pass, second_pass);
        assert_eq!(page[2].id(), Some(2));
        assert!(page.get(3).is_none());
    }

    #[test]
    fn test_next_page_number_bare_cursor() {
        let page = RowList::new(vec![], Some("7".to_string()));
        assert_eq!(page.next_page_number(), Some(7));

        let page = RowList::new(vec![], Some("http://x/?size=10".to_string()));
        assert_eq!(page.next_page_number(), None);
    }

    #[test]
    fn test_field_deserialize() {
        let json = r#"{
            "id": 1201,
            "table_id": 171,
            "name": "Name",
            "order": 0,
            "type": "text",
            "primary": true,
            "read_only": false,
            "description": null,
            "text_default": "",
            "db_index": false
        }"#;

        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.id, 1201);
        assert_eq!(field.field_type, "text");
        assert!(field.primary);
        assert_eq!(field.column_name(), "field_1201");
        assert!(!field.is_link_row());
    }

    #[test]
    fn test_field_optional_attributes_default() {
        let field: Field = serde_json::from_value(json!({
            "id": 5,
            "table_id": 2,
            "name": "Project",
            "order": 3,
            "type": "link_row",
            "primary": false,
            "link_row_table_id": 9,
            "text_default": null
        }))
        .unwrap();

        assert!(!field.read_only);
        assert_eq!(field.link_row_table_id, Some(9));
        assert_eq!(field.text_default, "");
        assert!(field.is_link_row());
    }

    #[test]
    fn test_field_requires_core_keys() {
        let result: std::result::Result<Field, _> = serde_json::from_value(json!({
            "id": 5,
            "table_id": 2,
            "name": "Project",
            "order": 3,
            "type": "text"
        }));
        assert!(result.is_err());
    }
}
