//! STAC item search request body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EodhError, Result};
use crate::pagination::PAGINATION_LIMIT;

/// Sort direction for `sortby`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One `sortby` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

/// Fields extension: properties to include in or exclude from results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldsFilter {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Filter language of `filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterLang {
    #[serde(rename = "cql-json")]
    CqlJson,
    #[serde(rename = "cql2-json")]
    Cql2Json,
    #[serde(rename = "cql2-text")]
    Cql2Text,
}

/// Body of `POST /search` (STAC API Item Search).
///
/// Unset fields are left out of the request body, and missing fields take
/// their defaults when a body is read back.
///
/// # Example
///
/// ```
/// use eodhapi::SearchParams;
///
/// let params = SearchParams::new()
///     .collections(&["cmip6"])
///     .bbox(-9.0, 49.4, 3.1, 61.3)
///     .datetime("2023-01-01T00:00:00Z/..")
///     .limit(20);
/// assert_eq!(params.limit, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Page size.
    pub limit: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,

    /// `[west, south, east, north]` (or 6 values with elevation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    /// GeoJSON geometry the results must intersect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intersects: Option<Value>,

    /// RFC 3339 datetime or interval (`start/end`, open ends as `..`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldsFilter>,

    /// Query extension object, e.g. `{"eo:cloud_cover": {"lte": 10}}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Map<String, Value>>,

    #[serde(rename = "sortby", default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<Vec<SortField>>,

    /// CQL filter expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,

    #[serde(rename = "filter-crs", default, skip_serializing_if = "Option::is_none")]
    pub filter_crs: Option<String>,

    #[serde(rename = "filter-lang", default, skip_serializing_if = "Option::is_none")]
    pub filter_lang: Option<FilterLang>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            limit: PAGINATION_LIMIT,
            collections: None,
            ids: None,
            bbox: None,
            intersects: None,
            datetime: None,
            fields: None,
            query: None,
            sort_by: None,
            filter: None,
            filter_crs: None,
            filter_lang: None,
        }
    }
}

impl SearchParams {
    /// Search parameters with the default page size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Restrict to collections.
    #[must_use]
    pub fn collections(mut self, collections: &[&str]) -> Self {
        self.collections = Some(collections.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Restrict to item IDs.
    #[must_use]
    pub fn ids(mut self, ids: &[&str]) -> Self {
        self.ids = Some(ids.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Set the bounding box `[west, south, east, north]`.
    #[must_use]
    pub fn bbox(mut self, west: f64, south: f64, east: f64, north: f64) -> Self {
        self.bbox = Some(vec![west, south, east, north]);
        self
    }

    /// Set a GeoJSON geometry to intersect.
    #[must_use]
    pub fn intersects(mut self, geometry: Value) -> Self {
        self.intersects = Some(geometry);
        self
    }

    /// Set datetime or datetime range (e.g. `"2024-06-01T00:00:00Z/.."`).
    #[must_use]
    pub fn datetime(mut self, datetime: &str) -> Self {
        self.datetime = Some(datetime.to_string());
        self
    }

    /// Add a `sortby` entry.
    #[must_use]
    pub fn sort_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort_by.get_or_insert_with(Vec::new).push(SortField {
            field: field.to_string(),
            direction,
        });
        self
    }

    /// Set a CQL filter.
    #[must_use]
    pub fn filter(mut self, filter: Value, lang: FilterLang) -> Self {
        self.filter = Some(filter);
        self.filter_lang = Some(lang);
        self
    }

    /// Set the query object from shorthand expressions.
    ///
    /// See [`parse_query_expressions`].
    ///
    /// # Errors
    ///
    /// Returns an error if an expression is not valid.
    pub fn query_expressions<S: AsRef<str>>(mut self, expressions: &[S]) -> Result<Self> {
        self.query = Some(parse_query_expressions(expressions)?);
        Ok(self)
    }
}

/// Comparison operators, longest first so `>=` wins over `>`.
const OPERATORS: [(&str, &str); 6] = [
    (">=", "gte"),
    ("<=", "lte"),
    ("<>", "neq"),
    ("=", "eq"),
    (">", "gt"),
    ("<", "lt"),
];

/// Fold query shorthand into a STAC query object.
///
/// Each expression is either a JSON object fragment, merged as-is, or a
/// comparison such as `eo:cloud_cover<=10`, which becomes
/// `{"eo:cloud_cover": {"lte": "10"}}`. Several comparisons on the same
/// property are combined.
///
/// # Errors
///
/// Returns [`EodhError::InvalidArgument`] for an expression that is neither.
pub fn parse_query_expressions<S: AsRef<str>>(expressions: &[S]) -> Result<Map<String, Value>> {
    let mut query = Map::new();

    for expression in expressions {
        let expression = expression.as_ref().trim();

        if let Ok(Value::Object(fragment)) = serde_json::from_str::<Value>(expression) {
            query.extend(fragment);
            continue;
        }

        let (key, op, value) = OPERATORS
            .iter()
            .find_map(|(symbol, name)| {
                let (key, value) = expression.split_once(symbol)?;
                (!key.is_empty() && !value.is_empty()).then_some((key.trim(), *name, value.trim()))
            })
            .ok_or_else(|| {
                EodhError::InvalidArgument(format!("cannot parse query expression '{expression}'"))
            })?;

        let entry = query
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(ops) => {
                ops.insert(op.to_string(), Value::String(value.to_string()));
            }
            other => {
                let mut ops = Map::new();
                ops.insert(op.to_string(), Value::String(value.to_string()));
                *other = Value::Object(ops);
            }
        }
    }

    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_params_serialize_only_limit() {
        let json = serde_json::to_value(SearchParams::new()).unwrap();
        assert_eq!(json, json!({"limit": 10}));
    }

    #[test]
    fn test_builder_serializes_stac_names() {
        let params = SearchParams::new()
            .collections(&["cmip6"])
            .bbox(-3.75, 40.38, -3.65, 40.45)
            .datetime("2024-06-01T00:00:00Z/2024-06-30T00:00:00Z")
            .sort_by("datetime", SortDirection::Desc)
            .filter(json!({"op": "=", "args": [{"property": "a"}, 1]}), FilterLang::Cql2Json)
            .limit(5);

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["limit"], 5);
        assert_eq!(json["collections"], json!(["cmip6"]));
        assert_eq!(json["bbox"], json!([-3.75, 40.38, -3.65, 40.45]));
        assert_eq!(json["sortby"], json!([{"field": "datetime", "direction": "desc"}]));
        assert_eq!(json["filter-lang"], "cql2-json");
        assert!(json.get("ids").is_none());
        assert!(json.get("intersects").is_none());
    }

    #[test]
    fn test_query_comparisons() {
        let query =
            parse_query_expressions(&["eo:cloud_cover<=10", "platform=sentinel-2a"]).unwrap();
        assert_eq!(
            Value::Object(query),
            json!({
                "eo:cloud_cover": {"lte": "10"},
                "platform": {"eq": "sentinel-2a"}
            })
        );
    }

    #[test]
    fn test_query_operator_precedence() {
        let query = parse_query_expressions(&["gsd>=10", "gsd<>20", "x>1"]).unwrap();
        assert_eq!(query["gsd"], json!({"gte": "10", "neq": "20"}));
        assert_eq!(query["x"], json!({"gt": "1"}));
    }

    #[test]
    fn test_query_json_fragment() {
        let query = parse_query_expressions(&[r#"{"eo:cloud_cover": {"lt": 5}}"#]).unwrap();
        assert_eq!(query["eo:cloud_cover"], json!({"lt": 5}));
    }

    #[test]
    fn test_query_rejects_garbage() {
        assert!(parse_query_expressions(&["no operator here"]).is_err());
        assert!(parse_query_expressions(&["=5"]).is_err());
    }
}
