//! Filter state and the query payload built from it.
//!
//! # Design
//! `FilterState` is the screen's view of its filter widgets and may hold
//! empty values (a cleared text box, an empty multi-select). `QueryBuilder`
//! turns it into a `Query` that carries only meaningful values, so the server
//! never sees `name=` or an empty `area[]`. Both are keyed by `BTreeMap`,
//! which makes the encoded URL deterministic for a given state.

use std::collections::BTreeMap;
use std::fmt;

use url::form_urlencoded;

/// A single filter value or list element.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(n) => write!(f, "{n}"),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// The current value of one filter widget.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Nothing selected (`undefined`/`null` in the widget).
    Null,
    Scalar(Scalar),
    /// Multi-select; passed through as-is when non-empty.
    List(Vec<Scalar>),
}

impl FilterValue {
    /// Whether this value would be stripped from a request.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Null => true,
            FilterValue::Scalar(Scalar::Text(s)) => s.is_empty(),
            FilterValue::Scalar(_) => false,
            FilterValue::List(items) => items.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Scalar(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Scalar(Scalar::Text(value.to_string()))
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Scalar(Scalar::Text(value))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Scalar(Scalar::Int(value))
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Scalar(Scalar::Int(i64::from(value)))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Scalar(Scalar::Float(value))
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Scalar(Scalar::Bool(value))
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        FilterValue::List(
            values
                .into_iter()
                .map(|v| Scalar::Text(v.to_string()))
                .collect(),
        )
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::List(values.into_iter().map(Scalar::Text).collect())
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(values: Vec<i64>) -> Self {
        FilterValue::List(values.into_iter().map(Scalar::Int).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Null, Into::into)
    }
}

/// Filter name -> current value, owned by one screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    values: BTreeMap<String, FilterValue>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used to declare a screen's initial shape.
    pub fn with(mut self, name: &str, value: impl Into<FilterValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<FilterValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Explicit pagination offsets for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

/// A stripped request payload. Never contains an empty value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    params: BTreeMap<String, FilterValue>,
}

impl Query {
    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.params.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Form-urlencode the payload. Lists become repeated `key[]=value` pairs.
    pub fn encode(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.params {
            match value {
                FilterValue::Null => {}
                FilterValue::Scalar(s) => {
                    out.append_pair(name, &s.to_string());
                }
                FilterValue::List(items) => {
                    let key = format!("{name}[]");
                    for item in items {
                        out.append_pair(&key, &item.to_string());
                    }
                }
            }
        }
        out.finish()
    }
}

pub const PAGE_KEY: &str = "page";
pub const PER_PAGE_KEY: &str = "perPage";

pub struct QueryBuilder;

impl QueryBuilder {
    /// Build the request payload for `filters`, optionally with offsets.
    ///
    /// Offsets override any filter that happens to use the same key.
    pub fn build(filters: &FilterState, page: Option<PageRequest>) -> Query {
        let mut params: BTreeMap<String, FilterValue> = filters
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();

        if let Some(page) = page {
            params.insert(PAGE_KEY.to_string(), page.page.into());
            params.insert(PER_PAGE_KEY.to_string(), page.per_page.into());
        }

        Query { params }
    }
}
