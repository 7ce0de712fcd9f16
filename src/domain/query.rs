use std::{collections::BTreeMap, fmt};

/// Sentinel the UI uses for "no filter".
pub const ALL_SENTINEL: &str = "All";

/// A primitive query-string value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// A filter selection coming from the UI. `All`, blank and unset all mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    #[default]
    All,
    Only(String),
}

impl Filter {
    pub fn value(&self) -> Option<&str> {
        match self {
            Filter::All => None,
            Filter::Only(v) => Some(v),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }
}

impl From<&str> for Filter {
    fn from(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_SENTINEL {
            Filter::All
        } else {
            Filter::Only(value.to_string())
        }
    }
}

impl From<String> for Filter {
    fn from(value: String) -> Self {
        Filter::from(value.as_str())
    }
}

impl From<Option<&str>> for Filter {
    fn from(value: Option<&str>) -> Self {
        value.map(Filter::from).unwrap_or_default()
    }
}

impl From<Option<String>> for Filter {
    fn from(value: Option<String>) -> Self {
        value.map(Filter::from).unwrap_or_default()
    }
}

/// Identity of one fetch: operation name plus its (ordered) parameters.
///
/// Two queries are equal iff both parts are equal, which makes `Query` the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    operation: String,
    params: BTreeMap<String, ParamValue>,
}

impl Query {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Adds the filter as a parameter unless it is the "All"/unset sentinel.
    pub fn with_filter(self, name: &str, filter: &Filter) -> Self {
        match filter.value() {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Query-string pairs in key order.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.operation)?;
        let mut sep = '?';
        for (k, v) in &self.params {
            write!(f, "{sep}{k}={v}")?;
            sep = '&';
        }
        Ok(())
    }
}
