//! Query parameters for list and export endpoints.
//!
//! Filters on list screens are often optional: a class filter that was never
//! picked, a search box that was cleared. Those must not reach the API as
//! `?class_id=&search=`, so [`QueryParams`] drops absent and empty values
//! when the URL is built.
//!
//! ```
//! use satchel_core::QueryParams;
//!
//! let params = QueryParams::new()
//!     .param("search", "")
//!     .param("class_id", None::<u32>)
//!     .param("page", 2)
//!     .param("active", true);
//!
//! assert_eq!(
//!     params.pairs(),
//!     vec![("page".to_string(), "2".to_string()), ("active".to_string(), "true".to_string())]
//! );
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

/// A single scalar query value, or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryValue(Option<String>);

impl QueryValue {
    /// The absent value; never sent.
    #[must_use]
    pub const fn absent() -> Self {
        Self(None)
    }

    /// The string form, if this value would be sent.
    #[must_use]
    pub fn as_sent(&self) -> Option<&str> {
        self.0.as_deref().filter(|value| !value.is_empty())
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self(Some(value.to_string()))
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self(Some(value))
    }
}

impl From<&String> for QueryValue {
    fn from(value: &String) -> Self {
        Self(Some(value.clone()))
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self(Some(value.to_string()))
    }
}

macro_rules! query_value_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    Self(Some(value.to_string()))
                }
            }
        )*
    };
}

query_value_from_display!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::absent, Into::into)
    }
}

/// Ordered query parameters with empty-value filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    /// Create an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter. Absent and empty values are kept but never sent.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Add a parameter in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<QueryValue>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Build parameters from a serializable filter struct or map.
    ///
    /// The value must serialize to a flat JSON object. Fields keep their
    /// declaration order. `null` and `""` fields are dropped like any other
    /// absent value; numbers and booleans are string-coerced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the value is not an object or a
    /// field holds an array or nested object.
    ///
    /// ```
    /// use satchel_core::QueryParams;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct InvoiceFilter {
    ///     status: Option<&'static str>,
    ///     term: u32,
    /// }
    ///
    /// let params = QueryParams::from_serialize(&InvoiceFilter { status: None, term: 3 })
    ///     .expect("flat filter");
    /// assert_eq!(params.to_query_string(), "term=3");
    /// ```
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let Value::Object(fields) = serde_json::to_value(value)? else {
            return Err(Error::invalid_request(
                "query parameters must serialize to an object",
            ));
        };

        let mut params = Self::new();
        for (name, value) in fields {
            let value = match value {
                Value::Null => QueryValue::absent(),
                Value::String(s) => QueryValue::from(s),
                Value::Bool(b) => QueryValue::from(b),
                Value::Number(n) => QueryValue::from(n.to_string()),
                Value::Array(_) | Value::Object(_) => {
                    return Err(Error::invalid_request(format!(
                        "query parameter `{name}` must be a scalar"
                    )));
                }
            };
            params.push(name, value);
        }
        Ok(params)
    }

    /// Append every entry of `other`, absent ones included.
    pub fn extend_from(&mut self, other: &Self) {
        self.entries.extend(other.entries.iter().cloned());
    }

    /// The pairs that are actually sent, in insertion order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter_map(|(name, value)| value.as_sent().map(|v| (name.clone(), v.to_string())))
            .collect()
    }

    /// Returns `true` if no parameter would be sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, value)| value.as_sent().is_none())
    }

    /// Encode the sent pairs as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in self.pairs() {
            serializer.append_pair(&name, &value);
        }
        serializer.finish()
    }

    /// Append the sent pairs to `url`. The URL is left untouched when
    /// nothing survives filtering, so no dangling `?` is produced.
    pub fn apply_to(&self, url: &mut url::Url) {
        let pairs = self.pairs();
        if pairs.is_empty() {
            return;
        }
        url.query_pairs_mut().extend_pairs(pairs);
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.push(name, value);
        }
        params
    }
}
