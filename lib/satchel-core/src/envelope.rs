//! List response envelopes.
//!
//! List endpoints are not consistent: paginated ones answer
//! `{"count": 120, "next": "...", "results": [...]}`, some answer
//! `{"data": [...]}`, others a bare array. [`ListEnvelope`] accepts all of
//! them so callers decode once and get a `Vec<T>`.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Error, Result};

/// Any of the list shapes the API returns.
///
/// When an object carries both `results` and `data`, `results` wins.
/// Prefer [`ListEnvelope::decode`] for whole response bodies: the derived
/// `Deserialize` tries each shape in turn and cannot say which item failed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    /// Paginated: `{"results": [...]}` with optional pagination fields.
    Results {
        /// Items on this page.
        results: Vec<T>,
        /// Total number of items across pages.
        #[serde(default)]
        count: Option<u64>,
        /// URL of the next page.
        #[serde(default)]
        next: Option<String>,
        /// URL of the previous page.
        #[serde(default)]
        previous: Option<String>,
    },
    /// Wrapped: `{"data": [...]}`.
    Data {
        /// Items.
        data: Vec<T>,
    },
    /// A bare JSON array.
    Bare(Vec<T>),
    /// `null`.
    Null,
}

impl<T> ListEnvelope<T> {
    /// The items, whatever the envelope.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Results { results, .. } => results,
            Self::Data { data } => data,
            Self::Bare(items) => items,
            Self::Null => Vec::new(),
        }
    }

    /// Total item count: the server's `count` when paginated, the number of
    /// items otherwise.
    #[must_use]
    pub fn total(&self) -> u64 {
        let len = match self {
            Self::Results {
                count: Some(count), ..
            } => return *count,
            Self::Results { results, .. } => results.len(),
            Self::Data { data } => data.len(),
            Self::Bare(items) => items.len(),
            Self::Null => 0,
        };
        u64::try_from(len).unwrap_or(u64::MAX)
    }

    /// URL of the next page, if the server sent one.
    #[must_use]
    pub fn next_page(&self) -> Option<&str> {
        match self {
            Self::Results { next, .. } => next.as_deref(),
            _ => None,
        }
    }
}

/// `{"results": [...]}` page.
#[derive(Deserialize)]
struct Page<T> {
    results: Vec<T>,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    previous: Option<String>,
}

/// `{"data": [...]}` wrapper.
#[derive(Deserialize)]
struct Wrapped<T> {
    data: Vec<T>,
}

impl<T: DeserializeOwned> ListEnvelope<T> {
    /// Decode a list response body.
    ///
    /// The shape is picked from the top-level value first, then the items
    /// are decoded with the failing path reported (e.g. `results[1].id`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::JsonDeserialization`] if the body is not JSON, is
    /// not one of the list shapes, or an item does not match `T`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let value: Value = crate::from_json(bytes)?;
        let shape = match &value {
            Value::Null => return Ok(Self::Null),
            Value::Array(_) => Shape::Bare,
            Value::Object(fields) if fields.contains_key("results") => Shape::Results,
            Value::Object(fields) if fields.contains_key("data") => Shape::Data,
            Value::Object(_) => {
                return Err(Error::json_deserialization(
                    ".",
                    "expected an array or an object with `results` or `data`",
                ));
            }
            other => {
                return Err(Error::json_deserialization(
                    ".",
                    format!("expected a list, found `{other}`"),
                ));
            }
        };

        Ok(match shape {
            Shape::Bare => Self::Bare(from_value(value)?),
            Shape::Results => {
                let Page {
                    results,
                    count,
                    next,
                    previous,
                } = from_value(value)?;
                Self::Results {
                    results,
                    count,
                    next,
                    previous,
                }
            }
            Shape::Data => Self::Data {
                data: from_value::<Wrapped<T>>(value)?.data,
            },
        })
    }
}

enum Shape {
    Bare,
    Results,
    Data,
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_path_to_error::deserialize(value)
        .map_err(|e| Error::json_deserialization(e.path().to_string(), e.inner().to_string()))
}

impl<T> Default for ListEnvelope<T> {
    fn default() -> Self {
        Self::Null
    }
}
