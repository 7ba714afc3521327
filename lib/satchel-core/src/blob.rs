//! Binary downloads (CSV exports, generated PDFs).

use bytes::Bytes;

use crate::{Response, Result};

/// Raw bytes of a download, with what the server said about them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
    content_type: Option<String>,
    filename: Option<String>,
}

impl Blob {
    /// Create a blob from raw bytes.
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
            filename: None,
        }
    }

    /// Build a blob from a response, failing on non-2xx statuses.
    ///
    /// The body is never JSON-decoded. A 204 yields an empty blob.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) for non-2xx responses.
    pub fn from_response(response: Response<Bytes>) -> Result<Self> {
        let response = response.error_for_status()?;
        let content_type = response.header("content-type").map(str::to_string);
        let filename = response
            .header("content-disposition")
            .and_then(disposition_filename);
        Ok(Self {
            data: response.into_body(),
            content_type,
            filename,
        })
    }

    /// The downloaded bytes.
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Consume into the downloaded bytes.
    #[must_use]
    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// `Content-Type` of the download, if sent.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Filename from `Content-Disposition`, if sent.
    ///
    /// Only the last path component of what the server sent is kept, so the
    /// name is safe to join onto a local directory. `.` and `..` are dropped.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing was downloaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Extract `filename` from a `Content-Disposition` value.
///
/// Only the plain `filename=` parameter is read; RFC 5987 `filename*=` is
/// skipped.
fn disposition_filename(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("filename"))
        .and_then(|(_, raw)| base_name(raw.trim().trim_matches('"')))
}

/// Last component of a `/` or `\` separated path, without control
/// characters. `None` when nothing usable is left.
fn base_name(raw: &str) -> Option<String> {
    let name: String = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let name = name.trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}
