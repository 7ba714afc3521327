//! Multipart form data for uploads (documents, photos, CSV imports).
//!
//! # Example
//!
//! ```
//! use satchel_core::{Form, Part};
//!
//! let form = Form::new()
//!     .text("student", "1042")
//!     .text("kind", "medical_note")
//!     .part(Part::file("file", "note.pdf", vec![0x25, 0x50, 0x44, 0x46]));
//!
//! assert!(form.content_type().starts_with("multipart/form-data; boundary="));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::{BufMut, Bytes, BytesMut};

/// A single field of a multipart form.
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    /// A plain text field. No per-part content type is sent, as browsers do
    /// for ordinary form inputs.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: Bytes::from(value.into()),
        }
    }

    /// A file field; the content type is guessed from the extension.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let filename = filename.into();
        let content_type = content_type_for(&filename).to_string();
        Self {
            name: name.into(),
            filename: Some(filename),
            content_type: Some(content_type),
            data: data.into(),
        }
    }

    /// Override the content type of this part.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filename, for file parts.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Field payload.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    fn write_to(&self, boundary: &str, buf: &mut BytesMut) {
        buf.put_slice(b"--");
        buf.put_slice(boundary.as_bytes());
        buf.put_slice(b"\r\n");

        buf.put_slice(b"Content-Disposition: form-data; name=\"");
        buf.put_slice(escape_quoted(&self.name).as_bytes());
        buf.put_u8(b'"');
        if let Some(filename) = &self.filename {
            buf.put_slice(b"; filename=\"");
            buf.put_slice(escape_quoted(filename).as_bytes());
            buf.put_u8(b'"');
        }
        buf.put_slice(b"\r\n");

        if let Some(content_type) = &self.content_type {
            buf.put_slice(b"Content-Type: ");
            buf.put_slice(content_type.as_bytes());
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(b"\r\n");
        buf.put_slice(&self.data);
        buf.put_slice(b"\r\n");
    }
}

/// Quotes and line breaks cannot appear inside a quoted header parameter.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Content type for an uploaded file, from its extension.
fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "svg" => "image/svg+xml",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// A multipart form, encoded with [`Form::into_body`].
#[derive(Debug, Clone)]
pub struct Form {
    parts: Vec<Part>,
    boundary: String,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Create an empty form with a fresh boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(next_boundary())
    }

    /// Create an empty form with a fixed boundary.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            parts: Vec::new(),
            boundary: boundary.into(),
        }
    }

    /// Add a part.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Add a text field.
    #[must_use]
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(Part::text(name, value))
    }

    /// Add a file field.
    #[must_use]
    pub fn file(
        self,
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.part(Part::file(name, filename, data))
    }

    /// The boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The parts, in insertion order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// `multipart/form-data; boundary=<boundary>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode into (content type header value, body bytes).
    #[must_use]
    pub fn into_body(self) -> (String, Bytes) {
        let mut buf = BytesMut::new();
        for part in &self.parts {
            part.write_to(&self.boundary, &mut buf);
        }
        buf.put_slice(b"--");
        buf.put_slice(self.boundary.as_bytes());
        buf.put_slice(b"--\r\n");

        (self.content_type(), buf.freeze())
    }
}

fn next_boundary() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    static SEQUENCE: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);

    format!("----SatchelFormBoundary{nanos:x}{sequence:04x}")
}
