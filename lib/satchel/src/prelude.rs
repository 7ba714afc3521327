//! Prelude module for convenient imports.
//!
//! ```ignore
//! use satchel::prelude::*;
//! ```

pub use crate::{
    ApiClient, Blob, ClientConfig, Empty, Error, FileTokenStore, Form, HttpClient, HyperClient,
    IntoOutcome, ListEnvelope, MemoryTokenStore, Method, Outcome, Part, QueryParams, Result,
    SessionState, StatusCode,
};
pub use serde::{Deserialize, Serialize};
