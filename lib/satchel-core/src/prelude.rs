//! Prelude module for convenient imports.
//!
//! ```ignore
//! use satchel_core::prelude::*;
//! ```

pub use crate::{
    Blob, Empty, Error, ErrorKind, Form, HttpClient, ListEnvelope, Method, Navigator, Part,
    QueryParams, Request, Response, Result, Session, SessionState, TokenStore,
};
