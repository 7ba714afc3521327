//! Tower middleware for [`HyperClient`](crate::HyperClient).
//!
//! Layers wrap the transport, so they see every request exactly as it goes
//! on the wire, including the `authorization` header added by
//! [`ApiClient`](crate::ApiClient).
//!
//! ```ignore
//! use satchel::HyperClient;
//! use satchel::middleware::LoggingLayer;
//!
//! let transport = HyperClient::builder()
//!     .layer(LoggingLayer::debug())
//!     .build();
//! ```

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

pub use tower::{Layer, ServiceBuilder};
