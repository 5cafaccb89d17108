//! HTTP surface for the resolution engine

pub mod http;

pub use http::{router, ApiError};
