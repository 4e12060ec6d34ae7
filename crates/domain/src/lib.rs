//! Stockline Domain - Core gateway types
//!
//! This crate defines the domain model for the Stockline inventory client
//! gateway. All types here are pure Rust with no I/O dependencies.

pub mod credentials;
pub mod error;
pub mod request;
pub mod response;

pub use credentials::Credentials;
pub use error::{GatewayError, GatewayResult};
pub use request::{ApiRequest, HttpMethod};
pub use response::ApiResponse;
